use std::path::Path;

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use colored::Colorize;

use crate::context::Context;
use crate::output::{entry_status, history_status, print_json, print_table};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Execute `resume`: hand JSON input to an entry awaiting it.
pub async fn resume(root: &Path, course_id: i64, input: &str) -> Result<()> {
    let input: serde_json::Value =
        serde_json::from_str(input).wrap_err("input must be valid JSON")?;
    let mut ctx = Context::open(root).await?;
    let entry = ctx.engine.resume(course_id, input)?;
    ctx.print_events();
    println!(
        "{} course {course_id}; step {} runs on the next advance",
        "Resumed".green(),
        entry.current_step
    );
    Ok(())
}

/// Execute `retry`.
pub async fn retry(root: &Path, course_id: i64) -> Result<()> {
    let mut ctx = Context::open(root).await?;
    let entry = ctx.engine.retry(course_id)?;
    ctx.print_events();
    println!("{} course {course_id} at {}", "Retrying".green(), entry.current_step);
    Ok(())
}

/// Execute `dismiss`.
pub async fn dismiss(root: &Path, course_id: i64) -> Result<()> {
    let ctx = Context::open(root).await?;
    let record = ctx.engine.dismiss(course_id)?;
    println!(
        "{} course {course_id} (failed at {})",
        "Dismissed".yellow(),
        record.final_step
    );
    Ok(())
}

/// Execute `status`: live entries, or the archive with `--history`.
pub async fn status(root: &Path, history: bool, course: Option<i64>, json: bool) -> Result<()> {
    let ctx = Context::open(root).await?;
    let ledger = ctx.engine.ledger();

    if history {
        let records = ledger.history(course)?;
        if json {
            return print_json(&records);
        }
        let rows = records
            .into_iter()
            .map(|r| {
                vec![
                    r.course_id.to_string(),
                    r.trigger,
                    r.final_step,
                    history_status(r.status),
                    r.finished_at.format(TIME_FORMAT).to_string(),
                    r.failure_reason.unwrap_or_default(),
                ]
            })
            .collect();
        print_table(
            &["COURSE", "TRIGGER", "FINAL STEP", "STATUS", "FINISHED", "REASON"],
            rows,
        );
        return Ok(());
    }

    let entries = match course {
        Some(id) => vec![ledger
            .get(id)?
            .ok_or_else(|| eyre!("course {id} has no lifecycle entry"))?],
        None => ledger.list()?,
    };
    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No courses in progress.");
        return Ok(());
    }
    let rows = entries
        .into_iter()
        .map(|e| {
            vec![
                e.course_id.to_string(),
                e.trigger,
                e.current_step,
                entry_status(e.status),
                e.updated_at.format(TIME_FORMAT).to_string(),
                e.failure_reason.unwrap_or_default(),
            ]
        })
        .collect();
    print_table(
        &["COURSE", "TRIGGER", "STEP", "STATUS", "UPDATED", "REASON"],
        rows,
    );
    Ok(())
}
