use std::path::Path;

use cc_core::engine::{ChainDecision, EvaluationReport};
use colored::Colorize;
use color_eyre::Result;

use crate::context::Context;

/// Execute `evaluate`: flag courses, or only show decisions with `--dry-run`.
pub async fn evaluate(root: &Path, dry_run: bool) -> Result<()> {
    let mut ctx = Context::open(root).await?;
    if dry_run {
        let report = ctx.engine.preview_all_at(chrono::Utc::now()).await?;
        print_decisions(&report);
        return Ok(());
    }
    let report = ctx.engine.evaluate_all().await?;
    ctx.print_events();
    print_evaluation(&report);
    Ok(())
}

/// Execute `advance`: run each pending entry's current step once.
pub async fn advance(root: &Path) -> Result<()> {
    let mut ctx = Context::open(root).await?;
    advance_with(&mut ctx).await?;
    ctx.save_courses().await
}

/// Execute `run`: evaluate and advance in one invocation.
pub async fn run(root: &Path) -> Result<()> {
    let mut ctx = Context::open(root).await?;
    let report = ctx.engine.evaluate_all().await?;
    ctx.print_events();
    print_evaluation(&report);
    advance_with(&mut ctx).await?;
    ctx.save_courses().await
}

async fn advance_with(ctx: &mut Context) -> Result<()> {
    let report = ctx.engine.advance_all().await?;
    ctx.print_events();
    println!(
        "{} {} advanced, {} awaiting input, {} completed, {} failed, {} skipped",
        "Advance:".bold(),
        report.advanced,
        report.awaiting,
        report.completed,
        report.failed,
        report.skipped
    );
    if report.errors > 0 {
        println!(
            "{}",
            format!("{} entries could not be saved; see the log", report.errors).red()
        );
    }
    Ok(())
}

fn print_evaluation(report: &EvaluationReport) {
    println!(
        "{} {} evaluated, {} flagged, {} excluded, {} errored, {} already in progress",
        "Evaluate:".bold(),
        report.decisions.len(),
        report.created.len(),
        report.excluded().len(),
        report.errored().len(),
        report.skipped
    );
}

fn print_decisions(report: &EvaluationReport) {
    for decision in &report.decisions {
        let text = match &decision.decision {
            ChainDecision::Triggered { by } => format!("{} by {by}", "flag".green()),
            ChainDecision::Excluded { by } => format!("{} by {by}", "exclude".dimmed()),
            ChainDecision::NoAction => "no action".to_string(),
            ChainDecision::Errored { trigger, reason } => {
                format!("{} in {trigger}: {reason}", "error".red())
            }
        };
        println!("course {}: {text}", decision.course_id);
    }
    println!("{} courses already in progress", report.skipped);
}
