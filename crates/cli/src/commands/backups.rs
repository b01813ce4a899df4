use std::path::Path;

use colored::Colorize;
use color_eyre::Result;

use crate::context::Context;
use crate::output::print_table;

/// Execute `backups list`.
pub async fn list(root: &Path, course: Option<i64>) -> Result<()> {
    let ctx = Context::open(root).await?;
    let rows = ctx
        .backups
        .list_backups(course)?
        .into_iter()
        .map(|b| {
            vec![
                b.id.to_string(),
                b.course_id.to_string(),
                b.shortname,
                b.created_at.format("%Y-%m-%d %H:%M").to_string(),
                b.backup_file,
            ]
        })
        .collect();
    print_table(&["ID", "COURSE", "SHORTNAME", "CREATED", "FILE"], rows);
    Ok(())
}

/// Execute `backups restore`: the restored course joins the course list.
pub async fn restore(root: &Path, backup_id: i64) -> Result<()> {
    let ctx = Context::open(root).await?;
    let course_id = ctx.backups.restore_course_backup(backup_id).await?;
    ctx.save_courses().await?;
    println!(
        "{} backup {backup_id} as course {course_id}",
        "Restored".green()
    );
    Ok(())
}
