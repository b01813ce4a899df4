use cc_protocol::{EntryStatus, Event, HistoryStatus};
use colored::Colorize;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> color_eyre::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{h:width$}", width = widths[i]))
        .collect();
    println!("{}", header_row.join("  ").bold());

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{cell:w$}")
            })
            .collect();
        println!("{}", cells.join("  "));
    }
}

pub fn entry_status(status: EntryStatus) -> String {
    let label = status.as_str();
    match status {
        EntryStatus::Pending => label.cyan().to_string(),
        EntryStatus::Running => label.blue().to_string(),
        EntryStatus::AwaitingInput => label.yellow().to_string(),
        EntryStatus::Completed => label.green().to_string(),
        EntryStatus::Failed => label.red().to_string(),
    }
}

pub fn history_status(status: HistoryStatus) -> String {
    let label = status.as_str();
    match status {
        HistoryStatus::Completed => label.green().to_string(),
        HistoryStatus::Dismissed => label.dimmed().to_string(),
    }
}

/// One line per engine event.
pub fn print_event(event: &Event) {
    match event {
        Event::CourseTriggered {
            course_id,
            trigger,
            first_step,
        } => println!(
            "{} course {course_id} by {trigger}, next step {first_step}",
            "flagged".green()
        ),
        Event::CourseExcluded { course_id, trigger } => {
            println!("{} course {course_id} by {trigger}", "excluded".dimmed())
        }
        Event::EntryStatusUpdate {
            course_id,
            status,
            step,
        } => println!("course {course_id}: {} at {step}", entry_status(*status)),
        Event::EntryMessage { course_id, message } => {
            println!("course {course_id}: {}", message.italic())
        }
        Event::EntryCompleted { course_id } => {
            println!("{} course {course_id}", "completed".green().bold())
        }
        Event::EntryFailed { course_id, reason } => {
            println!("{} course {course_id}: {reason}", "failed".red().bold())
        }
    }
}
