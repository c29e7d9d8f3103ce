//! Plain-text summary of every board in the log.

use std::fmt::Write;

use chrono::{Duration, NaiveDate};

use kanban_core::CoreError;

use crate::app::App;

fn format_duration(d: Duration) -> String {
    let hours = d.num_hours();
    let minutes = d.num_minutes() - hours * 60;
    if hours >= 24 {
        format!("{}d {}h", hours / 24, hours % 24)
    } else {
        format!("{hours}h {minutes}m")
    }
}

/// Describe each board: its columns with occupancy against WIP limits, the
/// average lead time and any overdue work items as of `today`.
pub fn render(app: &App, today: NaiveDate) -> Result<String, CoreError> {
    let boards = app.boards().all(None)?;
    if boards.is_empty() {
        return Ok("No boards.\n".to_string());
    }

    let mut out = String::new();
    for board in boards {
        let _ = writeln!(out, "{} - {}", board.name()?, board.description()?);
        for column in board.columns()? {
            let count = column.number_of_work_items()?;
            let _ = match column.wip_limit()? {
                Some(limit) => writeln!(out, "  {:<12} {count}/{limit}", column.name()?),
                None => writeln!(out, "  {:<12} {count}", column.name()?),
            };
        }

        let projection = app.lead_time_projection(board.id())?;
        let _ = match projection.average_lead_time() {
            Some(average) => writeln!(out, "  average lead time: {}", format_duration(average)),
            None => writeln!(out, "  average lead time: n/a"),
        };
        projection.close();

        let overdue = app.overdue_work_items(&board, today)?;
        for item in &overdue {
            let _ = writeln!(out, "  overdue: {}", item.name()?);
        }
    }
    Ok(out)
}
