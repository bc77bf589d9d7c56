//! Status command for showing every task's clock and logged time.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use tl_core::{
    ClockState, ElapsedOptions, EpochSeconds, elapsed_seconds, format_clock, format_humanized,
    live_elapsed,
};
use tl_db::Database;

/// One task as shown by `tl status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusEntry {
    pub id: String,
    pub description: String,
    pub running: bool,
    /// Seconds logged, including any running interval.
    pub elapsed_seconds: i64,
    /// Seconds since the running interval started.
    pub live_seconds: i64,
    pub invoiced: bool,
}

/// Collects status entries for all tasks.
pub fn collect(db: &mut Database, now: EpochSeconds) -> Result<Vec<StatusEntry>> {
    let options = ElapsedOptions {
        include_running: true,
    };
    db.list_tasks()?
        .into_iter()
        .map(|task| {
            let log = task.time_log()?;
            Ok(StatusEntry {
                id: task.id.to_string(),
                description: task.description.clone(),
                running: ClockState::of(&log) == ClockState::Running,
                elapsed_seconds: elapsed_seconds(&log, options, now),
                live_seconds: live_elapsed(&log, now),
                invoiced: task.is_invoiced(),
            })
        })
        .collect()
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    json: bool,
    now: EpochSeconds,
) -> Result<()> {
    let entries = collect(db, now)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }

    if entries.is_empty() {
        writeln!(writer, "No tasks yet. Create one with 'tl add --description <text>'.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<8}  {:<7}  {:>9}  {:>10}  Description",
        "ID", "State", "Total", "Humanized"
    )?;
    for entry in &entries {
        let id_short: String = entry.id.chars().take(8).collect();
        let state = if entry.running {
            ClockState::Running
        } else {
            ClockState::Idle
        };
        let marker = if entry.invoiced { " [invoiced]" } else { "" };
        writeln!(
            writer,
            "{:<8}  {:<7}  {:>9}  {:>10}  {}{}",
            id_short,
            state.as_str(),
            format_clock(entry.elapsed_seconds),
            format_humanized(entry.elapsed_seconds),
            entry.description,
            marker
        )?;
    }

    Ok(())
}
