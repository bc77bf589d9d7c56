//! Log command for showing a task's time log as editable rows.

use std::io::Write;

use anyhow::Result;

use tl_core::{
    ElapsedOptions, EpochSeconds, codec, elapsed_seconds, format_clock, interval_difference,
    is_overlapping,
};
use tl_db::Database;

use super::util::{format_epoch, load_task};

pub fn run<W: Write>(
    writer: &mut W,
    task_id: &str,
    db: &mut Database,
    now: EpochSeconds,
) -> Result<()> {
    let task = load_task(db, task_id)?;
    let rows = codec::decode_for_editing(&task.time_log)?;

    writeln!(writer, "{} ({})", task.description, task.id)?;
    writeln!(
        writer,
        "{:>3}  {:<19}  {:<19}  {:>8}  {:<8}  Description",
        "#", "Start", "Stop", "Duration", "Billable"
    )?;
    for (index, row) in rows.iter().enumerate() {
        let stop = if row.is_open() && row.start != 0 {
            "running".to_string()
        } else {
            format_epoch(row.stop)
        };
        let duration = if row.start == 0 {
            "-".to_string()
        } else {
            interval_difference(&rows, index, now).unwrap_or_default()
        };
        let line = format!(
            "{:>3}  {:<19}  {:<19}  {:>8}  {:<8}  {}",
            index,
            format_epoch(row.start),
            stop,
            duration,
            if row.is_billable() { "yes" } else { "no" },
            row.description()
        );
        writeln!(writer, "{}", line.trim_end())?;
    }

    let log = task.time_log()?;
    let total = elapsed_seconds(&log, ElapsedOptions::default(), now);
    writeln!(writer, "Total: {}", format_clock(total))?;
    if is_overlapping(&log) {
        writeln!(writer, "Warning: intervals overlap; fix them with 'tl edit'.")?;
    }
    Ok(())
}
