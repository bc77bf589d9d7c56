//! Start and stop commands for a task's clock.

use std::io::Write;

use anyhow::{Context, Result};

use tl_core::{EpochSeconds, TaskLifecycle, format_clock, latest_open};
use tl_db::Database;

use super::util::{format_epoch, load_task};

/// Starts the clock on a task.
pub fn start<W: Write>(
    writer: &mut W,
    task_id: &str,
    db: &mut Database,
    now: EpochSeconds,
) -> Result<()> {
    let task = load_task(db, task_id)?;
    TaskLifecycle::new(db)
        .start_at(&task, now)
        .with_context(|| format!("failed to start task {task_id}"))?;

    writeln!(writer, "Started {} at {}", task.id, format_epoch(now))?;
    Ok(())
}

/// Stops the clock on a task and reports the closed interval.
pub fn stop<W: Write>(
    writer: &mut W,
    task_id: &str,
    db: &mut Database,
    now: EpochSeconds,
) -> Result<()> {
    let task = load_task(db, task_id)?;
    let closing = latest_open(&task.time_log()?);
    let stopped = TaskLifecycle::new(db)
        .stop_at(&task, now)
        .with_context(|| format!("failed to stop task {task_id}"))?;

    let log = stopped.time_log()?;
    let closed = closing
        .and_then(|index| log.get(index))
        .map_or(0, |interval| interval.stop.saturating_sub(interval.start));
    writeln!(
        writer,
        "Stopped {} after {}",
        stopped.id,
        format_clock(closed)
    )?;
    Ok(())
}
