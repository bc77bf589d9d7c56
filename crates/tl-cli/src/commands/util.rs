//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use tl_core::{EpochSeconds, Task, TaskId, TaskRepository};
use tl_db::Database;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").unwrap());

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Parse a timestamp given on the command line into epoch seconds.
///
/// Supports:
/// - Epoch seconds: "1736154000"
/// - ISO 8601: "2025-01-06T09:00:00Z"
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
///
/// Times before the Unix epoch are rejected.
pub fn parse_epoch(s: &str, now: EpochSeconds) -> Result<EpochSeconds> {
    let seconds = parse_any_epoch(s.trim(), now)?;
    if seconds < 0 {
        anyhow::bail!("Invalid time: {s} is before 1970-01-01");
    }
    Ok(seconds)
}

fn parse_any_epoch(s: &str, now: EpochSeconds) -> Result<EpochSeconds> {
    if let Ok(seconds) = s.parse::<EpochSeconds>() {
        return Ok(seconds);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp());
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid time: {s}. Use epoch seconds, ISO 8601 (e.g., 2025-01-06T09:00:00Z) or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok(now - Duration::minutes(n * minutes_per_unit).num_seconds())
}

/// Formats epoch seconds as a UTC date and time; `0` renders as `-`.
pub fn format_epoch(seconds: EpochSeconds) -> String {
    if seconds == 0 {
        return "-".to_string();
    }
    DateTime::<Utc>::from_timestamp(seconds, 0).map_or_else(
        || seconds.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Loads a task by the ID given on the command line.
pub fn load_task(db: &mut Database, task_id: &str) -> Result<Task> {
    let id = TaskId::new(task_id).context("task ID cannot be empty")?;
    db.get(&id).with_context(|| format!("failed to load task {task_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: EpochSeconds = 1_736_154_000;

    #[test]
    fn parses_epoch_seconds() {
        assert_eq!(parse_epoch("1736150400", NOW).unwrap(), 1_736_150_400);
    }

    #[test]
    fn parses_rfc3339() {
        assert_eq!(
            parse_epoch("2025-01-06T09:00:00Z", 0).unwrap(),
            1_736_154_000
        );
    }

    #[test]
    fn parses_relative_times() {
        assert_eq!(parse_epoch("2 hours ago", NOW).unwrap(), NOW - 7_200);
        assert_eq!(parse_epoch("1 day ago", NOW).unwrap(), NOW - 86_400);
        assert_eq!(parse_epoch("30 minutes ago", NOW).unwrap(), NOW - 1_800);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_epoch("yesterday-ish", NOW).is_err());
        assert!(parse_epoch("99999999999999 weeks ago", NOW).is_err());
    }

    #[test]
    fn rejects_times_before_epoch() {
        assert!(parse_epoch("-9223372036854775808", NOW).is_err());
        assert!(parse_epoch("1969-12-31T23:59:59Z", NOW).is_err());
        assert!(parse_epoch("900 weeks ago", 1_000).is_err());
        assert_eq!(parse_epoch("0", NOW).unwrap(), 0);
    }

    #[test]
    fn formats_epoch_in_utc() {
        assert_eq!(format_epoch(NOW), "2025-01-06 09:00:00");
        assert_eq!(format_epoch(0), "-");
    }
}
