//! Elapsed-time aggregation and formatting.
//!
//! All functions are pure. Anything that depends on the current time takes
//! `now` explicitly so callers can poll on every render tick.

use crate::interval::TimeInterval;
use crate::lifecycle::live_elapsed;
use crate::types::EpochSeconds;
use crate::validate::is_running;

const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;

/// Decimal places used for billed hour quantities.
pub const TASK_HOURS_PRECISION: u32 = 4;

/// Options for [`elapsed_seconds`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElapsedOptions {
    /// Count open intervals up to `now`.
    pub include_running: bool,
}

/// Sums elapsed seconds across a log.
///
/// Open intervals run until `now`. Intervals whose start is after their
/// stop (every open interval among them) are skipped unless
/// `include_running` is set.
pub fn elapsed_seconds(log: &[TimeInterval], options: ElapsedOptions, now: EpochSeconds) -> i64 {
    log.iter()
        .filter(|interval| options.include_running || interval.start <= interval.stop)
        .map(|interval| {
            let effective_stop = if interval.is_open() { now } else { interval.stop };
            effective_stop.saturating_sub(interval.start).max(0)
        })
        .fold(0, i64::saturating_add)
}

/// Formats seconds as `H:MM:SS`, collapsing to `Nh` from 24 hours upwards.
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / SECONDS_PER_HOUR;
    if hours >= 24 {
        return format!("{hours}h");
    }
    let minutes = (seconds % SECONDS_PER_HOUR) / 60;
    let secs = seconds % 60;
    format!("{hours}:{minutes:02}:{secs:02}")
}

/// Formats seconds as `HH:MM:SS` with every component zero-padded.
pub fn format_hms(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / SECONDS_PER_HOUR;
    let minutes = (seconds % SECONDS_PER_HOUR) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats seconds for display next to a total.
///
/// Anything longer than a day becomes a coarse phrase such as `"3 days"`;
/// shorter values use [`format_hms`].
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    reason = "coarse rounding of day counts"
)]
pub fn format_humanized(seconds: i64) -> String {
    if seconds <= SECONDS_PER_DAY {
        return format_hms(seconds);
    }

    let days = (seconds as f64 / SECONDS_PER_DAY as f64).round() as i64;
    if days < 26 {
        return plural(days, "a day", "days");
    }
    let months = (days as f64 / 30.4).round() as i64;
    if months < 11 {
        return plural(months, "a month", "months");
    }
    let years = (days as f64 / 365.0).round().max(1.0) as i64;
    plural(years, "a year", "years")
}

fn plural(count: i64, one: &str, many: &str) -> String {
    if count <= 1 {
        one.to_string()
    } else {
        format!("{count} {many}")
    }
}

/// Formats the length of the interval at `index` as `HH:MM:SS`.
///
/// The last interval of a running log shows its live elapsed time instead
/// of the stored stop. Returns `None` if `index` is out of range.
pub fn interval_difference(
    log: &[TimeInterval],
    index: usize,
    now: EpochSeconds,
) -> Option<String> {
    let interval = log.get(index)?;
    let seconds = if index + 1 == log.len() && is_running(log) {
        live_elapsed(log, now)
    } else {
        interval.stop.saturating_sub(interval.start)
    };
    Some(format_hms(seconds))
}

/// Billed hours for a log.
///
/// Measures from the first interval's start to the last interval's stop,
/// in insertion order. Gaps between intervals are included.
#[allow(clippy::cast_precision_loss, reason = "spans are far below 2^52 seconds")]
pub fn task_hours(log: &[TimeInterval], precision: u32) -> f64 {
    let (Some(first), Some(last)) = (log.first(), log.last()) else {
        return 0.0;
    };
    let span = last.stop.saturating_sub(first.start);
    round_to(span as f64 / SECONDS_PER_HOUR as f64, precision)
}

/// Rounds half away from zero to `decimals` places.
#[allow(clippy::cast_possible_wrap, reason = "decimals is a small constant")]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Renders an hour quantity with at most four decimals and no trailing zeros.
pub fn format_hours(hours: f64) -> String {
    let rounded = round_to(hours, TASK_HOURS_PRECISION);
    format!("{rounded}")
}
