//! Running-state and overlap checks for time logs.

use thiserror::Error;

use crate::interval::TimeInterval;
use crate::types::EpochSeconds;

/// A time log contains intervals that overlap.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("interval starting at {start} overlaps the interval starting at {next_start}")]
pub struct OverlapError {
    /// Start of the earlier interval in start order.
    pub start: EpochSeconds,
    /// Start of the interval it runs into.
    pub next_start: EpochSeconds,
}

/// Returns true if any interval's clock is still running.
pub fn is_running(log: &[TimeInterval]) -> bool {
    log.iter().any(TimeInterval::is_open)
}

/// Returns true if any two intervals overlap.
pub fn is_overlapping(log: &[TimeInterval]) -> bool {
    first_overlap(log).is_some()
}

/// Rejects a log that must not be persisted.
pub fn validate_for_persist(log: &[TimeInterval]) -> Result<(), OverlapError> {
    match first_overlap(log) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Finds the first adjacent pair, in start order, where the earlier
/// interval runs past the later one's start.
///
/// The stop comparison is numeric, so a stored `0` never exceeds a start on
/// its own. An open interval with a later interval after it is still
/// flagged: its clock keeps running past that start.
fn first_overlap(log: &[TimeInterval]) -> Option<OverlapError> {
    let mut sorted: Vec<&TimeInterval> = log.iter().collect();
    // Stable: ties keep insertion order.
    sorted.sort_by_key(|interval| interval.start);

    sorted.windows(2).find_map(|pair| {
        let (cur, next) = (pair[0], pair[1]);
        let runs_past = cur.stop > next.start;
        let open_before_later = cur.is_open() && next.start > cur.start;
        (runs_past || open_before_later).then_some(OverlapError {
            start: cur.start,
            next_start: next.start,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(pairs: &[(EpochSeconds, EpochSeconds)]) -> Vec<TimeInterval> {
        pairs
            .iter()
            .map(|&(start, stop)| TimeInterval::new(start, stop))
            .collect()
    }

    #[test]
    fn running_detection() {
        assert!(is_running(&log(&[(10, 0)])));
        assert!(!is_running(&log(&[(10, 20)])));
        assert!(is_running(&log(&[(10, 0), (30, 40)])));
        assert!(!is_running(&[]));
    }

    #[test]
    fn shared_start_overlaps() {
        assert!(is_overlapping(&log(&[(0, 1), (0, 19)])));
    }

    #[test]
    fn trailing_open_interval_does_not_overlap() {
        assert!(!is_overlapping(&log(&[(0, 1), (19, 0)])));
    }

    #[test]
    fn open_interval_followed_by_later_interval_overlaps() {
        assert!(is_overlapping(&log(&[(0, 1), (19, 0), (20, 50)])));
    }

    #[test]
    fn detects_overlap_regardless_of_insertion_order() {
        assert!(is_overlapping(&log(&[(100, 200), (0, 150)])));
        assert!(!is_overlapping(&log(&[(100, 200), (0, 100)])));
    }

    #[test]
    fn touching_intervals_are_fine() {
        assert!(!is_overlapping(&log(&[(0, 10), (10, 20), (20, 30)])));
        assert!(!is_overlapping(&[]));
        assert!(!is_overlapping(&log(&[(5, 0)])));
    }

    #[test]
    fn validate_reports_offending_pair() {
        let entries = log(&[(50, 80), (0, 60)]);
        let err = validate_for_persist(&entries).unwrap_err();
        assert_eq!(
            err,
            OverlapError {
                start: 0,
                next_start: 50
            }
        );
        assert_eq!(entries, log(&[(50, 80), (0, 60)]));
        assert!(validate_for_persist(&log(&[(0, 10), (20, 30)])).is_ok());
    }
}
