//! Stored time-log encoding.
//!
//! A task's log is stored as a single text field holding a JSON array of
//! arrays. Each inner array is positional:
//!
//! ```text
//! [start, stop]                          legacy form
//! [start, stop, description, billable]   extended form
//! ```
//!
//! A log may mix both forms. Positional handling never leaves this module;
//! everything else works with [`TimeInterval`].

use serde_json::Value;
use thiserror::Error;

use crate::interval::TimeInterval;
use crate::types::EpochSeconds;

/// Errors decoding a stored time log.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The text is not valid JSON.
    #[error("time log is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    /// The top-level value is not an array.
    #[error("time log must be an array of intervals")]
    NotAnArray,
    /// One entry could not be interpreted as an interval.
    #[error("invalid time log entry {index}: {reason}")]
    Entry { index: usize, reason: String },
}

impl DecodeError {
    fn entry(index: usize, reason: impl Into<String>) -> Self {
        Self::Entry {
            index,
            reason: reason.into(),
        }
    }
}

/// Decodes a stored time log into intervals.
///
/// Empty input and `[]` both yield an empty log.
pub fn decode(raw: &str) -> Result<Vec<TimeInterval>, DecodeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(entries) = value else {
        return Err(DecodeError::NotAnArray);
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| decode_entry(index, entry))
        .collect()
}

/// Decodes a stored time log for an edit surface.
///
/// Same as [`decode`], but an empty log yields a single placeholder row so
/// the editor always has something to show. Use
/// [`strip_untouched_sentinel`] before saving the edited rows.
pub fn decode_for_editing(raw: &str) -> Result<Vec<TimeInterval>, DecodeError> {
    let intervals = decode(raw)?;
    if intervals.is_empty() {
        return Ok(vec![editing_sentinel()]);
    }
    Ok(intervals)
}

/// The placeholder row shown for an empty log.
pub fn editing_sentinel() -> TimeInterval {
    TimeInterval::extended(0, 0, "", true)
}

/// Drops the placeholder row if it comes back from the editor unchanged.
pub fn strip_untouched_sentinel(mut intervals: Vec<TimeInterval>) -> Vec<TimeInterval> {
    if intervals.len() == 1 && intervals[0] == editing_sentinel() {
        intervals.clear();
    }
    intervals
}

/// Encodes intervals into the stored form.
///
/// Each interval is written with exactly the fields it carries; legacy
/// intervals stay two elements long.
pub fn encode(intervals: &[TimeInterval]) -> String {
    let entries: Vec<Value> = intervals.iter().map(encode_entry).collect();
    Value::Array(entries).to_string()
}

fn encode_entry(interval: &TimeInterval) -> Value {
    let mut fields = vec![Value::from(interval.start), Value::from(interval.stop)];
    if let Some(description) = interval.stored_description() {
        fields.push(Value::from(description));
    }
    if let Some(billable) = interval.billable_flag() {
        fields.push(Value::from(billable));
    }
    Value::Array(fields)
}

fn decode_entry(index: usize, entry: &Value) -> Result<TimeInterval, DecodeError> {
    let Value::Array(fields) = entry else {
        return Err(DecodeError::entry(index, "expected an array"));
    };
    if !(2..=4).contains(&fields.len()) {
        return Err(DecodeError::entry(
            index,
            format!("expected 2 to 4 fields, got {}", fields.len()),
        ));
    }

    let start = decode_timestamp(index, "start", &fields[0])?;
    let stop = decode_timestamp(index, "stop", &fields[1])?;
    let description = match fields.get(2) {
        None => return Ok(TimeInterval::new(start, stop)),
        Some(Value::String(text)) => text.as_str(),
        Some(_) => return Err(DecodeError::entry(index, "description must be a string")),
    };
    match fields.get(3) {
        None => Ok(TimeInterval::described(start, stop, description)),
        Some(Value::Bool(flag)) => Ok(TimeInterval::extended(start, stop, description, *flag)),
        Some(_) => Err(DecodeError::entry(index, "billable must be a boolean")),
    }
}

fn decode_timestamp(
    index: usize,
    field: &str,
    value: &Value,
) -> Result<EpochSeconds, DecodeError> {
    let seconds = value
        .as_i64()
        .ok_or_else(|| DecodeError::entry(index, format!("{field} must be an integer")))?;
    if seconds < 0 {
        return Err(DecodeError::entry(index, format!("{field} must not be negative")));
    }
    Ok(seconds)
}
