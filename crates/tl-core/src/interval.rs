//! Logged time intervals.

use serde::Serialize;

use crate::types::EpochSeconds;

/// One start/stop pair in a task's time log.
///
/// The optional fields remember which stored form the interval came from:
/// legacy entries carry neither, described entries carry only a note and
/// extended entries carry both. A billable flag never exists without a
/// description, so every interval has exactly one stored form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeInterval {
    /// When the clock was started.
    pub start: EpochSeconds,
    /// When the clock was stopped, or `0` while it is still running.
    pub stop: EpochSeconds,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    billable: Option<bool>,
}

impl TimeInterval {
    /// Creates a legacy two-field interval.
    pub const fn new(start: EpochSeconds, stop: EpochSeconds) -> Self {
        Self {
            start,
            stop,
            description: None,
            billable: None,
        }
    }

    /// Creates an interval carrying a description but no billable flag.
    pub fn described(
        start: EpochSeconds,
        stop: EpochSeconds,
        description: impl Into<String>,
    ) -> Self {
        Self {
            start,
            stop,
            description: Some(description.into()),
            billable: None,
        }
    }

    /// Creates an extended interval carrying a description and billable flag.
    pub fn extended(
        start: EpochSeconds,
        stop: EpochSeconds,
        description: impl Into<String>,
        billable: bool,
    ) -> Self {
        Self {
            start,
            stop,
            description: Some(description.into()),
            billable: Some(billable),
        }
    }

    /// Creates an open interval whose clock is running.
    pub const fn open(start: EpochSeconds) -> Self {
        Self::new(start, 0)
    }

    /// Returns true while the interval's clock has not been stopped.
    pub const fn is_open(&self) -> bool {
        self.stop == 0
    }

    /// Returns the billable flag, treating an absent flag as billable.
    pub fn is_billable(&self) -> bool {
        self.billable.unwrap_or(true)
    }

    /// Returns the stored billable flag, if any.
    pub const fn billable_flag(&self) -> Option<bool> {
        self.billable
    }

    /// Returns the description, or an empty string when absent.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    /// Returns the stored description, if any.
    pub fn stored_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Sets the billable flag, promoting the interval to the extended form.
    pub fn set_billable(&mut self, billable: bool) {
        self.description.get_or_insert_with(String::new);
        self.billable = Some(billable);
    }
}
