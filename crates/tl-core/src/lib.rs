//! Core time-log engine.
//!
//! This crate contains the fundamental types and logic for:
//! - Codec: the stored array-of-arrays time log encoding
//! - Validation: running state and interval overlap detection
//! - Duration: elapsed totals, clock formats and billed hours
//! - Lifecycle: starting and stopping a task's clock through a repository
//! - Invoice: projecting tasks into invoice line items

pub mod codec;
pub mod duration;
pub mod interval;
pub mod invoice;
pub mod lifecycle;
pub mod repository;
pub mod task;
pub mod types;
pub mod validate;

pub use codec::DecodeError;
pub use duration::{
    ElapsedOptions, TASK_HOURS_PRECISION, elapsed_seconds, format_clock, format_hms, format_hours,
    format_humanized, interval_difference, task_hours,
};
pub use interval::TimeInterval;
pub use invoice::{InvoiceError, InvoiceLineItem, InvoiceOptions, build_line_item, project_many};
pub use lifecycle::{ClockState, LifecycleError, TaskLifecycle, latest_open, live_elapsed};
pub use repository::{CacheKey, RepositoryError, TaskRepository};
pub use task::{ProjectRef, Task};
pub use types::{ClientId, EpochSeconds, ProjectId, TaskId, ValidationError};
pub use validate::{OverlapError, is_overlapping, is_running, validate_for_persist};
