//! Projects task time logs into invoice line items.

use std::collections::BTreeSet;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::DecodeError;
use crate::duration::{TASK_HOURS_PRECISION, format_hours, round_to, task_hours};
use crate::interval::TimeInterval;
use crate::task::Task;
use crate::types::{ClientId, EpochSeconds, TaskId};

const FRAGMENT_SEPARATOR: &str = " • ";

/// Errors building invoice line items.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Tasks for one invoice must all belong to the same client.
    #[error("tasks belong to different clients: {}", format_clients(.clients))]
    MixedClient { clients: Vec<ClientId> },
    /// A task's stored log could not be decoded.
    #[error("task {task_id} has an invalid time log")]
    Decode {
        task_id: TaskId,
        #[source]
        source: DecodeError,
    },
}

fn format_clients(clients: &[ClientId]) -> String {
    clients
        .iter()
        .map(ClientId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Controls which details appear in a line item's notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceOptions {
    /// Start the notes with the project name.
    pub project_header: bool,
    /// Include each interval's date.
    pub dates: bool,
    /// Include each interval's start and end time.
    pub times: bool,
    /// Include each interval's elapsed hours.
    pub hours: bool,
    /// Include each interval's description.
    pub descriptions: bool,
    /// Bill every interval, ignoring per-interval billable flags.
    pub bill_without_distinction: bool,
}

impl Default for InvoiceOptions {
    fn default() -> Self {
        Self {
            project_header: false,
            dates: true,
            times: true,
            hours: false,
            descriptions: true,
            bill_without_distinction: false,
        }
    }
}

/// One invoice line derived from a task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceLineItem {
    pub task_id: TaskId,
    /// Billed hours.
    pub quantity: f64,
    /// Hourly rate.
    pub cost: f64,
    pub line_total: f64,
    pub notes: String,
}

/// Builds the line item for a single task.
pub fn build_line_item(
    task: &Task,
    options: &InvoiceOptions,
) -> Result<InvoiceLineItem, InvoiceError> {
    let log = task.time_log().map_err(|source| InvoiceError::Decode {
        task_id: task.id.clone(),
        source,
    })?;

    let quantity = task_hours(&log, TASK_HOURS_PRECISION);
    let cost = task.rate;
    Ok(InvoiceLineItem {
        task_id: task.id.clone(),
        quantity,
        cost,
        line_total: round_to(cost * quantity, 2),
        notes: build_notes(task, &log, options),
    })
}

/// Builds one line item per task, in input order.
///
/// Fails before building anything if the tasks span several clients.
pub fn project_many(
    tasks: &[Task],
    options: &InvoiceOptions,
) -> Result<Vec<InvoiceLineItem>, InvoiceError> {
    let clients: BTreeSet<&ClientId> = tasks
        .iter()
        .filter_map(|task| task.client_id.as_ref())
        .collect();
    if clients.len() > 1 {
        return Err(InvoiceError::MixedClient {
            clients: clients.into_iter().cloned().collect(),
        });
    }

    let items = tasks
        .iter()
        .map(|task| build_line_item(task, options))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(items = items.len(), "projected tasks into line items");
    Ok(items)
}

fn build_notes(task: &Task, log: &[TimeInterval], options: &InvoiceOptions) -> String {
    let mut lines = Vec::new();

    if let Some(project) = task.project.as_ref().filter(|_| options.project_header) {
        lines.push(format!("## {}", project.name));
    }
    if !task.description.is_empty() {
        lines.push(task.description.clone());
    }

    lines.extend(
        log.iter()
            .filter(|interval| !interval.is_open())
            .filter(|interval| options.bill_without_distinction || interval.is_billable())
            .map(|interval| interval_fragment(interval, options))
            .filter(|fragment| !fragment.is_empty()),
    );

    lines.join("\n")
}

#[allow(clippy::cast_precision_loss, reason = "interval lengths are far below 2^52 seconds")]
fn interval_fragment(interval: &TimeInterval, options: &InvoiceOptions) -> String {
    let mut parts = Vec::new();

    if options.dates {
        parts.push(format_timestamp(interval.start, "%Y-%m-%d"));
    }
    if options.times {
        parts.push(format!(
            "{} - {}",
            format_timestamp(interval.start, "%H:%M:%S"),
            format_timestamp(interval.stop, "%H:%M:%S")
        ));
    }
    if options.hours {
        let hours = (interval.stop - interval.start).max(0) as f64 / 3_600.0;
        parts.push(format!("{} hours", format_hours(hours)));
    }
    if options.descriptions && !interval.description().is_empty() {
        parts.push(interval.description().to_string());
    }

    parts.join(FRAGMENT_SEPARATOR)
}

/// Formats epoch seconds in UTC; out-of-range values fall back to the raw number.
fn format_timestamp(seconds: EpochSeconds, pattern: &str) -> String {
    DateTime::from_timestamp(seconds, 0)
        .map_or_else(|| seconds.to_string(), |dt| dt.format(pattern).to_string())
}
