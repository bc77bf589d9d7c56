//! Invoice command for projecting tasks into invoice line items.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Result, bail};
use clap::Args;

use tl_core::{InvoiceLineItem, InvoiceOptions, format_hours, project_many};
use tl_db::Database;

use super::util::load_task;

#[derive(Debug, Args)]
pub struct InvoiceArgs {
    /// Tasks to bill, in line item order.
    #[arg(required = true)]
    pub task_ids: Vec<String>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(
    writer: &mut W,
    args: &InvoiceArgs,
    db: &mut Database,
    options: &InvoiceOptions,
) -> Result<()> {
    let tasks = args
        .task_ids
        .iter()
        .map(|id| load_task(db, id))
        .collect::<Result<Vec<_>>>()?;
    if let Some(billed) = tasks.iter().find(|task| task.is_invoiced()) {
        tracing::warn!(task_id = %billed.id, "task is already on an invoice");
    }

    let items = project_many(&tasks, options)?;
    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&items)?)?;
        return Ok(());
    }

    if items.is_empty() {
        bail!("no line items to show");
    }
    write!(writer, "{}", format_items(&items))?;
    Ok(())
}

/// Formats line items for human-readable output.
pub fn format_items(items: &[InvoiceLineItem]) -> String {
    let mut output = String::new();

    for item in items {
        writeln!(
            output,
            "{}  {} h x {:.2} = {:.2}",
            item.task_id,
            format_hours(item.quantity),
            item.cost,
            item.line_total
        )
        .unwrap();
        for line in item.notes.lines() {
            writeln!(output, "    {line}").unwrap();
        }
    }

    let total: f64 = items.iter().map(|item| item.line_total).sum();
    writeln!(output, "Total: {total:.2}").unwrap();
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use tl_core::{ClientId, InvoiceError, TaskRepository, TimeInterval};
    use tl_db::NewTask;

    // 2025-01-06T09:00:00Z
    const MONDAY_9AM: i64 = 1_736_154_000;

    fn seed(db: &mut Database, description: &str, client: &str, log: &[TimeInterval]) -> String {
        let task = db
            .create_task(NewTask {
                description: description.to_string(),
                rate: 80.0,
                client_id: Some(ClientId::new(client).unwrap()),
                ..NewTask::default()
            })
            .unwrap();
        db.save(&task.with_time_log(log)).unwrap();
        task.id.to_string()
    }

    #[test]
    fn invoice_prints_line_items_and_total() {
        let mut db = Database::open_in_memory().unwrap();
        let first = seed(
            &mut db,
            "Design",
            "acme",
            &[TimeInterval::extended(MONDAY_9AM, MONDAY_9AM + 5_400, "wireframes", true)],
        );
        let second = seed(
            &mut db,
            "Build",
            "acme",
            &[
                TimeInterval::new(MONDAY_9AM + 7_200, MONDAY_9AM + 9_000),
                TimeInterval::new(MONDAY_9AM + 10_800, MONDAY_9AM + 14_400),
            ],
        );
        let args = InvoiceArgs {
            task_ids: vec![first.clone(), second.clone()],
            json: false,
        };

        let mut output = Vec::new();
        run(&mut output, &args, &mut db, &InvoiceOptions::default()).unwrap();

        let output = String::from_utf8(output)
            .unwrap()
            .replace(&first, "TASK-1")
            .replace(&second, "TASK-2");
        assert_snapshot!(output, @r"
        TASK-1  1.5 h x 80.00 = 120.00
            Design
            2025-01-06 • 09:00:00 - 10:30:00 • wireframes
        TASK-2  2 h x 80.00 = 160.00
            Build
            2025-01-06 • 11:00:00 - 11:30:00
            2025-01-06 • 12:00:00 - 13:00:00
        Total: 280.00
        ");
    }

    #[test]
    fn invoice_rejects_tasks_from_two_clients() {
        let mut db = Database::open_in_memory().unwrap();
        let first = seed(&mut db, "Design", "acme", &[TimeInterval::new(0, 3_600)]);
        let second = seed(&mut db, "Build", "globex", &[TimeInterval::new(0, 3_600)]);
        let args = InvoiceArgs {
            task_ids: vec![first, second],
            json: true,
        };

        let mut output = Vec::new();
        let err = run(&mut output, &args, &mut db, &InvoiceOptions::default()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<InvoiceError>(),
            Some(InvoiceError::MixedClient { .. })
        ));
        assert!(output.is_empty());
    }

    #[test]
    fn invoice_json_output() {
        let mut db = Database::open_in_memory().unwrap();
        let id = seed(&mut db, "Design", "acme", &[TimeInterval::new(0, 1_800)]);
        let args = InvoiceArgs {
            task_ids: vec![id.clone()],
            json: true,
        };

        let mut output = Vec::new();
        run(&mut output, &args, &mut db, &InvoiceOptions::default()).unwrap();

        let items: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(items[0]["task_id"], id.as_str());
        assert_eq!(items[0]["quantity"], 0.5);
        assert_eq!(items[0]["line_total"], 40.0);
    }

    #[test]
    fn unknown_task_fails() {
        let mut db = Database::open_in_memory().unwrap();
        let args = InvoiceArgs {
            task_ids: vec!["missing".to_string()],
            json: false,
        };
        let err = run(&mut Vec::new(), &args, &mut db, &InvoiceOptions::default()).unwrap_err();
        assert!(err.to_string().contains("failed to load task missing"));
        assert!(db.list_tasks().unwrap().is_empty());
    }
}
