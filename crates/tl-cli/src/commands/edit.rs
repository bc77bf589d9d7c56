//! Edit command for manual changes to a task's time log.

use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Args};

use tl_core::{EpochSeconds, TaskLifecycle, TimeInterval, codec};
use tl_db::Database;

use super::util::{load_task, parse_epoch};

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("target").required(true).args(["index", "append"])))]
pub struct EditArgs {
    /// Task ID.
    pub task_id: String,

    /// Row to edit, as numbered by `tl log`.
    #[arg(long)]
    pub index: Option<usize>,

    /// Append a new row instead of editing one.
    #[arg(long)]
    pub append: bool,

    /// New start time (epoch seconds, ISO 8601 or "2 hours ago").
    #[arg(long)]
    pub start: Option<String>,

    /// New stop time; "0" reopens the interval.
    #[arg(long)]
    pub stop: Option<String>,

    /// New description.
    #[arg(long)]
    pub description: Option<String>,

    /// Whether the row is billable.
    #[arg(long)]
    pub billable: Option<bool>,
}

pub fn run<W: Write>(
    writer: &mut W,
    args: &EditArgs,
    db: &mut Database,
    now: EpochSeconds,
) -> Result<()> {
    let task = load_task(db, &args.task_id)?;
    let mut rows = codec::decode_for_editing(&task.time_log)?;

    let index = if args.append {
        rows = codec::strip_untouched_sentinel(rows);
        rows.push(codec::editing_sentinel());
        rows.len() - 1
    } else {
        let index = args.index.unwrap_or_default();
        if index >= rows.len() {
            bail!("row {index} does not exist; the log has {} rows", rows.len());
        }
        index
    };

    apply(&mut rows[index], args, now)?;
    let row = rows[index].clone();

    TaskLifecycle::new(db)
        .save_log(&task, rows)
        .with_context(|| format!("failed to save time log for task {}", task.id))?;

    writeln!(
        writer,
        "Saved row {index} of {}: {} -> {}",
        task.id, row.start, row.stop
    )?;
    Ok(())
}

fn apply(row: &mut TimeInterval, args: &EditArgs, now: EpochSeconds) -> Result<()> {
    if let Some(start) = &args.start {
        row.start = parse_epoch(start, now).context("invalid --start")?;
    }
    if let Some(stop) = &args.stop {
        row.stop = parse_epoch(stop, now).context("invalid --stop")?;
    }
    if let Some(description) = &args.description {
        row.set_description(description.as_str());
    }
    if let Some(billable) = args.billable {
        row.set_billable(billable);
    }
    if row.stop != 0 && row.stop < row.start {
        bail!("stop ({}) is before start ({})", row.stop, row.start);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tl_core::{LifecycleError, TaskRepository};
    use tl_db::NewTask;

    const NOW: EpochSeconds = 1_736_154_000;

    fn seed(db: &mut Database, log: &[TimeInterval]) -> String {
        let task = db
            .create_task(NewTask {
                description: "Write tests".to_string(),
                rate: 40.0,
                ..NewTask::default()
            })
            .unwrap();
        db.save(&task.with_time_log(log)).unwrap();
        task.id.to_string()
    }

    fn args(task_id: &str) -> EditArgs {
        EditArgs {
            task_id: task_id.to_string(),
            index: None,
            append: false,
            start: None,
            stop: None,
            description: None,
            billable: None,
        }
    }

    #[test]
    fn append_to_empty_log_replaces_placeholder() {
        let mut db = Database::open_in_memory().unwrap();
        let id = seed(&mut db, &[]);
        let edit = EditArgs {
            append: true,
            start: Some("2 hours ago".to_string()),
            stop: Some("1 hour ago".to_string()),
            ..args(&id)
        };

        run(&mut Vec::new(), &edit, &mut db, NOW).unwrap();

        let task = load_task(&mut db, &id).unwrap();
        assert_eq!(
            task.time_log().unwrap(),
            vec![TimeInterval::extended(NOW - 7_200, NOW - 3_600, "", true)]
        );
    }

    #[test]
    fn editing_placeholder_row_writes_it() {
        let mut db = Database::open_in_memory().unwrap();
        let id = seed(&mut db, &[]);
        let edit = EditArgs {
            index: Some(0),
            start: Some("100".to_string()),
            stop: Some("200".to_string()),
            description: Some("setup".to_string()),
            ..args(&id)
        };

        run(&mut Vec::new(), &edit, &mut db, NOW).unwrap();

        let task = load_task(&mut db, &id).unwrap();
        assert_eq!(task.time_log, r#"[[100,200,"setup",true]]"#);
    }

    #[test]
    fn edit_keeps_legacy_rows_compact() {
        let mut db = Database::open_in_memory().unwrap();
        let id = seed(&mut db, &[TimeInterval::new(10, 20), TimeInterval::new(30, 40)]);
        let edit = EditArgs {
            index: Some(1),
            stop: Some("50".to_string()),
            ..args(&id)
        };

        run(&mut Vec::new(), &edit, &mut db, NOW).unwrap();

        let task = load_task(&mut db, &id).unwrap();
        assert_eq!(task.time_log, "[[10,20],[30,50]]");
    }

    #[test]
    fn billable_flag_on_legacy_row_survives_reload() {
        let mut db = Database::open_in_memory().unwrap();
        let id = seed(&mut db, &[TimeInterval::new(10, 20)]);
        let edit = EditArgs {
            index: Some(0),
            billable: Some(false),
            ..args(&id)
        };

        run(&mut Vec::new(), &edit, &mut db, NOW).unwrap();

        let task = load_task(&mut db, &id).unwrap();
        assert_eq!(task.time_log, r#"[[10,20,"",false]]"#);
        assert_eq!(
            task.time_log().unwrap(),
            vec![TimeInterval::extended(10, 20, "", false)]
        );
    }

    #[test]
    fn overlapping_edit_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let id = seed(&mut db, &[TimeInterval::new(10, 20), TimeInterval::new(30, 40)]);
        let edit = EditArgs {
            index: Some(0),
            stop: Some("35".to_string()),
            ..args(&id)
        };

        let err = run(&mut Vec::new(), &edit, &mut db, NOW).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LifecycleError>(),
            Some(LifecycleError::Overlap(_))
        ));
        let task = load_task(&mut db, &id).unwrap();
        assert_eq!(task.time_log, "[[10,20],[30,40]]");
    }

    #[test]
    fn out_of_range_row_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let id = seed(&mut db, &[TimeInterval::new(10, 20)]);
        let edit = EditArgs {
            index: Some(3),
            ..args(&id)
        };

        let err = run(&mut Vec::new(), &edit, &mut db, NOW).unwrap_err();
        assert!(err.to_string().contains("row 3 does not exist"));
    }

    #[test]
    fn stop_before_start_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let id = seed(&mut db, &[TimeInterval::new(10, 20)]);
        let edit = EditArgs {
            index: Some(0),
            stop: Some("5".to_string()),
            ..args(&id)
        };

        let err = run(&mut Vec::new(), &edit, &mut db, NOW).unwrap_err();
        assert!(err.to_string().contains("before start"));
    }
}
