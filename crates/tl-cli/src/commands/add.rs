//! Add command for creating tasks.

use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::Args;

use tl_core::{ClientId, ProjectId, ProjectRef, Task};
use tl_db::{Database, NewTask};

#[derive(Debug, Args)]
pub struct AddArgs {
    /// What the task is about.
    #[arg(short, long)]
    pub description: String,

    /// Hourly rate billed for this task.
    #[arg(short, long, default_value_t = 0.0)]
    pub rate: f64,

    /// Client the task is billed to.
    #[arg(long)]
    pub client: Option<String>,

    /// Project ID the task belongs to.
    #[arg(long, requires = "project_name")]
    pub project: Option<String>,

    /// Display name of the project.
    #[arg(long, requires = "project")]
    pub project_name: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &AddArgs, db: &mut Database) -> Result<Task> {
    if !args.rate.is_finite() || args.rate < 0.0 {
        bail!("rate must be a non-negative number");
    }

    let client_id = args
        .client
        .as_deref()
        .map(ClientId::new)
        .transpose()
        .context("invalid --client")?;
    let project = match (&args.project, &args.project_name) {
        (Some(id), Some(name)) => Some(ProjectRef {
            id: ProjectId::new(id.as_str()).context("invalid --project")?,
            name: name.clone(),
        }),
        _ => None,
    };

    let task = db.create_task(NewTask {
        description: args.description.trim().to_string(),
        rate: args.rate,
        client_id,
        project,
        ..NewTask::default()
    })?;
    writeln!(writer, "{}", task.id)?;
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tl_core::TaskRepository;

    #[test]
    fn add_prints_new_task_id() {
        let mut db = Database::open_in_memory().unwrap();
        let args = AddArgs {
            description: "  Migrate billing  ".to_string(),
            rate: 75.0,
            client: Some("acme".to_string()),
            project: Some("p-1".to_string()),
            project_name: Some("Billing".to_string()),
        };
        let mut output = Vec::new();

        let task = run(&mut output, &args, &mut db).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), format!("{}\n", task.id));
        let stored = db.get(&task.id).unwrap();
        assert_eq!(stored.description, "Migrate billing");
        assert_eq!(stored.client_id.unwrap().as_str(), "acme");
        assert_eq!(stored.project.unwrap().name, "Billing");
    }

    #[test]
    fn add_rejects_negative_rate() {
        let mut db = Database::open_in_memory().unwrap();
        let args = AddArgs {
            description: "Oops".to_string(),
            rate: -1.0,
            client: None,
            project: None,
            project_name: None,
        };
        let err = run(&mut Vec::new(), &args, &mut db).unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }
}
