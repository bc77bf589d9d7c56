//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{add::AddArgs, edit::EditArgs, invoice::InvoiceArgs};

/// Task time tracker.
///
/// Starts and stops clocks on tasks, keeps their time logs free of overlaps,
/// and projects logged time into invoice line items.
#[derive(Debug, Parser)]
#[command(name = "tl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a task.
    Add(AddArgs),

    /// Start a task's clock.
    Start {
        /// Task ID.
        task_id: String,
    },

    /// Stop a task's clock.
    Stop {
        /// Task ID.
        task_id: String,
    },

    /// Show every task with its running state and logged time.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show a task's time log.
    Log {
        /// Task ID.
        task_id: String,
    },

    /// Edit or append a time log entry.
    Edit(EditArgs),

    /// Project tasks into invoice line items.
    Invoice(InvoiceArgs),
}
