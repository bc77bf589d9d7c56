use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tl_cli::commands::{add, clock, edit, invoice, log, status};
use tl_cli::{Cli, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(tl_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = tl_db::Database::open(&config.database_path).with_context(|| {
        format!("failed to open {}", config.database_path.display())
    })?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut db, config) = open_database(cli.config.as_deref())?;
    let now = Utc::now().timestamp();
    let mut stdout = io::stdout().lock();

    match command {
        Commands::Add(args) => {
            add::run(&mut stdout, args, &mut db)?;
        }
        Commands::Start { task_id } => clock::start(&mut stdout, task_id, &mut db, now)?,
        Commands::Stop { task_id } => clock::stop(&mut stdout, task_id, &mut db, now)?,
        Commands::Status { json } => status::run(&mut stdout, &mut db, *json, now)?,
        Commands::Log { task_id } => log::run(&mut stdout, task_id, &mut db, now)?,
        Commands::Edit(args) => edit::run(&mut stdout, args, &mut db, now)?,
        Commands::Invoice(args) => invoice::run(&mut stdout, args, &mut db, &config.invoice)?,
    }

    Ok(())
}
