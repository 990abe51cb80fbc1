use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cs_cli::commands::{export, import, ingest, project, stats, status, user};
use cs_cli::{Cli, Commands, Config, IngestEvent, ProjectAction, UserAction};
use cs_core::EventKind;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(cs_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = cs_db::Database::open(&config.database_path).context("failed to open database")?;
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
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Stats { range, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            stats::run(&db, range, *json)?;
        }
        Some(Commands::Ingest { event }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match event {
                IngestEvent::Login { user, at } => {
                    ingest::run(&mut db, EventKind::Login, *user, at.as_deref())?;
                }
                IngestEvent::Logout { user, at } => {
                    ingest::run(&mut db, EventKind::Logout, *user, at.as_deref())?;
                }
            }
        }
        Some(Commands::User { action }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                UserAction::Add { email, first, last } => {
                    user::run(&mut db, email, first.as_deref(), last.as_deref())?;
                }
            }
        }
        Some(Commands::Project { action }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                ProjectAction::Add { user, name } => {
                    project::run(&mut db, *user, name)?;
                }
            }
        }
        Some(Commands::Import) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            import::run(&mut db)?;
        }
        Some(Commands::Export { limit }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            export::run(&db, *limit)?;
        }
        Some(Commands::Status) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            status::run(&mut std::io::stdout(), &db, &config.database_path)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
