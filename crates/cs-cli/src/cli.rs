//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Connection analytics for the document workspace.
///
/// Turns the raw login/logout ledger into bucketed connection counts,
/// paired session durations, and a combined statistics report.
#[derive(Debug, Parser)]
#[command(name = "cs", version, about, long_about = None)]
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
    /// Show the combined connection statistics report.
    Stats {
        /// Bucket granularity: day, week, month, or year.
        ///
        /// Unrecognized values fall back to day.
        #[arg(long, default_value = "day")]
        range: String,

        /// Output the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Record a connection event.
    Ingest {
        #[command(subcommand)]
        event: IngestEvent,
    },

    /// Manage users.
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Import events as JSONL from stdin.
    Import,

    /// Export events as JSONL to stdout.
    Export {
        /// Maximum number of events to export.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show database status.
    Status,
}

/// Connection events that can be ingested.
#[derive(Debug, Subcommand)]
pub enum IngestEvent {
    /// Record a login event.
    Login {
        /// The user the event belongs to.
        #[arg(long)]
        user: i64,

        /// Event time (RFC 3339); defaults to now.
        #[arg(long)]
        at: Option<String>,
    },

    /// Record a logout event.
    Logout {
        /// The user the event belongs to.
        #[arg(long)]
        user: i64,

        /// Event time (RFC 3339); defaults to now.
        #[arg(long)]
        at: Option<String>,
    },
}

/// User bookkeeping actions.
#[derive(Debug, Subcommand)]
pub enum UserAction {
    /// Create or update a user by email; prints the user id.
    Add {
        #[arg(long)]
        email: String,

        #[arg(long)]
        first: Option<String>,

        #[arg(long)]
        last: Option<String>,
    },
}

/// Project bookkeeping actions.
#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    /// Register a project for a user.
    Add {
        /// Owning user id.
        #[arg(long)]
        user: i64,

        /// Project name.
        name: String,
    },
}
