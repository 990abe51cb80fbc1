//! Connection analytics CLI library.
//!
//! This crate provides the CLI interface for the connection analytics
//! engine.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, IngestEvent, ProjectAction, UserAction};
pub use config::Config;
