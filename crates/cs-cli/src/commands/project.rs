//! Project bookkeeping command.

use anyhow::Result;
use chrono::Utc;

use cs_db::Database;

/// Registers a project for a user. Re-adding an existing project is a
/// no-op.
pub fn run(db: &mut Database, user: i64, name: &str) -> Result<()> {
    let created = db.add_project(user, name, Utc::now())?;
    if created {
        tracing::debug!(user, name, "project added");
    } else {
        tracing::debug!(user, name, "project already present");
    }
    Ok(())
}
