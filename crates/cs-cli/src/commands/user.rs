//! User bookkeeping command.

use anyhow::Result;
use chrono::Utc;

use cs_db::Database;

/// Creates or updates a user by email and prints the user id.
pub fn run(db: &mut Database, email: &str, first: Option<&str>, last: Option<&str>) -> Result<()> {
    let user_id = db.upsert_user(first, last, email, Utc::now())?;
    println!("{user_id}");
    Ok(())
}
