//! Status command for showing ledger health.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use cs_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, db_path: &Path) -> Result<()> {
    writeln!(writer, "Connection stats status")?;
    writeln!(writer, "Database: {}", db_path.display())?;
    writeln!(writer, "Users: {}", db.user_count()?)?;
    writeln!(writer, "Events: {}", db.event_count()?)?;

    let kinds = db.last_event_times_by_kind()?;
    if kinds.is_empty() {
        writeln!(writer, "No events recorded.")?;
        return Ok(());
    }

    writeln!(writer, "Last event:")?;
    for kind in kinds {
        writeln!(writer, "- {}: {}", kind.kind, kind.last_event)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, Utc};
    use cs_core::EventKind;
    use insta::assert_snapshot;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().expect("valid timestamp")
    }

    #[test]
    fn status_outputs_counts_and_last_event_per_kind() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("cs.db");
        let mut db = Database::open(&db_path).unwrap();

        let ada = db
            .upsert_user(Some("Ada"), None, "ada@example.com", ts("2024-01-01T00:00:00Z"))
            .unwrap();
        db.record_event(ada, EventKind::Login, ts("2024-01-15T10:00:00Z"))
            .unwrap();
        db.record_event(ada, EventKind::Logout, ts("2024-01-15T11:00:00Z"))
            .unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, &db_path).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&db_path.display().to_string(), "[TEMP]/cs.db");
        assert_snapshot!(output, @r"
Connection stats status
Database: [TEMP]/cs.db
Users: 1
Events: 2
Last event:
- logout: 2024-01-15T11:00:00.000Z
- login: 2024-01-15T10:00:00.000Z
");
    }

    #[test]
    fn empty_database_reports_no_events() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("cs.db");
        let db = Database::open(&db_path).unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, &db_path).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("No events recorded."));
    }
}
