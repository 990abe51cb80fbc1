//! Ingest command: records connection events from the surrounding app.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use cs_core::EventKind;
use cs_db::Database;

/// Records one login/logout event.
///
/// `at` defaults to now; an explicit timestamp must be RFC 3339.
pub fn run(db: &mut Database, kind: EventKind, user: i64, at: Option<&str>) -> Result<()> {
    let occurred_at = parse_at(at)?;
    db.record_event(user, kind, occurred_at)?;
    tracing::debug!(user, %kind, %occurred_at, "event recorded");
    Ok(())
}

fn parse_at(at: Option<&str>) -> Result<DateTime<Utc>> {
    match at {
        None => Ok(Utc::now()),
        Some(raw) => {
            let parsed = DateTime::parse_from_rfc3339(raw).with_context(|| {
                format!("invalid --at timestamp {raw:?}, expected RFC 3339 (e.g., 2024-01-15T10:30:00Z)")
            })?;
            Ok(parsed.with_timezone(&Utc))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_timestamp_is_recorded() {
        let mut db = Database::open_in_memory().unwrap();
        run(&mut db, EventKind::Login, 1, Some("2024-01-15T10:00:00Z")).unwrap();

        let events = db.list_events(None).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Login);
        assert_eq!(events[0].occurred_at, "2024-01-15T10:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn invalid_timestamp_is_an_error() {
        let mut db = Database::open_in_memory().unwrap();
        let result = run(&mut db, EventKind::Logout, 1, Some("yesterday"));
        assert!(result.is_err());
        assert_eq!(db.list_events(None).unwrap().len(), 0);
    }

    #[test]
    fn missing_timestamp_defaults_to_now() {
        let mut db = Database::open_in_memory().unwrap();
        let before = Utc::now();
        run(&mut db, EventKind::Login, 1, None).unwrap();
        let after = Utc::now();

        let events = db.list_events(None).unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].occurred_at >= before - chrono::Duration::seconds(1));
        assert!(events[0].occurred_at <= after + chrono::Duration::seconds(1));
    }
}
