//! End-to-end flow: bookkeeping -> ingest -> stats report.

use chrono::{DateTime, Duration, Utc};

use cs_cli::commands::{export, import, ingest, stats};
use cs_core::{EventKind, Granularity};
use cs_db::Database;

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().expect("valid timestamp")
}

#[test]
fn full_flow_produces_consistent_report() {
    let temp = tempfile::tempdir().unwrap();
    let db_path = temp.path().join("cs.db");
    let mut db = Database::open(&db_path).unwrap();

    let ada = db
        .upsert_user(Some("Ada"), Some("Lovelace"), "ada@example.com", ts("2024-01-01T00:00:00Z"))
        .unwrap();
    let grace = db
        .upsert_user(Some("Grace"), Some("Hopper"), "grace@example.com", ts("2024-01-01T00:00:00Z"))
        .unwrap();
    db.add_project(ada, "docs", ts("2024-01-02T00:00:00Z")).unwrap();
    db.add_project(ada, "graphs", ts("2024-01-02T00:00:00Z")).unwrap();
    db.add_project(grace, "docs", ts("2024-01-02T00:00:00Z")).unwrap();

    // Ada: two logins (the first is overwritten), one logout -> 30 min.
    ingest::run(&mut db, EventKind::Login, ada, Some("2024-01-15T10:00:00Z")).unwrap();
    ingest::run(&mut db, EventKind::Login, ada, Some("2024-01-15T10:10:00Z")).unwrap();
    ingest::run(&mut db, EventKind::Logout, ada, Some("2024-01-15T10:40:00Z")).unwrap();
    // Grace: one 60 min session the day before, still online today.
    ingest::run(&mut db, EventKind::Login, grace, Some("2024-01-14T09:00:00Z")).unwrap();
    ingest::run(&mut db, EventKind::Logout, grace, Some("2024-01-14T10:00:00Z")).unwrap();
    ingest::run(&mut db, EventKind::Login, grace, Some("2024-01-15T09:00:00Z")).unwrap();

    let report = stats::generate_stats(&db, Granularity::Day, None).unwrap();

    assert_eq!(report.online, 1);
    assert_eq!(report.offline, 1);
    // Sessions: 30 min (Ada, second login) and 60 min (Grace).
    assert!((report.avg_session_minutes - 45.0).abs() < 1e-9);

    let login_keys: Vec<_> = report.logins.iter().map(|b| (b.key.as_str(), b.count)).collect();
    assert_eq!(login_keys, vec![("2024-01-15", 3), ("2024-01-14", 1)]);
    let logout_keys: Vec<_> = report.logouts.iter().map(|b| (b.key.as_str(), b.count)).collect();
    assert_eq!(logout_keys, vec![("2024-01-15", 1), ("2024-01-14", 1)]);

    assert_eq!(report.projects_per_user.len(), 2);
    assert_eq!(report.projects_per_user[0].name, "Ada Lovelace");
    assert_eq!(report.projects_per_user[0].projects, 2);
    assert_eq!(report.projects_per_user[1].name, "Grace Hopper");
    assert_eq!(report.projects_per_user[1].projects, 1);
}

#[test]
fn stats_are_idempotent_against_an_unchanged_ledger() {
    let mut db = Database::open_in_memory().unwrap();
    let ada = db
        .upsert_user(Some("Ada"), None, "ada@example.com", ts("2024-01-01T00:00:00Z"))
        .unwrap();
    ingest::run(&mut db, EventKind::Login, ada, Some("2024-01-15T10:00:00Z")).unwrap();
    ingest::run(&mut db, EventKind::Logout, ada, Some("2024-01-15T10:30:00Z")).unwrap();

    for granularity in [
        Granularity::Day,
        Granularity::Week,
        Granularity::Month,
        Granularity::Year,
    ] {
        let first = stats::generate_stats(&db, granularity, None).unwrap();
        let second = stats::generate_stats(&db, granularity, None).unwrap();
        assert_eq!(
            stats::format_stats_json(&first).unwrap(),
            stats::format_stats_json(&second).unwrap()
        );
    }
}

#[test]
fn day_retention_caps_the_login_series_at_thirty() {
    let mut db = Database::open_in_memory().unwrap();
    let start = ts("2024-01-01T12:00:00Z");
    for day in 0..40 {
        db.record_event(1, EventKind::Login, start + Duration::days(day))
            .unwrap();
    }

    let report = stats::generate_stats(&db, Granularity::Day, None).unwrap();
    assert_eq!(report.logins.len(), 30);
    // Sorted descending by date: newest first.
    assert_eq!(report.logins[0].key, "2024-02-09");
    assert_eq!(report.logins[29].key, "2024-01-11");
}

#[test]
fn export_import_roundtrip_preserves_the_event_stream() {
    let mut source = Database::open_in_memory().unwrap();
    source
        .record_event(1, EventKind::Login, ts("2024-01-15T10:00:00Z"))
        .unwrap();
    source
        .record_event(1, EventKind::Logout, ts("2024-01-15T10:30:00Z"))
        .unwrap();
    source
        .record_event(2, EventKind::Logout, ts("2024-01-15T11:00:00Z"))
        .unwrap();

    let events = source.list_events(None).unwrap();
    let mut buffer = Vec::new();
    export::write_events(&mut buffer, &events).unwrap();

    let mut target = Database::open_in_memory().unwrap();
    let (imported, skipped) = import::import_from(&mut target, buffer.as_slice()).unwrap();
    assert_eq!(imported, 3);
    assert_eq!(skipped, 0);

    let source_report = stats::generate_stats(&source, Granularity::Day, None).unwrap();
    let target_report = stats::generate_stats(&target, Granularity::Day, None).unwrap();
    assert_eq!(source_report.logins, target_report.logins);
    assert_eq!(source_report.logouts, target_report.logouts);
    assert!(
        (source_report.avg_session_minutes - target_report.avg_session_minutes).abs()
            < f64::EPSILON
    );
}
