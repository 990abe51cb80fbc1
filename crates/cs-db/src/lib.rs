//! Event ledger for the connection analytics engine.
//!
//! Persists users, projects, and the append-only login/logout ledger using
//! `rusqlite`, and exposes the snapshot-consistent reads the analytics
//! pass needs.
//!
//! # Thread Safety
//!
//! [`Database`] wraps a `rusqlite::Connection`, which is `Send` but not
//! `Sync`. Move it between threads or guard it with a `Mutex`; it cannot
//! be shared without external synchronization.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond
//! precision (e.g., `2024-01-15T10:30:00.000Z`), always UTC. Lexicographic
//! ordering therefore matches chronological ordering, which the
//! upper-bound filtering in [`Database::stats_snapshot`] relies on.
//!
//! The `connection_events` table is append-only: rows are never updated,
//! and the rowid doubles as insertion order for tie-breaking.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use thiserror::Error;

use cs_core::{ConnectionEvent, EventKind, UserProjectCount};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Latest event timestamp grouped by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindLastEvent {
    pub kind: String,
    pub last_event: String,
}

/// All inputs of one report, read under a single transaction.
///
/// The three event reads and the two aggregates observe the same logical
/// snapshot of the ledger; a row inserted concurrently is either visible
/// to all of them or to none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Login events, newest first.
    pub logins: Vec<ConnectionEvent>,
    /// Logout events, newest first.
    pub logouts: Vec<ConnectionEvent>,
    /// Combined stream, oldest first, ties in insertion order.
    pub stream: Vec<ConnectionEvent>,
    pub online: u64,
    pub offline: u64,
    /// Pre-sorted: projects descending, then name ascending.
    pub project_counts: Vec<UserProjectCount>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The schema is initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                first_name TEXT,
                last_name TEXT,
                email TEXT NOT NULL UNIQUE,
                is_connected INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projects (
                project_name TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (project_name, user_id),
                FOREIGN KEY (user_id) REFERENCES users(user_id) ON DELETE CASCADE
            );

            -- Append-only login/logout ledger.
            -- occurred_at: RFC 3339 UTC text; kind: 'login' or 'logout'.
            -- No FK to users: history rows may outlive or predate the
            -- user table (imports, deleted accounts).
            CREATE TABLE IF NOT EXISTS connection_events (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                occurred_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_kind_time
                ON connection_events(kind, occurred_at);
            CREATE INDEX IF NOT EXISTS idx_events_time
                ON connection_events(occurred_at);
            ",
        )?;
        Ok(())
    }

    /// Creates or updates a user by email, returning the user id.
    pub fn upsert_user(
        &mut self,
        first_name: Option<&str>,
        last_name: Option<&str>,
        email: &str,
        created_at: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "
            INSERT INTO users (first_name, last_name, email, is_connected, created_at)
            VALUES (?1, ?2, ?3, 0, ?4)
            ON CONFLICT(email) DO UPDATE SET
                first_name = COALESCE(excluded.first_name, users.first_name),
                last_name = COALESCE(excluded.last_name, users.last_name)
            ",
            params![first_name, last_name, email, format_timestamp(created_at)],
        )?;
        let user_id = self.conn.query_row(
            "SELECT user_id FROM users WHERE email = ?1",
            [email],
            |row| row.get(0),
        )?;
        Ok(user_id)
    }

    /// Adds a project for a user, ignoring duplicates.
    ///
    /// Returns whether a new row was inserted.
    pub fn add_project(
        &mut self,
        user_id: i64,
        project_name: &str,
        created_at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let inserted = self.conn.execute(
            "
            INSERT OR IGNORE INTO projects (project_name, user_id, created_at)
            VALUES (?1, ?2, ?3)
            ",
            params![project_name, user_id, format_timestamp(created_at)],
        )?;
        Ok(inserted > 0)
    }

    /// Appends one connection event and updates the user's connected flag.
    ///
    /// Both writes happen in one transaction. An event for a user id with
    /// no user row is still recorded (the flag update just has nothing to
    /// touch).
    pub fn record_event(
        &mut self,
        user_id: i64,
        kind: EventKind,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let connected = i64::from(kind == EventKind::Login);
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO connection_events (user_id, kind, occurred_at) VALUES (?1, ?2, ?3)",
            params![user_id, kind.as_str(), format_timestamp(occurred_at)],
        )?;
        let updated = tx.execute(
            "UPDATE users SET is_connected = ?1 WHERE user_id = ?2",
            params![connected, user_id],
        )?;
        if updated == 0 {
            tracing::warn!(user_id, %kind, "connection event for unknown user");
        }
        tx.commit()?;
        Ok(())
    }

    /// Inserts a batch of events inside one transaction.
    ///
    /// Used by imports; does not touch `users.is_connected` since imported
    /// history says nothing about the current state.
    pub fn insert_events(&mut self, events: &[ConnectionEvent]) -> Result<usize, DbError> {
        if events.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO connection_events (user_id, kind, occurred_at) VALUES (?1, ?2, ?3)",
            )?;
            for event in events {
                inserted += stmt.execute(params![
                    event.user_id,
                    event.kind.as_str(),
                    format_timestamp(event.occurred_at),
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Lists events ascending by time (ties in insertion order), with an
    /// optional row limit.
    ///
    /// Rows that fail to decode are skipped, never fatal.
    pub fn list_events(&self, limit: Option<usize>) -> Result<Vec<ConnectionEvent>, DbError> {
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        let mut stmt = self.conn.prepare(
            "
            SELECT id, user_id, kind, occurred_at
            FROM connection_events
            ORDER BY occurred_at ASC, id ASC
            LIMIT ?1
            ",
        )?;
        let rows = stmt.query_map([limit], decode_row)?;
        collect_events(rows)
    }

    /// Lists the last event timestamp per kind, ordered by most recent.
    pub fn last_event_times_by_kind(&self) -> Result<Vec<KindLastEvent>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT kind, MAX(occurred_at) AS last_event
            FROM connection_events
            GROUP BY kind
            ORDER BY last_event DESC, kind ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(KindLastEvent {
                kind: row.get(0)?,
                last_event: row.get(1)?,
            })
        })?;
        let mut kinds = Vec::new();
        for row in rows {
            kinds.push(row?);
        }
        Ok(kinds)
    }

    /// Number of user rows.
    pub fn user_count(&self) -> Result<i64, DbError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Number of ledger rows.
    pub fn event_count(&self) -> Result<i64, DbError> {
        let count =
            self.conn
                .query_row("SELECT COUNT(*) FROM connection_events", [], |row| {
                    row.get(0)
                })?;
        Ok(count)
    }

    /// Reads every input of one stats report under a single transaction.
    ///
    /// An `upper_bound` additionally restricts all three event reads to
    /// `occurred_at <= upper_bound`, which makes reports reproducible
    /// against a growing ledger. Any query failure aborts the whole
    /// snapshot; there is no partial result and no retry here.
    pub fn stats_snapshot(
        &self,
        upper_bound: Option<DateTime<Utc>>,
    ) -> Result<StatsSnapshot, DbError> {
        let bound = upper_bound.map(format_timestamp);
        let tx = self.conn.unchecked_transaction()?;

        let logins = kind_events(&tx, EventKind::Login, bound.as_deref())?;
        let logouts = kind_events(&tx, EventKind::Logout, bound.as_deref())?;
        let stream = stream_events(&tx, bound.as_deref())?;
        let (online, offline) = connection_counts(&tx)?;
        let project_counts = project_counts(&tx)?;

        tx.commit()?;
        Ok(StatsSnapshot {
            logins,
            logouts,
            stream,
            online,
            offline,
            project_counts,
        })
    }
}

/// Events of one kind, newest first.
fn kind_events(
    conn: &Connection,
    kind: EventKind,
    bound: Option<&str>,
) -> Result<Vec<ConnectionEvent>, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT id, user_id, kind, occurred_at
        FROM connection_events
        WHERE kind = ?1 AND (?2 IS NULL OR occurred_at <= ?2)
        ORDER BY occurred_at DESC, id DESC
        ",
    )?;
    let rows = stmt.query_map(params![kind.as_str(), bound], decode_row)?;
    collect_events(rows)
}

/// The combined stream, oldest first, ties in insertion order.
fn stream_events(conn: &Connection, bound: Option<&str>) -> Result<Vec<ConnectionEvent>, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT id, user_id, kind, occurred_at
        FROM connection_events
        WHERE ?1 IS NULL OR occurred_at <= ?1
        ORDER BY occurred_at ASC, id ASC
        ",
    )?;
    let rows = stmt.query_map(params![bound], decode_row)?;
    collect_events(rows)
}

fn connection_counts(conn: &Connection) -> Result<(u64, u64), DbError> {
    let (online, offline): (i64, i64) = conn.query_row(
        "
        SELECT COALESCE(SUM(is_connected = 1), 0), COALESCE(SUM(is_connected = 0), 0)
        FROM users
        ",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok((
        u64::try_from(online).unwrap_or(0),
        u64::try_from(offline).unwrap_or(0),
    ))
}

/// Per-user project counts, display name falling back to email when the
/// trimmed first/last name is blank. Matches the order the report
/// contract expects: projects descending, then name ascending.
fn project_counts(conn: &Connection) -> Result<Vec<UserProjectCount>, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT u.user_id,
               COALESCE(
                   NULLIF(TRIM(COALESCE(u.first_name, '') || ' ' || COALESCE(u.last_name, '')), ''),
                   u.email
               ) AS name,
               COUNT(p.project_name) AS projects
        FROM users u
        LEFT JOIN projects p ON p.user_id = u.user_id
        GROUP BY u.user_id, name
        ORDER BY projects DESC, name ASC
        ",
    )?;
    let rows = stmt.query_map([], |row| {
        let user_id: i64 = row.get(0)?;
        let name: String = row.get(1)?;
        let projects: i64 = row.get(2)?;
        Ok(UserProjectCount {
            user_id,
            name,
            projects: u64::try_from(projects).unwrap_or(0),
        })
    })?;
    let mut counts = Vec::new();
    for row in rows {
        counts.push(row?);
    }
    Ok(counts)
}

/// Raw ledger row before timestamp/kind validation.
type RawEventRow = (i64, i64, String, String);

fn decode_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEventRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

/// Collects rows into typed events, skipping records whose kind or
/// timestamp fails to parse. A malformed record never aborts the read.
fn collect_events(
    rows: impl Iterator<Item = rusqlite::Result<RawEventRow>>,
) -> Result<Vec<ConnectionEvent>, DbError> {
    let mut events = Vec::new();
    for row in rows {
        let (id, user_id, kind, occurred_at) = row?;
        let kind: EventKind = match kind.parse() {
            Ok(kind) => kind,
            Err(error) => {
                tracing::debug!(id, %error, "skipping event with unknown kind");
                continue;
            }
        };
        let occurred_at = match DateTime::parse_from_rfc3339(&occurred_at) {
            Ok(parsed) => parsed.with_timezone(&Utc),
            Err(error) => {
                tracing::debug!(id, %error, "skipping event with malformed timestamp");
                continue;
            }
        };
        events.push(ConnectionEvent::new(user_id, kind, occurred_at));
    }
    Ok(events)
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
