//! Export command: writes ledger events as JSONL to stdout.

use std::io::{BufWriter, Write, stdout};

use anyhow::{Context, Result};

use cs_core::ConnectionEvent;
use cs_db::Database;

/// Runs the export command.
///
/// Events are written oldest first; `limit` caps the number of rows read.
pub fn run(db: &Database, limit: Option<usize>) -> Result<()> {
    let events = db.list_events(limit)?;
    let stdout = stdout();
    let writer = BufWriter::new(stdout.lock());
    write_events(writer, &events)
}

/// Writes events as JSONL to the given writer.
///
/// A broken pipe (e.g., piping into `head`) ends the export quietly.
pub fn write_events<W: Write>(mut writer: W, events: &[ConnectionEvent]) -> Result<()> {
    for event in events {
        serde_json::to_writer(&mut writer, event).context("failed to serialize event")?;
        if writeln!(writer).is_err() {
            break;
        }
    }
    Ok(())
}
