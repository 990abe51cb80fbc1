//! Import command: reads events as JSONL from stdin into the ledger.

use std::io::BufRead;

use anyhow::Result;

use cs_core::ConnectionEvent;
use cs_db::Database;

/// Runs the import command against stdin.
pub fn run(db: &mut Database) -> Result<()> {
    let stdin = std::io::stdin();
    let (imported, skipped) = import_from(db, stdin.lock())?;
    println!("imported {imported} events ({skipped} skipped)");
    Ok(())
}

/// Imports JSONL events from a reader.
///
/// Malformed lines are skipped with a debug log; the batch insert itself
/// is transactional. Returns (imported, skipped).
pub fn import_from<R: BufRead>(db: &mut Database, reader: R) -> Result<(usize, usize)> {
    let mut events: Vec<ConnectionEvent> = Vec::new();
    let mut skipped = 0;

    for (line_num, line_result) in reader.lines().enumerate() {
        let Ok(line) = line_result else {
            skipped += 1;
            continue;
        };

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ConnectionEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => {
                skipped += 1;
                tracing::debug!(
                    line = line_num + 1,
                    error = %e,
                    "skipping malformed import line"
                );
            }
        }
    }

    let imported = db.insert_events(&events)?;
    Ok((imported, skipped))
}
