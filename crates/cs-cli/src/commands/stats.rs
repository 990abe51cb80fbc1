//! Stats command: the one operation the analytics engine exposes.
//!
//! Reads a consistent ledger snapshot, runs bucketing and session pairing
//! over it, and assembles the combined report. Output is human-readable or
//! JSON (`--json`).

use std::fmt::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};

use cs_core::{Bucket, Granularity, StatsReport, aggregate_buckets, pair_sessions};
use cs_db::Database;

/// Computes one statistics report at the given granularity.
///
/// All ledger reads happen under a single snapshot, so the bucket totals
/// and the pairing average describe the same set of events. The optional
/// `upper_bound` pins the snapshot to a fixed point in time, which makes
/// repeated runs reproducible against a growing ledger. Any ledger failure
/// aborts the whole computation; there is no partial report.
pub fn generate_stats(
    db: &Database,
    granularity: Granularity,
    upper_bound: Option<DateTime<Utc>>,
) -> Result<StatsReport> {
    let snapshot = db.stats_snapshot(upper_bound)?;

    let logins = aggregate_buckets(&snapshot.logins, granularity);
    let logouts = aggregate_buckets(&snapshot.logouts, granularity);
    let pairing = pair_sessions(&snapshot.stream);

    Ok(StatsReport::assemble(
        snapshot.online,
        snapshot.offline,
        snapshot.project_counts,
        logins,
        logouts,
        pairing.avg_minutes(),
        granularity,
    ))
}

/// Formats the human-readable report output.
pub fn format_stats(report: &StatsReport) -> String {
    let mut output = String::new();

    writeln!(output, "CONNECTION STATS: {}", report.granularity).unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Online:      {}", report.online).unwrap();
    writeln!(output, "Offline:     {}", report.offline).unwrap();
    writeln!(output, "Avg session: {:.1} min", report.avg_session_minutes).unwrap();

    writeln!(output).unwrap();
    writeln!(output, "LOGINS").unwrap();
    writeln!(output, "──────").unwrap();
    write_buckets(&mut output, &report.logins);

    writeln!(output).unwrap();
    writeln!(output, "LOGOUTS").unwrap();
    writeln!(output, "───────").unwrap();
    write_buckets(&mut output, &report.logouts);

    writeln!(output).unwrap();
    writeln!(output, "PROJECTS PER USER").unwrap();
    writeln!(output, "─────────────────").unwrap();
    if report.projects_per_user.is_empty() {
        writeln!(output, "(no users)").unwrap();
    } else {
        for entry in &report.projects_per_user {
            writeln!(output, "{}  {}", entry.name, entry.projects).unwrap();
        }
    }

    output
}

fn write_buckets(output: &mut String, buckets: &[Bucket]) {
    if buckets.is_empty() {
        writeln!(output, "(no events)").unwrap();
        return;
    }
    for bucket in buckets {
        writeln!(output, "{}  {}", bucket.key, bucket.count).unwrap();
    }
}

/// Formats the report as pretty-printed JSON.
pub fn format_stats_json(report: &StatsReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Runs the stats command.
///
/// The range string is normalized leniently: anything unrecognized means
/// day.
pub fn run(db: &Database, range: &str, json: bool) -> Result<()> {
    let granularity = Granularity::from_query(range);
    let report = generate_stats(db, granularity, None)?;

    if json {
        println!("{}", format_stats_json(&report)?);
    } else {
        print!("{}", format_stats(&report));
    }

    Ok(())
}
