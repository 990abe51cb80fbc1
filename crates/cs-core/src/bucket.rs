//! Bucketed event counts per calendar window.
//!
//! Keys are derived from the UTC calendar; the local timezone of whoever
//! produced an event never changes which bucket it lands in.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::event::ConnectionEvent;
use crate::granularity::Granularity;

/// One bucket of the time series: a calendar key and an event count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub key: String,
    pub count: u64,
}

/// Maps a timestamp to the first day of its bucket plus the display key.
///
/// The start date orders buckets chronologically; the key is what reports
/// show. Keys within one granularity sort the same way as their start
/// dates.
fn bucket_of(granularity: Granularity, at: DateTime<Utc>) -> (NaiveDate, String) {
    let date = at.date_naive();
    match granularity {
        Granularity::Day => (date, date.format("%Y-%m-%d").to_string()),
        Granularity::Week => {
            let start =
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
            let iso = date.iso_week();
            (start, format!("{:04}-W{:02}", iso.year(), iso.week()))
        }
        Granularity::Month => {
            let start = date.with_day(1).unwrap_or(date);
            (start, start.format("%Y-%m-%d").to_string())
        }
        Granularity::Year => {
            let start = NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date);
            (start, format!("{:04}", date.year()))
        }
    }
}

/// Counts events per bucket at the given granularity.
///
/// Accepts the input in ascending or descending time order (it only reads
/// timestamps). The result is sorted descending by the time each key
/// represents and truncated to the granularity's retention window. Empty
/// input yields an empty sequence.
#[must_use]
pub fn aggregate_buckets(events: &[ConnectionEvent], granularity: Granularity) -> Vec<Bucket> {
    let mut counts: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();

    for event in events {
        let (start, key) = bucket_of(granularity, event.occurred_at);
        counts
            .entry(start)
            .and_modify(|bucket| bucket.count += 1)
            .or_insert(Bucket { key, count: 1 });
    }

    counts
        .into_values()
        .rev()
        .take(granularity.retention())
        .collect()
}
