//! Session pairing: matching each logout to the most recent unmatched
//! login for the same user and accumulating duration statistics.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::event::{ConnectionEvent, EventKind};

/// Accumulated result of one pairing pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PairingSummary {
    pub total_minutes: f64,
    pub session_count: u64,
}

impl PairingSummary {
    /// Average session duration in minutes, 0.0 when no session paired.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_minutes(&self) -> f64 {
        if self.session_count == 0 {
            0.0
        } else {
            self.total_minutes / self.session_count as f64
        }
    }
}

/// Pairs logouts with open logins in a single pass over the event stream.
///
/// Events are stable-sorted ascending by timestamp first, so ties keep
/// their ledger insertion order. A login unconditionally replaces any
/// unmatched open login for the same user; the replaced login never
/// contributes to duration accounting. A logout without an open login is
/// an orphan and is skipped.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pair_sessions(events: &[ConnectionEvent]) -> PairingSummary {
    let mut ordered: Vec<&ConnectionEvent> = events.iter().collect();
    ordered.sort_by_key(|event| event.occurred_at);

    let mut open_login: HashMap<i64, DateTime<Utc>> = HashMap::new();
    let mut summary = PairingSummary::default();

    for event in ordered {
        match event.kind {
            EventKind::Login => {
                open_login.insert(event.user_id, event.occurred_at);
            }
            EventKind::Logout => {
                if let Some(start) = open_login.remove(&event.user_id) {
                    let minutes =
                        (event.occurred_at - start).num_milliseconds() as f64 / 60_000.0;
                    if minutes >= 0.0 && minutes.is_finite() {
                        summary.total_minutes += minutes;
                        summary.session_count += 1;
                    }
                }
            }
        }
    }

    summary
}
