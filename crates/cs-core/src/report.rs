//! The combined statistics report.

use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::granularity::Granularity;

/// Project count for one user, with a display name resolved by the ledger.
///
/// Supplied pre-sorted: projects descending, then name ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProjectCount {
    pub user_id: i64,
    pub name: String,
    pub projects: u64,
}

/// One immutable statistics report.
///
/// For a fixed input snapshot and granularity this is pure function
/// output: assembling it twice yields identical reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub online: u64,
    pub offline: u64,
    pub projects_per_user: Vec<UserProjectCount>,
    pub logins: Vec<Bucket>,
    pub logouts: Vec<Bucket>,
    pub avg_session_minutes: f64,
    pub granularity: Granularity,
}

impl StatsReport {
    /// Composes already-computed parts into a report.
    ///
    /// No further transformation happens here: bucket sequences and
    /// project counts are exposed exactly as supplied.
    #[must_use]
    pub const fn assemble(
        online: u64,
        offline: u64,
        projects_per_user: Vec<UserProjectCount>,
        logins: Vec<Bucket>,
        logouts: Vec<Bucket>,
        avg_session_minutes: f64,
        granularity: Granularity,
    ) -> Self {
        Self {
            online,
            offline,
            projects_per_user,
            logins,
            logouts,
            avg_session_minutes,
            granularity,
        }
    }
}
