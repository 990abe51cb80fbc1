//! Core domain logic for the connection analytics engine.
//!
//! This crate contains the fundamental types and logic for:
//! - Bucketing: counting connection events per calendar window
//! - Pairing: matching logouts to open logins and estimating durations
//! - Reporting: assembling the combined statistics report
//!
//! Everything here is pure: no I/O, no hidden state across calls. The
//! ledger (see `cs-db`) supplies events and the two externally computed
//! aggregates; this crate only derives.

pub mod bucket;
pub mod event;
pub mod granularity;
pub mod pairing;
pub mod report;

pub use bucket::{Bucket, aggregate_buckets};
pub use event::{ConnectionEvent, EventKind, UnknownEventKind};
pub use granularity::Granularity;
pub use pairing::{PairingSummary, pair_sessions};
pub use report::{StatsReport, UserProjectCount};
