//! Report granularity: the calendar window used to group event counts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Calendar window for bucketed connection counts.
///
/// Each granularity carries a fixed retention window: the report keeps at
/// most that many buckets, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl Granularity {
    /// Maximum number of buckets retained in a report.
    #[must_use]
    pub const fn retention(&self) -> usize {
        match self {
            Self::Day => 30,
            Self::Week => 26,
            Self::Month => 12,
            Self::Year => 5,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Parses a caller-supplied range string.
    ///
    /// Matching is ASCII case-insensitive; anything unrecognized falls
    /// back to [`Granularity::Day`]. This is input normalization, not an
    /// error path.
    #[must_use]
    pub fn from_query(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Self::Week,
            "month" => Self::Month,
            "year" => Self::Year,
            _ => Self::Day,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Granularity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Granularity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_query(&s))
    }
}
