//! Connection event model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a connection event, as recorded by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Login,
    Logout,
}

impl EventKind {
    /// Returns the string representation used for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(Self::Login),
            "logout" => Ok(Self::Logout),
            _ => Err(UnknownEventKind(s.to_string())),
        }
    }
}

impl Serialize for EventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown event kind strings.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown event kind: {0}")]
pub struct UnknownEventKind(String);

/// A single login/logout event for one user.
///
/// Produced externally and immutable once recorded; the analytics pass
/// only reads these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEvent {
    pub user_id: i64,
    pub kind: EventKind,
    pub occurred_at: DateTime<Utc>,
}

impl ConnectionEvent {
    #[must_use]
    pub const fn new(user_id: i64, kind: EventKind, occurred_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            kind,
            occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrip() {
        for kind in [EventKind::Login, EventKind::Logout] {
            let s = kind.as_str();
            let parsed: EventKind = s.parse().expect("should parse");
            assert_eq!(parsed, kind);
            assert_eq!(kind.to_string(), s);
        }
    }

    #[test]
    fn unknown_kind_errors() {
        let result: Result<EventKind, _> = "reconnect".parse();
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "unknown event kind: reconnect"
        );
    }

    #[test]
    fn kind_serde_matches_as_str() {
        for kind in [EventKind::Login, EventKind::Logout] {
            let value = serde_json::to_value(kind).unwrap();
            assert_eq!(value.as_str().unwrap(), kind.as_str());
        }
    }

    #[test]
    fn event_json_roundtrip() {
        let event = ConnectionEvent::new(
            7,
            EventKind::Login,
            "2024-01-15T10:30:00Z".parse().unwrap(),
        );
        let json = serde_json::to_string(&event).unwrap();
        let parsed: ConnectionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
