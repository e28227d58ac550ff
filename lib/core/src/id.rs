//! Strongly-typed identifiers.
//!
//! `ConversationId` is opaque and supplied by the messaging channel.
//! `OrderId` is generated locally: a minute-resolution timestamp followed by
//! a process-wide sequence number, rendered as `YYYYMMDD-HHMM-<sequence>`.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Identifier of a customer conversation on the messaging channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Wraps a channel-supplied conversation identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConversationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

const ORDER_STAMP_FORMAT: &str = "%Y%m%d-%H%M";

/// Identifier assigned to a confirmed customization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderId {
    stamp: NaiveDateTime,
    sequence: u64,
}

impl OrderId {
    /// Builds an order id, truncating `at` to the minute.
    #[must_use]
    pub fn new(at: DateTime<Utc>, sequence: u64) -> Self {
        let naive = at.naive_utc();
        let stamp = naive
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(naive);
        Self { stamp, sequence }
    }

    /// Returns the process-wide sequence number.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the minute the order was confirmed in.
    #[must_use]
    pub fn stamp(&self) -> DateTime<Utc> {
        self.stamp.and_utc()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.stamp.format(ORDER_STAMP_FORMAT),
            self.sequence
        )
    }
}

impl FromStr for OrderId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason: String| ParseIdError {
            id_type: "OrderId",
            reason,
        };

        let (stamp, sequence) = s
            .rsplit_once('-')
            .ok_or_else(|| err("missing sequence separator".to_string()))?;
        let stamp = NaiveDateTime::parse_from_str(stamp, ORDER_STAMP_FORMAT)
            .map_err(|e| err(format!("bad timestamp '{stamp}': {e}")))?;
        let sequence = sequence
            .parse()
            .map_err(|e| err(format!("bad sequence '{sequence}': {e}")))?;

        Ok(Self { stamp, sequence })
    }
}

impl Serialize for OrderId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OrderId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
