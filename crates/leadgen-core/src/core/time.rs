// crates/leadgen-core/src/core/time.rs
// ============================================================================
// Module: Timestamps
// Description: Canonical timestamp type for wire and storage representation.
// Purpose: Avoid ambiguity between system clocks and stored timestamps.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! All timestamps in the orchestrator are UTC, millisecond-precision, and
//! serialize as RFC 3339 strings so they are directly comparable across the
//! HTTP surface, the event stream, and SQLite storage.

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A UTC timestamp with millisecond precision.
///
/// # Invariants
/// - Always UTC; naive/local timestamps are never constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(#[serde(with = "rfc3339")] OffsetDateTime);

impl Timestamp {
    /// Wraps a precomputed `OffsetDateTime`, truncated to millisecond precision.
    #[must_use]
    pub fn new(value: OffsetDateTime) -> Self {
        let nanos = (value.millisecond() as i128) * 1_000_000;
        let truncated = value.replace_nanosecond(0).unwrap_or(value);
        Self(truncated.saturating_add(time::Duration::nanoseconds(nanos as i64)))
    }

    /// Returns the underlying `OffsetDateTime`.
    #[must_use]
    pub const fn get(self) -> OffsetDateTime {
        self.0
    }

    /// Formats the timestamp as RFC 3339.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting fails (never happens for valid
    /// `OffsetDateTime` values produced by this type).
    pub fn to_rfc3339(self) -> Result<String, time::error::Format> {
        self.0.format(&Rfc3339)
    }
}

mod rfc3339 {
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    pub(super) fn serialize<S: Serializer>(
        value: &OffsetDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let text = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<OffsetDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&text, &Rfc3339).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let ts = Timestamp::new(OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(1_700_000_000));
        let json = serde_json::to_string(&ts).expect("serialize");
        let back: Timestamp = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(ts, back);
    }
}
