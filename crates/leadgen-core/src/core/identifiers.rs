// crates/leadgen-core/src/core/identifiers.rs
// ============================================================================
// Module: Identifiers
// Description: Canonical opaque identifiers used across the orchestrator.
// Purpose: Provide strongly typed, serializable identifiers with stable wire
// forms so call sites cannot confuse one UUID-shaped value for another.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! Identifiers are opaque wrappers around `Uuid` or `i64`/`String` primitives.
//! They serialize transparently so the wire shape matches the data model, while the Rust type system prevents passing an owner id where a
//! campaign id is expected.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Campaign owner identifier (a user id).
///
/// # Invariants
/// - Opaque UUID; no normalization is applied by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Creates an owner identifier from a raw UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the raw UUID value.
    #[must_use]
    pub const fn get(self) -> Uuid {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stable identifier for a normalized domain-generation pattern tuple.
///
/// # Invariants
/// - Opaque hex-encoded digest string; equal patterns always hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigHash(String);

impl ConfigHash {
    /// Wraps a precomputed digest string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the digest as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Monotonic per-campaign event sequence number.
///
/// # Invariants
/// - Strictly increasing per campaign, assigned at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence(i64);

impl Sequence {
    /// The first sequence number issued for a campaign.
    pub const FIRST: Self = Self(1);

    /// Wraps a raw sequence value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Returns the next sequence value.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use super::*;

    #[test]
    fn sequence_next_increments() {
        assert_eq!(Sequence::FIRST.next(), Sequence::new(2));
    }

    #[test]
    fn owner_id_round_trips_through_json() {
        let id = OwnerId::new(Uuid::nil());
        let json = serde_json::to_string(&id).expect("serialize");
        let back: OwnerId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, back);
    }
}
