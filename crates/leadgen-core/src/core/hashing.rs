// crates/leadgen-core/src/core/hashing.rs
// ============================================================================
// Module: Hashing
// Description: Canonical-JSON digests used for config hashes and integrity
// checks.
// Purpose: Give every crate one stable way to hash a normalized value.
// Dependencies: serde_json, sha2
// ============================================================================

//! ## Overview
//! The versioned config store and the domain pattern's
//! `config_hash` both need a stable digest over a canonical JSON
//! encoding. This module is the single place that encoding is defined so the
//! two call sites can never drift.

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

/// Supported hash algorithms.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    /// SHA-256 (default).
    #[default]
    Sha256,
}

impl HashAlgorithm {
    /// Returns a stable label for the algorithm.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

/// A hash digest paired with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashDigest {
    /// Algorithm used to compute `value`.
    pub algorithm: HashAlgorithm,
    /// Hex-encoded digest value.
    pub value: String,
}

/// Encodes a serializable value as canonical JSON bytes (sorted object keys,
/// no insignificant whitespace).
///
/// # Errors
///
/// Returns an error when `value` cannot be serialized to JSON.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    let canonical = canonicalize(&value);
    serde_json::to_vec(&canonical)
}

/// Hashes raw bytes with the given algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let digest = Sha256::digest(bytes);
            HashDigest {
                algorithm,
                value: hex_encode(&digest),
            }
        }
    }
}

/// Hashes a serializable value after canonical-JSON encoding.
///
/// # Errors
///
/// Returns an error when `value` cannot be serialized to JSON.
pub fn hash_canonical_json<T: Serialize>(
    algorithm: HashAlgorithm,
    value: &T,
) -> serde_json::Result<HashDigest> {
    let bytes = canonical_json_bytes(value)?;
    Ok(hash_bytes(algorithm, &bytes))
}

/// Recursively sorts object keys so the JSON encoding is deterministic.
fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut sorted = serde_json::Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                let Some(inner) = map.get(key) else {
                    continue;
                };
                sorted.insert(key.clone(), canonicalize(inner));
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize).collect())
        }
        other => other.clone(),
    }
}

/// Encodes bytes as lowercase hex without external dependencies.
fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use super::*;

    #[test]
    fn canonical_json_is_key_order_independent() {
        let a = serde_json::json!({"b": 1, "a": 2});
        let b = serde_json::json!({"a": 2, "b": 1});
        assert_eq!(
            canonical_json_bytes(&a).expect("encode"),
            canonical_json_bytes(&b).expect("encode")
        );
    }

    #[test]
    fn hash_bytes_is_deterministic() {
        let first = hash_bytes(HashAlgorithm::Sha256, b"hello");
        let second = hash_bytes(HashAlgorithm::Sha256, b"hello");
        assert_eq!(first, second);
    }
}
