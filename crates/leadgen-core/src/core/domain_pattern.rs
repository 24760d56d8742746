// crates/leadgen-core/src/core/domain_pattern.rs
// ============================================================================
// Module: Domain Generator
// Description: Deterministic offset-to-domain bijection and batch emission.
// Purpose: Turn a domain pattern into a streaming, memory-bounded sequence of
// candidate domains without materializing the combinatorial space.
// Dependencies: crate::core::hashing, serde
// ============================================================================

//! ## Overview
//! A domain pattern describes a combinatorial space of candidate domains: a
//! fixed constant plus one or two variable-length strings drawn from a
//! character set. [`offset_to_domain`] is a pure bijection from `[0, T)` onto
//! that space; [`generate_batch`] streams a bounded slice of it without ever
//! materializing `T` domains at once.

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::hash_canonical_json;
use crate::core::identifiers::ConfigHash;

// ============================================================================
// SECTION: Pattern
// ============================================================================

/// Shape of the variable portion of a domain pattern.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Variable string is prepended to the constant.
    Prefix,
    /// Variable string is appended to the constant.
    Suffix,
    /// Independent prefix and suffix variables surround the constant.
    Both,
}

/// A domain-generation pattern.
///
/// # Invariants
/// - `variable_length >= 1`.
/// - `character_set` has no duplicate characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainPattern {
    /// Pattern shape.
    pub pattern_type: PatternType,
    /// Length of each variable string.
    pub variable_length: u32,
    /// Characters available for the variable portion, in caller-supplied
    /// order (order matters for the offset bijection).
    pub character_set: Vec<char>,
    /// Fixed string placed adjacent to the variable portion.
    pub constant_string: String,
    /// Top-level domain suffix, without the leading dot.
    pub tld: String,
}

/// Domain generator errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// `character_set` is empty.
    #[error("character set must not be empty")]
    EmptyCharacterSet,
    /// `character_set` contains duplicate characters.
    #[error("character set must not contain duplicate characters")]
    DuplicateCharacters,
    /// `variable_length` is zero.
    #[error("variable length must be at least 1")]
    ZeroVariableLength,
    /// `offset` is outside `[0, T)`.
    #[error("offset {offset} is out of range for total combinations {total}")]
    OffsetOutOfRange {
        /// The rejected offset.
        offset: u128,
        /// Total combinations `T`.
        total: u128,
    },
}

impl DomainPattern {
    /// Validates the pattern's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] when the character set is empty, contains
    /// duplicates, or `variable_length` is zero.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.character_set.is_empty() {
            return Err(GenerationError::EmptyCharacterSet);
        }
        if self.variable_length == 0 {
            return Err(GenerationError::ZeroVariableLength);
        }
        let mut seen = self.character_set.clone();
        seen.sort_unstable();
        if seen.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(GenerationError::DuplicateCharacters);
        }
        Ok(())
    }

    /// Total number of combinations `T` addressable by this pattern.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] when the pattern is structurally invalid.
    pub fn total_combinations(&self) -> Result<u128, GenerationError> {
        self.validate()?;
        let base = self.character_set.len() as u128;
        let exponent = match self.pattern_type {
            PatternType::Prefix | PatternType::Suffix => u32::from(self.variable_length),
            PatternType::Both => self.variable_length.saturating_mul(2),
        };
        Ok(base.saturating_pow(exponent))
    }

    /// Maps `offset` to its domain name.
    ///
    /// This is a bijection on `[0, T)`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] when the pattern is invalid or `offset` is
    /// outside `[0, T)`.
    pub fn offset_to_domain(&self, offset: u128) -> Result<String, GenerationError> {
        let total = self.total_combinations()?;
        if offset >= total {
            return Err(GenerationError::OffsetOutOfRange {
                offset,
                total,
            });
        }
        let base = self.character_set.len() as u128;
        let length = self.variable_length as usize;
        let domain = match self.pattern_type {
            PatternType::Prefix => {
                let variable = encode_digits(offset, base, length, &self.character_set);
                format!("{variable}{}.{}", self.constant_string, self.tld)
            }
            PatternType::Suffix => {
                let variable = encode_digits(offset, base, length, &self.character_set);
                format!("{}{variable}.{}", self.constant_string, self.tld)
            }
            PatternType::Both => {
                let per_variable = base.saturating_pow(u32::from(self.variable_length));
                let prefix_index = offset / per_variable;
                let suffix_index = offset % per_variable;
                let prefix = encode_digits(prefix_index, base, length, &self.character_set);
                let suffix = encode_digits(suffix_index, base, length, &self.character_set);
                format!("{prefix}{}{suffix}.{}", self.constant_string, self.tld)
            }
        };
        Ok(domain)
    }

    /// Generates a batch of domains starting at `start_offset`, yielding at
    /// most `max_count` domains.
    ///
    /// Returns `(domains, next_offset)` where
    /// `next_offset = min(start_offset + domains.len(), T)`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] when the pattern is invalid or
    /// `start_offset > T`.
    pub fn generate_batch(
        &self,
        start_offset: u128,
        max_count: usize,
    ) -> Result<(Vec<String>, u128), GenerationError> {
        let total = self.total_combinations()?;
        if start_offset > total {
            return Err(GenerationError::OffsetOutOfRange {
                offset: start_offset,
                total,
            });
        }
        let remaining = total.saturating_sub(start_offset);
        let count = remaining.min(max_count as u128) as usize;
        let mut domains = Vec::with_capacity(count);
        for i in 0..count {
            let offset = start_offset + i as u128;
            domains.push(self.offset_to_domain(offset)?);
        }
        let next_offset = start_offset + domains.len() as u128;
        Ok((domains, next_offset))
    }
}

/// Encodes `value` as `length` digits in base `base`, most-significant digit
/// first, mapping each digit through `alphabet`.
fn encode_digits(value: u128, base: u128, length: usize, alphabet: &[char]) -> String {
    let mut digits = vec![0u128; length];
    let mut remaining = value;
    for slot in digits.iter_mut().rev() {
        *slot = remaining % base;
        remaining /= base;
    }
    digits
        .into_iter()
        .map(|digit| alphabet[digit as usize])
        .collect()
}

// ============================================================================
// SECTION: Config Hash
// ============================================================================

/// Canonical tuple hashed to produce a pattern's [`ConfigHash`].
#[derive(Debug, Serialize)]
struct CanonicalPattern<'a> {
    pattern_type: PatternType,
    variable_length: u32,
    character_set: Vec<char>,
    constant_string: &'a str,
    tld: &'a str,
}

/// Computes the stable [`ConfigHash`] shared by every campaign using the same
/// normalized pattern tuple.
///
/// # Errors
///
/// Returns an error only if canonical-JSON encoding fails, which does not
/// happen for this pattern's field types.
pub fn config_hash(pattern: &DomainPattern) -> Result<ConfigHash, serde_json::Error> {
    let mut sorted_charset = pattern.character_set.clone();
    sorted_charset.sort_unstable();
    let canonical = CanonicalPattern {
        pattern_type: pattern.pattern_type,
        variable_length: pattern.variable_length,
        character_set: sorted_charset,
        constant_string: &pattern.constant_string,
        tld: &pattern.tld,
    };
    let digest = hash_canonical_json(HashAlgorithm::Sha256, &canonical)?;
    Ok(ConfigHash::new(digest.value))
}

// ============================================================================
// SECTION: Memory Pool
// ============================================================================

/// A reusable buffer pool for batch domain generation, bounding peak memory
/// at `max_batch_memory_bytes` worth of reusable `String` allocations instead
/// of allocating a fresh `Vec<String>` per batch.
#[derive(Debug, Default)]
pub struct BatchBuffer {
    pool: Vec<Vec<String>>,
}

impl BatchBuffer {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a buffer from the pool, or allocates a new one with the
    /// requested capacity.
    #[must_use]
    pub fn take(&mut self, capacity: usize) -> Vec<String> {
        match self.pool.pop() {
            Some(mut buffer) => {
                buffer.clear();
                buffer.reserve(capacity.saturating_sub(buffer.capacity()));
                buffer
            }
            None => Vec::with_capacity(capacity),
        }
    }

    /// Returns a buffer to the pool for reuse.
    pub fn give_back(&mut self, mut buffer: Vec<String>) {
        buffer.clear();
        self.pool.push(buffer);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use super::*;

    fn sample_prefix() -> DomainPattern {
        DomainPattern {
            pattern_type: PatternType::Prefix,
            variable_length: 2,
            character_set: vec!['a', 'b'],
            constant_string: "x".to_string(),
            tld: "com".to_string(),
        }
    }

    #[test]
    fn s4_generation_correctness() {
        let pattern = sample_prefix();
        assert_eq!(pattern.total_combinations().expect("total"), 4);
        let (domains, next_offset) = pattern.generate_batch(0, 10).expect("batch");
        assert_eq!(
            domains,
            vec!["aax.com", "abx.com", "bax.com", "bbx.com"]
        );
        assert_eq!(next_offset, 4);

        let (domains, next_offset) = pattern.generate_batch(4, 10).expect("batch");
        assert!(domains.is_empty());
        assert_eq!(next_offset, 4);
    }

    #[test]
    fn offset_to_domain_is_bijective_over_small_space() {
        let pattern = sample_prefix();
        let total = pattern.total_combinations().expect("total");
        let mut seen = std::collections::HashSet::new();
        for offset in 0..total {
            let domain = pattern.offset_to_domain(offset).expect("domain");
            assert!(seen.insert(domain));
        }
        assert_eq!(seen.len() as u128, total);
    }

    #[test]
    fn generate_batch_last_element_matches_offset_before_next() {
        let pattern = sample_prefix();
        let (domains, next_offset) = pattern.generate_batch(0, 3).expect("batch");
        assert_eq!(domains.len(), 3);
        assert_eq!(next_offset, 3);
        let last = pattern.offset_to_domain(next_offset - 1).expect("domain");
        assert_eq!(domains.last(), Some(&last));
    }

    #[test]
    fn both_pattern_combines_independent_variables() {
        let pattern = DomainPattern {
            pattern_type: PatternType::Both,
            variable_length: 1,
            character_set: vec!['a', 'b'],
            constant_string: "-mid-".to_string(),
            tld: "net".to_string(),
        };
        assert_eq!(pattern.total_combinations().expect("total"), 4);
        let (domains, _) = pattern.generate_batch(0, 10).expect("batch");
        assert_eq!(
            domains,
            vec!["a-mid-a.net", "a-mid-b.net", "b-mid-a.net", "b-mid-b.net"]
        );
    }

    #[test]
    fn config_hash_ignores_character_set_order() {
        let mut a = sample_prefix();
        let mut b = sample_prefix();
        a.character_set = vec!['a', 'b'];
        b.character_set = vec!['b', 'a'];
        assert_eq!(config_hash(&a).unwrap(), config_hash(&b).unwrap());
    }

    #[test]
    fn config_hash_differs_for_different_patterns() {
        let a = sample_prefix();
        let mut b = sample_prefix();
        b.tld = "net".to_string();
        assert_ne!(config_hash(&a).unwrap(), config_hash(&b).unwrap());
    }

    #[test]
    fn validate_rejects_duplicate_characters() {
        let mut pattern = sample_prefix();
        pattern.character_set = vec!['a', 'a'];
        assert_eq!(pattern.validate(), Err(GenerationError::DuplicateCharacters));
    }
}
