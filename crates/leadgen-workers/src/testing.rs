// crates/leadgen-workers/src/testing.rs
// ============================================================================
// Module: Deterministic Test Validators
// Description: In-memory `DnsValidator`/`HttpKeywordValidator` stubs.
// Purpose: Let phase handler tests exercise the DNS/HTTP contracts without a
// real network call, with outcomes fixed up front rather than random.
// Dependencies: leadgen-core
// ============================================================================

//! ## Overview
//! These stubs stand in for the real external collaborators the DNS and
//! HTTP phase handlers call through [`leadgen_core::interfaces::DnsValidator`]
//! and [`leadgen_core::interfaces::HttpKeywordValidator`]. Every outcome is
//! configured at construction time so handler tests are deterministic.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Mutex;

use leadgen_core::interfaces::DnsProbeOutcome;
use leadgen_core::interfaces::DnsValidationStatus;
use leadgen_core::interfaces::DnsValidator;
use leadgen_core::interfaces::HttpKeywordValidator;
use leadgen_core::interfaces::HttpProbeOutcome;

/// A `DnsValidator` that resolves every domain except an explicit denylist.
#[derive(Debug, Default)]
pub struct StubDnsValidator {
    unresolved: HashSet<String>,
}

impl StubDnsValidator {
    /// Every probed domain resolves.
    #[must_use]
    pub fn always_resolved() -> Self {
        Self::default()
    }

    /// Domains in `unresolved` report `Unresolved`; every other domain
    /// resolves.
    #[must_use]
    pub fn with_unresolved(unresolved: impl IntoIterator<Item = String>) -> Self {
        Self {
            unresolved: unresolved.into_iter().collect(),
        }
    }
}

impl DnsValidator for StubDnsValidator {
    fn probe(&self, domain: &str, persona_id: Option<&str>) -> Result<DnsProbeOutcome, String> {
        let status = if self.unresolved.contains(domain) {
            DnsValidationStatus::Unresolved
        } else {
            DnsValidationStatus::Resolved
        };
        Ok(DnsProbeOutcome {
            status,
            persona_id: persona_id.map(str::to_string),
        })
    }
}

/// An `HttpKeywordValidator` with per-domain canned keyword matches.
#[derive(Debug, Default)]
pub struct StubHttpValidator {
    matches: Mutex<HashMap<String, (Vec<String>, Vec<String>)>>,
}

impl StubHttpValidator {
    /// Every fetch succeeds with a `200` and no keyword matches.
    #[must_use]
    pub fn always_empty() -> Self {
        Self::default()
    }

    /// Builds a validator where `domain` reports the given `(keyword_set
    /// matches, adhoc matches)` pair; domains absent from `matches` get no
    /// keyword hits.
    #[must_use]
    pub fn with_matches(matches: impl IntoIterator<Item = (String, (Vec<String>, Vec<String>))>) -> Self {
        Self {
            matches: Mutex::new(matches.into_iter().collect()),
        }
    }
}

impl HttpKeywordValidator for StubHttpValidator {
    fn fetch_and_match(
        &self,
        domain: &str,
        _persona_id: Option<&str>,
        _keyword_sets: &[Vec<String>],
        _adhoc_keywords: &[String],
    ) -> Result<HttpProbeOutcome, String> {
        let guard = self.matches.lock().map_err(|_| "stub validator mutex poisoned".to_string())?;
        let (found_keywords_from_sets, found_adhoc_keywords) = guard.get(domain).cloned().unwrap_or_default();
        Ok(HttpProbeOutcome {
            http_status: Some(200),
            page_title: Some(format!("{domain} title")),
            extracted_snippet: Some(format!("{domain} snippet")),
            found_keywords_from_sets,
            found_adhoc_keywords,
            status: DnsValidationStatus::Resolved,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use super::*;

    #[test]
    fn stub_dns_resolves_by_default() {
        let validator = StubDnsValidator::always_resolved();
        let outcome = validator.probe("a.com", None).expect("probe");
        assert_eq!(outcome.status, DnsValidationStatus::Resolved);
    }

    #[test]
    fn stub_dns_respects_denylist() {
        let validator = StubDnsValidator::with_unresolved(["a.com".to_string()]);
        assert_eq!(validator.probe("a.com", None).expect("probe").status, DnsValidationStatus::Unresolved);
        assert_eq!(validator.probe("b.com", None).expect("probe").status, DnsValidationStatus::Resolved);
    }

    #[test]
    fn stub_http_reports_configured_matches() {
        let validator = StubHttpValidator::with_matches([("a.com".to_string(), (vec!["set".to_string()], vec![]))]);
        let outcome = validator.fetch_and_match("a.com", None, &[], &[]).expect("fetch");
        assert_eq!(outcome.found_keywords_from_sets, vec!["set".to_string()]);
    }
}
