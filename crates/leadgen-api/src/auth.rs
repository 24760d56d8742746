// crates/leadgen-api/src/auth.rs
// ============================================================================
// Module: Request Identity Extraction
// Description: Builds an orchestrator `RequestContext` from inbound headers.
// Purpose: Fail closed when the caller identity is missing or malformed,
// deriving a request context straight from headers rather than trusting
// a session.
// Dependencies: axum, leadgen_orchestrator, uuid
// ============================================================================

//! ## Overview
//! There is no session layer here: every request asserts its own identity via
//! `X-Owner-Id` and, optionally, `X-Roles`. A reverse proxy terminating real
//! authentication is expected to set these headers; this module only parses
//! and fails closed, it does not authenticate.

use axum::http::HeaderMap;
use leadgen_orchestrator::RequestContext;
use leadgen_core::OwnerId;
use uuid::Uuid;

const OWNER_HEADER: &str = "x-owner-id";
const ROLES_HEADER: &str = "x-roles";
const ADMIN_ROLES: [&str; 2] = ["admin", "super_admin"];

/// Builds the dispatch-layer request context from `headers`.
///
/// # Errors
///
/// Returns a message describing the missing or malformed header.
pub fn extract(headers: &HeaderMap) -> Result<RequestContext, String> {
    let owner_header = headers
        .get(OWNER_HEADER)
        .ok_or_else(|| format!("missing {OWNER_HEADER} header"))?
        .to_str()
        .map_err(|_| format!("{OWNER_HEADER} header is not valid utf-8"))?;
    let owner_uuid = Uuid::parse_str(owner_header).map_err(|_| format!("{OWNER_HEADER} header is not a uuid"))?;
    let has_admin_role = headers
        .get(ROLES_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.split(',').map(str::trim).any(|role| ADMIN_ROLES.contains(&role)));
    Ok(RequestContext {
        caller: OwnerId::new(owner_uuid),
        has_admin_role,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with(owner: &str, roles: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(OWNER_HEADER, HeaderValue::from_str(owner).expect("header value"));
        if let Some(roles) = roles {
            headers.insert(ROLES_HEADER, HeaderValue::from_str(roles).expect("header value"));
        }
        headers
    }

    #[test]
    fn requires_owner_header() {
        assert!(extract(&HeaderMap::new()).is_err());
    }

    #[test]
    fn rejects_non_uuid_owner() {
        assert!(extract(&headers_with("not-a-uuid", None)).is_err());
    }

    #[test]
    fn recognizes_admin_role() {
        let context = extract(&headers_with("0e3f4b2a-6b8e-4f3e-9f0a-1c2d3e4f5061", Some("member, admin"))).expect("context");
        assert!(context.has_admin_role);
    }

    #[test]
    fn defaults_to_non_admin() {
        let context = extract(&headers_with("0e3f4b2a-6b8e-4f3e-9f0a-1c2d3e4f5061", None)).expect("context");
        assert!(!context.has_admin_role);
    }
}
