// crates/leadgen-core/src/core/access.rs
// ============================================================================
// Module: Access Predicate
// Description: Ownership + role predicate consumed by the orchestrator.
// Purpose: Decide whether a caller may act on a campaign without disclosing
// the existence of campaigns they cannot access.
// Dependencies: crate::core::identifiers
// ============================================================================

//! ## Overview
//! [`evaluate_access`] is a pure function over a caller's roles and a
//! campaign's recorded owner; it does not perform any lookup itself. Callers
//! supply `campaign_owner: Option<OwnerId>` (`None` meaning "campaign not
//! found", indistinguishable from "not owned by this caller")
//! and receive an [`AccessDecision`] or an [`AccessError`].

use crate::core::identifiers::OwnerId;

/// Action being authorized against a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignAction {
    /// Read campaign details or results.
    Read,
    /// Mutate campaign or phase state.
    Write,
    /// Transfer campaign ownership (admin-only).
    TransferOwnership,
}

/// Inputs to the access predicate.
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest {
    /// Caller identifier.
    pub caller: OwnerId,
    /// Action being attempted.
    pub action: CampaignAction,
    /// True when the caller holds `admin` or `super_admin`.
    pub has_admin_role: bool,
}

/// Successful access predicate outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    /// True when the caller is the recorded owner.
    pub is_owner: bool,
    /// True when the caller holds an admin role.
    pub has_admin: bool,
}

/// Access predicate errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// Campaign does not exist (admin caller; existence may be disclosed).
    CampaignNotFound,
    /// Campaign does not exist, or exists but is not owned by the caller
    /// (deliberately indistinguishable).
    CampaignNotFoundOrAccessDenied,
    /// Action requires the admin role.
    AdminRequired,
}

/// Evaluates the access predicate for a campaign lookup.
///
/// `campaign_owner` is `None` when the campaign does not exist (for admin
/// callers) or was excluded by an owner-scoped lookup (for non-admin
/// callers) — the caller of this function is responsible for performing the
/// right kind of lookup per rule 1/2 before calling this.
///
/// # Errors
///
/// Returns [`AccessError::CampaignNotFound`] or
/// [`AccessError::CampaignNotFoundOrAccessDenied`] when `campaign_owner` is
/// `None`, and [`AccessError::AdminRequired`] when a
/// [`CampaignAction::TransferOwnership`] is attempted without the admin
/// role.
pub fn evaluate_access(
    request: AccessRequest,
    campaign_owner: Option<OwnerId>,
) -> Result<AccessDecision, AccessError> {
    if request.action == CampaignAction::TransferOwnership && !request.has_admin_role {
        return Err(AccessError::AdminRequired);
    }
    if request.has_admin_role {
        return match campaign_owner {
            Some(_) => Ok(AccessDecision {
                is_owner: campaign_owner == Some(request.caller),
                has_admin: true,
            }),
            None => Err(AccessError::CampaignNotFound),
        };
    }
    match campaign_owner {
        Some(owner) if owner == request.caller => Ok(AccessDecision {
            is_owner: true,
            has_admin: false,
        }),
        _ => Err(AccessError::CampaignNotFoundOrAccessDenied),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn owner(n: u128) -> OwnerId {
        OwnerId::new(Uuid::from_u128(n))
    }

    #[test]
    fn admin_sees_missing_campaign_distinctly() {
        let request = AccessRequest {
            caller: owner(1),
            action: CampaignAction::Read,
            has_admin_role: true,
        };
        assert_eq!(
            evaluate_access(request, None),
            Err(AccessError::CampaignNotFound)
        );
    }

    #[test]
    fn non_owner_non_admin_gets_generic_denial() {
        let request = AccessRequest {
            caller: owner(1),
            action: CampaignAction::Read,
            has_admin_role: false,
        };
        assert_eq!(
            evaluate_access(request, Some(owner(2))),
            Err(AccessError::CampaignNotFoundOrAccessDenied)
        );
    }

    #[test]
    fn owner_is_allowed() {
        let request = AccessRequest {
            caller: owner(1),
            action: CampaignAction::Write,
            has_admin_role: false,
        };
        let decision = evaluate_access(request, Some(owner(1))).expect("allowed");
        assert!(decision.is_owner);
        assert!(!decision.has_admin);
    }

    #[test]
    fn ownership_transfer_requires_admin() {
        let request = AccessRequest {
            caller: owner(1),
            action: CampaignAction::TransferOwnership,
            has_admin_role: false,
        };
        assert_eq!(
            evaluate_access(request, Some(owner(1))),
            Err(AccessError::AdminRequired)
        );
    }
}
