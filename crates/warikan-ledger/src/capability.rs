//! # Capability
//!
//! Explicit actor context for every ledger operation.
//!
//! The external tenant-management collaborator resolves the current identity
//! to a `(tenant_id, member_id, role)` triple and enforces that only members
//! reach the ledger at all; the engine trusts the triple and never performs
//! its own identity resolution. No ambient session state, no request-scoped
//! lookups inside business logic.

use serde::{Deserialize, Serialize};
use warikan_core::Role;

use crate::error::{LedgerError, LedgerResult};

/// A pre-validated actor context, scoped to one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Tenant the actor is operating on.
    pub tenant_id: String,

    /// The actor's member id within that tenant.
    pub member_id: String,

    /// The actor's role within that tenant.
    pub role: Role,
}

impl Capability {
    /// Creates a capability.
    pub fn new(tenant_id: impl Into<String>, member_id: impl Into<String>, role: Role) -> Self {
        Capability {
            tenant_id: tenant_id.into(),
            member_id: member_id.into(),
            role,
        }
    }

    /// Ensures the capability targets the given tenant.
    ///
    /// A capability for another tenant is a forged or stale context, not a
    /// missing entity.
    pub fn ensure_tenant(&self, tenant_id: &str) -> LedgerResult<()> {
        if self.tenant_id != tenant_id {
            return Err(LedgerError::access_denied(format!(
                "capability is scoped to tenant {}, not {}",
                self.tenant_id, tenant_id
            )));
        }
        Ok(())
    }

    /// Ensures the actor may change the tenant's member list (owner/admin).
    pub fn ensure_can_manage_members(&self) -> LedgerResult<()> {
        if !self.role.can_manage_members() {
            return Err(LedgerError::access_denied(
                "managing members requires the owner or admin role",
            ));
        }
        Ok(())
    }

    /// Ensures the actor is one of the given members (operations that must
    /// "involve themselves": settlements, own payment methods).
    pub fn ensure_involves_self(&self, member_ids: &[&str]) -> LedgerResult<()> {
        if !member_ids.contains(&self.member_id.as_str()) {
            return Err(LedgerError::access_denied(
                "operation does not involve the acting member",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_scope() {
        let cap = Capability::new("t1", "m1", Role::Member);
        assert!(cap.ensure_tenant("t1").is_ok());
        assert!(matches!(
            cap.ensure_tenant("t2"),
            Err(LedgerError::AccessDenied { .. })
        ));
    }

    #[test]
    fn test_member_management_roles() {
        assert!(Capability::new("t1", "m1", Role::Owner)
            .ensure_can_manage_members()
            .is_ok());
        assert!(Capability::new("t1", "m1", Role::Admin)
            .ensure_can_manage_members()
            .is_ok());
        assert!(Capability::new("t1", "m1", Role::Member)
            .ensure_can_manage_members()
            .is_err());
    }

    #[test]
    fn test_involves_self() {
        let cap = Capability::new("t1", "m1", Role::Member);
        assert!(cap.ensure_involves_self(&["m1", "m2"]).is_ok());
        assert!(cap.ensure_involves_self(&["m2", "m3"]).is_err());
    }
}
