//! # Tenant Repository
//!
//! Database operations for tenants, members and payment methods.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Tenant ──cascade──► tenant_members ──cascade──► payment_methods       │
//! │     │                                                                   │
//! │     └──cascade──► payments ──cascade──► payment_splits                 │
//! │     └──cascade──► settlement_logs                                      │
//! │                                                                         │
//! │  Deleting a tenant removes the whole subtree. Individual members       │
//! │  referenced by historical settlement logs cannot be deleted.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use warikan_core::{Member, PaymentMethod, Tenant};

/// Repository for tenant-scoped membership data.
#[derive(Debug, Clone)]
pub struct TenantRepository {
    pool: SqlitePool,
}

impl TenantRepository {
    /// Creates a new TenantRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TenantRepository { pool }
    }

    /// Creates a tenant together with its owner membership, atomically.
    ///
    /// Group formation is one event: a tenant without an owner must never be
    /// observable.
    pub async fn create_tenant(&self, tenant: &Tenant, owner: &Member) -> DbResult<()> {
        debug!(id = %tenant.id, name = %tenant.name, "Creating tenant");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO tenants (id, name, description, currency, created_by, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.description)
        .bind(&tenant.currency)
        .bind(&tenant.created_by)
        .bind(tenant.created_at_ms)
        .bind(tenant.updated_at_ms)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO tenant_members (id, tenant_id, user_id, display_name, role, joined_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&owner.id)
        .bind(&owner.tenant_id)
        .bind(&owner.user_id)
        .bind(&owner.display_name)
        .bind(owner.role)
        .bind(owner.joined_at_ms)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Gets a tenant by ID.
    pub async fn get_tenant(&self, id: &str) -> DbResult<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, description, currency, created_by, created_at_ms, updated_at_ms
            FROM tenants
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    /// Deletes a tenant; the schema cascades to members, payments, splits
    /// and settlement logs.
    pub async fn delete_tenant(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM tenants WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Tenant", id));
        }

        Ok(())
    }

    /// Adds a member to a tenant.
    ///
    /// The UNIQUE(tenant_id, user_id) constraint surfaces as
    /// [`DbError::UniqueViolation`] when the user already holds a membership.
    pub async fn insert_member(&self, member: &Member) -> DbResult<()> {
        debug!(id = %member.id, tenant_id = %member.tenant_id, "Adding member");

        sqlx::query(
            r#"
            INSERT INTO tenant_members (id, tenant_id, user_id, display_name, role, joined_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&member.id)
        .bind(&member.tenant_id)
        .bind(&member.user_id)
        .bind(&member.display_name)
        .bind(member.role)
        .bind(member.joined_at_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a member by ID.
    pub async fn get_member(&self, id: &str) -> DbResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, tenant_id, user_id, display_name, role, joined_at_ms
            FROM tenant_members
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Lists all members of a tenant, ordered by join time then id for a
    /// stable presentation order.
    pub async fn list_members(&self, tenant_id: &str) -> DbResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, tenant_id, user_id, display_name, role, joined_at_ms
            FROM tenant_members
            WHERE tenant_id = ?1
            ORDER BY joined_at_ms, id
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Adds a payment method for a member.
    pub async fn insert_payment_method(&self, method: &PaymentMethod) -> DbResult<()> {
        debug!(id = %method.id, member_id = %method.member_id, "Adding payment method");

        sqlx::query(
            r#"
            INSERT INTO payment_methods
                (id, member_id, method_type, label, account_info, priority, is_active, created_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&method.id)
        .bind(&method.member_id)
        .bind(method.method_type)
        .bind(&method.label)
        .bind(&method.account_info)
        .bind(method.priority)
        .bind(method.is_active)
        .bind(method.created_at_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a payment method by ID.
    pub async fn get_payment_method(&self, id: &str) -> DbResult<Option<PaymentMethod>> {
        let method = sqlx::query_as::<_, PaymentMethod>(
            r#"
            SELECT id, member_id, method_type, label, account_info, priority, is_active, created_at_ms
            FROM payment_methods
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(method)
    }

    /// Lists a member's active payment methods, highest priority first.
    pub async fn list_payment_methods(&self, member_id: &str) -> DbResult<Vec<PaymentMethod>> {
        let methods = sqlx::query_as::<_, PaymentMethod>(
            r#"
            SELECT id, member_id, method_type, label, account_info, priority, is_active, created_at_ms
            FROM payment_methods
            WHERE member_id = ?1 AND is_active = 1
            ORDER BY priority, created_at_ms
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(methods)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use warikan_core::{new_id, PaymentMethodType, Role};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn tenant(id: &str, creator: &str) -> Tenant {
        Tenant {
            id: id.to_string(),
            name: "Trip".to_string(),
            description: None,
            currency: "JPY".to_string(),
            created_by: creator.to_string(),
            created_at_ms: 1,
            updated_at_ms: 1,
        }
    }

    fn member(id: &str, tenant_id: &str, user_id: &str, role: Role) -> Member {
        Member {
            id: id.to_string(),
            tenant_id: tenant_id.to_string(),
            user_id: user_id.to_string(),
            display_name: format!("member {id}"),
            role,
            joined_at_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_create_tenant_with_owner() {
        let db = test_db().await;
        let repo = db.tenants();

        repo.create_tenant(&tenant("t1", "u1"), &member("m1", "t1", "u1", Role::Owner))
            .await
            .unwrap();

        let loaded = repo.get_tenant("t1").await.unwrap().unwrap();
        assert_eq!(loaded.currency, "JPY");
        assert_eq!(loaded.created_by, "u1");

        let members = repo.list_members("t1").await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].role, Role::Owner);
    }

    #[tokio::test]
    async fn test_duplicate_membership_rejected() {
        let db = test_db().await;
        let repo = db.tenants();

        repo.create_tenant(&tenant("t1", "u1"), &member("m1", "t1", "u1", Role::Owner))
            .await
            .unwrap();

        // Same user joining the same tenant again.
        let err = repo
            .insert_member(&member("m2", "t1", "u1", Role::Member))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_delete_tenant_cascades() {
        let db = test_db().await;
        let repo = db.tenants();

        repo.create_tenant(&tenant("t1", "u1"), &member("m1", "t1", "u1", Role::Owner))
            .await
            .unwrap();
        repo.delete_tenant("t1").await.unwrap();

        assert!(repo.get_tenant("t1").await.unwrap().is_none());
        assert!(repo.get_member("m1").await.unwrap().is_none());
        assert!(matches!(
            repo.delete_tenant("t1").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_payment_methods_priority_order() {
        let db = test_db().await;
        let repo = db.tenants();

        repo.create_tenant(&tenant("t1", "u1"), &member("m1", "t1", "u1", Role::Owner))
            .await
            .unwrap();

        for (label, priority, active) in [("Bank", 1, true), ("PayPay", 0, true), ("Old", 0, false)]
        {
            repo.insert_payment_method(&PaymentMethod {
                id: new_id(),
                member_id: "m1".to_string(),
                method_type: PaymentMethodType::Other,
                label: label.to_string(),
                account_info: None,
                priority,
                is_active: active,
                created_at_ms: 1,
            })
            .await
            .unwrap();
        }

        let methods = repo.list_payment_methods("m1").await.unwrap();
        let labels: Vec<&str> = methods.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["PayPay", "Bank"]);
    }
}
