//! # Payment Repository
//!
//! Database operations for payments and their splits.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_payment (ledger engine)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  allocate() ──► shares summing EXACTLY to the total                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  insert_with_splits() ← payment + all splits in ONE transaction        │
//! │                                                                         │
//! │  A payment without its splits (or with a partial split set) is never   │
//! │  observable, so the sum invariant holds at every commit point.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Read Path
//! The balance calculator depends on "all payments and splits of a tenant";
//! [`PaymentRepository::list_with_splits`] is that explicit query contract,
//! returning fully-typed aggregates instead of implicit relation traversal.

use std::collections::HashMap;

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use warikan_core::{Payment, PaymentSplit, PaymentWithSplits};

/// A split joined with the owning payment's tenant and payer, as needed for
/// settlement precondition checks.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SplitWithContext {
    pub id: String,
    pub payment_id: String,
    pub debtor_member_id: String,
    pub amount_minor: i64,
    pub is_paid: bool,
    pub tenant_id: String,
    pub payer_member_id: String,
}

/// Repository for payment database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Inserts a payment and all of its splits in one transaction.
    ///
    /// The caller (the ledger engine) has already allocated the splits; this
    /// method trusts that they sum to the total and only guarantees
    /// atomicity.
    pub async fn insert_with_splits(
        &self,
        payment: &Payment,
        splits: &[PaymentSplit],
    ) -> DbResult<()> {
        debug!(
            id = %payment.id,
            total_minor = payment.total_minor,
            splits = splits.len(),
            "Inserting payment with splits"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO payments
                (id, tenant_id, payer_member_id, title, total_minor, paid_at_ms, created_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.tenant_id)
        .bind(&payment.payer_member_id)
        .bind(&payment.title)
        .bind(payment.total_minor)
        .bind(payment.paid_at_ms)
        .bind(payment.created_at_ms)
        .execute(&mut *tx)
        .await?;

        for split in splits {
            sqlx::query(
                r#"
                INSERT INTO payment_splits
                    (id, payment_id, debtor_member_id, amount_minor, is_paid, paid_at_ms)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&split.id)
            .bind(&split.payment_id)
            .bind(&split.debtor_member_id)
            .bind(split.amount_minor)
            .bind(split.is_paid)
            .bind(split.paid_at_ms)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets a payment by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, tenant_id, payer_member_id, title, total_minor, paid_at_ms, created_at_ms
            FROM payments
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Gets all splits of a payment.
    pub async fn get_splits(&self, payment_id: &str) -> DbResult<Vec<PaymentSplit>> {
        let splits = sqlx::query_as::<_, PaymentSplit>(
            r#"
            SELECT id, payment_id, debtor_member_id, amount_minor, is_paid, paid_at_ms
            FROM payment_splits
            WHERE payment_id = ?1
            ORDER BY id
            "#,
        )
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(splits)
    }

    /// Gets one split joined with its payment's tenant and payer.
    ///
    /// This is a snapshot read for precondition checks; the recorder
    /// re-validates the paid state inside its transaction.
    pub async fn get_split_with_context(&self, split_id: &str) -> DbResult<SplitWithContext> {
        let split = sqlx::query_as::<_, SplitWithContext>(
            r#"
            SELECT
                s.id,
                s.payment_id,
                s.debtor_member_id,
                s.amount_minor,
                s.is_paid,
                p.tenant_id,
                p.payer_member_id
            FROM payment_splits s
            JOIN payments p ON p.id = s.payment_id
            WHERE s.id = ?1
            "#,
        )
        .bind(split_id)
        .fetch_optional(&self.pool)
        .await?;

        split.ok_or_else(|| DbError::not_found("PaymentSplit", split_id))
    }

    /// Lists every payment of a tenant together with its splits, oldest
    /// first.
    ///
    /// This is the explicit read contract the balance calculator depends on.
    pub async fn list_with_splits(&self, tenant_id: &str) -> DbResult<Vec<PaymentWithSplits>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, tenant_id, payer_member_id, title, total_minor, paid_at_ms, created_at_ms
            FROM payments
            WHERE tenant_id = ?1
            ORDER BY paid_at_ms, id
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        let splits = sqlx::query_as::<_, PaymentSplit>(
            r#"
            SELECT s.id, s.payment_id, s.debtor_member_id, s.amount_minor, s.is_paid, s.paid_at_ms
            FROM payment_splits s
            JOIN payments p ON p.id = s.payment_id
            WHERE p.tenant_id = ?1
            ORDER BY s.id
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        // Group splits under their payments, preserving payment order.
        let mut grouped: HashMap<String, Vec<PaymentSplit>> = HashMap::with_capacity(payments.len());
        for split in splits {
            grouped
                .entry(split.payment_id.clone())
                .or_default()
                .push(split);
        }

        Ok(payments
            .into_iter()
            .map(|payment| {
                let splits = grouped.remove(&payment.id).unwrap_or_default();
                PaymentWithSplits { payment, splits }
            })
            .collect())
    }

    /// Lists a tenant's payments without splits (history view).
    pub async fn list_for_tenant(&self, tenant_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, tenant_id, payer_member_id, title, total_minor, paid_at_ms, created_at_ms
            FROM payments
            WHERE tenant_id = ?1
            ORDER BY paid_at_ms, id
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use warikan_core::{Member, Role, Tenant};

    async fn seeded_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let tenants = db.tenants();

        tenants
            .create_tenant(
                &Tenant {
                    id: "t1".into(),
                    name: "Trip".into(),
                    description: None,
                    currency: "JPY".into(),
                    created_by: "u-a".into(),
                    created_at_ms: 1,
                    updated_at_ms: 1,
                },
                &Member {
                    id: "a".into(),
                    tenant_id: "t1".into(),
                    user_id: "u-a".into(),
                    display_name: "A".into(),
                    role: Role::Owner,
                    joined_at_ms: 1,
                },
            )
            .await
            .unwrap();

        for (id, user) in [("b", "u-b"), ("c", "u-c")] {
            tenants
                .insert_member(&Member {
                    id: id.into(),
                    tenant_id: "t1".into(),
                    user_id: user.into(),
                    display_name: id.to_uppercase(),
                    role: Role::Member,
                    joined_at_ms: 2,
                })
                .await
                .unwrap();
        }

        db
    }

    fn payment(id: &str, payer: &str, total: i64, paid_at_ms: i64) -> Payment {
        Payment {
            id: id.into(),
            tenant_id: "t1".into(),
            payer_member_id: payer.into(),
            title: "Dinner".into(),
            total_minor: total,
            paid_at_ms,
            created_at_ms: paid_at_ms,
        }
    }

    fn split(id: &str, payment_id: &str, debtor: &str, amount: i64) -> PaymentSplit {
        PaymentSplit {
            id: id.into(),
            payment_id: payment_id.into(),
            debtor_member_id: debtor.into(),
            amount_minor: amount,
            is_paid: false,
            paid_at_ms: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_aggregate() {
        let db = seeded_db().await;
        let repo = db.payments();

        repo.insert_with_splits(
            &payment("p1", "a", 100, 10),
            &[
                split("s1", "p1", "a", 34),
                split("s2", "p1", "b", 33),
                split("s3", "p1", "c", 33),
            ],
        )
        .await
        .unwrap();

        let aggregates = repo.list_with_splits("t1").await.unwrap();
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].splits.len(), 3);
        assert_eq!(
            aggregates[0].splits_total().unwrap(),
            aggregates[0].payment.total()
        );
    }

    #[tokio::test]
    async fn test_list_orders_by_paid_at() {
        let db = seeded_db().await;
        let repo = db.payments();

        repo.insert_with_splits(&payment("p2", "a", 50, 20), &[split("s2", "p2", "b", 50)])
            .await
            .unwrap();
        repo.insert_with_splits(&payment("p1", "b", 70, 10), &[split("s1", "p1", "a", 70)])
            .await
            .unwrap();

        let payments = repo.list_for_tenant("t1").await.unwrap();
        let ids: Vec<&str> = payments.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_split_with_context() {
        let db = seeded_db().await;
        let repo = db.payments();

        repo.insert_with_splits(&payment("p1", "a", 40, 10), &[split("s1", "p1", "b", 40)])
            .await
            .unwrap();

        let ctx = repo.get_split_with_context("s1").await.unwrap();
        assert_eq!(ctx.tenant_id, "t1");
        assert_eq!(ctx.payer_member_id, "a");
        assert_eq!(ctx.debtor_member_id, "b");
        assert!(!ctx.is_paid);

        assert!(matches!(
            repo.get_split_with_context("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_payer_rejected_by_foreign_key() {
        let db = seeded_db().await;
        let repo = db.payments();

        let err = repo
            .insert_with_splits(&payment("p1", "ghost", 10, 1), &[split("s1", "p1", "b", 10)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
