//! # Settlement Repository
//!
//! Storage side of the settlement recorder: the only code that may flip a
//! split's paid flag.
//!
//! ## The Race It Guards
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two clients settle the same split concurrently                         │
//! │                                                                         │
//! │  Client 1: read split (unpaid) ──────────┐                             │
//! │  Client 2: read split (unpaid) ────┐     │                             │
//! │                                    │     ▼                             │
//! │                                    │  TX1: UPDATE ... WHERE is_paid=0  │
//! │                                    │       → 1 row, commit ✓           │
//! │                                    ▼                                   │
//! │                                 TX2: UPDATE ... WHERE is_paid=0        │
//! │                                      → 0 rows → ROLLBACK, Conflict     │
//! │                                                                         │
//! │  The compare-and-set runs against the authoritative row, not against   │
//! │  a value read earlier in the request. No silent overwrite, no lost     │
//! │  update; the split ends paid exactly once.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use warikan_core::SettlementLog;

/// Repository for settlement log operations.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    pool: SqlitePool,
}

impl SettlementRepository {
    /// Creates a new SettlementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettlementRepository { pool }
    }

    /// Records a settlement atomically.
    ///
    /// Within one transaction:
    /// 1. appends the settlement log row (the UNIQUE idempotency key makes a
    ///    concurrent duplicate fail here),
    /// 2. marks every target split paid with a compare-and-set
    ///    (`... WHERE id = ? AND is_paid = 0`),
    /// 3. links the discharged splits to the log.
    ///
    /// If any split was settled in the meantime, the whole transaction rolls
    /// back with [`DbError::Conflict`] and nothing is persisted.
    pub async fn record(&self, log: &SettlementLog, split_ids: &[String]) -> DbResult<()> {
        debug!(
            id = %log.id,
            from = %log.from_member_id,
            to = %log.to_member_id,
            amount_minor = log.amount_minor,
            splits = split_ids.len(),
            "Recording settlement"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO settlement_logs
                (id, tenant_id, from_member_id, to_member_id, amount_minor,
                 payment_method_id, note, idempotency_key, settled_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&log.id)
        .bind(&log.tenant_id)
        .bind(&log.from_member_id)
        .bind(&log.to_member_id)
        .bind(log.amount_minor)
        .bind(&log.payment_method_id)
        .bind(&log.note)
        .bind(&log.idempotency_key)
        .bind(log.settled_at_ms)
        .execute(&mut *tx)
        .await?;

        for split_id in split_ids {
            // Compare-and-set against the authoritative row. Zero rows means
            // the split settled concurrently (or vanished); either way the
            // precondition no longer holds.
            let result = sqlx::query(
                r#"
                UPDATE payment_splits
                SET is_paid = 1, paid_at_ms = ?2
                WHERE id = ?1 AND is_paid = 0
                "#,
            )
            .bind(split_id)
            .bind(log.settled_at_ms)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Dropping tx rolls back, but be explicit about it.
                tx.rollback().await?;
                return Err(DbError::conflict("PaymentSplit", split_id));
            }

            sqlx::query(
                r#"
                INSERT INTO settlement_log_splits (settlement_log_id, split_id)
                VALUES (?1, ?2)
                "#,
            )
            .bind(&log.id)
            .bind(split_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Looks up a settlement log by its idempotency key.
    pub async fn find_by_idempotency_key(&self, key: &str) -> DbResult<Option<SettlementLog>> {
        let log = sqlx::query_as::<_, SettlementLog>(
            r#"
            SELECT id, tenant_id, from_member_id, to_member_id, amount_minor,
                   payment_method_id, note, idempotency_key, settled_at_ms
            FROM settlement_logs
            WHERE idempotency_key = ?1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(log)
    }

    /// Returns the ids of the splits a settlement log discharged, sorted.
    pub async fn split_ids_for_log(&self, log_id: &str) -> DbResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT split_id
            FROM settlement_log_splits
            WHERE settlement_log_id = ?1
            ORDER BY split_id
            "#,
        )
        .bind(log_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Lists a tenant's settlement logs, oldest first.
    pub async fn list_for_tenant(&self, tenant_id: &str) -> DbResult<Vec<SettlementLog>> {
        let logs = sqlx::query_as::<_, SettlementLog>(
            r#"
            SELECT id, tenant_id, from_member_id, to_member_id, amount_minor,
                   payment_method_id, note, idempotency_key, settled_at_ms
            FROM settlement_logs
            WHERE tenant_id = ?1
            ORDER BY settled_at_ms, id
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use warikan_core::{Member, Payment, PaymentSplit, Role, Tenant};

    async fn seeded_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let tenants = db.tenants();

        tenants
            .create_tenant(
                &Tenant {
                    id: "t1".into(),
                    name: "Flat".into(),
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
        tenants
            .insert_member(&Member {
                id: "b".into(),
                tenant_id: "t1".into(),
                user_id: "u-b".into(),
                display_name: "B".into(),
                role: Role::Member,
                joined_at_ms: 2,
            })
            .await
            .unwrap();

        db.payments()
            .insert_with_splits(
                &Payment {
                    id: "p1".into(),
                    tenant_id: "t1".into(),
                    payer_member_id: "a".into(),
                    title: "Rent".into(),
                    total_minor: 100,
                    paid_at_ms: 10,
                    created_at_ms: 10,
                },
                &[
                    PaymentSplit {
                        id: "s1".into(),
                        payment_id: "p1".into(),
                        debtor_member_id: "b".into(),
                        amount_minor: 60,
                        is_paid: false,
                        paid_at_ms: None,
                    },
                    PaymentSplit {
                        id: "s2".into(),
                        payment_id: "p1".into(),
                        debtor_member_id: "a".into(),
                        amount_minor: 40,
                        is_paid: false,
                        paid_at_ms: None,
                    },
                ],
            )
            .await
            .unwrap();

        db
    }

    fn log(id: &str, key: &str, amount: i64) -> SettlementLog {
        SettlementLog {
            id: id.into(),
            tenant_id: "t1".into(),
            from_member_id: "b".into(),
            to_member_id: "a".into(),
            amount_minor: amount,
            payment_method_id: None,
            note: None,
            idempotency_key: key.into(),
            settled_at_ms: 100,
        }
    }

    #[tokio::test]
    async fn test_record_marks_split_paid_once() {
        let db = seeded_db().await;
        let repo = db.settlements();

        repo.record(&log("l1", "k1", 60), &["s1".into()]).await.unwrap();

        let splits = db.payments().get_splits("p1").await.unwrap();
        let s1 = splits.iter().find(|s| s.id == "s1").unwrap();
        assert!(s1.is_paid);
        assert_eq!(s1.paid_at_ms, Some(100));

        // Settling the same split again conflicts and persists nothing.
        let err = repo
            .record(&log("l2", "k2", 60), &["s1".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
        assert!(repo.find_by_idempotency_key("k2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_conflict_rolls_back_whole_transaction() {
        let db = seeded_db().await;
        let repo = db.settlements();

        repo.record(&log("l1", "k1", 60), &["s1".into()]).await.unwrap();

        // s2 is still unpaid, but the batch includes the settled s1:
        // nothing from the batch may stick.
        let err = repo
            .record(&log("l2", "k2", 100), &["s2".into(), "s1".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));

        let splits = db.payments().get_splits("p1").await.unwrap();
        let s2 = splits.iter().find(|s| s.id == "s2").unwrap();
        assert!(!s2.is_paid);
    }

    #[tokio::test]
    async fn test_duplicate_idempotency_key_rejected() {
        let db = seeded_db().await;
        let repo = db.settlements();

        repo.record(&log("l1", "k1", 60), &["s1".into()]).await.unwrap();

        let err = repo
            .record(&log("l2", "k1", 40), &["s2".into()])
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());

        // The split from the failed attempt stays unpaid.
        let splits = db.payments().get_splits("p1").await.unwrap();
        assert!(!splits.iter().find(|s| s.id == "s2").unwrap().is_paid);
    }

    #[tokio::test]
    async fn test_lookup_and_listing() {
        let db = seeded_db().await;
        let repo = db.settlements();

        repo.record(&log("l1", "k1", 60), &["s1".into()]).await.unwrap();

        let found = repo.find_by_idempotency_key("k1").await.unwrap().unwrap();
        assert_eq!(found.id, "l1");
        assert_eq!(repo.split_ids_for_log("l1").await.unwrap(), vec!["s1"]);

        let logs = repo.list_for_tenant("t1").await.unwrap();
        assert_eq!(logs.len(), 1);
        assert!(repo.list_for_tenant("t2").await.unwrap().is_empty());
    }
}
