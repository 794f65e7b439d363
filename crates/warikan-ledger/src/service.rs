//! # Ledger Service
//!
//! The engine facade: every operation a presentation layer may perform
//! against a tenant's ledger, behind explicit capability checks.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every operation follows the same shape:                                │
//! │                                                                         │
//! │  1. validate input shape        (warikan-core::validation)             │
//! │  2. check the capability        (tenant scope, role, involvement)      │
//! │  3. load state / run pure logic (allocate, compute_balances, plan)     │
//! │  4. persist atomically          (warikan-db repositories)              │
//! │                                                                         │
//! │  Balances are NEVER stored: get_balances recomputes them from the      │
//! │  payment/split rows on every call, so there is no materialized         │
//! │  counter to drift out of sync.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Idempotent Settlement
//! `record_settlement` deduplicates on the caller-supplied idempotency key:
//! a retry carrying the same key and the same payload returns the original
//! log without touching any split a second time; the same key with a
//! *different* payload is a [`ConflictError::IdempotencyKeyReuse`].

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use warikan_core::{
    allocate, compute_balances, new_id, plan,
    validation::{
        validate_name, validate_note, validate_participants, validate_positive_amount,
        validate_target_splits, validate_title,
    },
    AllocationMode, ArithmeticError, HistoryEntry, Member, Money, Payment, PaymentMethod,
    PaymentMethodType, PaymentSplit, PaymentWithSplits, Role, SettlementLog, Tenant, Transfer,
    ValidationError,
};
use warikan_db::{Database, DbError};

use crate::capability::Capability;
use crate::error::{ConflictError, LedgerError, LedgerResult};

/// Current wall-clock time as epoch milliseconds.
fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// =============================================================================
// Operation Inputs
// =============================================================================

/// Input for [`Ledger::create_payment`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentInput {
    /// Member who fronted the money.
    pub payer_member_id: String,

    /// What was paid for.
    pub title: String,

    /// Total amount, strictly positive.
    pub total: Money,

    /// When the expense happened; defaults to now.
    pub paid_at_ms: Option<i64>,

    /// Debtor members, in allocation order. No duplicates.
    pub participants: Vec<String>,

    /// How the total is divided among the participants.
    pub mode: AllocationMode,
}

/// Input for [`Ledger::record_settlement`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSettlementInput {
    /// The transfer being settled, usually taken from a plan.
    pub transfer: Transfer,

    /// The splits this transfer discharges. Their amounts must sum to the
    /// transfer amount exactly.
    pub target_splits: Vec<String>,

    /// Optional payment method used, owned by either party.
    pub payment_method_id: Option<String>,

    pub note: Option<String>,

    /// Caller-supplied key making retries safe.
    pub idempotency_key: String,
}

// =============================================================================
// Ledger
// =============================================================================

/// The ledger engine.
///
/// Cheap to clone; all state lives in the store.
#[derive(Debug, Clone)]
pub struct Ledger {
    db: Database,
}

impl Ledger {
    /// Creates a ledger over an open database.
    pub fn new(db: Database) -> Self {
        Ledger { db }
    }

    // =========================================================================
    // Tenant & Membership
    // =========================================================================

    /// Creates a tenant with the caller as its owner, atomically.
    ///
    /// Returns the tenant and the owner's membership; the caller derives its
    /// capability from the latter.
    pub async fn create_tenant(
        &self,
        user_id: &str,
        display_name: &str,
        name: &str,
        description: Option<&str>,
        currency: &str,
    ) -> LedgerResult<(Tenant, Member)> {
        if user_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "user_id".to_string(),
            }
            .into());
        }
        let name = validate_name("name", name)?;
        let display_name = validate_name("display_name", display_name)?;
        let currency = validate_name("currency", currency)?;
        let description = validate_note(description)?;

        let now = now_ms();
        let tenant = Tenant {
            id: new_id(),
            name,
            description,
            currency,
            created_by: user_id.to_string(),
            created_at_ms: now,
            updated_at_ms: now,
        };
        let owner = Member {
            id: new_id(),
            tenant_id: tenant.id.clone(),
            user_id: user_id.to_string(),
            display_name,
            role: Role::Owner,
            joined_at_ms: now,
        };

        self.db.tenants().create_tenant(&tenant, &owner).await?;
        info!(tenant_id = %tenant.id, owner = %owner.id, "Created tenant");
        Ok((tenant, owner))
    }

    /// Adds a member to a tenant. Requires the owner or admin role.
    ///
    /// The owner role cannot be granted: a tenant has exactly one owner, set
    /// at creation.
    pub async fn add_member(
        &self,
        cap: &Capability,
        tenant_id: &str,
        user_id: &str,
        display_name: &str,
        role: Role,
    ) -> LedgerResult<Member> {
        cap.ensure_tenant(tenant_id)?;
        cap.ensure_can_manage_members()?;
        if role == Role::Owner {
            return Err(LedgerError::access_denied(
                "the owner role is assigned at tenant creation and cannot be granted",
            ));
        }
        if user_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "user_id".to_string(),
            }
            .into());
        }
        let display_name = validate_name("display_name", display_name)?;

        self.require_tenant(tenant_id).await?;

        let member = Member {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            user_id: user_id.to_string(),
            display_name,
            role,
            joined_at_ms: now_ms(),
        };

        match self.db.tenants().insert_member(&member).await {
            Ok(()) => {
                info!(tenant_id, member_id = %member.id, "Added member");
                Ok(member)
            }
            Err(DbError::UniqueViolation { .. }) => Err(ValidationError::Duplicate {
                field: "membership".to_string(),
                value: user_id.to_string(),
            }
            .into()),
            Err(other) => Err(other.into()),
        }
    }

    /// Lists a tenant's members in join order.
    pub async fn list_members(
        &self,
        cap: &Capability,
        tenant_id: &str,
    ) -> LedgerResult<Vec<Member>> {
        cap.ensure_tenant(tenant_id)?;
        self.require_tenant(tenant_id).await?;
        Ok(self.db.tenants().list_members(tenant_id).await?)
    }

    // =========================================================================
    // Payment Methods
    // =========================================================================

    /// Registers a payment method for the acting member.
    pub async fn add_payment_method(
        &self,
        cap: &Capability,
        member_id: &str,
        method_type: PaymentMethodType,
        label: &str,
        account_info: Option<String>,
        priority: i64,
    ) -> LedgerResult<PaymentMethod> {
        cap.ensure_involves_self(&[member_id])?;
        let label = validate_name("label", label)?;
        self.require_member(cap, member_id).await?;

        let method = PaymentMethod {
            id: new_id(),
            member_id: member_id.to_string(),
            method_type,
            label,
            account_info,
            priority,
            is_active: true,
            created_at_ms: now_ms(),
        };
        self.db.tenants().insert_payment_method(&method).await?;
        Ok(method)
    }

    /// Lists a fellow member's active payment methods, highest priority
    /// first. Visible to anyone in the same tenant (you need them to pay).
    pub async fn list_payment_methods(
        &self,
        cap: &Capability,
        member_id: &str,
    ) -> LedgerResult<Vec<PaymentMethod>> {
        self.require_member(cap, member_id).await?;
        Ok(self.db.tenants().list_payment_methods(member_id).await?)
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Records an expense and allocates it into splits, atomically.
    ///
    /// The actor must be the payer, a participant, or hold a
    /// member-management role (owner/admin entering expenses on behalf of
    /// others).
    pub async fn create_payment(
        &self,
        cap: &Capability,
        tenant_id: &str,
        input: CreatePaymentInput,
    ) -> LedgerResult<PaymentWithSplits> {
        cap.ensure_tenant(tenant_id)?;

        let title = validate_title(&input.title)?;
        validate_positive_amount("total", input.total)?;
        validate_participants(&input.participants)?;

        let involved = cap.member_id == input.payer_member_id
            || input.participants.contains(&cap.member_id)
            || cap.role.can_manage_members();
        if !involved {
            return Err(LedgerError::access_denied(
                "payment must involve the acting member",
            ));
        }

        // One membership read covers the payer and every participant.
        let members = self.db.tenants().list_members(tenant_id).await?;
        let known: HashSet<&str> = members.iter().map(|m| m.id.as_str()).collect();
        if !known.contains(input.payer_member_id.as_str()) {
            return Err(LedgerError::not_found("Member", &input.payer_member_id));
        }
        for participant in &input.participants {
            if !known.contains(participant.as_str()) {
                return Err(LedgerError::not_found("Member", participant));
            }
        }

        let shares = allocate(input.total, &input.participants, &input.mode)?;

        let now = now_ms();
        let payment = Payment {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            payer_member_id: input.payer_member_id,
            title,
            total_minor: input.total.minor(),
            paid_at_ms: input.paid_at_ms.unwrap_or(now),
            created_at_ms: now,
        };
        let splits: Vec<PaymentSplit> = shares
            .into_iter()
            .map(|(debtor_member_id, amount)| PaymentSplit {
                id: new_id(),
                payment_id: payment.id.clone(),
                debtor_member_id,
                amount_minor: amount.minor(),
                is_paid: false,
                paid_at_ms: None,
            })
            .collect();

        self.db.payments().insert_with_splits(&payment, &splits).await?;
        info!(
            tenant_id,
            payment_id = %payment.id,
            total_minor = payment.total_minor,
            splits = splits.len(),
            "Created payment"
        );
        Ok(PaymentWithSplits { payment, splits })
    }

    // =========================================================================
    // Balances & Planning
    // =========================================================================

    /// Computes every member's net position from scratch.
    ///
    /// Positive means the tenant owes the member, negative means the member
    /// owes the tenant. The values always sum to zero.
    pub async fn get_balances(
        &self,
        cap: &Capability,
        tenant_id: &str,
    ) -> LedgerResult<BTreeMap<String, Money>> {
        cap.ensure_tenant(tenant_id)?;
        self.require_tenant(tenant_id).await?;

        let members = self.db.tenants().list_members(tenant_id).await?;
        let member_ids: Vec<String> = members.into_iter().map(|m| m.id).collect();
        let payments = self.db.payments().list_with_splits(tenant_id).await?;

        Ok(compute_balances(&member_ids, &payments)?)
    }

    /// Proposes a small set of transfers that settles all balances.
    ///
    /// Purely advisory: nothing is recorded until a transfer is passed to
    /// [`Ledger::record_settlement`].
    pub async fn plan_settlement(
        &self,
        cap: &Capability,
        tenant_id: &str,
    ) -> LedgerResult<Vec<Transfer>> {
        let balances = self.get_balances(cap, tenant_id).await?;
        let transfers = plan(&balances)?;
        debug!(tenant_id, transfers = transfers.len(), "Planned settlement");
        Ok(transfers)
    }

    // =========================================================================
    // Settlement Recording
    // =========================================================================

    /// Records a settled transfer, marking its target splits paid.
    ///
    /// ## Rules
    /// - The actor must be the paying or receiving member.
    /// - Every target split must be owed by `transfer.from`, belong to a
    ///   payment fronted by `transfer.to`, and still be unpaid.
    /// - The split amounts must sum exactly to the transfer amount.
    ///
    /// Retrying with the same idempotency key and payload returns the
    /// original log; reusing the key with a different payload is a conflict.
    pub async fn record_settlement(
        &self,
        cap: &Capability,
        tenant_id: &str,
        input: RecordSettlementInput,
    ) -> LedgerResult<SettlementLog> {
        cap.ensure_tenant(tenant_id)?;

        validate_positive_amount("amount", input.transfer.amount)?;
        if input.transfer.from == input.transfer.to {
            return Err(ValidationError::SelfTransfer {
                member_id: input.transfer.from.clone(),
            }
            .into());
        }
        validate_target_splits(&input.target_splits)?;
        let note = validate_note(input.note.as_deref())?;
        if input.idempotency_key.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "idempotency_key".to_string(),
            }
            .into());
        }

        cap.ensure_involves_self(&[input.transfer.from.as_str(), input.transfer.to.as_str()])?;

        // Fast path: a previous attempt with this key already went through.
        if let Some(existing) = self
            .db
            .settlements()
            .find_by_idempotency_key(&input.idempotency_key)
            .await?
        {
            return self.verify_replay(cap, existing, &input).await;
        }

        self.require_member(cap, &input.transfer.from).await?;
        self.require_member(cap, &input.transfer.to).await?;

        if let Some(method_id) = &input.payment_method_id {
            let method = self
                .db
                .tenants()
                .get_payment_method(method_id)
                .await?
                .ok_or_else(|| LedgerError::not_found("PaymentMethod", method_id))?;
            if method.member_id != input.transfer.from && method.member_id != input.transfer.to {
                return Err(LedgerError::not_found("PaymentMethod", method_id));
            }
        }

        // Snapshot precondition checks. The recorder re-validates the paid
        // state inside its transaction; these reads exist to fail with the
        // precise taxonomy error instead of a bare conflict.
        let mut sum = Money::zero();
        for split_id in &input.target_splits {
            let ctx = self.db.payments().get_split_with_context(split_id).await?;
            if ctx.tenant_id != tenant_id {
                return Err(LedgerError::not_found("PaymentSplit", split_id));
            }
            if ctx.debtor_member_id != input.transfer.from {
                return Err(ValidationError::SplitDebtorMismatch {
                    split_id: split_id.clone(),
                    debtor_member_id: ctx.debtor_member_id,
                    expected_member_id: input.transfer.from.clone(),
                }
                .into());
            }
            if ctx.payer_member_id != input.transfer.to {
                return Err(ValidationError::SplitPayeeMismatch {
                    split_id: split_id.clone(),
                    payer_member_id: ctx.payer_member_id,
                    expected_member_id: input.transfer.to.clone(),
                }
                .into());
            }
            if ctx.is_paid {
                return Err(ConflictError::SplitAlreadySettled {
                    split_id: split_id.clone(),
                }
                .into());
            }
            sum = sum
                .checked_add(Money::from_minor(ctx.amount_minor))
                .ok_or(ArithmeticError::Overflow {
                    context: "settlement amount sum",
                })?;
        }
        if sum != input.transfer.amount {
            return Err(ValidationError::SplitSumMismatch {
                expected_minor: input.transfer.amount.minor(),
                actual_minor: sum.minor(),
                delta_minor: sum.minor() - input.transfer.amount.minor(),
            }
            .into());
        }

        let log = SettlementLog {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            from_member_id: input.transfer.from.clone(),
            to_member_id: input.transfer.to.clone(),
            amount_minor: input.transfer.amount.minor(),
            payment_method_id: input.payment_method_id.clone(),
            note,
            idempotency_key: input.idempotency_key.clone(),
            settled_at_ms: now_ms(),
        };

        match self.db.settlements().record(&log, &input.target_splits).await {
            Ok(()) => {
                info!(
                    tenant_id,
                    settlement_id = %log.id,
                    from = %log.from_member_id,
                    to = %log.to_member_id,
                    amount_minor = log.amount_minor,
                    "Recorded settlement"
                );
                Ok(log)
            }
            // Lost the insert race on the key: another request with the same
            // key committed between our fast path and the transaction.
            Err(DbError::UniqueViolation { .. }) => {
                match self
                    .db
                    .settlements()
                    .find_by_idempotency_key(&input.idempotency_key)
                    .await?
                {
                    Some(existing) => self.verify_replay(cap, existing, &input).await,
                    None => Err(ConflictError::IdempotencyKeyReuse {
                        key: input.idempotency_key.clone(),
                    }
                    .into()),
                }
            }
            Err(other) => Err(other.into()),
        }
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Returns the tenant's payments and settlements as one chronological
    /// stream, oldest first, ties broken by entity id.
    pub async fn get_history(
        &self,
        cap: &Capability,
        tenant_id: &str,
    ) -> LedgerResult<Vec<HistoryEntry>> {
        cap.ensure_tenant(tenant_id)?;
        self.require_tenant(tenant_id).await?;

        let payments = self.db.payments().list_for_tenant(tenant_id).await?;
        let logs = self.db.settlements().list_for_tenant(tenant_id).await?;

        let mut entries: Vec<HistoryEntry> = payments
            .into_iter()
            .map(HistoryEntry::Payment)
            .chain(logs.into_iter().map(HistoryEntry::Settlement))
            .collect();
        entries.sort_by(|a, b| {
            a.timestamp_ms()
                .cmp(&b.timestamp_ms())
                .then_with(|| a.entry_id().cmp(b.entry_id()))
        });
        Ok(entries)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Fails with NotFound when the tenant no longer exists (stale
    /// capability after a delete).
    async fn require_tenant(&self, tenant_id: &str) -> LedgerResult<Tenant> {
        self.db
            .tenants()
            .get_tenant(tenant_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Tenant", tenant_id))
    }

    /// Loads a member and checks it belongs to the capability's tenant.
    /// Members of other tenants are simply not visible.
    async fn require_member(&self, cap: &Capability, member_id: &str) -> LedgerResult<Member> {
        self.db
            .tenants()
            .get_member(member_id)
            .await?
            .filter(|m| m.tenant_id == cap.tenant_id)
            .ok_or_else(|| LedgerError::not_found("Member", member_id))
    }

    /// Decides whether an existing log under the requested key is a
    /// legitimate replay (same payload, return it) or key reuse (conflict).
    async fn verify_replay(
        &self,
        cap: &Capability,
        existing: SettlementLog,
        input: &RecordSettlementInput,
    ) -> LedgerResult<SettlementLog> {
        let reuse = || -> LedgerError {
            ConflictError::IdempotencyKeyReuse {
                key: input.idempotency_key.clone(),
            }
            .into()
        };

        if existing.tenant_id != cap.tenant_id
            || existing.from_member_id != input.transfer.from
            || existing.to_member_id != input.transfer.to
            || existing.amount_minor != input.transfer.amount.minor()
        {
            return Err(reuse());
        }

        let recorded = self.db.settlements().split_ids_for_log(&existing.id).await?;
        let mut requested = input.target_splits.clone();
        requested.sort();
        if recorded != requested {
            return Err(reuse());
        }

        debug!(settlement_id = %existing.id, "Idempotent settlement replay");
        Ok(existing)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
