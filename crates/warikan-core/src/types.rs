//! # Domain Types
//!
//! Core domain types used throughout the Warikan ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Tenant ──owns──► Member ──owns──► PaymentMethod                       │
//! │     │                                                                   │
//! │     └────owns──► Payment ──owns──► PaymentSplit                        │
//! │                                        ▲                                │
//! │                                        │ discharged by (at most one)    │
//! │                               SettlementLog (append-only)              │
//! │                                                                         │
//! │  Pure values: Money, Transfer, AllocationMode, HistoryEntry            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity Pattern
//! Every entity id is a UUID v4 string, generated by [`new_id`]. Members are
//! tenant-scoped: one user may hold one `Member` record per tenant, with a
//! display name distinct from their global identity.
//!
//! All monetary fields are stored as `*_minor: i64` (integer minor units) and
//! surfaced as [`Money`] through accessor methods. Timestamps are integer
//! epoch milliseconds (`*_ms: i64`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

/// Generates a fresh entity id (UUID v4, string form).
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Role
// =============================================================================

/// A member's role within a tenant.
///
/// Owner and admin may manage the member list; any member may create
/// payments and settlements involving themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Created the tenant. Exactly one per tenant, immutable.
    Owner,
    /// May manage members alongside the owner.
    Admin,
    /// Regular participant.
    Member,
}

impl Role {
    /// Whether this role may change the tenant's member list.
    #[inline]
    pub const fn can_manage_members(&self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Member
    }
}

// =============================================================================
// Payment Method Type
// =============================================================================

/// How a settlement is carried out in the real world.
///
/// Pure UX metadata: never consulted for balance correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    BankTransfer,
    PayPay,
    LinePay,
    Cash,
    Other,
}

// =============================================================================
// Tenant
// =============================================================================

/// A shared-expense group.
///
/// Deleting a tenant cascades to its members, payments and splits; settlement
/// logs are removed with the tenant but never with an individual member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Tenant {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Group name shown in listings.
    pub name: String,

    /// Optional free-form description.
    pub description: Option<String>,

    /// ISO-4217-style currency code; fixed for the tenant's lifetime.
    /// All `Money` values within the tenant are minor units of this currency.
    pub currency: String,

    /// Identity token of the creator. Immutable.
    pub created_by: String,

    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

// =============================================================================
// Member
// =============================================================================

/// A user's membership record within one tenant.
///
/// Distinct from the user's global identity: the same person carries a
/// different `Member` id (and possibly display name) in every tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Member {
    pub id: String,

    /// Owning tenant.
    pub tenant_id: String,

    /// Stable identity token from the external identity collaborator.
    pub user_id: String,

    /// Display name within this tenant.
    pub display_name: String,

    pub role: Role,

    pub joined_at_ms: i64,
}

// =============================================================================
// Payment Method
// =============================================================================

/// A way a member prefers to receive settlements ("Bank XY", "PayPay", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentMethod {
    pub id: String,

    /// Owning member.
    pub member_id: String,

    pub method_type: PaymentMethodType,

    /// Human-readable label, e.g. the bank's name.
    pub label: String,

    /// Opaque account details (JSON string); never interpreted by the engine.
    pub account_info: Option<String>,

    /// Lower number = higher priority in settlement UX.
    pub priority: i64,

    pub is_active: bool,

    pub created_at_ms: i64,
}

// =============================================================================
// Payment
// =============================================================================

/// A single expense event: one payer, one total amount.
///
/// Immutable once splits exist. There are no in-place total edits; a wrong
/// payment is corrected by compensating operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: String,

    pub tenant_id: String,

    /// Member who fronted the money.
    pub payer_member_id: String,

    /// What was paid for ("Dinner at ...").
    pub title: String,

    /// Total amount in minor units.
    pub total_minor: i64,

    /// When the expense actually happened (user-supplied).
    pub paid_at_ms: i64,

    pub created_at_ms: i64,
}

impl Payment {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_minor(self.total_minor)
    }
}

// =============================================================================
// Payment Split
// =============================================================================

/// One debtor's share of a payment.
///
/// **Sum invariant**: for a fixed payment, the amounts of all its splits sum
/// exactly to the payment's total, in minor units. The allocator guarantees
/// this at creation and nothing may edit amounts afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentSplit {
    pub id: String,

    pub payment_id: String,

    /// Member who owes this share.
    pub debtor_member_id: String,

    /// Share amount in minor units.
    pub amount_minor: i64,

    /// Transitions false → true exactly once, inside the recorder's
    /// transaction. Never reverts.
    pub is_paid: bool,

    /// Set when `is_paid` flips to true.
    pub paid_at_ms: Option<i64>,
}

impl PaymentSplit {
    /// Returns the share amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_minor(self.amount_minor)
    }
}

// =============================================================================
// Payment With Splits
// =============================================================================

/// Explicit read aggregate: a payment together with all of its splits.
///
/// The balance calculator consumes a slice of these; the repository returning
/// them is the single, reviewable query contract for "all payments and splits
/// of a tenant".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentWithSplits {
    pub payment: Payment,
    pub splits: Vec<PaymentSplit>,
}

impl PaymentWithSplits {
    /// Sum of split amounts; equals `payment.total()` when the sum invariant
    /// holds. Checked arithmetic, overflow yields `None`.
    pub fn splits_total(&self) -> Option<Money> {
        self.splits
            .iter()
            .try_fold(Money::zero(), |acc, s| acc.checked_add(s.amount()))
    }
}

// =============================================================================
// Settlement Log
// =============================================================================

/// Append-only record of a settled transfer.
///
/// One log may discharge several whole splits between the same two members
/// (the split ids are kept in a junction table); a split is discharged by at
/// most one log. Member and split references are historical: they never
/// cascade on member deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SettlementLog {
    pub id: String,

    pub tenant_id: String,

    /// Debtor who paid.
    pub from_member_id: String,

    /// Creditor who received.
    pub to_member_id: String,

    /// Transferred amount in minor units (sum of the discharged splits).
    pub amount_minor: i64,

    /// Optional payment method used (UX metadata).
    pub payment_method_id: Option<String>,

    pub note: Option<String>,

    /// Caller-supplied key deduplicating retries of the same settlement.
    pub idempotency_key: String,

    pub settled_at_ms: i64,
}

impl SettlementLog {
    /// Returns the transferred amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_minor(self.amount_minor)
    }
}

// =============================================================================
// Transfer
// =============================================================================

/// One proposed settling transfer: `from` pays `to` the given amount.
///
/// Produced by the settlement planner; purely advisory until recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: Money,
}

// =============================================================================
// Allocation Mode
// =============================================================================

/// How a payment total is divided among participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "values", rename_all = "snake_case")]
pub enum AllocationMode {
    /// Even division; the remainder goes one minor unit at a time to the
    /// first participants in the given order.
    Equal,

    /// Shares proportional to integer weights (largest-remainder method).
    /// Parallel to the participant sequence.
    Weighted(Vec<i64>),

    /// Caller supplies the exact per-participant amounts.
    /// Parallel to the participant sequence; must sum to the total.
    Explicit(Vec<Money>),
}

// =============================================================================
// History Entry
// =============================================================================

/// One row of a tenant's chronological history: either an expense or a
/// settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEntry {
    Payment(Payment),
    Settlement(SettlementLog),
}

impl HistoryEntry {
    /// Event timestamp used for chronological ordering.
    pub fn timestamp_ms(&self) -> i64 {
        match self {
            HistoryEntry::Payment(p) => p.paid_at_ms,
            HistoryEntry::Settlement(s) => s.settled_at_ms,
        }
    }

    /// Entity id, used as a deterministic tie-break when timestamps collide.
    pub fn entry_id(&self) -> &str {
        match self {
            HistoryEntry::Payment(p) => &p.id,
            HistoryEntry::Settlement(s) => &s.id,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
