//! # warikan-ledger: Ledger & Settlement Engine
//!
//! The facade crate a presentation layer talks to. It wires the pure
//! algorithms from `warikan-core` to the SQLite store in `warikan-db` and
//! guards every operation with an explicit capability.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Presentation layer (external: identity, routing, rendering)           │
//! │       │  Capability { tenant_id, member_id, role }                     │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 warikan-ledger (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   Ledger::create_payment     allocate → insert atomically       │   │
//! │  │   Ledger::get_balances       recompute, never stored            │   │
//! │  │   Ledger::plan_settlement    greedy netting, advisory           │   │
//! │  │   Ledger::record_settlement  idempotent, conflict-checked       │   │
//! │  │   Ledger::get_history        payments + settlements, merged     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                              │                                  │
//! │       ▼                              ▼                                  │
//! │  warikan-core (pure math)       warikan-db (SQLite store)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```no_run
//! use warikan_core::{AllocationMode, Money, Role};
//! use warikan_db::{Database, DbConfig};
//! use warikan_ledger::{Capability, CreatePaymentInput, Ledger};
//!
//! # async fn example() -> warikan_ledger::LedgerResult<()> {
//! let db = Database::new(DbConfig::new("warikan.db")).await?;
//! let ledger = Ledger::new(db);
//!
//! let (tenant, owner) = ledger
//!     .create_tenant("user-1", "Alice", "Ski Trip", None, "JPY")
//!     .await?;
//! let cap = Capability::new(&tenant.id, &owner.id, Role::Owner);
//!
//! ledger
//!     .create_payment(
//!         &cap,
//!         &tenant.id,
//!         CreatePaymentInput {
//!             payer_member_id: owner.id.clone(),
//!             title: "Lift tickets".into(),
//!             total: Money::from_minor(12_000),
//!             paid_at_ms: None,
//!             participants: vec![owner.id.clone()],
//!             mode: AllocationMode::Equal,
//!         },
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod capability;
pub mod error;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use capability::Capability;
pub use error::{ConflictError, LedgerError, LedgerResult};
pub use service::{CreatePaymentInput, Ledger, RecordSettlementInput};
