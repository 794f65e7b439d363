//! # warikan-core: Pure Business Logic for the Warikan Ledger
//!
//! This crate is the **heart** of the shared-expense ledger. It contains the
//! allocation, balance and netting algorithms as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Warikan Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Presentation layer (external)                   │   │
//! │  │        identity, tenant membership UI, rendering                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 warikan-ledger (engine facade)                  │   │
//! │  │   create_payment, get_balances, plan_settlement,                │   │
//! │  │   record_settlement, get_history                                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ warikan-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │ allocate  │  │  balance  │  │  netting  │  │   │
//! │  │   │   Money   │  │  shares   │  │ positions │  │ transfers │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 warikan-db (ledger store)                       │   │
//! │  │          SQLite queries, migrations, repositories               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Tenant, Member, Payment, PaymentSplit, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`allocate`] - Split allocator (sum-preserving shares)
//! - [`balance`] - Balance calculator (conservation invariant)
//! - [`netting`] - Settlement planner (greedy debt netting)
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, bit for bit
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are minor units (i64), never floats
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocate;
pub mod balance;
pub mod error;
pub mod money;
pub mod netting;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use warikan_core::Money` instead of
// `use warikan_core::money::Money`

pub use allocate::allocate;
pub use balance::compute_balances;
pub use error::{ArithmeticError, CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use netting::plan;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of tenant and member display names.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of a payment title.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum length of a settlement note.
pub const MAX_NOTE_LEN: usize = 500;
