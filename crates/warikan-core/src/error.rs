//! # Error Types
//!
//! Domain-specific error types for warikan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  warikan-core errors (this file)                                       │
//! │  ├── ValidationError  - Input / invariant violations                   │
//! │  ├── ArithmeticError  - Overflow, degenerate weight sets               │
//! │  └── CoreError        - Umbrella over the two above                    │
//! │                                                                         │
//! │  warikan-db errors (separate crate)                                    │
//! │  └── DbError          - Storage operation failures                     │
//! │                                                                         │
//! │  warikan-ledger errors (separate crate)                                │
//! │  └── LedgerError      - What the presentation layer sees               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → Presentation        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (amounts, ids, deltas)
//! 3. Errors are enum variants, never String
//! 4. Every variant carries enough structure for an actionable message

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input and invariant validation errors.
///
/// These errors occur when a request doesn't meet the ledger's preconditions.
/// They are recoverable: the caller fixes the request and retries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// An allocation was requested for an empty participant set.
    #[error("participant set must not be empty")]
    EmptyParticipants,

    /// An amount that must be strictly positive is not.
    #[error("{field} must be positive, got {minor}")]
    NonPositiveAmount { field: String, minor: i64 },

    /// A negative amount where only zero-or-more is meaningful.
    #[error("{field} must not be negative, got {minor}")]
    NegativeAmount { field: String, minor: i64 },

    /// Explicit shares (or recorded splits) do not sum to the payment total.
    ///
    /// `delta_minor` is signed: positive means the shares overshoot the
    /// total, negative means they fall short.
    #[error("split sum mismatch: expected {expected_minor}, got {actual_minor} (delta {delta_minor:+})")]
    SplitSumMismatch {
        expected_minor: i64,
        actual_minor: i64,
        delta_minor: i64,
    },

    /// A parallel sequence (weights, explicit shares) has the wrong length.
    #[error("{field} has {actual} entries, expected {expected}")]
    CountMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// A weighted allocation contains a negative weight.
    #[error("weight for participant #{index} is negative: {weight}")]
    NegativeWeight { index: usize, weight: i64 },

    /// A settlement was recorded against zero target splits.
    #[error("settlement must target at least one split")]
    EmptyTargetSplits,

    /// Duplicate value where uniqueness is required.
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// A netting plan was requested for balances that do not sum to zero.
    ///
    /// Balances are recomputed from the store and sum to zero by
    /// construction; a residue here means the caller tampered with them.
    #[error("balances do not sum to zero (residue {residue_minor})")]
    UnbalancedBalances { residue_minor: i64 },

    /// A transfer from a member to themselves.
    #[error("transfer from and to member must differ: {member_id}")]
    SelfTransfer { member_id: String },

    /// A settlement targeted a split that is not owed by the paying member.
    #[error("split {split_id} is owed by {debtor_member_id}, not by {expected_member_id}")]
    SplitDebtorMismatch {
        split_id: String,
        debtor_member_id: String,
        expected_member_id: String,
    },

    /// A settlement targeted a split whose payment was fronted by someone
    /// other than the receiving member.
    #[error("split {split_id} settles a payment fronted by {payer_member_id}, not by {expected_member_id}")]
    SplitPayeeMismatch {
        split_id: String,
        payer_member_id: String,
        expected_member_id: String,
    },
}

// =============================================================================
// Arithmetic Error
// =============================================================================

/// Integer arithmetic failures.
///
/// Distinct from validation: the request shape was fine, but the magnitudes
/// cannot be represented or divided.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArithmeticError {
    /// An i64 amount overflowed during {context}.
    #[error("amount overflow during {context}")]
    Overflow { context: &'static str },

    /// A weighted allocation whose weights sum to zero or less.
    #[error("weight sum must be positive, got {sum}")]
    NonPositiveWeightSum { sum: i64 },
}

// =============================================================================
// Core Error
// =============================================================================

/// Umbrella error for the pure engine components.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Arithmetic error (wraps ArithmeticError).
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sum_mismatch_message_carries_signed_delta() {
        let err = ValidationError::SplitSumMismatch {
            expected_minor: 100,
            actual_minor: 103,
            delta_minor: 3,
        };
        assert_eq!(
            err.to_string(),
            "split sum mismatch: expected 100, got 103 (delta +3)"
        );

        let err = ValidationError::SplitSumMismatch {
            expected_minor: 100,
            actual_minor: 99,
            delta_minor: -1,
        };
        assert_eq!(
            err.to_string(),
            "split sum mismatch: expected 100, got 99 (delta -1)"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let err: CoreError = ValidationError::EmptyParticipants.into();
        assert!(matches!(err, CoreError::Validation(_)));

        let err: CoreError = ArithmeticError::NonPositiveWeightSum { sum: 0 }.into();
        assert!(matches!(err, CoreError::Arithmetic(_)));
    }
}
