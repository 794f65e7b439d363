//! # Ledger Error Taxonomy
//!
//! The error surface a presentation layer programs against.
//!
//! ## Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         LedgerError                                     │
//! │                                                                         │
//! │  Validation   bad request shape (split sums, empty sets, amounts)      │
//! │  AccessDenied actor lacks membership or role for the operation         │
//! │  NotFound     referenced entity missing or not visible to the actor    │
//! │  Conflict     state changed between read and commit, or an             │
//! │               idempotency key was reused with a different payload      │
//! │  Arithmetic   overflow / degenerate weight sets                        │
//! │  Storage      infrastructure failure ("retry later", not "bad request")│
//! │                                                                         │
//! │  ALL of these are recoverable by the caller. Nothing here is fatal.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Operations return `LedgerResult<T>`; the presentation layer matches on
//! the variant to decide retry/redirect/surface behavior. Exceptions are
//! never used for control flow.

use thiserror::Error;
use warikan_core::{ArithmeticError, CoreError, ValidationError};
use warikan_db::DbError;

// =============================================================================
// Conflict Error
// =============================================================================

/// Concurrent-modification conflicts, kept structured so the UI can point at
/// the exact split or key involved.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConflictError {
    /// The split's paid state changed between read and commit; a paid split
    /// never reverts, so retrying the same settlement will keep failing.
    /// Re-plan instead.
    #[error("split {split_id} is already settled")]
    SplitAlreadySettled { split_id: String },

    /// The idempotency key matches a previous settlement with a *different*
    /// payload. Distinguished from a legitimate idempotent replay, which is
    /// not an error.
    #[error("idempotency key '{key}' was already used with a different payload")]
    IdempotencyKeyReuse { key: String },
}

// =============================================================================
// Ledger Error
// =============================================================================

/// Everything a ledger operation can fail with.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Request shape violates a precondition (split sum mismatches, empty
    /// participant/target sets, non-positive amounts).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Actor is not a member of the target tenant or lacks the role for the
    /// requested mutation.
    #[error("access denied: {reason}")]
    AccessDenied { reason: String },

    /// Referenced entity does not exist or is not visible to the actor.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Concurrent settlement conflict or idempotency-key misuse.
    #[error("conflict: {0}")]
    Conflict(#[from] ConflictError),

    /// Amount overflow or degenerate weighted allocation.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),

    /// Storage I/O failure, distinct from the domain taxonomy: signals
    /// "retry later" rather than "invalid request".
    #[error("storage error: {0}")]
    Storage(DbError),
}

impl LedgerError {
    /// Creates an AccessDenied error.
    pub fn access_denied(reason: impl Into<String>) -> Self {
        LedgerError::AccessDenied {
            reason: reason.into(),
        }
    }

    /// Creates a NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        LedgerError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<CoreError> for LedgerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => LedgerError::Validation(e),
            CoreError::Arithmetic(e) => LedgerError::Arithmetic(e),
        }
    }
}

/// Storage errors carrying domain meaning are lifted into the taxonomy;
/// everything else stays a StorageError.
impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => LedgerError::NotFound { entity, id },
            DbError::Conflict { id, .. } => {
                LedgerError::Conflict(ConflictError::SplitAlreadySettled { split_id: id })
            }
            other => LedgerError::Storage(other),
        }
    }
}

/// Convenience type alias for Results with LedgerError.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_conflict_becomes_domain_conflict() {
        let err: LedgerError = DbError::conflict("PaymentSplit", "s1").into();
        assert!(matches!(
            err,
            LedgerError::Conflict(ConflictError::SplitAlreadySettled { .. })
        ));
    }

    #[test]
    fn test_db_not_found_becomes_domain_not_found() {
        let err: LedgerError = DbError::not_found("Payment", "p1").into();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }

    #[test]
    fn test_infrastructure_errors_stay_storage() {
        let err: LedgerError = DbError::PoolExhausted.into();
        assert!(matches!(err, LedgerError::Storage(_)));
    }

    #[test]
    fn test_core_error_mapping() {
        let err: LedgerError = CoreError::Validation(ValidationError::EmptyParticipants).into();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
