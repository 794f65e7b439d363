//! # Validation Module
//!
//! Input validation utilities for the Warikan ledger.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation layer                                           │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Ledger engine (Rust)                                         │
//! │  └── THIS MODULE: field rules, then allocator/recorder invariants      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE constraints                                     │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_NAME_LEN, MAX_NOTE_LEN, MAX_TITLE_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a tenant or member display name.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - Must be at most [`MAX_NAME_LEN`] characters
///
/// Returns the trimmed name.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates a payment title. Returns the trimmed title.
pub fn validate_title(title: &str) -> ValidationResult<String> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LEN,
        });
    }

    Ok(title.to_string())
}

/// Validates an optional settlement note.
pub fn validate_note(note: Option<&str>) -> ValidationResult<Option<String>> {
    match note {
        None => Ok(None),
        Some(n) => {
            let n = n.trim();
            if n.is_empty() {
                return Ok(None);
            }
            if n.chars().count() > MAX_NOTE_LEN {
                return Err(ValidationError::TooLong {
                    field: "note".to_string(),
                    max: MAX_NOTE_LEN,
                });
            }
            Ok(Some(n.to_string()))
        }
    }
}

// =============================================================================
// Amount Validators
// =============================================================================

/// Validates that an amount is strictly positive.
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::NonPositiveAmount {
            field: field.to_string(),
            minor: amount.minor(),
        });
    }
    Ok(())
}

// =============================================================================
// Participant Validators
// =============================================================================

/// Validates a participant sequence for a payment.
///
/// ## Rules
/// - Must not be empty
/// - Must not contain the same member twice (one split per debtor)
pub fn validate_participants(participants: &[String]) -> ValidationResult<()> {
    if participants.is_empty() {
        return Err(ValidationError::EmptyParticipants);
    }

    let mut seen = HashSet::with_capacity(participants.len());
    for member_id in participants {
        if !seen.insert(member_id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "participants".to_string(),
                value: member_id.clone(),
            });
        }
    }

    Ok(())
}

/// Validates a settlement target split set: non-empty, no duplicates.
pub fn validate_target_splits(split_ids: &[String]) -> ValidationResult<()> {
    if split_ids.is_empty() {
        return Err(ValidationError::EmptyTargetSplits);
    }

    let mut seen = HashSet::with_capacity(split_ids.len());
    for split_id in split_ids {
        if !seen.insert(split_id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "target_splits".to_string(),
                value: split_id.clone(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("name", "  Ski Trip  ").unwrap(), "Ski Trip");
        assert!(matches!(
            validate_name("name", "   "),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_name("name", &"x".repeat(MAX_NAME_LEN + 1)),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_note_blank_becomes_none() {
        assert_eq!(validate_note(None).unwrap(), None);
        assert_eq!(validate_note(Some("  ")).unwrap(), None);
        assert_eq!(validate_note(Some(" paid ")).unwrap(), Some("paid".into()));
    }

    #[test]
    fn test_validate_positive_amount() {
        assert!(validate_positive_amount("total", Money::from_minor(1)).is_ok());
        assert!(matches!(
            validate_positive_amount("total", Money::zero()),
            Err(ValidationError::NonPositiveAmount { .. })
        ));
        assert!(matches!(
            validate_positive_amount("total", Money::from_minor(-5)),
            Err(ValidationError::NonPositiveAmount { .. })
        ));
    }

    #[test]
    fn test_validate_participants() {
        assert!(validate_participants(&["a".into(), "b".into()]).is_ok());
        assert!(matches!(
            validate_participants(&[]),
            Err(ValidationError::EmptyParticipants)
        ));
        assert!(matches!(
            validate_participants(&["a".into(), "a".into()]),
            Err(ValidationError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_validate_target_splits() {
        assert!(matches!(
            validate_target_splits(&[]),
            Err(ValidationError::EmptyTargetSplits)
        ));
        assert!(validate_target_splits(&["s1".into()]).is_ok());
    }
}
