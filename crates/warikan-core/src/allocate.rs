//! # Split Allocator
//!
//! Turns a payment total plus an ordered participant set into per-member
//! shares that sum **exactly** to the total, in minor units.
//!
//! ## Why Exactness Matters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total = 100, three participants [A, B, C]                              │
//! │                                                                         │
//! │  Naive float division:  33.33.. each  → splits lose 0.01               │
//! │  Naive integer division: 33 each      → splits lose 1 minor unit       │
//! │                                                                         │
//! │  This allocator: quotient 33 to all, remainder 1 distributed one       │
//! │  unit at a time to the FIRST participants in the given order:          │
//! │                                                                         │
//! │    allocate(100, [A, B, C], Equal) == [(A, 34), (B, 33), (C, 33)]      │
//! │                                                                         │
//! │  Deterministic, bit-for-bit reproducible, residue-free.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The allocator is pure: it never touches storage. The caller persists the
//! returned shares as splits in the same transaction that creates the
//! payment.

use crate::error::{ArithmeticError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::AllocationMode;

// =============================================================================
// Allocation
// =============================================================================

/// Allocates `total` across `participants` according to `mode`.
///
/// Returns one `(member_id, share)` pair per participant, in participant
/// order. The shares always sum exactly to `total`.
///
/// ## Errors
/// - [`ValidationError::EmptyParticipants`] for an empty participant set
/// - [`ValidationError::NonPositiveAmount`] for a zero or negative total
/// - [`ValidationError::CountMismatch`] when weights/shares are not parallel
///   to the participants
/// - [`ValidationError::SplitSumMismatch`] (with the signed delta) when
///   explicit shares don't sum to the total
/// - [`ArithmeticError::NonPositiveWeightSum`] / [`ArithmeticError::Overflow`]
///   for degenerate weighted inputs
///
/// ## Example
/// ```rust
/// use warikan_core::allocate::allocate;
/// use warikan_core::money::Money;
/// use warikan_core::types::AllocationMode;
///
/// let participants = vec!["a".to_string(), "b".to_string(), "c".to_string()];
/// let shares = allocate(Money::from_minor(100), &participants, &AllocationMode::Equal).unwrap();
/// let amounts: Vec<i64> = shares.iter().map(|(_, m)| m.minor()).collect();
/// assert_eq!(amounts, vec![34, 33, 33]);
/// ```
pub fn allocate(
    total: Money,
    participants: &[String],
    mode: &AllocationMode,
) -> CoreResult<Vec<(String, Money)>> {
    if participants.is_empty() {
        return Err(ValidationError::EmptyParticipants.into());
    }
    if !total.is_positive() {
        return Err(ValidationError::NonPositiveAmount {
            field: "total".to_string(),
            minor: total.minor(),
        }
        .into());
    }

    let shares = match mode {
        AllocationMode::Equal => allocate_equal(total, participants.len()),
        AllocationMode::Weighted(weights) => allocate_weighted(total, participants, weights)?,
        AllocationMode::Explicit(shares) => validate_explicit(total, participants, shares)?,
    };

    debug_assert_eq!(
        shares.iter().map(|m| m.minor()).sum::<i64>(),
        total.minor(),
        "allocator produced a residue"
    );

    Ok(participants.iter().cloned().zip(shares).collect())
}

// =============================================================================
// Equal Mode
// =============================================================================

/// Even division: quotient to everyone, the remainder (always < n) one minor
/// unit at a time to the first `remainder` participants.
fn allocate_equal(total: Money, n: usize) -> Vec<Money> {
    let n_i64 = n as i64;
    let quotient = total.minor() / n_i64;
    let remainder = total.minor() % n_i64;

    (0..n_i64)
        .map(|i| {
            if i < remainder {
                Money::from_minor(quotient + 1)
            } else {
                Money::from_minor(quotient)
            }
        })
        .collect()
}

// =============================================================================
// Weighted Mode
// =============================================================================

/// Largest-remainder allocation: floor(total * weight / weight_sum) per
/// participant, then the missing minor units go to the participants with the
/// largest fractional remainder, ties broken by participant order.
fn allocate_weighted(
    total: Money,
    participants: &[String],
    weights: &[i64],
) -> CoreResult<Vec<Money>> {
    if weights.len() != participants.len() {
        return Err(ValidationError::CountMismatch {
            field: "weights".to_string(),
            expected: participants.len(),
            actual: weights.len(),
        }
        .into());
    }

    for (index, &weight) in weights.iter().enumerate() {
        if weight < 0 {
            return Err(ValidationError::NegativeWeight { index, weight }.into());
        }
    }

    let weight_sum = weights
        .iter()
        .try_fold(0i64, |acc, &w| acc.checked_add(w))
        .ok_or(ArithmeticError::Overflow {
            context: "weight sum",
        })?;
    if weight_sum <= 0 {
        return Err(ArithmeticError::NonPositiveWeightSum { sum: weight_sum }.into());
    }

    // i128 intermediates: total * weight cannot overflow before division.
    let total_i128 = total.minor() as i128;
    let weight_sum_i128 = weight_sum as i128;

    let mut floors = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    let mut floor_sum: i64 = 0;

    for &weight in weights {
        let scaled = total_i128 * weight as i128;
        let floor = (scaled / weight_sum_i128) as i64;
        let remainder = scaled % weight_sum_i128;
        floor_sum = floor_sum
            .checked_add(floor)
            .ok_or(ArithmeticError::Overflow {
                context: "weighted floor sum",
            })?;
        floors.push(floor);
        remainders.push(remainder);
    }

    // total - floor_sum minor units are still unassigned; fewer than n of
    // them by construction.
    let leftover = total.minor() - floor_sum;

    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| remainders[b].cmp(&remainders[a]).then(a.cmp(&b)));

    for &index in order.iter().take(leftover as usize) {
        floors[index] += 1;
    }

    Ok(floors.into_iter().map(Money::from_minor).collect())
}

// =============================================================================
// Explicit Mode
// =============================================================================

/// Pass-through of caller-supplied shares; only validates the sum invariant.
/// A mismatch reports the signed delta (positive = shares overshoot).
fn validate_explicit(
    total: Money,
    participants: &[String],
    shares: &[Money],
) -> CoreResult<Vec<Money>> {
    if shares.len() != participants.len() {
        return Err(ValidationError::CountMismatch {
            field: "shares".to_string(),
            expected: participants.len(),
            actual: shares.len(),
        }
        .into());
    }

    for share in shares {
        if share.is_negative() {
            return Err(ValidationError::NegativeAmount {
                field: "share".to_string(),
                minor: share.minor(),
            }
            .into());
        }
    }

    let actual = shares
        .iter()
        .try_fold(Money::zero(), |acc, &s| acc.checked_add(s))
        .ok_or(ArithmeticError::Overflow {
            context: "explicit share sum",
        })?;

    if actual != total {
        return Err(ValidationError::SplitSumMismatch {
            expected_minor: total.minor(),
            actual_minor: actual.minor(),
            delta_minor: actual.minor() - total.minor(),
        }
        .into());
    }

    Ok(shares.to_vec())
}

// =============================================================================
// Unit Tests
// =============================================================================
