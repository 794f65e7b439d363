//! # Balance Calculator
//!
//! Computes each member's net position from the stored ledger state.
//!
//! ## Sign Convention
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  balance > 0  →  net amount owed TO the member (creditor)              │
//! │  balance < 0  →  net amount the member owes    (debtor)                │
//! │                                                                         │
//! │  For every payment:                                                     │
//! │    payer   +total                                                       │
//! │    debtor  -split.amount      while the split is UNPAID                 │
//! │    payer   -split.amount      once the split is PAID                    │
//! │                                                                         │
//! │  A paid split has been discharged in cash: the debtor owes nothing     │
//! │  and the payer's outstanding credit shrinks by the same amount, so     │
//! │  the pair nets to zero. Each payment therefore contributes             │
//! │  total - Σ splits = 0, and the tenant-wide balances ALWAYS sum to      │
//! │  zero (conservation invariant).                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This is a pure function of the payment aggregates: it is recomputed on
//! every read and never cached across mutations, so stored and materialized
//! state cannot drift.

use std::collections::BTreeMap;

use crate::error::{ArithmeticError, CoreResult};
use crate::money::Money;
use crate::types::PaymentWithSplits;

// =============================================================================
// Balance Computation
// =============================================================================

/// Computes net balances for a tenant from its full payment history.
///
/// `member_ids` seeds the result so every current member appears, including
/// members with no activity (balance zero). Payers and debtors referenced by
/// the payments are added as encountered.
///
/// The returned map is ordered by member id for deterministic iteration.
///
/// ## Errors
/// [`ArithmeticError::Overflow`] if accumulation exceeds i64. Nothing else
/// can fail: the stored data already satisfies the sum invariant.
pub fn compute_balances(
    member_ids: &[String],
    payments: &[PaymentWithSplits],
) -> CoreResult<BTreeMap<String, Money>> {
    let mut balances: BTreeMap<String, Money> = member_ids
        .iter()
        .map(|id| (id.clone(), Money::zero()))
        .collect();

    for pws in payments {
        credit(
            &mut balances,
            &pws.payment.payer_member_id,
            pws.payment.total(),
        )?;

        for split in &pws.splits {
            if split.is_paid {
                // Already discharged in cash; reduce the payer's credit.
                debit(&mut balances, &pws.payment.payer_member_id, split.amount())?;
            } else {
                debit(&mut balances, &split.debtor_member_id, split.amount())?;
            }
        }
    }

    debug_assert_eq!(
        balances.values().map(|m| m.minor()).sum::<i64>(),
        0,
        "conservation invariant violated"
    );

    Ok(balances)
}

fn credit(balances: &mut BTreeMap<String, Money>, member_id: &str, amount: Money) -> CoreResult<()> {
    let entry = balances
        .entry(member_id.to_string())
        .or_insert_with(Money::zero);
    *entry = entry
        .checked_add(amount)
        .ok_or(ArithmeticError::Overflow {
            context: "balance credit",
        })?;
    Ok(())
}

fn debit(balances: &mut BTreeMap<String, Money>, member_id: &str, amount: Money) -> CoreResult<()> {
    let entry = balances
        .entry(member_id.to_string())
        .or_insert_with(Money::zero);
    *entry = entry
        .checked_sub(amount)
        .ok_or(ArithmeticError::Overflow {
            context: "balance debit",
        })?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
