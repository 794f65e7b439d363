//! # Settlement Planner
//!
//! Consumes net balances and proposes an ordered list of transfers that
//! bring every balance to exactly zero.
//!
//! ## Greedy Debt Netting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  balances: { A: +50, B: -20, C: -30 }                                   │
//! │                                                                         │
//! │  Step 1: largest creditor A(+50), largest debtor C(-30)                │
//! │          → transfer C──30──► A    leaves { A: +20, B: -20 }            │
//! │  Step 2: largest creditor A(+20), largest debtor B(-20)                │
//! │          → transfer B──20──► A    leaves { }                           │
//! │                                                                         │
//! │  plan == [(C→A, 30), (B→A, 20)]                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! At most N−1 transfers for N members with nonzero balance. This is an
//! **approximation**, not a global optimum: exact minimum-transaction netting
//! is NP-hard (subset-sum reduction), and the greedy result is both good
//! enough and deterministic. Ties are broken by member id order.
//!
//! The planner performs no mutation; the output is advisory and may be stale
//! by the time it is recorded, which is why the recorder re-validates every
//! split at commit time.

use std::collections::BTreeMap;

use crate::error::{ArithmeticError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::Transfer;

// =============================================================================
// Planning
// =============================================================================

/// Produces settling transfers for the given balances.
///
/// Every returned transfer has `amount > 0` and `from != to`; applying all of
/// them zeroes every balance.
///
/// ## Errors
/// [`ValidationError::UnbalancedBalances`] if the input doesn't sum to zero
/// (balances straight from [`compute_balances`](crate::balance::compute_balances)
/// always do).
pub fn plan(balances: &BTreeMap<String, Money>) -> CoreResult<Vec<Transfer>> {
    let residue = balances
        .values()
        .try_fold(Money::zero(), |acc, &m| acc.checked_add(m))
        .ok_or(ArithmeticError::Overflow {
            context: "balance sum",
        })?;
    if !residue.is_zero() {
        return Err(ValidationError::UnbalancedBalances {
            residue_minor: residue.minor(),
        }
        .into());
    }

    // BTreeMap iteration is id-ordered, so ties resolve to the smallest
    // member id deterministically (strict `>` keeps the first maximum).
    let mut creditors: Vec<(String, Money)> = Vec::new();
    let mut debtors: Vec<(String, Money)> = Vec::new();
    for (member_id, &balance) in balances {
        if balance.is_positive() {
            creditors.push((member_id.clone(), balance));
        } else if balance.is_negative() {
            debtors.push((member_id.clone(), balance.abs()));
        }
    }

    let mut transfers = Vec::new();

    while !creditors.is_empty() && !debtors.is_empty() {
        let ci = index_of_max(&creditors);
        let di = index_of_max(&debtors);

        let amount = creditors[ci].1.min(debtors[di].1);
        transfers.push(Transfer {
            from: debtors[di].0.clone(),
            to: creditors[ci].0.clone(),
            amount,
        });

        creditors[ci].1 -= amount;
        debtors[di].1 -= amount;

        // Preserve id order of the survivors for the next tie-break.
        if creditors[ci].1.is_zero() {
            creditors.remove(ci);
        }
        if debtors[di].1.is_zero() {
            debtors.remove(di);
        }
    }

    debug_assert!(creditors.is_empty() && debtors.is_empty());

    Ok(transfers)
}

/// Index of the entry with the largest amount; the earliest (smallest id)
/// entry wins ties.
fn index_of_max(entries: &[(String, Money)]) -> usize {
    let mut best = 0;
    for (index, entry) in entries.iter().enumerate().skip(1) {
        if entry.1 > entries[best].1 {
            best = index;
        }
    }
    best
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn balances(entries: &[(&str, i64)]) -> BTreeMap<String, Money> {
        entries
            .iter()
            .map(|&(id, minor)| (id.to_string(), Money::from_minor(minor)))
            .collect()
    }

    fn apply(balances: &BTreeMap<String, Money>, transfers: &[Transfer]) -> BTreeMap<String, Money> {
        let mut result = balances.clone();
        for t in transfers {
            *result.get_mut(&t.from).unwrap() += t.amount;
            *result.get_mut(&t.to).unwrap() -= t.amount;
        }
        result
    }

    #[test]
    fn test_scenario_largest_pairs_first() {
        let input = balances(&[("a", 50), ("b", -20), ("c", -30)]);
        let transfers = plan(&input).unwrap();

        assert_eq!(
            transfers,
            vec![
                Transfer {
                    from: "c".to_string(),
                    to: "a".to_string(),
                    amount: Money::from_minor(30),
                },
                Transfer {
                    from: "b".to_string(),
                    to: "a".to_string(),
                    amount: Money::from_minor(20),
                },
            ]
        );

        let after = apply(&input, &transfers);
        assert!(after.values().all(|m| m.is_zero()));
    }

    #[test]
    fn test_no_self_transfer_and_positive_amounts() {
        let input = balances(&[
            ("a", 17),
            ("b", -5),
            ("c", 3),
            ("d", -9),
            ("e", 0),
            ("f", -6),
        ]);
        let transfers = plan(&input).unwrap();

        for t in &transfers {
            assert_ne!(t.from, t.to);
            assert!(t.amount.is_positive());
        }
        let after = apply(&input, &transfers);
        assert!(after.values().all(|m| m.is_zero()));
    }

    #[test]
    fn test_transfer_count_bound() {
        // 6 members with nonzero balance -> at most 5 transfers.
        let input = balances(&[
            ("a", 10),
            ("b", 20),
            ("c", 30),
            ("d", -15),
            ("e", -15),
            ("f", -30),
        ]);
        let transfers = plan(&input).unwrap();
        assert!(transfers.len() <= 5);

        let after = apply(&input, &transfers);
        assert!(after.values().all(|m| m.is_zero()));
    }

    #[test]
    fn test_tie_break_by_member_id() {
        // Two equal creditors and two equal debtors: smallest ids pair first.
        let input = balances(&[("a", 10), ("b", 10), ("y", -10), ("z", -10)]);
        let transfers = plan(&input).unwrap();

        assert_eq!(
            transfers,
            vec![
                Transfer {
                    from: "y".to_string(),
                    to: "a".to_string(),
                    amount: Money::from_minor(10),
                },
                Transfer {
                    from: "z".to_string(),
                    to: "b".to_string(),
                    amount: Money::from_minor(10),
                },
            ]
        );
    }

    #[test]
    fn test_all_zero_yields_empty_plan() {
        let input = balances(&[("a", 0), ("b", 0)]);
        assert!(plan(&input).unwrap().is_empty());
        assert!(plan(&BTreeMap::new()).unwrap().is_empty());
    }

    #[test]
    fn test_unbalanced_input_rejected() {
        let input = balances(&[("a", 10), ("b", -5)]);
        assert!(matches!(
            plan(&input),
            Err(CoreError::Validation(
                ValidationError::UnbalancedBalances { residue_minor: 5 }
            ))
        ));
    }

    #[test]
    fn test_one_debtor_many_creditors() {
        let input = balances(&[("a", 5), ("b", 7), ("c", -12)]);
        let transfers = plan(&input).unwrap();

        // Largest creditor first: c pays b 7, then c pays a 5.
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].to, "b");
        assert_eq!(transfers[0].amount, Money::from_minor(7));
        assert_eq!(transfers[1].to, "a");
        assert_eq!(transfers[1].amount, Money::from_minor(5));

        let after = apply(&input, &transfers);
        assert!(after.values().all(|m| m.is_zero()));
    }
}
