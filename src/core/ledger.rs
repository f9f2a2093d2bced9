//! Expense ledger - pure balance computation for a trip's shared costs.
//!
//! All amounts are integer cents. Every expense is split equally among its split
//! set; when the amount does not divide evenly the remainder is spread one cent at
//! a time over the lowest participant ids, so the shares always add up to the
//! amount and the balances of a trip always sum to exactly zero.

use crate::errors::{Error, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Identifier of a trip participant
pub type ParticipantId = i64;

/// An expense as seen by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerExpense {
    /// Amount in cents, must be positive
    pub amount_cents: i64,
    /// Participant who paid
    pub payer: ParticipantId,
    /// Participants sharing the cost; empty means everyone
    pub split_among: Vec<ParticipantId>,
}

/// A settlement transfer already made between two participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPayment {
    /// Participant who sent the money
    pub from: ParticipantId,
    /// Participant who received it
    pub to: ParticipantId,
    /// Amount in cents, must be positive
    pub amount_cents: i64,
}

/// A transfer that would settle outstanding balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    /// Participant who owes money
    pub from: ParticipantId,
    /// Participant who is owed money
    pub to: ParticipantId,
    /// Amount in cents
    pub amount_cents: i64,
}

/// Computes the net balance of every participant.
///
/// Positive balances are owed money, negative balances owe money. Every
/// participant appears in the result, including those with a zero balance.
///
/// # Errors
/// Returns [`Error::InvalidExpenseData`] if an amount is not positive, if a
/// balance would leave the `i64` range, if expenses exist but no participants
/// do, or if an expense or payment names someone outside the participant set.
pub fn compute_balances(
    expenses: &[LedgerExpense],
    payments: &[LedgerPayment],
    participants: &[ParticipantId],
) -> Result<BTreeMap<ParticipantId, i64>> {
    let everyone: BTreeSet<ParticipantId> = participants.iter().copied().collect();
    if everyone.is_empty() && !(expenses.is_empty() && payments.is_empty()) {
        return Err(invalid("cannot split expenses without participants"));
    }

    let mut balances: BTreeMap<ParticipantId, i64> =
        everyone.iter().map(|&id| (id, 0)).collect();

    for expense in expenses {
        if expense.amount_cents <= 0 {
            return Err(invalid(format!(
                "expense amount must be positive, got {}",
                expense.amount_cents
            )));
        }
        ensure_member(&everyone, expense.payer, "payer")?;

        let split: BTreeSet<ParticipantId> = if expense.split_among.is_empty() {
            everyone.clone()
        } else {
            for &id in &expense.split_among {
                ensure_member(&everyone, id, "split member")?;
            }
            expense.split_among.iter().copied().collect()
        };

        credit(&mut balances, expense.payer, expense.amount_cents)?;
        for (id, share) in split.iter().zip(split_evenly(expense.amount_cents, split.len())) {
            debit(&mut balances, *id, share)?;
        }
    }

    for payment in payments {
        if payment.amount_cents <= 0 {
            return Err(invalid(format!(
                "payment amount must be positive, got {}",
                payment.amount_cents
            )));
        }
        ensure_member(&everyone, payment.from, "payment sender")?;
        ensure_member(&everyone, payment.to, "payment recipient")?;

        credit(&mut balances, payment.from, payment.amount_cents)?;
        debit(&mut balances, payment.to, payment.amount_cents)?;
    }

    Ok(balances)
}

/// Splits `amount` into `parts` integer shares that differ by at most one cent.
/// The larger shares come first.
#[must_use]
pub fn split_evenly(amount: i64, parts: usize) -> Vec<i64> {
    let Ok(n) = i64::try_from(parts) else {
        return Vec::new();
    };
    if n == 0 {
        return Vec::new();
    }
    let base = amount / n;
    let remainder = amount % n;
    (0..n).map(|i| if i < remainder { base + 1 } else { base }).collect()
}

/// Proposes the transfers that bring every balance to zero.
///
/// Greedy: the largest debtor repeatedly pays the largest creditor. Ties are
/// broken by participant id so the output is deterministic.
#[must_use]
pub fn suggest_settlements(balances: &BTreeMap<ParticipantId, i64>) -> Vec<Settlement> {
    let mut debtors: Vec<(ParticipantId, i64)> = balances
        .iter()
        .filter(|&(_, &b)| b < 0)
        .map(|(&id, &b)| (id, -b))
        .collect();
    let mut creditors: Vec<(ParticipantId, i64)> = balances
        .iter()
        .filter(|&(_, &b)| b > 0)
        .map(|(&id, &b)| (id, b))
        .collect();
    debtors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    creditors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut settlements = Vec::new();
    let (mut d, mut c) = (0, 0);
    while d < debtors.len() && c < creditors.len() {
        let amount = debtors[d].1.min(creditors[c].1);
        settlements.push(Settlement {
            from: debtors[d].0,
            to: creditors[c].0,
            amount_cents: amount,
        });
        debtors[d].1 -= amount;
        creditors[c].1 -= amount;
        if debtors[d].1 == 0 {
            d += 1;
        }
        if creditors[c].1 == 0 {
            c += 1;
        }
    }
    settlements
}

/// Balances stay within `-i64::MAX..=i64::MAX` so they can always be negated.
fn credit(balances: &mut BTreeMap<ParticipantId, i64>, id: ParticipantId, cents: i64) -> Result<()> {
    let balance = balances.entry(id).or_default();
    *balance = balance
        .checked_add(cents)
        .filter(|b| *b != i64::MIN)
        .ok_or_else(|| invalid(format!("balance of participant {id} overflows")))?;
    Ok(())
}

fn debit(balances: &mut BTreeMap<ParticipantId, i64>, id: ParticipantId, cents: i64) -> Result<()> {
    let balance = balances.entry(id).or_default();
    *balance = balance
        .checked_sub(cents)
        .filter(|b| *b != i64::MIN)
        .ok_or_else(|| invalid(format!("balance of participant {id} overflows")))?;
    Ok(())
}

fn ensure_member(
    everyone: &BTreeSet<ParticipantId>,
    id: ParticipantId,
    role: &str,
) -> Result<()> {
    if everyone.contains(&id) {
        Ok(())
    } else {
        Err(invalid(format!("{role} {id} is not a trip participant")))
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidExpenseData {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const A: ParticipantId = 1;
    const B: ParticipantId = 2;
    const C: ParticipantId = 3;

    fn expense(amount_cents: i64, payer: ParticipantId, split: &[ParticipantId]) -> LedgerExpense {
        LedgerExpense {
            amount_cents,
            payer,
            split_among: split.to_vec(),
        }
    }

    #[test]
    fn test_two_person_split() {
        let balances = compute_balances(&[expense(100, A, &[A, B])], &[], &[A, B]).unwrap();
        assert_eq!(balances[&A], 50);
        assert_eq!(balances[&B], -50);
    }

    #[test]
    fn test_empty_split_means_everyone() {
        let balances = compute_balances(&[expense(90, C, &[])], &[], &[A, B, C]).unwrap();
        assert_eq!(balances[&A], -30);
        assert_eq!(balances[&B], -30);
        assert_eq!(balances[&C], 60);
    }

    #[test]
    fn test_uneven_split_still_nets_to_zero() {
        let balances = compute_balances(&[expense(100, A, &[])], &[], &[A, B, C]).unwrap();
        // 34 + 33 + 33; lowest id takes the extra cent
        assert_eq!(balances[&A], 66);
        assert_eq!(balances[&B], -33);
        assert_eq!(balances[&C], -33);
        assert_eq!(balances.values().sum::<i64>(), 0);
    }

    #[test]
    fn test_balances_sum_to_zero_across_many_inputs() {
        let people = [A, B, C, 4, 5];
        for n in 1..=people.len() {
            let participants = &people[..n];
            let mut expenses = Vec::new();
            for (i, amount) in [1_i64, 7, 100, 333, 1001, 99_999].into_iter().enumerate() {
                let payer = participants[i % n];
                let split: Vec<_> = participants.iter().copied().skip(i % n).collect();
                expenses.push(expense(amount, payer, &split));
            }
            let payments = if n > 1 {
                vec![LedgerPayment {
                    from: participants[1],
                    to: participants[0],
                    amount_cents: 25,
                }]
            } else {
                Vec::new()
            };
            let balances = compute_balances(&expenses, &payments, participants).unwrap();
            assert_eq!(balances.values().sum::<i64>(), 0, "n = {n}");
            assert_eq!(balances.len(), n);
        }
    }

    #[test]
    fn test_payment_settles_debt() {
        let payments = [LedgerPayment {
            from: B,
            to: A,
            amount_cents: 50,
        }];
        let balances =
            compute_balances(&[expense(100, A, &[A, B])], &payments, &[A, B]).unwrap();
        assert_eq!(balances[&A], 0);
        assert_eq!(balances[&B], 0);
    }

    #[test]
    fn test_no_expenses_gives_zero_balances() {
        let balances = compute_balances(&[], &[], &[A, B]).unwrap();
        assert_eq!(balances.len(), 2);
        assert!(balances.values().all(|&b| b == 0));
        assert!(compute_balances(&[], &[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_invalid_input() {
        let negative = compute_balances(&[expense(-5, A, &[])], &[], &[A]);
        assert!(matches!(negative, Err(Error::InvalidExpenseData { .. })));

        let nobody = compute_balances(&[expense(5, A, &[])], &[], &[]);
        assert!(matches!(nobody, Err(Error::InvalidExpenseData { .. })));

        let outsider = compute_balances(&[expense(5, C, &[])], &[], &[A, B]);
        assert!(matches!(outsider, Err(Error::InvalidExpenseData { .. })));

        let outsider_split = compute_balances(&[expense(5, A, &[A, C])], &[], &[A, B]);
        assert!(matches!(outsider_split, Err(Error::InvalidExpenseData { .. })));

        let bad_payment = compute_balances(
            &[],
            &[LedgerPayment {
                from: A,
                to: B,
                amount_cents: 0,
            }],
            &[A, B],
        );
        assert!(matches!(bad_payment, Err(Error::InvalidExpenseData { .. })));
    }

    #[test]
    fn test_split_evenly() {
        assert_eq!(split_evenly(10, 3), vec![4, 3, 3]);
        assert_eq!(split_evenly(9, 3), vec![3, 3, 3]);
        assert_eq!(split_evenly(1, 2), vec![1, 0]);
        assert!(split_evenly(10, 0).is_empty());
    }

    #[test]
    fn test_suggest_settlements_zeroes_balances() {
        let balances = compute_balances(
            &[expense(300, A, &[]), expense(60, B, &[])],
            &[],
            &[A, B, C],
        )
        .unwrap();
        // A +180, B -60, C -120
        let settlements = suggest_settlements(&balances);
        assert_eq!(
            settlements,
            vec![
                Settlement {
                    from: C,
                    to: A,
                    amount_cents: 120
                },
                Settlement {
                    from: B,
                    to: A,
                    amount_cents: 60
                },
            ]
        );

        let mut after = balances.clone();
        for s in &settlements {
            *after.get_mut(&s.from).unwrap() += s.amount_cents;
            *after.get_mut(&s.to).unwrap() -= s.amount_cents;
        }
        assert!(after.values().all(|&b| b == 0));
    }

    #[test]
    fn test_huge_amounts_are_rejected_not_wrapped() {
        let huge = i64::MAX / 2 + 1;
        let expenses = vec![expense(huge, A, &[A, B]); 4];
        let result = compute_balances(&expenses, &[], &[A, B]);
        assert!(matches!(result, Err(Error::InvalidExpenseData { .. })));

        let payments = [
            LedgerPayment {
                from: A,
                to: B,
                amount_cents: i64::MAX,
            },
            LedgerPayment {
                from: A,
                to: B,
                amount_cents: 1,
            },
        ];
        let result = compute_balances(&[], &payments, &[A, B]);
        assert!(matches!(result, Err(Error::InvalidExpenseData { .. })));

        // The largest representable balance still works
        let balances = compute_balances(&[expense(i64::MAX, A, &[B])], &[], &[A, B]).unwrap();
        assert_eq!(balances[&A], i64::MAX);
        assert_eq!(balances[&B], -i64::MAX);
        assert_eq!(suggest_settlements(&balances)[0].amount_cents, i64::MAX);
    }
}
