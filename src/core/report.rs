//! Trip report generation.
//!
//! This module gathers a trip's expenses, balances and settlement suggestions
//! into a structured [`TripSummary`], plus a few formatting helpers for
//! displaying amounts. Nothing here writes to the database.

use crate::{
    core::{
        expense::{ExpenseCategory, balances_for_trip, expenses_for_trip},
        ledger::{ParticipantId, Settlement, suggest_settlements},
        participant::participants_for_trip,
        trip::find_trip,
    },
    entities::{participant, trip},
    errors::{Error, Result},
};
use sea_orm::ConnectionTrait;
use std::collections::BTreeMap;

/// Spending overview of one trip.
#[derive(Debug, Clone)]
pub struct TripSummary {
    /// The trip being reported on
    pub trip: trip::Model,
    /// Participants in join order
    pub participants: Vec<participant::Model>,
    /// Sum of every expense
    pub total_cents: i64,
    /// Portion already paid to an agency
    pub prepaid_cents: i64,
    /// Portion paid during the trip
    pub out_of_pocket_cents: i64,
    /// Expense totals per category; categories without expenses are omitted
    pub by_category: BTreeMap<ExpenseCategory, i64>,
    /// Net balance per participant
    pub balances: BTreeMap<ParticipantId, i64>,
    /// Transfers that would settle every balance
    pub settlements: Vec<Settlement>,
}

impl TripSummary {
    /// Display name of a participant, or `#id` if unknown.
    #[must_use]
    pub fn participant_name(&self, id: ParticipantId) -> String {
        self.participants
            .iter()
            .find(|p| p.id == id)
            .map_or_else(|| format!("#{id}"), |p| p.name.clone())
    }

    /// Multi-line plain text rendering.
    #[must_use]
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("{} {}", self.trip.icon, self.trip.name),
            format!("Total: {}", format_cents(self.total_cents)),
            format!(
                "Prepagado: {} | Durante el viaje: {}",
                format_cents(self.prepaid_cents),
                format_cents(self.out_of_pocket_cents)
            ),
        ];
        for (category, cents) in &self.by_category {
            lines.push(format!("  {category}: {}", format_cents(*cents)));
        }
        for (id, balance) in &self.balances {
            lines.push(format!(
                "{}: {}",
                self.participant_name(*id),
                format_signed_cents(*balance)
            ));
        }
        for settlement in &self.settlements {
            lines.push(format!(
                "{} → {}: {}",
                self.participant_name(settlement.from),
                self.participant_name(settlement.to),
                format_cents(settlement.amount_cents)
            ));
        }
        lines.join("\n")
    }
}

/// Builds the summary for `trip_id`.
///
/// Expenses whose stored category is not recognised are counted under
/// [`ExpenseCategory::Other`].
pub async fn trip_summary<C>(db: &C, trip_id: i64) -> Result<TripSummary>
where
    C: ConnectionTrait,
{
    let trip = find_trip(db, trip_id).await?;
    let participants = participants_for_trip(db, trip_id).await?;
    let expenses = expenses_for_trip(db, trip_id).await?;

    let mut total_cents: i64 = 0;
    let mut prepaid_cents: i64 = 0;
    let mut by_category: BTreeMap<ExpenseCategory, i64> = BTreeMap::new();
    for expense in &expenses {
        total_cents = add_cents(total_cents, expense.amount_cents)?;
        if expense.prepaid {
            prepaid_cents = add_cents(prepaid_cents, expense.amount_cents)?;
        }
        let category = expense
            .category
            .parse()
            .unwrap_or(ExpenseCategory::Other);
        let entry = by_category.entry(category).or_insert(0);
        *entry = add_cents(*entry, expense.amount_cents)?;
    }

    let balances = if participants.is_empty() {
        BTreeMap::new()
    } else {
        balances_for_trip(db, trip_id).await?
    };
    let settlements = suggest_settlements(&balances);

    Ok(TripSummary {
        trip,
        participants,
        total_cents,
        prepaid_cents,
        out_of_pocket_cents: total_cents - prepaid_cents,
        by_category,
        balances,
        settlements,
    })
}

fn add_cents(total: i64, cents: i64) -> Result<i64> {
    total.checked_add(cents).ok_or_else(|| Error::InvalidExpenseData {
        message: "trip total overflows".to_string(),
    })
}

/// Formats cents as euros, e.g. `-12.34 €`.
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02} €", abs / 100, abs % 100)
}

/// Like [`format_cents`] but always shows the sign of non-zero amounts.
#[must_use]
pub fn format_signed_cents(cents: i64) -> String {
    if cents > 0 {
        format!("+{}", format_cents(cents))
    } else {
        format_cents(cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{
            expense::{NewPayment, add_expense, add_payment},
            participant::add_participant,
        },
        test_utils::*,
    };

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(0), "0.00 €");
        assert_eq!(format_cents(5), "0.05 €");
        assert_eq!(format_cents(123_456), "1234.56 €");
        assert_eq!(format_cents(-1234), "-12.34 €");
        assert_eq!(format_cents(i64::MIN), "-92233720368547758.08 €");
    }

    #[test]
    fn test_format_signed_cents() {
        assert_eq!(format_signed_cents(5000), "+50.00 €");
        assert_eq!(format_signed_cents(-5000), "-50.00 €");
        assert_eq!(format_signed_cents(0), "0.00 €");
    }

    #[tokio::test]
    async fn test_trip_summary() -> Result<()> {
        let (db, trip) = setup_with_trip().await?;
        let ana = add_participant(&db, trip.id, "Ana", None).await?;
        let ben = add_participant(&db, trip.id, "Ben", None).await?;

        let mut flights = test_expense(ana.id, 10_000);
        flights.category = ExpenseCategory::Transport;
        flights.prepaid = true;
        add_expense(&db, trip.id, &flights).await?;
        add_expense(&db, trip.id, &test_expense(ben.id, 3_000)).await?;
        add_payment(
            &db,
            trip.id,
            &NewPayment {
                from_id: ben.id,
                to_id: ana.id,
                amount_cents: 1_000,
                description: "Bizum".to_string(),
                date: test_date(),
            },
        )
        .await?;

        let summary = trip_summary(&db, trip.id).await?;
        assert_eq!(summary.total_cents, 13_000);
        assert_eq!(summary.prepaid_cents, 10_000);
        assert_eq!(summary.out_of_pocket_cents, 3_000);
        assert_eq!(summary.by_category[&ExpenseCategory::Transport], 10_000);
        assert_eq!(summary.by_category[&ExpenseCategory::Food], 3_000);
        // Ana: paid 10000, owes 6500, received 1000 -> +2500
        assert_eq!(summary.balances[&ana.id], 2_500);
        assert_eq!(summary.balances[&ben.id], -2_500);
        assert_eq!(
            summary.settlements,
            vec![Settlement {
                from: ben.id,
                to: ana.id,
                amount_cents: 2_500
            }]
        );

        let text = summary.render();
        assert!(text.contains("Total: 130.00 €"));
        assert!(text.contains("Ben → Ana: 25.00 €"));
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_rejects_overflowing_totals() -> Result<()> {
        let (db, trip) = setup_with_trip().await?;
        let ana = add_participant(&db, trip.id, "Ana", None).await?;
        add_expense(&db, trip.id, &test_expense(ana.id, i64::MAX)).await?;
        add_expense(&db, trip.id, &test_expense(ana.id, 1)).await?;

        let result = trip_summary(&db, trip.id).await;
        assert!(matches!(result, Err(Error::InvalidExpenseData { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_of_empty_trip() -> Result<()> {
        let (db, trip) = setup_with_trip().await?;
        let summary = trip_summary(&db, trip.id).await?;

        assert_eq!(summary.total_cents, 0);
        assert!(summary.by_category.is_empty());
        assert!(summary.balances.is_empty());
        assert!(summary.settlements.is_empty());
        assert_eq!(summary.participant_name(7), "#7");
        Ok(())
    }
}
