//! Participant business logic - the people sharing a trip's costs.
//!
//! Participants are created with display data (initials and an avatar colour)
//! derived from their name and the colours already in use in the trip. A participant that still
//! appears in an expense or payment cannot be removed, so the ledger never
//! references someone who no longer exists.

use crate::{
    entities::{
        Expense, ExpenseShare, Participant, Payment, expense, expense_share, participant, payment,
    },
    errors::{Error, Result},
};
use sea_orm::{Condition, PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Avatar colours; a new participant takes the first one free in the trip.
pub const PALETTE: [&str; 8] = [
    "#4F46E5", "#059669", "#D97706", "#DC2626", "#7C3AED", "#0891B2", "#DB2777", "#65A30D",
];

/// Up to two upper-case initials from the first two words of `name`.
///
/// `"ana garcía lópez"` → `"AG"`, `"Bob"` → `"B"`, `"  "` → `"?"`.
#[must_use]
pub fn initials_for(name: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect();
    if initials.is_empty() {
        "?".to_string()
    } else {
        initials
    }
}

/// Colour for the participant at `index` (zero-based join order).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn color_for(index: u64) -> &'static str {
    PALETTE[(index % PALETTE.len() as u64) as usize]
}

/// First palette colour not in `taken`; once every colour is in use the
/// palette wraps around by participant count.
#[must_use]
pub fn next_color(taken: &[String]) -> &'static str {
    PALETTE
        .iter()
        .copied()
        .find(|c| !taken.iter().any(|t| t.as_str() == *c))
        .unwrap_or_else(|| color_for(taken.len() as u64))
}

/// Inserts a participant into `trip_id` without checking that the trip exists.
///
/// Used directly when the caller already holds the trip inside a transaction.
pub async fn insert_participant<C>(
    db: &C,
    trip_id: i64,
    name: &str,
    email: Option<&str>,
) -> Result<participant::Model>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("name", "Participant name cannot be empty"));
    }
    let email = email.map(str::trim).filter(|e| !e.is_empty());
    if let Some(email) = email {
        if !email.contains('@') {
            return Err(Error::validation("email", format!("'{email}' is not an email")));
        }
    }

    let taken: Vec<String> = participants_for_trip(db, trip_id)
        .await?
        .into_iter()
        .map(|p| p.color)
        .collect();

    let model = participant::ActiveModel {
        trip_id: Set(trip_id),
        name: Set(name.to_string()),
        email: Set(email.map(str::to_string)),
        initials: Set(initials_for(name)),
        color: Set(next_color(&taken).to_string()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Adds a participant to an existing trip.
#[instrument(skip(db))]
pub async fn add_participant(
    db: &DatabaseConnection,
    trip_id: i64,
    name: &str,
    email: Option<&str>,
) -> Result<participant::Model> {
    let txn = db.begin().await?;
    crate::core::trip::find_trip(&txn, trip_id).await?;
    let participant = insert_participant(&txn, trip_id, name, email).await?;
    txn.commit().await?;
    info!("Added participant {} to trip {}", participant.id, trip_id);
    Ok(participant)
}

/// All participants of a trip, in join order.
pub async fn participants_for_trip<C>(db: &C, trip_id: i64) -> Result<Vec<participant::Model>>
where
    C: ConnectionTrait,
{
    Participant::find()
        .filter(participant::Column::TripId.eq(trip_id))
        .order_by_asc(participant::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Ids of the participants of a trip, ascending.
pub async fn participant_ids<C>(db: &C, trip_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    Ok(participants_for_trip(db, trip_id)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect())
}

/// Removes a participant who has no expenses, shares or payments.
///
/// # Errors
/// [`Error::NotFound`] if the participant is not part of `trip_id`;
/// [`Error::Validation`] if the ledger still references them.
#[instrument(skip(db))]
pub async fn remove_participant(
    db: &DatabaseConnection,
    trip_id: i64,
    participant_id: i64,
) -> Result<()> {
    let txn = db.begin().await?;
    let participant = Participant::find_by_id(participant_id)
        .filter(participant::Column::TripId.eq(trip_id))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Participant", participant_id))?;

    let paid = Expense::find()
        .filter(expense::Column::PayerId.eq(participant_id))
        .count(&txn)
        .await?;
    let shares = ExpenseShare::find()
        .filter(expense_share::Column::ParticipantId.eq(participant_id))
        .count(&txn)
        .await?;
    let transfers = Payment::find()
        .filter(
            Condition::any()
                .add(payment::Column::ParticipantId.eq(participant_id))
                .add(payment::Column::RecipientId.eq(participant_id)),
        )
        .count(&txn)
        .await?;
    if paid + shares + transfers > 0 {
        return Err(Error::validation(
            "participant_id",
            format!(
                "{} still has {} expenses, {} shares and {} payments",
                participant.name, paid, shares, transfers
            ),
        ));
    }

    participant.delete(&txn).await?;
    txn.commit().await?;
    info!("Removed participant {} from trip {}", participant_id, trip_id);
    Ok(())
}
