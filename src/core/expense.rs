//! Expense and payment business logic.
//!
//! Expenses record who paid for what; payments record settlement transfers
//! between participants. Both feed the pure [`crate::core::ledger`] through
//! [`balances_for_trip`].

use crate::{
    core::{
        ledger::{self, LedgerExpense, LedgerPayment, ParticipantId},
        participant::participant_ids,
        trip::find_trip,
    },
    entities::{Expense, ExpenseShare, Payment, expense, expense_share, payment},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    str::FromStr,
};
use tracing::{debug, info, instrument};

/// Fixed set of expense categories.
///
/// Serialized (and stored) with the Spanish names used by the web client;
/// the English names are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExpenseCategory {
    /// Flights, trains, car hire
    #[serde(rename = "transporte", alias = "transport")]
    Transport,
    /// Hotels and apartments
    #[serde(rename = "alojamiento", alias = "lodging")]
    Lodging,
    /// Restaurants and groceries
    #[serde(rename = "comida", alias = "food")]
    Food,
    /// Tours, tickets, excursions
    #[serde(rename = "actividades", alias = "activities")]
    Activities,
    /// Anything else
    #[serde(rename = "otros", alias = "other")]
    Other,
}

impl ExpenseCategory {
    /// Every category, in display order
    pub const ALL: [Self; 5] = [
        Self::Transport,
        Self::Lodging,
        Self::Food,
        Self::Activities,
        Self::Other,
    ];

    /// Persisted name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transporte",
            Self::Lodging => "alojamiento",
            Self::Food => "comida",
            Self::Activities => "actividades",
            Self::Other => "otros",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "transporte" | "transport" => Ok(Self::Transport),
            "alojamiento" | "lodging" => Ok(Self::Lodging),
            "comida" | "food" => Ok(Self::Food),
            "actividades" | "activities" => Ok(Self::Activities),
            "otros" | "other" => Ok(Self::Other),
            other => Err(Error::validation(
                "category",
                format!("unknown expense category '{other}'"),
            )),
        }
    }
}

/// Input for a new expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    /// What the money was spent on
    pub description: String,
    /// Amount in cents, must be positive
    pub amount_cents: i64,
    /// Category
    pub category: ExpenseCategory,
    /// Participant who paid
    pub payer_id: i64,
    /// Day of the expense
    pub date: Date,
    /// Already paid to an agency as part of a package
    pub prepaid: bool,
    /// Participants sharing the cost; empty means the whole trip
    pub split_among: Vec<i64>,
}

/// Input for a new settlement payment.
#[derive(Debug, Clone)]
pub struct NewPayment {
    /// Participant sending the money
    pub from_id: i64,
    /// Participant receiving it
    pub to_id: i64,
    /// Amount in cents, must be positive
    pub amount_cents: i64,
    /// Free-form note
    pub description: String,
    /// Day of the transfer
    pub date: Date,
}

/// Inserts an expense (and its explicit split) without checking that the trip exists.
///
/// Validates the amount and that the payer and every split member belong to the trip.
pub async fn insert_expense<C>(db: &C, trip_id: i64, new: &NewExpense) -> Result<expense::Model>
where
    C: ConnectionTrait,
{
    let description = new.description.trim();
    if description.is_empty() {
        return Err(Error::validation("description", "Expense description cannot be empty"));
    }
    if new.amount_cents <= 0 {
        return Err(Error::validation(
            "amount",
            format!("must be positive, got {}", new.amount_cents),
        ));
    }

    let members = participant_ids(db, trip_id).await?;
    if !members.contains(&new.payer_id) {
        return Err(Error::validation(
            "payer_id",
            format!("participant {} is not part of trip {trip_id}", new.payer_id),
        ));
    }
    let mut split = new.split_among.clone();
    split.sort_unstable();
    split.dedup();
    if let Some(outsider) = split.iter().find(|id| !members.contains(id)) {
        return Err(Error::validation(
            "split_among",
            format!("participant {outsider} is not part of trip {trip_id}"),
        ));
    }

    let model = expense::ActiveModel {
        trip_id: Set(trip_id),
        description: Set(description.to_string()),
        amount_cents: Set(new.amount_cents),
        category: Set(new.category.as_str().to_string()),
        payer_id: Set(new.payer_id),
        date: Set(new.date),
        prepaid: Set(new.prepaid),
        ..Default::default()
    }
    .insert(db)
    .await?;

    if !split.is_empty() {
        ExpenseShare::insert_many(split.iter().map(|&participant_id| expense_share::ActiveModel {
            expense_id: Set(model.id),
            participant_id: Set(participant_id),
        }))
        .exec_without_returning(db)
        .await?;
    }

    Ok(model)
}

/// Records an expense on an existing trip.
#[instrument(skip(db, new), fields(amount = new.amount_cents))]
pub async fn add_expense(
    db: &DatabaseConnection,
    trip_id: i64,
    new: &NewExpense,
) -> Result<expense::Model> {
    let txn = db.begin().await?;
    find_trip(&txn, trip_id).await?;
    let expense = insert_expense(&txn, trip_id, new).await?;
    txn.commit().await?;
    info!("Added expense {} to trip {}", expense.id, trip_id);
    Ok(expense)
}

/// Deletes an expense and its split rows.
#[instrument(skip(db))]
pub async fn delete_expense(db: &DatabaseConnection, trip_id: i64, expense_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let expense = Expense::find_by_id(expense_id)
        .filter(expense::Column::TripId.eq(trip_id))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Expense", expense_id))?;
    ExpenseShare::delete_many()
        .filter(expense_share::Column::ExpenseId.eq(expense_id))
        .exec(&txn)
        .await?;
    expense.delete(&txn).await?;
    txn.commit().await?;
    Ok(())
}

/// All expenses of a trip, oldest first.
pub async fn expenses_for_trip<C>(db: &C, trip_id: i64) -> Result<Vec<expense::Model>>
where
    C: ConnectionTrait,
{
    Expense::find()
        .filter(expense::Column::TripId.eq(trip_id))
        .order_by_asc(expense::Column::Date)
        .order_by_asc(expense::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Explicit split members per expense id; expenses split among everyone are absent.
pub async fn splits_for_expenses<C>(
    db: &C,
    expense_ids: &[i64],
) -> Result<HashMap<i64, Vec<ParticipantId>>>
where
    C: ConnectionTrait,
{
    let mut splits: HashMap<i64, Vec<ParticipantId>> = HashMap::new();
    if expense_ids.is_empty() {
        return Ok(splits);
    }
    let shares = ExpenseShare::find()
        .filter(expense_share::Column::ExpenseId.is_in(expense_ids.iter().copied()))
        .order_by_asc(expense_share::Column::ParticipantId)
        .all(db)
        .await?;
    for share in shares {
        splits
            .entry(share.expense_id)
            .or_default()
            .push(share.participant_id);
    }
    Ok(splits)
}

/// Records a settlement payment between two participants of a trip.
#[instrument(skip(db, new), fields(amount = new.amount_cents))]
pub async fn add_payment(
    db: &DatabaseConnection,
    trip_id: i64,
    new: &NewPayment,
) -> Result<payment::Model> {
    if new.amount_cents <= 0 {
        return Err(Error::validation(
            "amount",
            format!("must be positive, got {}", new.amount_cents),
        ));
    }
    if new.from_id == new.to_id {
        return Err(Error::validation(
            "to_id",
            "a participant cannot pay themselves",
        ));
    }

    let txn = db.begin().await?;
    find_trip(&txn, trip_id).await?;
    let members = participant_ids(&txn, trip_id).await?;
    for (field, id) in [("from_id", new.from_id), ("to_id", new.to_id)] {
        if !members.contains(&id) {
            return Err(Error::validation(
                field,
                format!("participant {id} is not part of trip {trip_id}"),
            ));
        }
    }

    let payment = payment::ActiveModel {
        trip_id: Set(trip_id),
        participant_id: Set(new.from_id),
        recipient_id: Set(new.to_id),
        amount_cents: Set(new.amount_cents),
        description: Set(new.description.trim().to_string()),
        date: Set(new.date),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;
    info!("Recorded payment {} on trip {}", payment.id, trip_id);
    Ok(payment)
}

/// Deletes a payment.
pub async fn delete_payment(db: &DatabaseConnection, trip_id: i64, payment_id: i64) -> Result<()> {
    let result = Payment::delete_many()
        .filter(payment::Column::Id.eq(payment_id))
        .filter(payment::Column::TripId.eq(trip_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("Payment", payment_id));
    }
    Ok(())
}

/// All payments of a trip, oldest first.
pub async fn payments_for_trip<C>(db: &C, trip_id: i64) -> Result<Vec<payment::Model>>
where
    C: ConnectionTrait,
{
    Payment::find()
        .filter(payment::Column::TripId.eq(trip_id))
        .order_by_asc(payment::Column::Date)
        .order_by_asc(payment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Net balance per participant for a trip (see [`ledger::compute_balances`]).
#[instrument(skip(db))]
pub async fn balances_for_trip<C>(db: &C, trip_id: i64) -> Result<BTreeMap<ParticipantId, i64>>
where
    C: ConnectionTrait,
{
    find_trip(db, trip_id).await?;
    let participants = participant_ids(db, trip_id).await?;
    let expenses = expenses_for_trip(db, trip_id).await?;
    let payments = payments_for_trip(db, trip_id).await?;
    let ids: Vec<i64> = expenses.iter().map(|e| e.id).collect();
    let mut splits = splits_for_expenses(db, &ids).await?;

    let ledger_expenses: Vec<LedgerExpense> = expenses
        .iter()
        .map(|e| LedgerExpense {
            amount_cents: e.amount_cents,
            payer: e.payer_id,
            split_among: splits.remove(&e.id).unwrap_or_default(),
        })
        .collect();
    let ledger_payments: Vec<LedgerPayment> = payments
        .iter()
        .map(|p| LedgerPayment {
            from: p.participant_id,
            to: p.recipient_id,
            amount_cents: p.amount_cents,
        })
        .collect();

    debug!(
        "Computing balances for trip {} from {} expenses and {} payments",
        trip_id,
        ledger_expenses.len(),
        ledger_payments.len()
    );
    ledger::compute_balances(&ledger_expenses, &ledger_payments, &participants)
}
