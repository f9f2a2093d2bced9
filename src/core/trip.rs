//! Trip business logic and the per-user [`TripStore`].
//!
//! The free functions are generic over [`ConnectionTrait`] so they can run
//! inside a caller's transaction (the reservation flow materializes a whole trip
//! that way). [`TripStore`] is the façade the application talks to: it scopes
//! every call to one user, and after each committed mutation it publishes that
//! user's full trip list to subscribers.

use crate::{
    core::{
        expense::{self, NewExpense, NewPayment},
        ledger::ParticipantId,
        participant,
    },
    entities::{
        Destination, Expense, ExpenseShare, Participant, Payment, Reservation, Trip,
        TripDestination, destination, expense as expense_entity, expense_share,
        participant as participant_entity, payment, reservation, trip, trip_destination,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use std::collections::BTreeMap;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Icon used when a trip is created without one
pub const DEFAULT_TRIP_ICON: &str = "✈️";

/// Input for a new trip.
#[derive(Debug, Clone)]
pub struct NewTrip {
    /// Trip name
    pub name: String,
    /// Emoji or icon identifier; blank picks [`DEFAULT_TRIP_ICON`]
    pub icon: String,
    /// First day
    pub start_date: Date,
    /// Last day, not before `start_date`
    pub end_date: Date,
    /// Agency the trip was booked through
    pub agency_id: Option<i64>,
}

/// Partial update of a trip; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TripUpdate {
    /// New name
    pub name: Option<String>,
    /// New icon
    pub icon: Option<String>,
    /// New first day
    pub start_date: Option<Date>,
    /// New last day
    pub end_date: Option<Date>,
    /// Close or reopen the trip
    pub finalized: Option<bool>,
}

fn validate_dates(start: Date, end: Date) -> Result<()> {
    if end < start {
        return Err(Error::validation(
            "end_date",
            format!("{end} is before the start date {start}"),
        ));
    }
    Ok(())
}

fn required_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("name", "Trip name cannot be empty"));
    }
    Ok(name.to_string())
}

fn icon_or_default(icon: &str) -> String {
    let icon = icon.trim();
    if icon.is_empty() {
        DEFAULT_TRIP_ICON.to_string()
    } else {
        icon.to_string()
    }
}

/// Finds a trip by id.
///
/// # Errors
/// [`Error::NotFound`] if there is no such trip.
pub async fn find_trip<C>(db: &C, trip_id: i64) -> Result<trip::Model>
where
    C: ConnectionTrait,
{
    Trip::find_by_id(trip_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Trip", trip_id))
}

/// Inserts a trip for `user_id` after validating name and dates.
pub async fn insert_trip<C>(db: &C, user_id: i64, new: &NewTrip) -> Result<trip::Model>
where
    C: ConnectionTrait,
{
    let name = required_name(&new.name)?;
    validate_dates(new.start_date, new.end_date)?;

    let model = trip::ActiveModel {
        user_id: Set(user_id),
        name: Set(name),
        icon: Set(icon_or_default(&new.icon)),
        start_date: Set(new.start_date),
        end_date: Set(new.end_date),
        finalized: Set(false),
        agency_id: Set(new.agency_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Trips owned by `user_id`, soonest first.
pub async fn trips_for_user<C>(db: &C, user_id: i64) -> Result<Vec<trip::Model>>
where
    C: ConnectionTrait,
{
    Trip::find()
        .filter(trip::Column::UserId.eq(user_id))
        .order_by_asc(trip::Column::StartDate)
        .order_by_asc(trip::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Links a destination to a trip at the end of its route.
///
/// Returns `false` if the destination was already linked.
///
/// # Errors
/// [`Error::NotFound`] if the destination does not exist.
pub async fn link_destination<C>(db: &C, trip_id: i64, destination_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    Destination::find_by_id(destination_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Destination", destination_id))?;

    let existing = TripDestination::find_by_id((trip_id, destination_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    let last = TripDestination::find()
        .filter(trip_destination::Column::TripId.eq(trip_id))
        .order_by_desc(trip_destination::Column::Position)
        .one(db)
        .await?;

    trip_destination::ActiveModel {
        trip_id: Set(trip_id),
        destination_id: Set(destination_id),
        position: Set(last.map_or(0, |l| l.position + 1)),
    }
    .insert(db)
    .await?;
    Ok(true)
}

/// Unlinks a destination from a trip; `false` if it was not linked.
pub async fn unlink_destination<C>(db: &C, trip_id: i64, destination_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = TripDestination::delete_by_id((trip_id, destination_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Destinations of a trip in route order.
pub async fn trip_destinations<C>(db: &C, trip_id: i64) -> Result<Vec<destination::Model>>
where
    C: ConnectionTrait,
{
    let links = TripDestination::find()
        .filter(trip_destination::Column::TripId.eq(trip_id))
        .order_by_asc(trip_destination::Column::Position)
        .all(db)
        .await?;
    let ids: Vec<i64> = links.iter().map(|l| l.destination_id).collect();
    let mut by_id: BTreeMap<i64, destination::Model> = Destination::find()
        .filter(destination::Column::Id.is_in(ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|d| (d.id, d))
        .collect();
    Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
}

/// Deletes a trip and everything it owns in one transaction.
///
/// Reservations that materialized the trip keep their row, with `trip_id` cleared.
#[instrument(skip(db))]
pub async fn delete_trip(db: &DatabaseConnection, trip_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    find_trip(&txn, trip_id).await?;

    let expense_ids: Vec<i64> = Expense::find()
        .select_only()
        .column(expense_entity::Column::Id)
        .filter(expense_entity::Column::TripId.eq(trip_id))
        .into_tuple::<i64>()
        .all(&txn)
        .await?;

    ExpenseShare::delete_many()
        .filter(expense_share::Column::ExpenseId.is_in(expense_ids))
        .exec(&txn)
        .await?;
    let expenses = Expense::delete_many()
        .filter(expense_entity::Column::TripId.eq(trip_id))
        .exec(&txn)
        .await?;
    let payments = Payment::delete_many()
        .filter(payment::Column::TripId.eq(trip_id))
        .exec(&txn)
        .await?;
    let participants = Participant::delete_many()
        .filter(participant_entity::Column::TripId.eq(trip_id))
        .exec(&txn)
        .await?;
    TripDestination::delete_many()
        .filter(trip_destination::Column::TripId.eq(trip_id))
        .exec(&txn)
        .await?;
    Reservation::update_many()
        .col_expr(reservation::Column::TripId, Expr::value(Option::<i64>::None))
        .filter(reservation::Column::TripId.eq(trip_id))
        .exec(&txn)
        .await?;
    Trip::delete_by_id(trip_id).exec(&txn).await?;

    txn.commit().await?;
    info!(
        "Deleted trip {} with {} expenses, {} payments and {} participants",
        trip_id, expenses.rows_affected, payments.rows_affected, participants.rows_affected
    );
    Ok(())
}

/// A user's trips, written through to the database.
///
/// Every mutation commits before the updated list is published, so a
/// subscriber never observes a state that failed to persist. An `Err` from a
/// mutation always means nothing was written: once the commit succeeds the
/// call succeeds, even if republishing the list fails.
#[derive(Debug)]
pub struct TripStore {
    db: DatabaseConnection,
    user_id: i64,
    tx: watch::Sender<Vec<trip::Model>>,
}

impl TripStore {
    /// Opens the store for `user_id`, loading the current trip list.
    ///
    /// # Errors
    /// [`Error::NotFound`] if the user does not exist.
    #[instrument(skip(db))]
    pub async fn open(db: DatabaseConnection, user_id: i64) -> Result<Self> {
        crate::core::user::get_user(&db, user_id).await?;
        let trips = trips_for_user(&db, user_id).await?;
        debug!("Opened trip store for user {} with {} trips", user_id, trips.len());
        let (tx, _) = watch::channel(trips);
        Ok(Self { db, user_id, tx })
    }

    /// Owning user.
    #[must_use]
    pub const fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Underlying connection, for read-only helpers such as reports.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Subscribes to the user's full trip list.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<trip::Model>> {
        self.tx.subscribe()
    }

    /// Reloads the trip list and sends it to subscribers.
    ///
    /// Runs after a mutation has committed, so a failed reload is logged and
    /// the subscribers keep the previous list until the next mutation.
    pub(crate) async fn publish(&self) {
        match trips_for_user(&self.db, self.user_id).await {
            Ok(trips) => {
                self.tx.send_replace(trips);
            }
            Err(e) => warn!("Trip list for user {} not republished: {}", self.user_id, e),
        }
    }

    /// The user's trips, soonest first.
    pub async fn list(&self) -> Result<Vec<trip::Model>> {
        trips_for_user(&self.db, self.user_id).await
    }

    /// A trip owned by this user.
    ///
    /// # Errors
    /// [`Error::NotFound`] if the trip does not exist or belongs to someone else.
    pub async fn get(&self, trip_id: i64) -> Result<trip::Model> {
        let trip = find_trip(&self.db, trip_id).await?;
        if trip.user_id != self.user_id {
            return Err(Error::not_found("Trip", trip_id));
        }
        Ok(trip)
    }

    /// Creates a trip.
    pub async fn create(&self, new: &NewTrip) -> Result<trip::Model> {
        let trip = insert_trip(&self.db, self.user_id, new).await?;
        info!("Created trip {} '{}' for user {}", trip.id, trip.name, self.user_id);
        self.publish().await;
        Ok(trip)
    }

    /// Applies a partial update.
    pub async fn update(&self, trip_id: i64, update: TripUpdate) -> Result<trip::Model> {
        let current = self.get(trip_id).await?;
        let start = update.start_date.unwrap_or(current.start_date);
        let end = update.end_date.unwrap_or(current.end_date);
        validate_dates(start, end)?;
        let name = update.name.as_deref().map(required_name).transpose()?;

        let mut model: trip::ActiveModel = current.into();
        if let Some(name) = name {
            model.name = Set(name);
        }
        if let Some(icon) = update.icon {
            model.icon = Set(icon_or_default(&icon));
        }
        if let Some(finalized) = update.finalized {
            model.finalized = Set(finalized);
        }
        model.start_date = Set(start);
        model.end_date = Set(end);
        let trip = model.update(&self.db).await?;

        self.publish().await;
        Ok(trip)
    }

    /// Deletes a trip and all of its participants, expenses and payments.
    pub async fn delete(&self, trip_id: i64) -> Result<()> {
        self.get(trip_id).await?;
        delete_trip(&self.db, trip_id).await?;
        self.publish().await;
        Ok(())
    }

    /// Adds a destination to the end of the route; `false` if already present.
    pub async fn add_destination(&self, trip_id: i64, destination_id: i64) -> Result<bool> {
        self.get(trip_id).await?;
        let added = link_destination(&self.db, trip_id, destination_id).await?;
        if added {
            self.publish().await;
        }
        Ok(added)
    }

    /// Removes a destination from the route; `false` if it was not there.
    pub async fn remove_destination(&self, trip_id: i64, destination_id: i64) -> Result<bool> {
        self.get(trip_id).await?;
        let removed = unlink_destination(&self.db, trip_id, destination_id).await?;
        if removed {
            self.publish().await;
        }
        Ok(removed)
    }

    /// Destinations of a trip in route order.
    pub async fn destinations(&self, trip_id: i64) -> Result<Vec<destination::Model>> {
        self.get(trip_id).await?;
        trip_destinations(&self.db, trip_id).await
    }

    /// Adds a participant.
    pub async fn add_participant(
        &self,
        trip_id: i64,
        name: &str,
        email: Option<&str>,
    ) -> Result<participant_entity::Model> {
        self.get(trip_id).await?;
        let participant = participant::add_participant(&self.db, trip_id, name, email).await?;
        self.publish().await;
        Ok(participant)
    }

    /// Removes a participant that the ledger no longer references.
    pub async fn remove_participant(&self, trip_id: i64, participant_id: i64) -> Result<()> {
        self.get(trip_id).await?;
        participant::remove_participant(&self.db, trip_id, participant_id).await?;
        self.publish().await;
        Ok(())
    }

    /// Participants in join order.
    pub async fn participants(&self, trip_id: i64) -> Result<Vec<participant_entity::Model>> {
        self.get(trip_id).await?;
        participant::participants_for_trip(&self.db, trip_id).await
    }

    /// Records an expense.
    pub async fn add_expense(
        &self,
        trip_id: i64,
        new: &NewExpense,
    ) -> Result<expense_entity::Model> {
        self.get(trip_id).await?;
        let expense = expense::add_expense(&self.db, trip_id, new).await?;
        self.publish().await;
        Ok(expense)
    }

    /// Deletes an expense.
    pub async fn delete_expense(&self, trip_id: i64, expense_id: i64) -> Result<()> {
        self.get(trip_id).await?;
        expense::delete_expense(&self.db, trip_id, expense_id).await?;
        self.publish().await;
        Ok(())
    }

    /// Expenses, oldest first.
    pub async fn expenses(&self, trip_id: i64) -> Result<Vec<expense_entity::Model>> {
        self.get(trip_id).await?;
        expense::expenses_for_trip(&self.db, trip_id).await
    }

    /// Records a settlement payment.
    pub async fn add_payment(&self, trip_id: i64, new: &NewPayment) -> Result<payment::Model> {
        self.get(trip_id).await?;
        let payment = expense::add_payment(&self.db, trip_id, new).await?;
        self.publish().await;
        Ok(payment)
    }

    /// Deletes a payment.
    pub async fn delete_payment(&self, trip_id: i64, payment_id: i64) -> Result<()> {
        self.get(trip_id).await?;
        expense::delete_payment(&self.db, trip_id, payment_id).await?;
        self.publish().await;
        Ok(())
    }

    /// Payments, oldest first.
    pub async fn payments(&self, trip_id: i64) -> Result<Vec<payment::Model>> {
        self.get(trip_id).await?;
        expense::payments_for_trip(&self.db, trip_id).await
    }

    /// Net balance per participant.
    pub async fn balances(&self, trip_id: i64) -> Result<BTreeMap<ParticipantId, i64>> {
        self.get(trip_id).await?;
        expense::balances_for_trip(&self.db, trip_id).await
    }
}
