//! Package reservation business logic.
//!
//! Booking a package does more than store a reservation row: it materializes a
//! complete trip for the customer (dates, destinations, travellers and the
//! package's prepaid expenses) so the booking shows up in the trip planner
//! straight away. Everything happens in one database transaction.

use crate::{
    core::{
        catalog::{duration_days, get_package, package_destination_ids},
        expense::{NewExpense, insert_expense},
        participant::insert_participant,
        trip::{NewTrip, TripStore, insert_trip, link_destination},
        user::get_user,
    },
    entities::{Reservation, reservation, trip},
    errors::{Error, Result},
};
use chrono::{Days, NaiveDate};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::{info, instrument, warn};

/// Reservation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Booked, waiting for the agency
    Pending,
    /// Accepted by the agency
    Confirmed,
    /// Trip has taken place
    Completed,
    /// Withdrawn by either side
    Cancelled,
}

impl ReservationStatus {
    /// Persisted form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Completed | Self::Cancelled)
        )
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(Error::validation(
                "status",
                format!("unknown reservation status '{other}'"),
            )),
        }
    }
}

/// Customer details captured by the booking form.
#[derive(Debug, Clone)]
pub struct CustomerInfo {
    /// User that will own the materialized trip
    pub user_id: i64,
    /// Full name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Number of travellers, customer included
    pub party_size: u32,
    /// Departure day as `YYYY-MM-DD`
    pub departure_date: String,
}

struct ValidCustomer {
    name: String,
    email: String,
    phone: Option<String>,
    party_size: i32,
    departure: NaiveDate,
}

fn validate_customer(customer: &CustomerInfo) -> Result<ValidCustomer> {
    let name = customer.name.trim();
    if name.is_empty() {
        return Err(Error::validation("customer_name", "cannot be empty"));
    }
    let email = customer.email.trim();
    if email.is_empty() {
        return Err(Error::validation("customer_email", "cannot be empty"));
    }
    let departure = customer.departure_date.trim();
    if departure.is_empty() {
        return Err(Error::validation("departure_date", "cannot be empty"));
    }
    let departure = NaiveDate::parse_from_str(departure, "%Y-%m-%d").map_err(|e| {
        Error::validation("departure_date", format!("'{departure}' is not YYYY-MM-DD: {e}"))
    })?;
    if customer.party_size == 0 {
        return Err(Error::validation("party_size", "at least one traveller is required"));
    }
    let party_size = i32::try_from(customer.party_size)
        .map_err(|_| Error::validation("party_size", "too many travellers"))?;

    Ok(ValidCustomer {
        name: name.to_string(),
        email: email.to_string(),
        phone: customer
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
        party_size,
        departure,
    })
}

/// Books `package_id` for `customer` and materializes the matching trip.
///
/// The trip is owned by `customer.user_id`, named after the package and runs
/// from the departure date for the package's number of days. The customer is
/// the first participant, followed by placeholder travellers up to the party
/// size; every scheduled package expense is recorded as prepaid by the
/// customer for the whole party.
///
/// # Errors
/// [`Error::Validation`] for missing customer data or a package duration
/// without a day count; [`Error::NotFound`] for an unknown package or user.
/// On any error nothing is written.
#[instrument(skip(db, customer), fields(user_id = customer.user_id))]
pub async fn reserve(
    db: &DatabaseConnection,
    package_id: i64,
    customer: &CustomerInfo,
) -> Result<(reservation::Model, trip::Model)> {
    let valid = validate_customer(customer)?;

    let txn = db.begin().await?;
    let package = get_package(&txn, package_id).await?;
    get_user(&txn, customer.user_id).await?;

    let days = duration_days(&package.duration).ok_or_else(|| {
        Error::validation(
            "duration",
            format!("'{}' does not start with a number of days", package.duration),
        )
    })?;
    let end_date = valid
        .departure
        .checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(|| Error::validation("departure_date", "trip ends past the calendar"))?;
    let party = i64::from(valid.party_size);
    let total_price_cents = package
        .price_cents
        .checked_mul(party)
        .ok_or_else(|| Error::validation("party_size", "total price overflows"))?;

    let trip = insert_trip(
        &txn,
        customer.user_id,
        &NewTrip {
            name: package.name.clone(),
            icon: String::new(),
            start_date: valid.departure,
            end_date,
            agency_id: Some(package.agency_id),
        },
    )
    .await?;

    for destination_id in package_destination_ids(&txn, package.id).await? {
        link_destination(&txn, trip.id, destination_id).await?;
    }

    let customer_participant =
        insert_participant(&txn, trip.id, &valid.name, Some(&valid.email)).await?;
    for traveller in 2..=valid.party_size {
        insert_participant(&txn, trip.id, &format!("Viajero {traveller}"), None).await?;
    }

    for scheduled in package.scheduled_expenses()? {
        let amount_cents = scheduled
            .amount_cents
            .checked_mul(party)
            .ok_or_else(|| Error::validation("party_size", "expense amount overflows"))?;
        insert_expense(
            &txn,
            trip.id,
            &NewExpense {
                description: scheduled.description,
                amount_cents,
                category: scheduled.category,
                payer_id: customer_participant.id,
                date: valid.departure,
                prepaid: true,
                split_among: Vec::new(),
            },
        )
        .await?;
    }

    let reservation = reservation::ActiveModel {
        package_id: Set(package.id),
        agency_id: Set(package.agency_id),
        trip_id: Set(Some(trip.id)),
        customer_name: Set(valid.name),
        customer_email: Set(valid.email),
        customer_phone: Set(valid.phone),
        party_size: Set(valid.party_size),
        departure_date: Set(valid.departure),
        total_price_cents: Set(total_price_cents),
        status: Set(ReservationStatus::Pending.as_str().to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(
        "Reservation {} for package {} created trip {}",
        reservation.id, package.id, trip.id
    );
    Ok((reservation, trip))
}

/// Current status of a stored reservation.
pub fn status_of(reservation: &reservation::Model) -> Result<ReservationStatus> {
    reservation.status.parse()
}

/// Moves a reservation to `next`.
///
/// # Errors
/// [`Error::InvalidTransition`] if the lifecycle does not allow the change.
#[instrument(skip(db))]
pub async fn update_status(
    db: &DatabaseConnection,
    reservation_id: i64,
    next: ReservationStatus,
) -> Result<reservation::Model> {
    let current = get_reservation(db, reservation_id).await?;
    let from = status_of(&current)?;
    if !from.can_become(next) {
        warn!("Rejected reservation {} change {} -> {}", reservation_id, from, next);
        return Err(Error::InvalidTransition {
            from: from.to_string(),
            to: next.to_string(),
        });
    }

    let mut active: reservation::ActiveModel = current.into();
    active.status = Set(next.as_str().to_string());
    let updated = active.update(db).await?;
    info!("Reservation {} is now {}", reservation_id, next);
    Ok(updated)
}

/// Finds a reservation by id.
pub async fn get_reservation<C>(db: &C, reservation_id: i64) -> Result<reservation::Model>
where
    C: ConnectionTrait,
{
    Reservation::find_by_id(reservation_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Reservation", reservation_id))
}

/// Reservations received by an agency, newest first.
pub async fn reservations_for_agency<C>(db: &C, agency_id: i64) -> Result<Vec<reservation::Model>>
where
    C: ConnectionTrait,
{
    Reservation::find()
        .filter(reservation::Column::AgencyId.eq(agency_id))
        .order_by_desc(reservation::Column::CreatedAt)
        .order_by_desc(reservation::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

impl TripStore {
    /// Books a package for this store's user and publishes the new trip.
    ///
    /// # Errors
    /// [`Error::Validation`] on `user_id` if `customer` names another user,
    /// otherwise as [`reserve`].
    pub async fn reserve_package(
        &self,
        package_id: i64,
        customer: &CustomerInfo,
    ) -> Result<(reservation::Model, trip::Model)> {
        if customer.user_id != self.user_id() {
            return Err(Error::validation(
                "user_id",
                format!("store belongs to user {}", self.user_id()),
            ));
        }
        let booked = reserve(self.connection(), package_id, customer).await?;
        self.publish().await;
        Ok(booked)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{
            catalog::{create_destination, create_package},
            expense::{ExpenseCategory, balances_for_trip, expenses_for_trip},
            participant::participants_for_trip,
            trip::trip_destinations,
        },
        entities::Trip,
        test_utils::*,
    };
    use sea_orm::PaginatorTrait;

    struct Fixture {
        db: DatabaseConnection,
        user_id: i64,
        agency_id: i64,
        package_id: i64,
        destination_ids: Vec<i64>,
    }

    async fn fixture() -> Result<Fixture> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "ana@example.com").await?;
        let kyoto = create_destination(&db, &test_new_destination("Kyoto")).await?;
        let osaka = create_destination(&db, &test_new_destination("Osaka")).await?;
        let agency = create_test_agency(&db, "Viajes Sakura").await?;
        let package =
            create_package(&db, &test_new_package(agency.id, &[kyoto.id, osaka.id])).await?;
        Ok(Fixture {
            db,
            user_id: user.id,
            agency_id: agency.id,
            package_id: package.id,
            destination_ids: vec![kyoto.id, osaka.id],
        })
    }

    fn customer(user_id: i64) -> CustomerInfo {
        CustomerInfo {
            user_id,
            name: "Ana García".to_string(),
            email: "ana@example.com".to_string(),
            phone: Some("600123123".to_string()),
            party_size: 2,
            departure_date: "2025-06-01".to_string(),
        }
    }

    #[tokio::test]
    async fn test_reserve_materializes_trip() -> Result<()> {
        let f = fixture().await?;
        let (reservation, trip) = reserve(&f.db, f.package_id, &customer(f.user_id)).await?;

        assert_eq!(status_of(&reservation)?, ReservationStatus::Pending);
        assert_eq!(reservation.trip_id, Some(trip.id));
        assert_eq!(reservation.total_price_cents, 2 * 150_000);
        assert_eq!(trip.user_id, f.user_id);
        assert_eq!(trip.agency_id, Some(f.agency_id));
        assert_eq!(trip.start_date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(trip.end_date, NaiveDate::from_ymd_opt(2025, 6, 6).unwrap());

        let destinations: Vec<i64> = trip_destinations(&f.db, trip.id)
            .await?
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(destinations, f.destination_ids);

        let participants = participants_for_trip(&f.db, trip.id).await?;
        let names: Vec<&str> = participants.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ana García", "Viajero 2"]);

        let expenses = expenses_for_trip(&f.db, trip.id).await?;
        assert_eq!(expenses.len(), 2);
        assert!(expenses.iter().all(|e| e.prepaid && e.payer_id == participants[0].id));
        let transport = expenses
            .iter()
            .find(|e| e.category == ExpenseCategory::Transport.as_str())
            .unwrap();
        assert_eq!(transport.amount_cents, 2 * 60_000);

        // The customer fronted the whole party's share
        let balances = balances_for_trip(&f.db, trip.id).await?;
        assert_eq!(balances[&participants[0].id], 100_000);
        assert_eq!(balances[&participants[1].id], -100_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_name_writes_nothing() -> Result<()> {
        let f = fixture().await?;
        let mut info = customer(f.user_id);
        info.name = "   ".to_string();

        let result = reserve(&f.db, f.package_id, &info).await;
        assert!(matches!(
            result,
            Err(Error::Validation {
                field: "customer_name",
                ..
            })
        ));
        assert_eq!(Reservation::find().count(&f.db).await?, 0);
        assert_eq!(Trip::find().count(&f.db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_validation_order() -> Result<()> {
        let f = fixture().await?;
        let mut info = customer(f.user_id);
        info.email = String::new();
        info.departure_date = String::new();
        let result = reserve(&f.db, f.package_id, &info).await;
        assert!(matches!(
            result,
            Err(Error::Validation {
                field: "customer_email",
                ..
            })
        ));

        let mut info = customer(f.user_id);
        info.departure_date = "01/06/2025".to_string();
        let result = reserve(&f.db, f.package_id, &info).await;
        assert!(matches!(
            result,
            Err(Error::Validation {
                field: "departure_date",
                ..
            })
        ));

        let mut info = customer(f.user_id);
        info.party_size = 0;
        let result = reserve(&f.db, f.package_id, &info).await;
        assert!(matches!(
            result,
            Err(Error::Validation {
                field: "party_size",
                ..
            })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_inside_transaction_rolls_back() -> Result<()> {
        let f = fixture().await?;
        // A malformed customer email is only caught when the participant is
        // inserted, after the trip row already exists in the transaction.
        let mut info = customer(f.user_id);
        info.email = "not-an-email".to_string();

        let result = reserve(&f.db, f.package_id, &info).await;
        assert!(matches!(result, Err(Error::Validation { field: "email", .. })));
        assert_eq!(Reservation::find().count(&f.db).await?, 0);
        assert_eq!(Trip::find().count(&f.db).await?, 0);

        let result = reserve(&f.db, 999, &customer(f.user_id)).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Package", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_duration_without_days() -> Result<()> {
        let f = fixture().await?;
        // Bypass package validation to store a duration with no day count
        let package = get_package(&f.db, f.package_id).await?;
        let mut active: crate::entities::package::ActiveModel = package.into();
        active.duration = Set("Fin de semana".to_string());
        active.update(&f.db).await?;

        let result = reserve(&f.db, f.package_id, &customer(f.user_id)).await;
        assert!(matches!(
            result,
            Err(Error::Validation {
                field: "duration",
                ..
            })
        ));
        assert_eq!(Trip::find().count(&f.db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_status_transitions() -> Result<()> {
        let f = fixture().await?;
        let (reservation, _) = reserve(&f.db, f.package_id, &customer(f.user_id)).await?;

        let result = update_status(&f.db, reservation.id, ReservationStatus::Completed).await;
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));

        let confirmed = update_status(&f.db, reservation.id, ReservationStatus::Confirmed).await?;
        assert_eq!(status_of(&confirmed)?, ReservationStatus::Confirmed);
        let completed = update_status(&f.db, reservation.id, ReservationStatus::Completed).await?;
        assert_eq!(status_of(&completed)?, ReservationStatus::Completed);

        let result = update_status(&f.db, reservation.id, ReservationStatus::Cancelled).await;
        assert!(matches!(
            result,
            Err(Error::InvalidTransition { ref from, ref to }) if from == "completed" && to == "cancelled"
        ));

        let (second, _) = reserve(&f.db, f.package_id, &customer(f.user_id)).await?;
        update_status(&f.db, second.id, ReservationStatus::Cancelled).await?;
        assert_eq!(reservations_for_agency(&f.db, f.agency_id).await?.len(), 2);
        assert!(reservations_for_agency(&f.db, 999).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_trip_keeps_reservation() -> Result<()> {
        let f = fixture().await?;
        let (reservation, trip) = reserve(&f.db, f.package_id, &customer(f.user_id)).await?;

        crate::core::trip::delete_trip(&f.db, trip.id).await?;
        let reservation = get_reservation(&f.db, reservation.id).await?;
        assert_eq!(reservation.trip_id, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_store_reserve_publishes() -> Result<()> {
        let f = fixture().await?;
        let store = TripStore::open(f.db.clone(), f.user_id).await?;
        let mut rx = store.subscribe();

        let (_, trip) = store.reserve_package(f.package_id, &customer(f.user_id)).await?;
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), vec![trip]);

        let result = store.reserve_package(f.package_id, &customer(f.user_id + 1)).await;
        assert!(matches!(result, Err(Error::Validation { field: "user_id", .. })));
        Ok(())
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Confirmed".parse::<ReservationStatus>().unwrap(), ReservationStatus::Confirmed);
        assert!("shipped".parse::<ReservationStatus>().is_err());
        assert!(ReservationStatus::Pending.can_become(ReservationStatus::Cancelled));
        assert!(!ReservationStatus::Cancelled.can_become(ReservationStatus::Pending));
    }
}
