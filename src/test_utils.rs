//! Shared test utilities for `TravelPin`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        catalog::{self, ItineraryDay, NewAgency, NewDestination, NewPackage, ScheduledExpense},
        expense::{self, ExpenseCategory, NewExpense},
        trip::{NewTrip, insert_trip},
        user,
    },
    entities,
    errors::Result,
};
use sea_orm::{DatabaseConnection, prelude::Date};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test user named "Test User".
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
) -> Result<entities::user::Model> {
    user::create_user(db, "Test User", email).await
}

/// The day every test trip starts: 2025-06-01.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn test_date() -> Date {
    Date::from_ymd_opt(2025, 6, 1).unwrap()
}

/// A trip input with sensible defaults.
///
/// # Defaults
/// * dates: 2025-06-01 to 2025-06-06
/// * icon: blank (the default icon is used)
/// * no agency
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn test_new_trip(name: &str) -> NewTrip {
    NewTrip {
        name: name.to_string(),
        icon: String::new(),
        start_date: test_date(),
        end_date: Date::from_ymd_opt(2025, 6, 6).unwrap(),
        agency_id: None,
    }
}

/// Sets up a complete test environment with a user and one empty trip.
/// Returns (db, trip) for common test scenarios.
pub async fn setup_with_trip() -> Result<(DatabaseConnection, entities::trip::Model)> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, "test@example.com").await?;
    let trip = insert_trip(&db, user.id, &test_new_trip("Test Trip")).await?;
    Ok((db, trip))
}

/// An expense input with sensible defaults.
///
/// # Defaults
/// * `description`: `"Test expense"`
/// * `category`: food
/// * `date`: [`test_date`]
/// * not prepaid, split among the whole trip
#[must_use]
pub fn test_expense(payer_id: i64, amount_cents: i64) -> NewExpense {
    NewExpense {
        description: "Test expense".to_string(),
        amount_cents,
        category: ExpenseCategory::Food,
        payer_id,
        date: test_date(),
        prepaid: false,
        split_among: Vec::new(),
    }
}

/// Records a [`test_expense`] on `trip_id`.
pub async fn create_test_expense(
    db: &DatabaseConnection,
    trip_id: i64,
    payer_id: i64,
    amount_cents: i64,
) -> Result<entities::expense::Model> {
    expense::add_expense(db, trip_id, &test_expense(payer_id, amount_cents)).await
}

/// A destination input with sensible defaults.
///
/// # Defaults
/// * `country`: `"Testlandia"`
/// * `category`: `"cultura"`
/// * `rating`: 4.0
#[must_use]
pub fn test_new_destination(name: &str) -> NewDestination {
    NewDestination {
        name: name.to_string(),
        country: "Testlandia".to_string(),
        category: "cultura".to_string(),
        rating: 4.0,
        description: format!("Visita {name}"),
        budget: "€€".to_string(),
        duration: "3-4 días".to_string(),
        best_season: "Primavera".to_string(),
    }
}

/// Creates a test agency rated 4.5.
pub async fn create_test_agency(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::agency::Model> {
    catalog::create_agency(
        db,
        &NewAgency {
            name: name.to_string(),
            email: Some("agencia@example.com".to_string()),
            phone: None,
            rating: 4.5,
        },
    )
    .await
}

/// A package input with sensible defaults.
///
/// # Defaults
/// * `price_cents`: 150000
/// * `duration`: `"5 días / 4 noches"`
/// * scheduled expenses: flight 60000 (transport), hotel 40000 (lodging)
#[must_use]
pub fn test_new_package(agency_id: i64, destination_ids: &[i64]) -> NewPackage {
    NewPackage {
        agency_id,
        name: "Test Package".to_string(),
        price_cents: 150_000,
        duration: "5 días / 4 noches".to_string(),
        included: Vec::new(),
        itinerary: vec![
            ItineraryDay {
                day: 1,
                title: "Llegada".to_string(),
                description: String::new(),
            },
            ItineraryDay {
                day: 2,
                title: "Excursión".to_string(),
                description: "Día completo".to_string(),
            },
        ],
        expense_breakdown: vec![
            ScheduledExpense {
                description: "Vuelo".to_string(),
                amount_cents: 60_000,
                category: ExpenseCategory::Transport,
            },
            ScheduledExpense {
                description: "Hotel".to_string(),
                amount_cents: 40_000,
                category: ExpenseCategory::Lodging,
            },
        ],
        destination_ids: destination_ids.to_vec(),
    }
}
