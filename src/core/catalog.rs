//! Catalog business logic - destinations, agencies, packages and favorites.
//!
//! Destinations and packages are read-mostly reference data: they are written by
//! the seed routine or an administrator and referenced (never owned) by trips,
//! collections and reservations.

use crate::{
    core::expense::ExpenseCategory,
    entities::{
        Agency, Destination, Favorite, Package, PackageDestination, User, agency, destination,
        favorite, package, package_destination,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// One day of a package itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryDay {
    /// Day number, starting at 1
    pub day: u32,
    /// Short title (e.g., "Llegada a Kyoto")
    pub title: String,
    /// Longer description of the day
    #[serde(default)]
    pub description: String,
}

/// A per-person cost that a package schedules up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledExpense {
    /// What the cost covers
    pub description: String,
    /// Per-person amount in cents
    pub amount_cents: i64,
    /// Expense category
    pub category: ExpenseCategory,
}

/// Number of days in a duration text, read from its leading integer token.
///
/// `"5 días / 4 noches"` → `Some(5)`, `"Fin de semana"` → `None`.
#[must_use]
pub fn duration_days(duration: &str) -> Option<u32> {
    let digits: String = duration
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Input for a new destination.
#[derive(Debug, Clone, Default)]
pub struct NewDestination {
    /// Name of the place
    pub name: String,
    /// Country
    pub country: String,
    /// Category
    pub category: String,
    /// Rating 0-5
    pub rating: f64,
    /// Card text
    pub description: String,
    /// Budget hint
    pub budget: String,
    /// Recommended stay
    pub duration: String,
    /// Best season to visit
    pub best_season: String,
}

fn required(field: &'static str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(field, "cannot be empty"));
    }
    Ok(value.to_string())
}

fn validate_rating(rating: f64) -> Result<()> {
    if !rating.is_finite() || !(0.0..=5.0).contains(&rating) {
        return Err(Error::validation(
            "rating",
            format!("must be between 0 and 5, got {rating}"),
        ));
    }
    Ok(())
}

/// Creates a destination.
pub async fn create_destination<C>(db: &C, new: &NewDestination) -> Result<destination::Model>
where
    C: ConnectionTrait,
{
    let name = required("name", &new.name)?;
    let country = required("country", &new.country)?;
    validate_rating(new.rating)?;

    destination::ActiveModel {
        name: Set(name),
        country: Set(country),
        category: Set(new.category.trim().to_string()),
        rating: Set(new.rating),
        description: Set(new.description.clone()),
        budget: Set(new.budget.clone()),
        duration: Set(new.duration.clone()),
        best_season: Set(new.best_season.clone()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Finds a destination by id.
pub async fn get_destination<C>(db: &C, destination_id: i64) -> Result<destination::Model>
where
    C: ConnectionTrait,
{
    Destination::find_by_id(destination_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Destination", destination_id))
}

/// Finds a destination by exact name.
pub async fn find_destination_by_name<C>(db: &C, name: &str) -> Result<Option<destination::Model>>
where
    C: ConnectionTrait,
{
    Destination::find()
        .filter(destination::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All destinations, alphabetically.
pub async fn list_destinations<C>(db: &C) -> Result<Vec<destination::Model>>
where
    C: ConnectionTrait,
{
    Destination::find()
        .order_by_asc(destination::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Destinations whose name or country contains `query` (case-insensitive,
/// accents respected), optionally restricted to one category.
pub async fn search_destinations<C>(
    db: &C,
    query: &str,
    category: Option<&str>,
) -> Result<Vec<destination::Model>>
where
    C: ConnectionTrait,
{
    let needle = query.trim().to_lowercase();
    let category = category.map(|c| c.trim().to_lowercase());
    Ok(list_destinations(db)
        .await?
        .into_iter()
        .filter(|d| {
            needle.is_empty()
                || d.name.to_lowercase().contains(&needle)
                || d.country.to_lowercase().contains(&needle)
        })
        .filter(|d| {
            category
                .as_ref()
                .is_none_or(|c| d.category.to_lowercase() == *c)
        })
        .collect())
}

/// Input for a new agency.
#[derive(Debug, Clone, Default)]
pub struct NewAgency {
    /// Commercial name
    pub name: String,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Rating 0-5
    pub rating: f64,
}

/// Creates an agency.
pub async fn create_agency<C>(db: &C, new: &NewAgency) -> Result<agency::Model>
where
    C: ConnectionTrait,
{
    let name = required("name", &new.name)?;
    validate_rating(new.rating)?;
    agency::ActiveModel {
        name: Set(name),
        email: Set(new.email.clone()),
        phone: Set(new.phone.clone()),
        rating: Set(new.rating),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Finds an agency by id.
pub async fn get_agency<C>(db: &C, agency_id: i64) -> Result<agency::Model>
where
    C: ConnectionTrait,
{
    Agency::find_by_id(agency_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Agency", agency_id))
}

/// Finds an agency by exact name.
pub async fn find_agency_by_name<C>(db: &C, name: &str) -> Result<Option<agency::Model>>
where
    C: ConnectionTrait,
{
    Agency::find()
        .filter(agency::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All agencies, alphabetically.
pub async fn list_agencies<C>(db: &C) -> Result<Vec<agency::Model>>
where
    C: ConnectionTrait,
{
    Agency::find()
        .order_by_asc(agency::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Input for a new package.
#[derive(Debug, Clone, Default)]
pub struct NewPackage {
    /// Offering agency
    pub agency_id: i64,
    /// Commercial name
    pub name: String,
    /// Per-person price in cents
    pub price_cents: i64,
    /// Duration text with a leading day count
    pub duration: String,
    /// Included items
    pub included: Vec<String>,
    /// Day-by-day plan
    pub itinerary: Vec<ItineraryDay>,
    /// Scheduled per-person expenses
    pub expense_breakdown: Vec<ScheduledExpense>,
    /// Destinations in visiting order
    pub destination_ids: Vec<i64>,
}

/// Creates a package and links its destinations in order.
///
/// # Errors
/// [`Error::Validation`] for a blank name, negative price, duration without a
/// leading day count or non-positive scheduled expense; [`Error::NotFound`] if
/// the agency or a destination does not exist.
#[instrument(skip(db, new), fields(name = %new.name))]
pub async fn create_package<C>(db: &C, new: &NewPackage) -> Result<package::Model>
where
    C: ConnectionTrait,
{
    let name = required("name", &new.name)?;
    if new.price_cents < 0 {
        return Err(Error::validation(
            "price",
            format!("cannot be negative, got {}", new.price_cents),
        ));
    }
    if duration_days(&new.duration).is_none() {
        return Err(Error::validation(
            "duration",
            format!("'{}' does not start with a number of days", new.duration),
        ));
    }
    if let Some(bad) = new.expense_breakdown.iter().find(|e| e.amount_cents <= 0) {
        return Err(Error::validation(
            "expense_breakdown",
            format!("'{}' must have a positive amount", bad.description),
        ));
    }
    get_agency(db, new.agency_id).await?;
    for &id in &new.destination_ids {
        get_destination(db, id).await?;
    }

    let package = package::ActiveModel {
        agency_id: Set(new.agency_id),
        name: Set(name),
        price_cents: Set(new.price_cents),
        duration: Set(new.duration.trim().to_string()),
        included: Set(serde_json::to_string(&new.included)?),
        itinerary: Set(serde_json::to_string(&new.itinerary)?),
        expense_breakdown: Set(serde_json::to_string(&new.expense_breakdown)?),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let mut position = 0;
    for &destination_id in &new.destination_ids {
        if PackageDestination::find_by_id((package.id, destination_id))
            .one(db)
            .await?
            .is_some()
        {
            continue;
        }
        package_destination::ActiveModel {
            package_id: Set(package.id),
            destination_id: Set(destination_id),
            position: Set(position),
        }
        .insert(db)
        .await?;
        position += 1;
    }

    debug!("Created package {} with {} destinations", package.id, position);
    Ok(package)
}

/// Finds a package by id.
pub async fn get_package<C>(db: &C, package_id: i64) -> Result<package::Model>
where
    C: ConnectionTrait,
{
    Package::find_by_id(package_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Package", package_id))
}

/// Packages of one agency, cheapest first.
pub async fn packages_for_agency<C>(db: &C, agency_id: i64) -> Result<Vec<package::Model>>
where
    C: ConnectionTrait,
{
    Package::find()
        .filter(package::Column::AgencyId.eq(agency_id))
        .order_by_asc(package::Column::PriceCents)
        .order_by_asc(package::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Destination ids of a package in visiting order.
pub async fn package_destination_ids<C>(db: &C, package_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    Ok(PackageDestination::find()
        .filter(package_destination::Column::PackageId.eq(package_id))
        .order_by_asc(package_destination::Column::Position)
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.destination_id)
        .collect())
}

impl package::Model {
    /// Included items.
    pub fn included_items(&self) -> Result<Vec<String>> {
        serde_json::from_str(&self.included).map_err(Into::into)
    }

    /// Day-by-day plan.
    pub fn itinerary_days(&self) -> Result<Vec<ItineraryDay>> {
        serde_json::from_str(&self.itinerary).map_err(Into::into)
    }

    /// Scheduled per-person expenses.
    pub fn scheduled_expenses(&self) -> Result<Vec<ScheduledExpense>> {
        serde_json::from_str(&self.expense_breakdown).map_err(Into::into)
    }

    /// Scheduled per-person total per category.
    pub fn breakdown_by_category(&self) -> Result<BTreeMap<ExpenseCategory, i64>> {
        let mut totals = BTreeMap::new();
        for expense in self.scheduled_expenses()? {
            *totals.entry(expense.category).or_default() += expense.amount_cents;
        }
        Ok(totals)
    }
}

/// Marks a destination as a favorite; `false` if it already was one.
#[instrument(skip(db))]
pub async fn add_favorite<C>(db: &C, user_id: i64, destination_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;
    get_destination(db, destination_id).await?;

    if Favorite::find_by_id((user_id, destination_id))
        .one(db)
        .await?
        .is_some()
    {
        return Ok(false);
    }
    favorite::ActiveModel {
        user_id: Set(user_id),
        destination_id: Set(destination_id),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(db)
    .await?;
    info!("User {} favorited destination {}", user_id, destination_id);
    Ok(true)
}

/// Unmarks a favorite; `false` if it was not one.
pub async fn remove_favorite<C>(db: &C, user_id: i64, destination_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = Favorite::delete_by_id((user_id, destination_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// A user's favorite destinations, alphabetically.
pub async fn favorites<C>(db: &C, user_id: i64) -> Result<Vec<destination::Model>>
where
    C: ConnectionTrait,
{
    let ids: Vec<i64> = Favorite::find()
        .filter(favorite::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|f| f.destination_id)
        .collect();
    Destination::find()
        .filter(destination::Column::Id.is_in(ids))
        .order_by_asc(destination::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}
