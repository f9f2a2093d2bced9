//! Catalog seeding from [`CatalogConfig`].

use crate::{
    config::catalog::{AgencyConfig, CatalogConfig, DestinationConfig, PackageConfig},
    core::catalog::{
        NewAgency, NewDestination, NewPackage, create_agency, create_destination, create_package,
        find_agency_by_name, find_destination_by_name,
    },
    entities::{Package, package},
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// Rows inserted by one [`seed_catalog`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// New destinations
    pub destinations: usize,
    /// New agencies
    pub agencies: usize,
    /// New packages
    pub packages: usize,
}

impl SeedSummary {
    /// Whether the run inserted nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.destinations == 0 && self.agencies == 0 && self.packages == 0
    }
}

/// Writes the catalog's reference data, skipping anything already present.
///
/// Destinations and agencies are matched by name, packages by agency and name.
/// Existing rows are left untouched. The whole run is one transaction.
///
/// # Errors
/// [`Error::Config`] if a package names a destination that is neither in the
/// database nor in the catalog; validation errors from the catalog functions.
#[instrument(skip(db, catalog))]
pub async fn seed_catalog(db: &DatabaseConnection, catalog: &CatalogConfig) -> Result<SeedSummary> {
    info!(
        "Seeding catalog: {} destinations, {} agencies",
        catalog.destinations.len(),
        catalog.agencies.len()
    );
    let txn = db.begin().await?;
    let mut summary = SeedSummary::default();

    for destination in &catalog.destinations {
        if seed_destination(&txn, destination).await? {
            summary.destinations += 1;
        }
    }
    for agency in &catalog.agencies {
        let (agency_id, inserted) = seed_agency(&txn, agency).await?;
        if inserted {
            summary.agencies += 1;
        }
        for package in &agency.packages {
            if seed_package(&txn, agency_id, package).await? {
                summary.packages += 1;
            }
        }
    }

    txn.commit().await?;
    info!("Catalog seeded: {:?}", summary);
    Ok(summary)
}

async fn seed_destination<C>(db: &C, cfg: &DestinationConfig) -> Result<bool>
where
    C: ConnectionTrait,
{
    if find_destination_by_name(db, &cfg.name).await?.is_some() {
        debug!("Destination '{}' already exists. Skipping.", cfg.name);
        return Ok(false);
    }
    create_destination(
        db,
        &NewDestination {
            name: cfg.name.clone(),
            country: cfg.country.clone(),
            category: cfg.category.clone(),
            rating: cfg.rating,
            description: cfg.description.clone(),
            budget: cfg.budget.clone(),
            duration: cfg.duration.clone(),
            best_season: cfg.best_season.clone(),
        },
    )
    .await?;
    Ok(true)
}

async fn seed_agency<C>(db: &C, cfg: &AgencyConfig) -> Result<(i64, bool)>
where
    C: ConnectionTrait,
{
    if let Some(existing) = find_agency_by_name(db, &cfg.name).await? {
        debug!("Agency '{}' already exists. Skipping.", cfg.name);
        return Ok((existing.id, false));
    }
    let agency = create_agency(
        db,
        &NewAgency {
            name: cfg.name.clone(),
            email: cfg.email.clone(),
            phone: cfg.phone.clone(),
            rating: cfg.rating,
        },
    )
    .await?;
    Ok((agency.id, true))
}

async fn seed_package<C>(db: &C, agency_id: i64, cfg: &PackageConfig) -> Result<bool>
where
    C: ConnectionTrait,
{
    let existing = Package::find()
        .filter(package::Column::AgencyId.eq(agency_id))
        .filter(package::Column::Name.eq(cfg.name.trim()))
        .one(db)
        .await?;
    if existing.is_some() {
        debug!("Package '{}' already exists. Skipping.", cfg.name);
        return Ok(false);
    }

    let mut destination_ids = Vec::with_capacity(cfg.destinations.len());
    for name in &cfg.destinations {
        let destination = find_destination_by_name(db, name)
            .await?
            .ok_or_else(|| Error::Config {
                message: format!("Package '{}' references unknown destination '{name}'", cfg.name),
            })?;
        destination_ids.push(destination.id);
    }

    create_package(
        db,
        &NewPackage {
            agency_id,
            name: cfg.name.clone(),
            price_cents: cfg.price_cents,
            duration: cfg.duration.clone(),
            included: cfg.included.clone(),
            itinerary: cfg.itinerary.clone(),
            expense_breakdown: cfg.expenses.clone(),
            destination_ids,
        },
    )
    .await?;
    Ok(true)
}
