//! Destination entity - Immutable reference data seeded from the catalog.
//!
//! Destinations are referenced by trips, packages and favorites but never owned by them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Destination database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "destinos")]
pub struct Model {
    /// Unique identifier for the destination
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the place (e.g., "Kyoto")
    pub name: String,
    /// Country the destination belongs to
    pub country: String,
    /// Free-form category (e.g., "playa", "montaña", "ciudad")
    pub category: String,
    /// Average rating, 0 to 5
    pub rating: f64,
    /// Descriptive text shown on the destination card
    pub description: String,
    /// Budget hint (e.g., "€€")
    pub budget: String,
    /// Recommended stay (e.g., "4-5 días")
    pub duration: String,
    /// Best season to visit
    pub best_season: String,
}

/// Destinations only appear on the referenced side of relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
