//! Package entity - An agency offer with a fixed price and schedule.
//!
//! `included`, `itinerary` and `expense_breakdown` are JSON documents; use the
//! typed accessors in [`crate::core::catalog`] rather than reading them directly.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Package database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "paquetes")]
pub struct Model {
    /// Unique identifier for the package
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Agency offering the package
    pub agency_id: i64,
    /// Commercial name of the package
    pub name: String,
    /// Price per traveller in cents
    pub price_cents: i64,
    /// Duration text (e.g., "5 días / 4 noches"); the leading number is the day count
    pub duration: String,
    /// JSON array of included items
    pub included: String,
    /// JSON array of itinerary days
    pub itinerary: String,
    /// JSON array of scheduled per-person expenses
    pub expense_breakdown: String,
}

/// Defines relationships between Package and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each package belongs to one agency
    #[sea_orm(
        belongs_to = "super::agency::Entity",
        from = "Column::AgencyId",
        to = "super::agency::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Agency,
}

impl Related<super::agency::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Agency.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
