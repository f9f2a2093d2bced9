//! Ordered link between a trip and the destinations it visits.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Trip destination database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "viaje_destinos")]
pub struct Model {
    /// Trip the destination is part of
    #[sea_orm(primary_key, auto_increment = false)]
    pub trip_id: i64,
    /// Linked destination
    #[sea_orm(primary_key, auto_increment = false)]
    pub destination_id: i64,
    /// Zero-based order of the stop within the trip
    pub position: i32,
}

/// Defines relationships between `TripDestination` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each link belongs to one trip
    #[sea_orm(
        belongs_to = "super::trip::Entity",
        from = "Column::TripId",
        to = "super::trip::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Trip,
    /// Each link points at one destination
    #[sea_orm(
        belongs_to = "super::destination::Entity",
        from = "Column::DestinationId",
        to = "super::destination::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Destination,
}

impl ActiveModelBehavior for ActiveModel {}
