//! Participant entity - A person sharing the costs of a trip.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Participant database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "participantes")]
pub struct Model {
    /// Unique identifier for the participant
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning trip
    pub trip_id: i64,
    /// Display name
    pub name: String,
    /// Contact email, if known
    pub email: Option<String>,
    /// Up to two upper-case letters used for the avatar
    pub initials: String,
    /// Avatar background colour as a hex string
    pub color: String,
}

/// Defines relationships between Participant and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each participant belongs to one trip
    #[sea_orm(
        belongs_to = "super::trip::Entity",
        from = "Column::TripId",
        to = "super::trip::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Trip,
}

impl Related<super::trip::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trip.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
