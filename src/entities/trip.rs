//! Trip entity - A user's planned journey.
//!
//! A trip exclusively owns its participants, expenses, payments and destination
//! links; all of them are removed together with the trip.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Trip database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "viajes")]
pub struct Model {
    /// Unique identifier for the trip
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Trip name (e.g., "Verano en Japón")
    pub name: String,
    /// Emoji or icon identifier shown next to the name
    pub icon: String,
    /// First day of the trip
    pub start_date: Date,
    /// Last day of the trip
    pub end_date: Date,
    /// Whether the trip is closed for edits
    pub finalized: bool,
    /// Agency the trip was booked through, if any
    pub agency_id: Option<i64>,
    /// When the trip was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Trip and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each trip belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    /// Trips booked through an agency keep existing if the agency goes away
    #[sea_orm(
        belongs_to = "super::agency::Entity",
        from = "Column::AgencyId",
        to = "super::agency::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Agency,
    /// One trip has many participants
    #[sea_orm(has_many = "super::participant::Entity")]
    Participants,
    /// One trip has many expenses
    #[sea_orm(has_many = "super::expense::Entity")]
    Expenses,
    /// One trip has many payments
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
