//! Reservation entity - A customer's booking of an agency package.
//!
//! `status` holds the persisted form of [`crate::core::reservation::ReservationStatus`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reservation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservas")]
pub struct Model {
    /// Unique identifier for the reservation
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Booked package
    pub package_id: i64,
    /// Agency that owns the package
    pub agency_id: i64,
    /// Trip materialized for the booking; cleared if the trip is deleted
    pub trip_id: Option<i64>,
    /// Customer full name
    pub customer_name: String,
    /// Customer email
    pub customer_email: String,
    /// Customer phone
    pub customer_phone: Option<String>,
    /// Number of travellers
    pub party_size: i32,
    /// First day of the trip
    pub departure_date: Date,
    /// Price for the whole party in cents
    pub total_price_cents: i64,
    /// `pending`, `confirmed`, `completed` or `cancelled`
    pub status: String,
    /// When the booking was made
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Reservation and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each reservation books one package
    #[sea_orm(
        belongs_to = "super::package::Entity",
        from = "Column::PackageId",
        to = "super::package::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Package,
    /// The materialized trip, while it exists
    #[sea_orm(
        belongs_to = "super::trip::Entity",
        from = "Column::TripId",
        to = "super::trip::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Trip,
}

impl ActiveModelBehavior for ActiveModel {}
