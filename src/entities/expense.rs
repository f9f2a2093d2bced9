//! Expense entity - Money spent on a trip by one participant.
//!
//! `category` holds the persisted form of [`crate::core::expense::ExpenseCategory`].
//! Expenses materialized from an agency package carry `prepaid = true`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gastos")]
pub struct Model {
    /// Unique identifier for the expense
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning trip
    pub trip_id: i64,
    /// What the money was spent on
    pub description: String,
    /// Amount in cents, always positive
    pub amount_cents: i64,
    /// One of `transporte`, `alojamiento`, `comida`, `actividades`, `otros`
    pub category: String,
    /// Participant who paid
    pub payer_id: i64,
    /// Day the expense happened (or is scheduled)
    pub date: Date,
    /// Paid up front to the agency as part of a package
    pub prepaid: bool,
}

/// Defines relationships between Expense and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each expense belongs to one trip
    #[sea_orm(
        belongs_to = "super::trip::Entity",
        from = "Column::TripId",
        to = "super::trip::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Trip,
    /// Explicit split members, if any
    #[sea_orm(has_many = "super::expense_share::Entity")]
    Shares,
}

impl Related<super::trip::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trip.def()
    }
}

impl Related<super::expense_share::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shares.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
