//! Explicit split membership for an expense.
//! An expense without rows here is split among every trip participant.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense share database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gasto_participantes")]
pub struct Model {
    /// Expense being split
    #[sea_orm(primary_key, auto_increment = false)]
    pub expense_id: i64,
    /// Participant carrying a share
    #[sea_orm(primary_key, auto_increment = false)]
    pub participant_id: i64,
}

/// Defines relationships between `ExpenseShare` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each share belongs to one expense
    #[sea_orm(
        belongs_to = "super::expense::Entity",
        from = "Column::ExpenseId",
        to = "super::expense::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expense,
    /// Each share names one participant
    #[sea_orm(
        belongs_to = "super::participant::Entity",
        from = "Column::ParticipantId",
        to = "super::participant::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Participant,
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
