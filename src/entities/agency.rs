//! Agency entity - A travel agency offering packages.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Agency database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "agencias")]
pub struct Model {
    /// Unique identifier for the agency
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Commercial name
    pub name: String,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Average customer rating, 0 to 5
    pub rating: f64,
}

/// Defines relationships between Agency and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One agency offers many packages
    #[sea_orm(has_many = "super::package::Entity")]
    Packages,
}

impl Related<super::package::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Packages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
