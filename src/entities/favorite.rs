//! Favorite entity - Join table marking a destination as a user's favorite.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Favorite database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "favoritos")]
pub struct Model {
    /// User who marked the favorite
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    /// Destination marked as favorite
    #[sea_orm(primary_key, auto_increment = false)]
    pub destination_id: i64,
    /// When the favorite was added
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Favorite and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each favorite belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    /// Each favorite points at one destination
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
