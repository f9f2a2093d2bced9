//! Ordered link between a package and the destinations it covers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Package destination database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "paquete_destinos")]
pub struct Model {
    /// Package the destination is part of
    #[sea_orm(primary_key, auto_increment = false)]
    pub package_id: i64,
    /// Linked destination
    #[sea_orm(primary_key, auto_increment = false)]
    pub destination_id: i64,
    /// Zero-based order of the stop within the package
    pub position: i32,
}

/// Defines relationships between `PackageDestination` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each stop belongs to one package
    #[sea_orm(
        belongs_to = "super::package::Entity",
        from = "Column::PackageId",
        to = "super::package::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Package,
    /// Each stop points at one destination
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
