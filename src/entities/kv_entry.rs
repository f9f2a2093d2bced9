//! Key-value entity - Durable backing for [`crate::core::kv::DatabaseStore`].
//! Used for client-style documents such as per-user collection lists.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Key-value database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "kv_store")]
pub struct Model {
    /// Storage key (e.g., `"colecciones:42"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Stored document, usually JSON
    pub value: String,
    /// When this key was last written
    pub updated_at: DateTimeUtc,
}

/// `KvEntry` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
