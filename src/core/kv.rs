//! Key-value persistence for client-style documents.
//!
//! Stores such as [`crate::core::collection::CollectionStore`] take a
//! [`KeyValueStore`] instead of reaching for a global, so tests can run against
//! [`MemoryStore`] and the application against [`DatabaseStore`].

use crate::{
    entities::{KvEntry, kv_entry},
    errors::{Error, Result},
};
use async_trait::async_trait;
use sea_orm::{Set, prelude::*, sea_query::OnConflict};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// A durable string-to-string store.
///
/// Implementations report failures as [`Error::Persistence`].
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;
    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removes `key`; removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Store backed by the `kv_store` table.
#[derive(Debug, Clone)]
pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    /// Wraps an open connection; the `kv_store` table must already exist.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn persistence(action: &str, key: &str, e: &DbErr) -> Error {
    Error::Persistence {
        message: format!("failed to {action} key '{key}': {e}"),
    }
}

#[async_trait]
impl KeyValueStore for DatabaseStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entry = KvEntry::find_by_id(key.to_string())
            .one(&self.db)
            .await
            .map_err(|e| persistence("read", key, &e))?;
        Ok(entry.map(|e| e.value))
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let entry = kv_entry::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(chrono::Utc::now()),
        };
        KvEntry::insert(entry)
            .on_conflict(
                OnConflict::column(kv_entry::Column::Key)
                    .update_columns([kv_entry::Column::Value, kv_entry::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| persistence("write", key, &e))?;
        debug!("Stored {} bytes under '{}'", value.len(), key);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> Result<()> {
        KvEntry::delete_by_id(key.to_string())
            .exec(&self.db)
            .await
            .map_err(|e| persistence("remove", key, &e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_memory_store_set_get_remove() -> Result<()> {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await?, None);

        store.set("k", "v1").await?;
        store.set("k", "v2").await?;
        assert_eq!(store.get("k").await?, Some("v2".to_string()));

        store.remove("k").await?;
        store.remove("k").await?;
        assert_eq!(store.get("k").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_database_store_upserts() -> Result<()> {
        let db = setup_test_db().await?;
        let store = DatabaseStore::new(db.clone());

        store.set("colecciones:1", "[]").await?;
        store.set("colecciones:1", "[1]").await?;
        assert_eq!(store.get("colecciones:1").await?, Some("[1]".to_string()));
        assert_eq!(KvEntry::find().count(&db).await?, 1);

        store.remove("colecciones:1").await?;
        assert_eq!(store.get("colecciones:1").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_database_store_reports_persistence_errors() -> Result<()> {
        // No tables: every access fails
        let db = sea_orm::Database::connect("sqlite::memory:").await?;
        let store = DatabaseStore::new(db);

        assert!(matches!(
            store.set("k", "v").await,
            Err(Error::Persistence { message: _ })
        ));
        assert!(matches!(
            store.get("k").await,
            Err(Error::Persistence { message: _ })
        ));
        Ok(())
    }
}
