//! Collection store - user-scoped bookmark lists of destinations.
//!
//! Collections live in a key-value document (`colecciones:{user_id}`) rather than
//! in the relational schema, using the same JSON layout as the web client:
//! `[{"id":1,"nombre":"...","icono":"...","destinos":[3,7],"fechaCreacion":1717200000000}]`.
//!
//! Every mutation is prepared on a copy of the list, written to the store, and
//! only then swapped in and published. A failed write leaves both the in-memory
//! list and the subscribers untouched.

use crate::{
    core::kv::KeyValueStore,
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Icon used when a collection is created without one
pub const DEFAULT_ICON: &str = "📁";

/// A named, ordered set of destination ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Identifier, unique within the owning user's collections
    pub id: i64,
    /// Display name
    #[serde(rename = "nombre")]
    pub name: String,
    /// Emoji or icon identifier
    #[serde(rename = "icono")]
    pub icon: String,
    /// Destination ids in insertion order, without duplicates
    #[serde(rename = "destinos")]
    pub destinations: Vec<i64>,
    /// Creation time in epoch milliseconds
    #[serde(rename = "fechaCreacion")]
    pub created_at: i64,
}

/// Storage key holding a user's collections.
#[must_use]
pub fn storage_key(user_id: i64) -> String {
    format!("colecciones:{user_id}")
}

/// Storage key holding the last collection id handed out to a user.
///
/// Kept apart from the document so ids of deleted collections are never reused.
#[must_use]
pub fn last_id_key(user_id: i64) -> String {
    format!("colecciones:{user_id}:ultimo_id")
}

/// Serializes collections into their persisted JSON form.
pub fn encode_collections(collections: &[Collection]) -> Result<String> {
    serde_json::to_string(collections).map_err(Into::into)
}

/// Parses the persisted JSON form.
pub fn decode_collections(json: &str) -> Result<Vec<Collection>> {
    serde_json::from_str(json).map_err(Into::into)
}

/// In-memory owner of one user's collections, written through to a [`KeyValueStore`].
#[derive(Debug)]
pub struct CollectionStore<S> {
    store: S,
    key: String,
    last_id_key: String,
    last_id: i64,
    collections: Vec<Collection>,
    tx: watch::Sender<Vec<Collection>>,
}

impl<S: KeyValueStore> CollectionStore<S> {
    /// Loads the collections of `user_id` from `store`.
    ///
    /// A missing key yields an empty store. Destination ids repeated inside a
    /// collection are collapsed to their first occurrence.
    ///
    /// # Errors
    /// Returns [`Error::Serialization`] if the stored document is not valid JSON
    /// in the expected layout, or the store's error if it cannot be read.
    #[instrument(skip(store))]
    pub async fn load(store: S, user_id: i64) -> Result<Self> {
        let key = storage_key(user_id);
        let mut collections = match store.get(&key).await? {
            Some(json) => decode_collections(&json)?,
            None => Vec::new(),
        };

        for collection in &mut collections {
            let before = collection.destinations.len();
            dedup_in_order(&mut collection.destinations);
            if collection.destinations.len() != before {
                warn!(
                    "Collection {} had duplicate destinations; keeping first occurrences",
                    collection.id
                );
            }
        }

        let last_id_key = last_id_key(user_id);
        let stored_last_id: i64 = match store.get(&last_id_key).await? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => 0,
        };
        let last_id = collections
            .iter()
            .map(|c| c.id)
            .fold(stored_last_id, i64::max);

        debug!("Loaded {} collections for user {}", collections.len(), user_id);
        let (tx, _) = watch::channel(collections.clone());
        Ok(Self {
            store,
            key,
            last_id_key,
            last_id,
            collections,
            tx,
        })
    }

    /// Subscribes to the full list, republished after every successful mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<Collection>> {
        self.tx.subscribe()
    }

    /// All collections in creation order.
    #[must_use]
    pub fn list(&self) -> &[Collection] {
        &self.collections
    }

    /// Looks up a collection by id.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    /// Collections that contain `destination_id`.
    #[must_use]
    pub fn containing(&self, destination_id: i64) -> Vec<&Collection> {
        self.collections
            .iter()
            .filter(|c| c.destinations.contains(&destination_id))
            .collect()
    }

    /// Creates an empty collection.
    ///
    /// Ids only grow: a deleted collection's id is never handed out again.
    ///
    /// # Errors
    /// [`Error::Validation`] if the name is blank, [`Error::Persistence`] if the write fails.
    pub async fn create(&mut self, name: &str, icon: &str) -> Result<Collection> {
        let name = required_name(name)?;
        let id = self.last_id + 1;
        // Reserve the id first; a document write that fails later only skips it
        self.store
            .set(&self.last_id_key, &id.to_string())
            .await
            .map_err(into_persistence)?;
        self.last_id = id;

        let collection = Collection {
            id,
            name,
            icon: icon_or_default(icon),
            destinations: Vec::new(),
            created_at: chrono::Utc::now().timestamp_millis(),
        };

        let mut next = self.collections.clone();
        next.push(collection.clone());
        self.commit(next).await?;
        info!("Created collection {} '{}'", collection.id, collection.name);
        Ok(collection)
    }

    /// Renames a collection and/or changes its icon; `None` keeps the current value.
    pub async fn update(
        &mut self,
        id: i64,
        name: Option<&str>,
        icon: Option<&str>,
    ) -> Result<Collection> {
        let name = name.map(required_name).transpose()?;
        let mut next = self.collections.clone();
        let collection = find_mut(&mut next, id)?;
        if let Some(name) = name {
            collection.name = name;
        }
        if let Some(icon) = icon {
            collection.icon = icon_or_default(icon);
        }
        let updated = collection.clone();
        self.commit(next).await?;
        Ok(updated)
    }

    /// Deletes a collection.
    pub async fn delete(&mut self, id: i64) -> Result<()> {
        if self.get(id).is_none() {
            return Err(Error::not_found("Collection", id));
        }
        let next = self.collections.iter().filter(|c| c.id != id).cloned().collect();
        self.commit(next).await?;
        info!("Deleted collection {}", id);
        Ok(())
    }

    /// Appends a destination to a collection.
    ///
    /// Returns `false`, without writing, when the destination is already present.
    pub async fn add_destination(&mut self, id: i64, destination_id: i64) -> Result<bool> {
        let mut next = self.collections.clone();
        let collection = find_mut(&mut next, id)?;
        if collection.destinations.contains(&destination_id) {
            return Ok(false);
        }
        collection.destinations.push(destination_id);
        self.commit(next).await?;
        Ok(true)
    }

    /// Removes a destination from a collection; `false` if it was not there.
    pub async fn remove_destination(&mut self, id: i64, destination_id: i64) -> Result<bool> {
        let mut next = self.collections.clone();
        let collection = find_mut(&mut next, id)?;
        let before = collection.destinations.len();
        collection.destinations.retain(|&d| d != destination_id);
        if collection.destinations.len() == before {
            return Ok(false);
        }
        self.commit(next).await?;
        Ok(true)
    }

    /// Write-then-notify: persist `next`, then adopt and publish it.
    async fn commit(&mut self, next: Vec<Collection>) -> Result<()> {
        let json = encode_collections(&next)?;
        self.store
            .set(&self.key, &json)
            .await
            .map_err(into_persistence)?;
        self.collections = next;
        self.tx.send_replace(self.collections.clone());
        Ok(())
    }
}

fn into_persistence(error: Error) -> Error {
    match error {
        Error::Persistence { .. } => error,
        other => Error::Persistence {
            message: other.to_string(),
        },
    }
}

fn find_mut(collections: &mut [Collection], id: i64) -> Result<&mut Collection> {
    collections
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| Error::not_found("Collection", id))
}

fn required_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("name", "Collection name cannot be empty"));
    }
    Ok(name.to_string())
}

fn icon_or_default(icon: &str) -> String {
    let icon = icon.trim();
    if icon.is_empty() {
        DEFAULT_ICON.to_string()
    } else {
        icon.to_string()
    }
}

fn dedup_in_order(ids: &mut Vec<i64>) {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(*id));
}
