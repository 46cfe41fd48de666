//! Favorite cities, persisted as a JSON array under one storage key.
//!
//! Every mutation rewrites the whole list. The store is owned by a single
//! event loop, so mutations take `&mut self` and need no locking.

use crate::storage::{KeyValueStore, StorageError};
use crate::types::City;

/// Storage key for the favorites blob
pub const FAVORITES_KEY: &str = "weather-favorites";

#[derive(Debug, thiserror::Error)]
pub enum FavoritesError {
    #[error("Failed to persist favorites: {0}")]
    Storage(#[from] StorageError),
    #[error("Failed to encode favorites: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Ordered favorites list with no two entries sharing (name, country).
pub struct FavoritesStore<S: KeyValueStore> {
    storage: S,
    favorites: Vec<City>,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    /// Load the persisted list. Missing or malformed data yields an empty list.
    pub fn load(storage: S) -> Self {
        let favorites = match storage.get(FAVORITES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<City>>(&raw) {
                Ok(list) => dedup(list),
                Err(e) => {
                    tracing::warn!("Ignoring malformed favorites data: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read favorites: {}", e);
                Vec::new()
            }
        };

        tracing::debug!("Loaded {} favorites", favorites.len());
        Self { storage, favorites }
    }

    pub fn list(&self) -> &[City] {
        &self.favorites
    }

    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    pub fn contains(&self, city: &City) -> bool {
        self.favorites.iter().any(|f| f.same_place(city))
    }

    /// Append `city` unless an entry with the same identity exists.
    /// Returns whether the list changed.
    ///
    /// # Errors
    /// Persisting failed. The in-memory list is updated regardless.
    pub fn add(&mut self, city: City) -> Result<bool, FavoritesError> {
        if self.contains(&city) {
            return Ok(false);
        }
        tracing::info!("Adding favorite: {}, {}", city.name, city.country);
        self.favorites.push(city);
        self.persist()?;
        Ok(true)
    }

    /// Remove every entry sharing `city`'s identity. Returns whether the list changed.
    ///
    /// # Errors
    /// Persisting failed. The in-memory list is updated regardless.
    pub fn remove(&mut self, city: &City) -> Result<bool, FavoritesError> {
        let before = self.favorites.len();
        self.favorites.retain(|f| !f.same_place(city));
        let changed = self.favorites.len() != before;
        if changed {
            tracing::info!("Removed favorite: {}, {}", city.name, city.country);
        }
        self.persist()?;
        Ok(changed)
    }

    /// Add if absent, remove if present. Returns whether `city` is now a favorite.
    ///
    /// # Errors
    /// Persisting failed.
    pub fn toggle(&mut self, city: City) -> Result<bool, FavoritesError> {
        if self.contains(&city) {
            self.remove(&city)?;
            Ok(false)
        } else {
            self.add(city)?;
            Ok(true)
        }
    }

    fn persist(&self) -> Result<(), FavoritesError> {
        let json = serde_json::to_string(&self.favorites)?;
        self.storage.set(FAVORITES_KEY, &json)?;
        Ok(())
    }
}

/// Drop later duplicates from a hand-edited or legacy blob.
fn dedup(list: Vec<City>) -> Vec<City> {
    let mut out: Vec<City> = Vec::with_capacity(list.len());
    for city in list {
        if !out.iter().any(|c| c.same_place(&city)) {
            out.push(city);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn paris() -> City {
        City::new("Paris", "FR", 48.85, 2.35)
    }

    fn stored(storage: &MemoryStore) -> Vec<City> {
        let raw = storage.get(FAVORITES_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn test_load_missing_is_empty() {
        let store = FavoritesStore::load(MemoryStore::new());
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_malformed_is_empty() {
        let storage = MemoryStore::new();
        storage.set(FAVORITES_KEY, "[{\"name\": 42}").unwrap();
        let store = FavoritesStore::load(storage);
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_then_remove() {
        let mut store = FavoritesStore::load(MemoryStore::new());
        let city = paris();

        assert!(store.add(city.clone()).unwrap());
        assert!(store.contains(&city));

        assert!(store.remove(&city).unwrap());
        assert!(!store.contains(&city));
    }

    #[test]
    fn test_add_is_idempotent_by_identity() {
        let mut store = FavoritesStore::load(MemoryStore::new());
        store.add(paris()).unwrap();
        let changed = store.add(City::new("Paris", "FR", 0.0, 0.0)).unwrap();

        assert!(!changed);
        assert_eq!(store.len(), 1);
        // First entry's coordinates are kept
        assert_eq!(store.list()[0].latitude, 48.85);
    }

    #[test]
    fn test_same_name_other_country_is_distinct() {
        let mut store = FavoritesStore::load(MemoryStore::new());
        store.add(paris()).unwrap();
        store.add(City::new("Paris", "US", 33.66, -95.55)).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_mutations_persist_full_list() {
        let storage = MemoryStore::new();
        let mut store = FavoritesStore::load(storage.clone());
        store.add(paris()).unwrap();
        store.add(City::new("Oslo", "NO", 59.91, 10.75)).unwrap();

        let names: Vec<String> = stored(&storage).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Paris", "Oslo"]);

        store.remove(&paris()).unwrap();
        assert_eq!(stored(&storage).len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let storage = MemoryStore::new();
        let mut store = FavoritesStore::load(storage.clone());
        assert!(!store.remove(&paris()).unwrap());
        assert!(stored(&storage).is_empty());
    }

    #[test]
    fn test_reload_round_trip() {
        let storage = MemoryStore::new();
        {
            let mut store = FavoritesStore::load(storage.clone());
            store.add(paris()).unwrap();
        }
        let reloaded = FavoritesStore::load(storage);
        assert!(reloaded.contains(&paris()));
    }

    #[test]
    fn test_load_drops_duplicate_entries() {
        let storage = MemoryStore::new();
        let raw = serde_json::to_string(&vec![paris(), paris()]).unwrap();
        storage.set(FAVORITES_KEY, &raw).unwrap();
        assert_eq!(FavoritesStore::load(storage).len(), 1);
    }

    #[test]
    fn test_toggle() {
        let mut store = FavoritesStore::load(MemoryStore::new());
        assert!(store.toggle(paris()).unwrap());
        assert!(!store.toggle(paris()).unwrap());
        assert!(store.is_empty());
    }
}
