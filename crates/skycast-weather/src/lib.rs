//! Weather service for SkyCast
//!
//! Fetches current conditions and a daily forecast from OpenWeatherMap,
//! falls back to demo data when the API cannot be reached, and keeps a
//! persisted list of favorite cities.

pub mod types;
pub mod demo;
pub mod favorites;
pub mod forecast;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod storage;

pub use types::*;
pub use favorites::{FavoritesError, FavoritesStore, FAVORITES_KEY};
pub use location::LocationSource;
pub use provider::{ProviderSettings, WeatherProvider};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
