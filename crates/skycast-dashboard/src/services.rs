//! Dashboard backend: async weather and location work.
//! Every request runs as its own task; results come back over an mpsc channel.
//! Requests are never cancelled once started.

use std::sync::Arc;
use std::time::Duration;

use skycast_weather::{Acquisition, City, LocationSource, WeatherProvider};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::error_mapping::location_error;

/// Transient user-facing confirmation or warning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// Messages sent from async operations back to the dashboard loop
#[derive(Debug)]
pub enum DashboardMessage {
    /// Result of one acquisition sequence, tagged with the request generation
    Fetched {
        generation: u64,
        acquisition: Acquisition,
    },
    /// Type-ahead suggestions for `query`
    Suggestions { query: String, cities: Vec<City> },
    /// Notice produced off the dashboard loop (geolocation outcome)
    Notice(Notice),
    /// Auto-refresh timer fired
    RefreshTick,
}

/// Shared handles used to start requests.
#[derive(Clone)]
pub struct DashboardServices {
    provider: Arc<WeatherProvider>,
    location: Arc<LocationSource>,
    default_city: String,
    tx: UnboundedSender<DashboardMessage>,
    runtime: tokio::runtime::Handle,
}

impl DashboardServices {
    /// Must be called from within a Tokio runtime.
    pub fn new(
        provider: Arc<WeatherProvider>,
        location: Arc<LocationSource>,
        default_city: impl Into<String>,
    ) -> (Self, UnboundedReceiver<DashboardMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let services = Self {
            provider,
            location,
            default_city: default_city.into(),
            tx,
            runtime: tokio::runtime::Handle::current(),
        };
        (services, rx)
    }

    pub fn default_city(&self) -> &str {
        &self.default_city
    }

    /// Sender for messages from outside the services (timer, tests).
    pub fn sender(&self) -> UnboundedSender<DashboardMessage> {
        self.tx.clone()
    }

    /// Locate the user, then fetch weather there. Falls back to the default city.
    pub fn request_locate(&self, generation: u64) {
        let tx = self.tx.clone();
        let provider = self.provider.clone();
        let location = self.location.clone();
        let default_city = self.default_city.clone();

        self.runtime.spawn(async move {
            let (acquisition, notice) = match location.locate().await {
                Ok(coords) => {
                    let acquisition = provider.fetch_by_coordinates(coords.latitude, coords.longitude).await;
                    (acquisition, Notice::Success("Location detected!".to_string()))
                }
                Err(e) => {
                    tracing::warn!("Geolocation error: {}", e);
                    let acquisition = provider.fetch_by_city_name(&default_city).await;
                    (acquisition, Notice::Error(location_error(&e).user_message().to_string()))
                }
            };
            let _ = tx.send(DashboardMessage::Notice(notice));
            let _ = tx.send(DashboardMessage::Fetched { generation, acquisition });
        });
    }

    pub fn request_city(&self, generation: u64, name: String) {
        let tx = self.tx.clone();
        let provider = self.provider.clone();
        self.runtime.spawn(async move {
            let acquisition = provider.fetch_by_city_name(&name).await;
            let _ = tx.send(DashboardMessage::Fetched { generation, acquisition });
        });
    }

    pub fn request_coordinates(&self, generation: u64, lat: f64, lon: f64) {
        let tx = self.tx.clone();
        let provider = self.provider.clone();
        self.runtime.spawn(async move {
            let acquisition = provider.fetch_by_coordinates(lat, lon).await;
            let _ = tx.send(DashboardMessage::Fetched { generation, acquisition });
        });
    }

    pub fn request_suggestions(&self, query: String) {
        let tx = self.tx.clone();
        let provider = self.provider.clone();
        self.runtime.spawn(async move {
            let cities = provider.search_cities(&query).await;
            let _ = tx.send(DashboardMessage::Suggestions { query, cities });
        });
    }
}

/// Send [`DashboardMessage::RefreshTick`] every `period` until `cancel` fires.
/// The first tick comes one full period after start.
pub fn spawn_auto_refresh(
    tx: UnboundedSender<DashboardMessage>,
    period: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Auto-refresh stopped");
                    break;
                }
                _ = interval.tick() => {
                    if tx.send(DashboardMessage::RefreshTick).is_err() {
                        break;
                    }
                }
            }
        }
    })
}
