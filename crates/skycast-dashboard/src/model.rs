//! Dashboard state and user actions.
//!
//! All state lives on the dashboard loop. Actions start requests through
//! [`DashboardServices`]; results arrive later as [`DashboardMessage`]s and are
//! folded in by [`Dashboard::apply`].

use chrono::{DateTime, Utc};
use skycast_weather::{
    Acquisition, City, FallbackReason, FavoritesStore, ForecastDay, KeyValueStore, WeatherSnapshot,
};

use crate::error_mapping::favorites_error;
use crate::render::Theme;
use crate::services::{DashboardMessage, DashboardServices, Notice};

/// How results of overlapping requests are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyPolicy {
    /// Every result is shown as it arrives; a slow old response can
    /// overwrite a newer one.
    #[default]
    CompletionOrder,
    /// Results of requests superseded by a newer one are dropped.
    LatestRequest,
}

/// Read-only view used by the renderer
pub struct DashboardView<'a> {
    pub weather: Option<&'a WeatherSnapshot>,
    pub forecast: &'a [ForecastDay],
    pub favorites: &'a [City],
    pub suggestions: &'a [City],
    pub is_favorite: bool,
    pub loading: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub fallback: Option<FallbackReason>,
    pub theme: Theme,
}

pub struct Dashboard<S: KeyValueStore> {
    services: DashboardServices,
    favorites: FavoritesStore<S>,
    policy: ApplyPolicy,
    theme: Theme,
    weather: Option<WeatherSnapshot>,
    forecast: Vec<ForecastDay>,
    suggestions: Vec<City>,
    /// Type-ahead query whose answer is still wanted
    pending_query: Option<String>,
    fallback: Option<FallbackReason>,
    last_updated: Option<DateTime<Utc>>,
    notices: Vec<Notice>,
    /// Generation of the most recently issued fetch
    issued: u64,
    /// Fetches issued but not yet answered
    in_flight: usize,
}

impl<S: KeyValueStore> Dashboard<S> {
    pub fn new(services: DashboardServices, favorites: FavoritesStore<S>, policy: ApplyPolicy, theme: Theme) -> Self {
        Self {
            services,
            favorites,
            policy,
            theme,
            weather: None,
            forecast: Vec::new(),
            suggestions: Vec::new(),
            pending_query: None,
            fallback: None,
            last_updated: None,
            notices: Vec::new(),
            issued: 0,
            in_flight: 0,
        }
    }

    pub fn view(&self) -> DashboardView<'_> {
        DashboardView {
            weather: self.weather.as_ref(),
            forecast: &self.forecast,
            favorites: self.favorites.list(),
            suggestions: &self.suggestions,
            is_favorite: self.is_current_favorite(),
            loading: self.is_loading(),
            last_updated: self.last_updated,
            fallback: self.fallback,
            theme: self.theme,
        }
    }

    pub fn weather(&self) -> Option<&WeatherSnapshot> {
        self.weather.as_ref()
    }

    pub fn forecast(&self) -> &[ForecastDay] {
        &self.forecast
    }

    pub fn suggestions(&self) -> &[City] {
        &self.suggestions
    }

    pub fn favorites(&self) -> &[City] {
        self.favorites.list()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Drain pending notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn is_current_favorite(&self) -> bool {
        self.weather
            .as_ref()
            .is_some_and(|w| self.favorites.contains(&w.as_city()))
    }

    fn next_generation(&mut self) -> u64 {
        self.issued += 1;
        self.in_flight += 1;
        self.last_updated = Some(Utc::now());
        self.issued
    }

    /// Use-my-location. Also run once at start-up.
    pub fn locate(&mut self) {
        let generation = self.next_generation();
        self.services.request_locate(generation);
    }

    /// Free-text search. Returns false for a blank query.
    pub fn search(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        let generation = self.next_generation();
        self.services.request_city(generation, query.to_string());
        true
    }

    /// Look up type-ahead suggestions for `query`.
    pub fn suggest(&mut self, query: &str) {
        let query = query.trim().to_string();
        self.pending_query = Some(query.clone());
        self.services.request_suggestions(query);
    }

    /// Fetch weather for a suggestion or favorite.
    pub fn select(&mut self, city: &City) {
        let generation = self.next_generation();
        self.suggestions.clear();
        self.pending_query = None;
        self.services
            .request_coordinates(generation, city.latitude, city.longitude);
    }

    /// Re-fetch the displayed city by name. Returns false when nothing is displayed.
    pub fn refresh(&mut self) -> bool {
        if !self.refetch_current() {
            return false;
        }
        self.notices.push(Notice::Success("Weather refreshed!".to_string()));
        true
    }

    /// Timer-driven refresh; silent.
    pub fn auto_refresh(&mut self) {
        if self.refetch_current() {
            tracing::debug!("Auto-refresh started");
        }
    }

    fn refetch_current(&mut self) -> bool {
        let Some(city) = self.weather.as_ref().map(|w| w.city.clone()) else {
            return false;
        };
        let generation = self.next_generation();
        self.services.request_city(generation, city);
        true
    }

    /// Add or remove the displayed city. Returns the new favorite state,
    /// or `None` when nothing is displayed.
    pub fn toggle_favorite(&mut self) -> Option<bool> {
        let city = self.weather.as_ref()?.as_city();
        let now_favorite = !self.favorites.contains(&city);
        let result = if now_favorite {
            self.favorites.add(city.clone())
        } else {
            self.favorites.remove(&city)
        };

        match result {
            Ok(_) => {
                let verb = if now_favorite { "added to" } else { "removed from" };
                self.notices
                    .push(Notice::Success(format!("{} {} favorites", city.name, verb)));
            }
            Err(e) => {
                tracing::error!("Failed to save favorites: {}", e);
                self.notices
                    .push(Notice::Error(favorites_error(e).user_message().to_string()));
            }
        }
        Some(now_favorite)
    }

    pub fn remove_favorite(&mut self, city: &City) {
        if let Err(e) = self.favorites.remove(city) {
            tracing::error!("Failed to save favorites: {}", e);
            self.notices
                .push(Notice::Error(favorites_error(e).user_message().to_string()));
        }
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    /// Fold one message into the dashboard state.
    pub fn apply(&mut self, message: DashboardMessage) {
        match message {
            DashboardMessage::Fetched {
                generation,
                acquisition,
            } => self.apply_fetch(generation, acquisition),
            DashboardMessage::Suggestions { query, cities } => {
                if self.pending_query.as_deref() != Some(query.as_str()) {
                    tracing::debug!("Dropping suggestions for stale query {:?}", query);
                    return;
                }
                tracing::debug!("{} suggestions for {:?}", cities.len(), query);
                self.suggestions = cities;
            }
            DashboardMessage::Notice(notice) => self.notices.push(notice),
            DashboardMessage::RefreshTick => self.auto_refresh(),
        }
    }

    fn apply_fetch(&mut self, generation: u64, acquisition: Acquisition) {
        self.in_flight = self.in_flight.saturating_sub(1);

        if self.policy == ApplyPolicy::LatestRequest && generation < self.issued {
            tracing::debug!(
                "Discarding result of request {} (latest is {})",
                generation,
                self.issued
            );
            return;
        }

        match acquisition {
            Acquisition::Live { snapshot, forecast } => {
                self.weather = Some(snapshot);
                // A missing forecast leaves the previous one in place
                if let Some(days) = forecast {
                    self.forecast = days;
                }
                self.fallback = None;
            }
            Acquisition::Fallback { report, reason } => {
                self.weather = Some(report.snapshot);
                self.forecast = report.forecast;
                self.fallback = Some(reason);
            }
        }
    }
}
