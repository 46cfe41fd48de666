//! OpenWeatherMap client.
//!
//! Every public operation degrades silently: failures are logged and replaced
//! by demo data, and the returned [`Acquisition`] records which branch was taken.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use crate::demo;
use crate::forecast::{daily_forecast, round_half_up, wind_kmh, ForecastSlot};
use crate::geocode::{self, GeocodeMatch, GEOCODE_PATH, SUGGESTION_LIMIT};
use crate::types::{Acquisition, City, FallbackReason, ForecastDay, WeatherError, WeatherSnapshot};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_API_KEY: &str = "demo";
const CURRENT_PATH: &str = "/data/2.5/weather";
const FORECAST_PATH: &str = "/data/2.5/forecast";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("SkyCast/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`WeatherProvider`]
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Condition {
    main: String,
    #[serde(default)]
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    name: String,
    sys: CurrentSys,
    main: CurrentMain,
    weather: Vec<Condition>,
    wind: Wind,
    #[serde(default)]
    timezone: i32,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct CurrentSys {
    #[serde(default)]
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct CurrentMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastEntry>,
    #[serde(default)]
    city: Option<ForecastCity>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt: i64,
    main: ForecastMain,
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct ForecastMain {
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastCity {
    #[serde(default)]
    timezone: i32,
}

impl TryFrom<CurrentResponse> for WeatherSnapshot {
    type Error = WeatherError;

    fn try_from(body: CurrentResponse) -> Result<Self, Self::Error> {
        let condition = body
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::Parse("current conditions without weather entry".into()))?;

        Ok(WeatherSnapshot {
            city: body.name,
            country: body.sys.country,
            temperature: round_half_up(body.main.temp),
            feels_like: round_half_up(body.main.feels_like),
            condition: condition.main,
            description: condition.description,
            humidity: body.main.humidity,
            wind_speed: wind_kmh(body.wind.speed),
            icon: condition.icon,
            sunrise: body.sys.sunrise,
            sunset: body.sys.sunset,
            utc_offset: body.timezone,
            observed_at: body.dt,
        })
    }
}

impl TryFrom<ForecastEntry> for ForecastSlot {
    type Error = WeatherError;

    fn try_from(entry: ForecastEntry) -> Result<Self, Self::Error> {
        let condition = entry
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::Parse(format!("forecast slot {} without weather entry", entry.dt)))?;

        Ok(ForecastSlot {
            timestamp: entry.dt,
            temp_min: entry.main.temp_min,
            temp_max: entry.main.temp_max,
            condition: condition.main,
            icon: condition.icon,
        })
    }
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
}

impl WeatherProvider {
    /// # Errors
    /// The HTTP client could not be built (TLS backend unavailable).
    pub fn new(settings: ProviderSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key,
        })
    }

    /// Current conditions plus daily forecast for a coordinate pair.
    ///
    /// A non-success forecast status keeps the live snapshot and leaves the
    /// forecast unset; any other failure replaces both with demo data.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_by_coordinates(&self, lat: f64, lon: f64) -> Acquisition {
        let snapshot = match self.current(lat, lon).await {
            Ok(s) => s,
            Err(e) => return demo_fallback(demo::DEMO_CITY, &e),
        };

        match self.forecast(lat, lon).await {
            Ok(days) => Acquisition::Live {
                snapshot,
                forecast: Some(days),
            },
            Err(WeatherError::Status(code)) => {
                tracing::debug!("Forecast returned status {}, keeping previous forecast", code);
                Acquisition::Live {
                    snapshot,
                    forecast: None,
                }
            }
            Err(e) => demo_fallback(demo::DEMO_CITY, &e),
        }
    }

    /// Resolve `name` to its first geocoding match, then fetch by coordinates.
    ///
    /// When the name cannot be resolved the demo snapshot is returned under
    /// the requested name and no forecast request is made.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_by_city_name(&self, name: &str) -> Acquisition {
        let first = match self.lookup_city(name).await {
            Ok(first) => first,
            Err(e) => return demo_fallback(name, &e),
        };

        match first {
            Some(city) => {
                tracing::debug!("Resolved {} to {}, {}", name, city.latitude, city.longitude);
                self.fetch_by_coordinates(city.latitude, city.longitude).await
            }
            None => demo_fallback(name, &WeatherError::CityNotFound(name.to_string())),
        }
    }

    /// First geocoding match for `name`, without any demo substitution.
    ///
    /// # Errors
    /// The geocoder could not be reached, answered with a non-success status,
    /// or returned a body that does not decode.
    #[instrument(skip(self), level = "debug")]
    pub async fn lookup_city(&self, name: &str) -> Result<Option<City>, WeatherError> {
        Ok(self.geocode(name, 1).await?.into_iter().next())
    }

    /// Up to five suggestions for a type-ahead query.
    ///
    /// Short queries and non-success statuses yield nothing; an unreachable
    /// or garbled geocoder yields a single placeholder named after `query`.
    #[instrument(skip(self), level = "debug")]
    pub async fn search_cities(&self, query: &str) -> Vec<City> {
        if !geocode::is_searchable(query) {
            return Vec::new();
        }

        match self.geocode(query, SUGGESTION_LIMIT).await {
            Ok(cities) => cities,
            Err(WeatherError::Status(code)) => {
                tracing::debug!("City search returned status {}", code);
                Vec::new()
            }
            Err(e) => {
                tracing::debug!("City search failed, offering placeholder: {}", e);
                vec![geocode::offline_suggestion(query)]
            }
        }
    }

    async fn current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, WeatherError> {
        let body: CurrentResponse = self.get_json(CURRENT_PATH, &self.coordinate_query(lat, lon)).await?;
        WeatherSnapshot::try_from(body)
    }

    async fn forecast(&self, lat: f64, lon: f64) -> Result<Vec<ForecastDay>, WeatherError> {
        let body: ForecastResponse = self.get_json(FORECAST_PATH, &self.coordinate_query(lat, lon)).await?;
        let utc_offset = body.city.map(|c| c.timezone).unwrap_or(0);
        let slots = body
            .list
            .into_iter()
            .map(ForecastSlot::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(daily_forecast(slots, utc_offset))
    }

    async fn geocode(&self, query: &str, limit: usize) -> Result<Vec<City>, WeatherError> {
        let params = [
            ("q", query.to_string()),
            ("limit", limit.to_string()),
            ("appid", self.api_key.clone()),
        ];
        let matches: Vec<GeocodeMatch> = self.get_json(GEOCODE_PATH, &params).await?;
        Ok(matches.into_iter().map(City::from).collect())
    }

    fn coordinate_query(&self, lat: f64, lon: f64) -> [(&'static str, String); 4] {
        [
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ]
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| WeatherError::Parse(format!("{}: {}", path, e)))
    }
}

fn demo_fallback(city: &str, error: &WeatherError) -> Acquisition {
    tracing::info!(
        "Using demo data for {} ({}). Add your OpenWeatherMap API key for live data",
        city,
        error
    );
    let now = chrono::Utc::now().timestamp();
    Acquisition::Fallback {
        report: demo::report_for(city, now),
        reason: FallbackReason::from(error),
    }
}
