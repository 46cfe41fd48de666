use serde::{Deserialize, Serialize};

/// Weather icon categories mapped from OpenWeatherMap icon codes ("01d", "10n", ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherIcon {
    #[default]
    Clear,
    ClearNight,
    PartlyCloudy,
    PartlyCloudyNight,
    Cloudy,
    Drizzle,
    Rain,
    Thunderstorm,
    Snow,
    Fog,
}

impl WeatherIcon {
    /// Convert an OpenWeatherMap icon code to a WeatherIcon.
    /// See: https://openweathermap.org/weather-conditions#Icon-list
    pub fn from_code(code: &str) -> Self {
        let night = code.contains('n');
        match code.get(..2).unwrap_or_default() {
            "01" if night => Self::ClearNight,
            "01" => Self::Clear,
            "02" if night => Self::PartlyCloudyNight,
            "02" => Self::PartlyCloudy,
            "03" | "04" => Self::Cloudy,
            "09" => Self::Drizzle,
            "10" => Self::Rain,
            "11" => Self::Thunderstorm,
            "13" => Self::Snow,
            "50" => Self::Fog,
            _ => Self::Clear, // Unknown codes default to clear
        }
    }

    /// Icon name used by renderers
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "sun",
            Self::ClearNight => "moon",
            Self::PartlyCloudy => "cloud_sun",
            Self::PartlyCloudyNight => "cloud_moon",
            Self::Cloudy => "cloud",
            Self::Drizzle => "cloud_drizzle",
            Self::Rain => "cloud_rain",
            Self::Thunderstorm => "cloud_lightning",
            Self::Snow => "cloud_snow",
            Self::Fog => "cloud_fog",
        }
    }

    /// Single-glyph form for terminal output
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Clear => "☀",
            Self::ClearNight => "☾",
            Self::PartlyCloudy | Self::PartlyCloudyNight => "⛅",
            Self::Cloudy => "☁",
            Self::Drizzle | Self::Rain => "☂",
            Self::Thunderstorm => "⚡",
            Self::Snow => "❄",
            Self::Fog => "≡",
        }
    }
}

/// A named place. Two cities are the same favorite when name and country match exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub country: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

impl City {
    pub fn new(name: impl Into<String>, country: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            latitude,
            longitude,
        }
    }

    /// Identity key: (name, country), case-sensitive.
    pub fn key(&self) -> (&str, &str) {
        (&self.name, &self.country)
    }

    pub fn same_place(&self, other: &City) -> bool {
        self.key() == other.key()
    }
}

/// Geographic coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Current conditions for one place. Replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub city: String,
    pub country: String,
    /// °C, rounded
    pub temperature: i32,
    pub feels_like: i32,
    /// Condition group, e.g. "Clouds"
    pub condition: String,
    pub description: String,
    /// Percent
    pub humidity: u8,
    /// km/h, rounded
    pub wind_speed: i32,
    pub icon: String,
    /// Epoch seconds (UTC)
    pub sunrise: i64,
    pub sunset: i64,
    /// Shift from UTC in seconds
    pub utc_offset: i32,
    pub observed_at: i64,
}

impl WeatherSnapshot {
    pub fn icon_kind(&self) -> WeatherIcon {
        WeatherIcon::from_code(&self.icon)
    }

    /// City record for this snapshot. Coordinates are not carried by the snapshot.
    pub fn as_city(&self) -> City {
        City::new(self.city.clone(), self.country.clone(), 0.0, 0.0)
    }
}

/// One day of the multi-day forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    /// Epoch seconds of the first 3-hour slot seen for this date
    pub date: i64,
    pub temp_min: i32,
    pub temp_max: i32,
    pub condition: String,
    pub icon: String,
}

/// Snapshot and forecast produced together by one acquisition sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub snapshot: WeatherSnapshot,
    pub forecast: Vec<ForecastDay>,
}

/// Why demo data was substituted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// Request never got a response (connect error, timeout, ...)
    Transport,
    /// Endpoint answered with a non-success status
    Status(u16),
    /// Body could not be decoded
    Decode,
    /// Geocoding returned zero matches
    NoGeocodeMatch,
}

impl From<&WeatherError> for FallbackReason {
    fn from(e: &WeatherError) -> Self {
        match e {
            WeatherError::Network(_) => Self::Transport,
            WeatherError::Status(code) => Self::Status(*code),
            WeatherError::Parse(_) => Self::Decode,
            WeatherError::CityNotFound(_) => Self::NoGeocodeMatch,
        }
    }
}

/// Outcome of one acquisition sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Acquisition {
    /// Live data. `forecast` is `None` when the forecast endpoint answered
    /// non-success; callers keep whatever forecast they already show.
    Live {
        snapshot: WeatherSnapshot,
        forecast: Option<Vec<ForecastDay>>,
    },
    /// Demo data substituted after a failure
    Fallback {
        report: WeatherReport,
        reason: FallbackReason,
    },
}

impl Acquisition {
    pub fn snapshot(&self) -> &WeatherSnapshot {
        match self {
            Self::Live { snapshot, .. } => snapshot,
            Self::Fallback { report, .. } => &report.snapshot,
        }
    }

    pub fn forecast(&self) -> Option<&[ForecastDay]> {
        match self {
            Self::Live { forecast, .. } => forecast.as_deref(),
            Self::Fallback { report, .. } => Some(&report.forecast),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location service not supported")]
    Unsupported,
    #[error("Location service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Location error: {0}")]
    Other(String),
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Unexpected status: {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("City not found: {0}")]
    CityNotFound(String),
}
