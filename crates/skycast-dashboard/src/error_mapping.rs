//! Maps weather-crate errors and fallback reasons to skycast_core::AppError for consistent user-facing messages.

use skycast_core::{AppError, NetworkError, StorageError, WeatherError};
use skycast_weather::{FallbackReason, FavoritesError, LocationError};

pub fn favorites_error(e: FavoritesError) -> AppError {
    AppError::Storage(StorageError::WriteFailed(e.to_string()))
}

pub fn location_error(e: &LocationError) -> AppError {
    match e {
        LocationError::Unsupported => AppError::Weather(WeatherError::LocationUnsupported),
        other => AppError::Weather(WeatherError::LocationNotFound(other.to_string())),
    }
}

/// Why the displayed weather is demo data.
pub fn fallback_error(reason: FallbackReason) -> AppError {
    match reason {
        FallbackReason::Transport => AppError::Network(NetworkError::ConnectionFailed("no response".into())),
        FallbackReason::Status(401) => AppError::Weather(WeatherError::InvalidApiKey),
        FallbackReason::Status(code) if code >= 500 => AppError::Weather(WeatherError::ServiceUnavailable),
        FallbackReason::Status(code) => AppError::Weather(WeatherError::ApiError(format!("status {}", code))),
        FallbackReason::Decode => AppError::Network(NetworkError::InvalidResponse("undecodable body".into())),
        FallbackReason::NoGeocodeMatch => AppError::Weather(WeatherError::CityNotFound),
    }
}
