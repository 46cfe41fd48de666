//! Where the user is.
//!
//! Coordinates come from configuration or an IP geolocation service. A
//! machine with neither configured reports [`LocationError::Unsupported`],
//! which callers treat differently from a lookup that was tried and failed.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::types::{Coordinates, LocationError};

pub const DEFAULT_IP_LOCATION_URL: &str = "http://ip-api.com/json";
const REQUEST_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Deserialize)]
struct IpLocationResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Clone)]
pub enum LocationSource {
    /// Fixed coordinates from configuration
    Fixed(Coordinates),
    /// Approximate position from the public IP address
    Ip { client: Client, url: String },
    /// No way to determine a position
    Unsupported,
}

impl LocationSource {
    /// IP-based lookup against `url`.
    ///
    /// # Errors
    /// The HTTP client could not be built.
    pub fn ip(url: impl Into<String>) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LocationError::Other(e.to_string()))?;
        Ok(Self::Ip {
            client,
            url: url.into(),
        })
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }

    /// # Errors
    /// [`LocationError::Unsupported`] when no source is configured, otherwise
    /// the lookup failed.
    pub async fn locate(&self) -> Result<Coordinates, LocationError> {
        match self {
            Self::Fixed(coords) => Ok(*coords),
            Self::Unsupported => Err(LocationError::Unsupported),
            Self::Ip { client, url } => {
                let response = client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| LocationError::ServiceUnavailable(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(LocationError::ServiceUnavailable(format!(
                        "status {}",
                        response.status()
                    )));
                }

                let body: IpLocationResponse = response
                    .json()
                    .await
                    .map_err(|e| LocationError::Other(e.to_string()))?;

                if body.status.as_deref() == Some("fail") {
                    return Err(LocationError::ServiceUnavailable(
                        body.message.unwrap_or_else(|| "lookup failed".to_string()),
                    ));
                }

                match (body.lat, body.lon) {
                    (Some(latitude), Some(longitude)) => {
                        tracing::info!("Got location: {}, {}", latitude, longitude);
                        Ok(Coordinates { latitude, longitude })
                    }
                    _ => Err(LocationError::Other("response without coordinates".to_string())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_location() {
        let coords = Coordinates {
            latitude: 47.6062,
            longitude: -122.3321,
        };
        let source = LocationSource::Fixed(coords);
        assert!(source.is_available());
        assert_eq!(source.locate().await.unwrap(), coords);
    }

    #[tokio::test]
    async fn test_unsupported() {
        let source = LocationSource::Unsupported;
        assert!(!source.is_available());
        assert!(matches!(source.locate().await, Err(LocationError::Unsupported)));
    }
}
