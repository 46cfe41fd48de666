//! Integration tests for WeatherProvider using wiremock.
//!
//! These tests verify live, partial and demo-fallback behavior against a mock
//! OpenWeatherMap server.

use std::time::Duration;

use skycast_weather::{Acquisition, FallbackReason, ProviderSettings, WeatherError, WeatherProvider};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DAY: i64 = 86_400;
// 2024-01-01T00:00:00Z
const JAN_1: i64 = 1_704_067_200;

fn provider_for(base_url: &str) -> WeatherProvider {
    WeatherProvider::new(ProviderSettings {
        base_url: base_url.to_string(),
        api_key: "test-key".to_string(),
        timeout: Duration::from_secs(2),
    })
    .unwrap()
}

/// Nothing listens on port 1
fn unreachable_provider() -> WeatherProvider {
    provider_for("http://127.0.0.1:1")
}

fn current_body() -> serde_json::Value {
    serde_json::json!({
        "name": "Berlin",
        "sys": { "country": "DE", "sunrise": JAN_1 + 27_000, "sunset": JAN_1 + 55_000 },
        "main": { "temp": 2.5, "feels_like": -1.4, "humidity": 88 },
        "weather": [{ "main": "Rain", "description": "light rain", "icon": "10d" }],
        "wind": { "speed": 10.0 },
        "timezone": 3600,
        "dt": JAN_1 + 40_000
    })
}

/// 3-hour slots covering `days` days, temp_min equal to the slot index
fn forecast_body(days: i64) -> serde_json::Value {
    let list: Vec<_> = (0..days * 8)
        .map(|i| {
            serde_json::json!({
                "dt": JAN_1 + i * 10_800,
                "main": { "temp_min": i as f64, "temp_max": i as f64 + 5.0 },
                "weather": [{ "main": "Clouds", "description": "overcast", "icon": "04d" }]
            })
        })
        .collect();
    serde_json::json!({ "list": list, "city": { "timezone": 0 } })
}

async fn mount_current(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_by_coordinates_live() {
    let server = MockServer::start().await;
    mount_current(&server).await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("lat", "52.52"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(6)))
        .mount(&server)
        .await;

    let result = provider_for(&server.uri()).fetch_by_coordinates(52.52, 13.405).await;

    let Acquisition::Live { snapshot, forecast } = result else {
        panic!("expected live data, got {:?}", result);
    };
    assert_eq!(snapshot.city, "Berlin");
    assert_eq!(snapshot.country, "DE");
    assert_eq!(snapshot.temperature, 3);
    assert_eq!(snapshot.feels_like, -1);
    assert_eq!(snapshot.wind_speed, 36);
    assert_eq!(snapshot.description, "light rain");

    let forecast = forecast.unwrap();
    assert_eq!(forecast.len(), 5);
    for (i, day) in forecast.iter().enumerate() {
        assert_eq!(day.date, JAN_1 + i as i64 * DAY);
        assert_eq!(day.temp_min, i as i32 * 8);
    }
}

#[tokio::test]
async fn test_forecast_status_error_keeps_live_snapshot() {
    let server = MockServer::start().await;
    mount_current(&server).await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = provider_for(&server.uri()).fetch_by_coordinates(52.52, 13.405).await;

    assert!(!result.is_fallback());
    assert_eq!(result.snapshot().city, "Berlin");
    assert!(result.forecast().is_none());
}

#[tokio::test]
async fn test_forecast_garbage_falls_back_to_demo() {
    let server = MockServer::start().await;
    mount_current(&server).await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = provider_for(&server.uri()).fetch_by_coordinates(52.52, 13.405).await;

    assert!(matches!(result, Acquisition::Fallback { reason: FallbackReason::Decode, .. }));
    assert_eq!(result.snapshot().city, "Demo City");
    assert_eq!(result.forecast().map(|f| f.len()), Some(5));
}

#[tokio::test]
async fn test_current_status_error_falls_back_to_demo() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401,
            "message": "Invalid API key"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(6)))
        .expect(0)
        .mount(&server)
        .await;

    let result = provider_for(&server.uri()).fetch_by_coordinates(1.0, 2.0).await;

    assert!(matches!(result, Acquisition::Fallback { reason: FallbackReason::Status(401), .. }));
    assert_eq!(result.snapshot().city, "Demo City");
}

#[tokio::test]
async fn test_network_failure_falls_back_to_demo() {
    let result = unreachable_provider().fetch_by_coordinates(1.0, 2.0).await;
    assert!(matches!(result, Acquisition::Fallback { reason: FallbackReason::Transport, .. }));
}

#[tokio::test]
async fn test_fetch_by_city_name_resolves_first_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Berlin"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "Berlin", "country": "DE", "lat": 52.52, "lon": 13.405 }
        ])))
        .mount(&server)
        .await;
    mount_current(&server).await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("lat", "52.52"))
        .and(query_param("lon", "13.405"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(3)))
        .mount(&server)
        .await;

    let result = provider_for(&server.uri()).fetch_by_city_name("Berlin").await;

    assert!(!result.is_fallback());
    assert_eq!(result.snapshot().city, "Berlin");
    assert_eq!(result.forecast().map(|f| f.len()), Some(3));
}

#[tokio::test]
async fn test_fetch_by_city_name_no_match_uses_requested_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(6)))
        .expect(0)
        .mount(&server)
        .await;

    let before = chrono::Utc::now().timestamp();
    let result = provider_for(&server.uri()).fetch_by_city_name("Nowhereville").await;
    let after = chrono::Utc::now().timestamp();

    let Acquisition::Fallback { report, reason } = result else {
        panic!("expected fallback, got {:?}", result);
    };
    assert_eq!(reason, FallbackReason::NoGeocodeMatch);
    assert_eq!(report.snapshot.city, "Nowhereville");
    assert_eq!(report.forecast.len(), 5);

    let now = report.snapshot.observed_at;
    assert!(now >= before && now <= after);
    for (i, day) in report.forecast.iter().enumerate() {
        assert_eq!(day.date, now + (i as i64 + 1) * DAY);
    }
}

#[tokio::test]
async fn test_fetch_by_city_name_network_failure_uses_requested_name() {
    let result = unreachable_provider().fetch_by_city_name("Lisbon").await;
    assert!(result.is_fallback());
    assert_eq!(result.snapshot().city, "Lisbon");
}

#[tokio::test]
async fn test_search_cities_short_query_skips_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let cities = provider_for(&server.uri()).search_cities("a").await;
    assert!(cities.is_empty());
}

#[tokio::test]
async fn test_search_cities_returns_matches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Spring"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "Springfield", "country": "US", "lat": 39.8, "lon": -89.64 },
            { "name": "Springfield", "country": "US", "lat": 37.21, "lon": -93.29 },
            { "name": "Springs", "country": "ZA", "lat": -26.25, "lon": 28.4 }
        ])))
        .mount(&server)
        .await;

    let cities = provider_for(&server.uri()).search_cities("Spring").await;

    assert_eq!(cities.len(), 3);
    assert_eq!(cities[2].name, "Springs");
    assert_eq!(cities[2].country, "ZA");
    assert_eq!(cities[0].latitude, 39.8);
}

#[tokio::test]
async fn test_search_cities_status_error_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cities = provider_for(&server.uri()).search_cities("Spring").await;
    assert!(cities.is_empty());
}

#[tokio::test]
async fn test_search_cities_network_failure_offers_placeholder() {
    let cities = unreachable_provider().search_cities("sf").await;

    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0].name, "sf");
    assert_eq!(cities[0].country, "US");
}

#[tokio::test]
async fn test_lookup_city_returns_first_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Oslo"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "Oslo", "country": "NO", "lat": 59.91, "lon": 10.75 }
        ])))
        .mount(&server)
        .await;

    let city = provider_for(&server.uri()).lookup_city("Oslo").await.unwrap().unwrap();
    assert_eq!(city.name, "Oslo");
    assert_eq!(city.country, "NO");
}

#[tokio::test]
async fn test_lookup_city_reports_failures_instead_of_placeholder() {
    let result = unreachable_provider().lookup_city("sf").await;
    assert!(matches!(result, Err(WeatherError::Network(_))));

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let result = provider_for(&server.uri()).lookup_city("Oslo").await;
    assert!(matches!(result, Err(WeatherError::Status(401))));
}

#[tokio::test]
async fn test_lookup_city_no_match_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    assert!(provider_for(&server.uri()).lookup_city("Nowhereville").await.unwrap().is_none());
}
