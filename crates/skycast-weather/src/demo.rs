//! Fixed demo data substituted whenever a live request fails.
//! Timestamps are relative to the moment the fixture is built.

use crate::types::{ForecastDay, WeatherReport, WeatherSnapshot};

/// City name used when a coordinate lookup falls back
pub const DEMO_CITY: &str = "Demo City";

const DAY_SECS: i64 = 86_400;
const SIX_HOURS_SECS: i64 = 21_600;

/// Demo current conditions (San Francisco, partly cloudy).
pub fn snapshot(now: i64) -> WeatherSnapshot {
    WeatherSnapshot {
        city: "San Francisco".to_string(),
        country: "US".to_string(),
        temperature: 18,
        feels_like: 16,
        condition: "Clouds".to_string(),
        description: "Partly cloudy".to_string(),
        humidity: 72,
        wind_speed: 12,
        icon: "03d".to_string(),
        sunrise: now - SIX_HOURS_SECS,
        sunset: now + SIX_HOURS_SECS,
        utc_offset: -28_800,
        observed_at: now,
    }
}

/// Five demo days starting tomorrow.
pub fn forecast(now: i64) -> Vec<ForecastDay> {
    const DAYS: [(i32, i32, &str, &str); 5] = [
        (14, 20, "Clear", "01d"),
        (15, 22, "Clouds", "02d"),
        (13, 19, "Rain", "10d"),
        (12, 18, "Rain", "09d"),
        (14, 21, "Clear", "01d"),
    ];

    DAYS.iter()
        .zip(1..)
        .map(|(&(temp_min, temp_max, condition, icon), offset)| ForecastDay {
            date: now + offset * DAY_SECS,
            temp_min,
            temp_max,
            condition: condition.to_string(),
            icon: icon.to_string(),
        })
        .collect()
}

/// Demo report with the city field replaced.
pub fn report_for(city: &str, now: i64) -> WeatherReport {
    let mut snapshot = snapshot(now);
    snapshot.city = city.to_string();
    WeatherReport {
        snapshot,
        forecast: forecast(now),
    }
}
