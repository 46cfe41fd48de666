//! Text rendering for the dashboard, plus the pure display helpers it uses.

use std::fmt::Write;

use chrono::{DateTime, Datelike, Duration, Timelike};
use skycast_weather::forecast::local_date;
use skycast_weather::WeatherSnapshot;

use crate::error_mapping::fallback_error;
use crate::model::DashboardView;

const SUN_BAR_WIDTH: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_dark_mode(dark_mode: bool) -> Self {
        if dark_mode {
            Self::Dark
        } else {
            Self::Light
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, Self::Dark)
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    fn accent(&self) -> &'static str {
        match self {
            Self::Light => "\x1b[34m",
            Self::Dark => "\x1b[96m",
        }
    }
}

/// Background class derived from local time and condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Night,
    Sunset,
    Rainy,
    Cloudy,
    Clear,
}

impl Mood {
    /// `now` is epoch seconds; the hour is taken in the snapshot's own offset.
    pub fn for_snapshot(snapshot: &WeatherSnapshot, now: i64) -> Self {
        let hour = local_hour(now, snapshot.utc_offset).unwrap_or(12);
        Self::classify(hour, &snapshot.condition)
    }

    pub fn classify(local_hour: u32, condition: &str) -> Self {
        if !(6..=20).contains(&local_hour) {
            return Self::Night;
        }
        if (17..=20).contains(&local_hour) {
            return Self::Sunset;
        }
        let condition = condition.to_lowercase();
        if condition.contains("rain") || condition.contains("drizzle") {
            Self::Rainy
        } else if condition.contains("cloud") {
            Self::Cloudy
        } else {
            Self::Clear
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            Self::Night => "night",
            Self::Sunset => "sunset",
            Self::Rainy => "rainy",
            Self::Cloudy => "cloudy",
            Self::Clear => "clear",
        }
    }
}

fn local_hour(epoch: i64, utc_offset: i32) -> Option<u32> {
    DateTime::from_timestamp(epoch + i64::from(utc_offset), 0).map(|dt| dt.hour())
}

/// Wall-clock time at the location, e.g. "06:42 AM".
pub fn format_local_time(epoch: i64, utc_offset: i32) -> String {
    DateTime::from_timestamp(epoch + i64::from(utc_offset), 0)
        .map(|dt| dt.format("%I:%M %p").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// Percentage of daylight elapsed, clamped to 0..=100.
pub fn sun_progress(sunrise: i64, sunset: i64, now: i64) -> f64 {
    let day_length = sunset - sunrise;
    if day_length <= 0 {
        return 0.0;
    }
    let elapsed = (now - sunrise) as f64;
    (elapsed / day_length as f64 * 100.0).clamp(0.0, 100.0)
}

fn sun_bar(progress: f64) -> String {
    let position = ((progress / 100.0) * (SUN_BAR_WIDTH - 1) as f64).round() as usize;
    (0..SUN_BAR_WIDTH)
        .map(|i| if i == position { '☀' } else { '─' })
        .collect()
}

/// "Today", "Tomorrow" or a short weekday name, compared in the location's calendar.
pub fn day_label(date: i64, utc_offset: i32, now: i64) -> String {
    let (Some(day), Some(today)) = (local_date(date, utc_offset), local_date(now, utc_offset)) else {
        return String::new();
    };
    if day == today {
        "Today".to_string()
    } else if Some(day) == today.checked_add_signed(Duration::days(1)) {
        "Tomorrow".to_string()
    } else {
        day.weekday().to_string()
    }
}

/// Render the whole dashboard as text. `now` is epoch seconds.
pub fn render(view: &DashboardView<'_>, now: i64, color: bool) -> String {
    let (accent, reset) = if color {
        (view.theme.accent(), "\x1b[0m")
    } else {
        ("", "")
    };
    let mut out = String::new();

    let Some(weather) = view.weather else {
        let _ = writeln!(out, "{}", if view.loading { "Loading weather..." } else { "No weather loaded." });
        return out;
    };

    let star = if view.is_favorite { "★" } else { "☆" };
    let _ = writeln!(
        out,
        "{accent}{}, {}{reset} {star}  [{}]",
        weather.city,
        weather.country,
        Mood::for_snapshot(weather, now).class()
    );
    let _ = writeln!(
        out,
        "  {} {}°C  {} (feels like {}°C)",
        weather.icon_kind().glyph(),
        weather.temperature,
        weather.description,
        weather.feels_like
    );
    let _ = writeln!(out, "  Humidity {}%  Wind {} km/h", weather.humidity, weather.wind_speed);
    let _ = writeln!(
        out,
        "  Sunrise {}  {}  Sunset {}",
        format_local_time(weather.sunrise, weather.utc_offset),
        sun_bar(sun_progress(weather.sunrise, weather.sunset, now)),
        format_local_time(weather.sunset, weather.utc_offset)
    );

    if !view.forecast.is_empty() {
        let _ = writeln!(out, "{accent}5-day forecast{reset}");
        for day in view.forecast {
            let _ = writeln!(
                out,
                "  {:<9} {} {:>3}° / {:>3}°  {}",
                day_label(day.date, weather.utc_offset, now),
                skycast_weather::WeatherIcon::from_code(&day.icon).glyph(),
                day.temp_max,
                day.temp_min,
                day.condition
            );
        }
    }

    if !view.suggestions.is_empty() {
        let _ = writeln!(out, "{accent}Suggestions{reset}");
        for (i, city) in view.suggestions.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}, {}", i + 1, city.name, city.country);
        }
    }

    if !view.favorites.is_empty() {
        let names: Vec<&str> = view.favorites.iter().map(|c| c.name.as_str()).collect();
        let _ = writeln!(out, "Favorites: {}", names.join(", "));
    }

    let mut status = Vec::new();
    if view.loading {
        status.push("refreshing...".to_string());
    }
    if let Some(updated) = view.last_updated {
        status.push(format!("updated {}", updated.format("%H:%M:%S UTC")));
    }
    if let Some(reason) = view.fallback {
        status.push(format!("demo data: {}", fallback_error(reason).user_message()));
    }
    if !status.is_empty() {
        let _ = writeln!(out, "  {}", status.join(" · "));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use skycast_weather::{demo, FallbackReason};

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_format_local_time() {
        // 1970-01-01 06:30 UTC
        assert_eq!(format_local_time(6 * 3600 + 1800, 0), "06:30 AM");
        assert_eq!(format_local_time(6 * 3600 + 1800, 9 * 3600), "03:30 PM");
        assert_eq!(format_local_time(3600, -3600), "12:00 AM");
    }

    #[test]
    fn test_sun_progress() {
        assert_eq!(sun_progress(100, 200, 150), 50.0);
        assert_eq!(sun_progress(100, 200, 50), 0.0);
        assert_eq!(sun_progress(100, 200, 500), 100.0);
        assert_eq!(sun_progress(200, 200, 200), 0.0);
        assert_eq!(sun_progress(300, 200, 250), 0.0);
    }

    #[test]
    fn test_sun_bar_endpoints() {
        assert!(sun_bar(0.0).starts_with('☀'));
        assert!(sun_bar(100.0).ends_with('☀'));
        assert_eq!(sun_bar(50.0).chars().count(), SUN_BAR_WIDTH);
    }

    #[test]
    fn test_day_label() {
        // 1970-01-01 is a Thursday
        let noon = 12 * 3600;
        assert_eq!(day_label(noon, 0, noon), "Today");
        assert_eq!(day_label(noon + 86_400, 0, noon), "Tomorrow");
        assert_eq!(day_label(noon + 2 * 86_400, 0, noon), "Sat");
    }

    #[test]
    fn test_day_label_uses_location_calendar() {
        // 23:00 UTC and 01:00 UTC next day are the same date at UTC-3
        let late = 23 * 3600;
        let early = 25 * 3600;
        assert_eq!(day_label(early, -3 * 3600, late), "Today");
        assert_eq!(day_label(early, 0, late), "Tomorrow");
    }

    #[test]
    fn test_mood_classification() {
        assert_eq!(Mood::classify(3, "Clear"), Mood::Night);
        assert_eq!(Mood::classify(21, "Rain"), Mood::Night);
        assert_eq!(Mood::classify(18, "Rain"), Mood::Sunset);
        assert_eq!(Mood::classify(10, "Light Drizzle"), Mood::Rainy);
        assert_eq!(Mood::classify(10, "Clouds"), Mood::Cloudy);
        assert_eq!(Mood::classify(10, "Clear"), Mood::Clear);
        assert_eq!(Mood::classify(6, "Snow"), Mood::Clear);
        assert_eq!(Mood::Rainy.class(), "rainy");
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::from_dark_mode(true), Theme::Dark);
        assert!(!Theme::default().is_dark());
    }

    #[test]
    fn test_render_demo_without_color() {
        let snapshot = demo::snapshot(NOW);
        let forecast = demo::forecast(NOW);
        let view = DashboardView {
            weather: Some(&snapshot),
            forecast: &forecast,
            favorites: &[],
            suggestions: &[],
            is_favorite: false,
            loading: false,
            last_updated: None,
            fallback: Some(FallbackReason::Transport),
            theme: Theme::Dark,
        };

        let text = render(&view, NOW, false);
        assert!(text.starts_with("San Francisco, US ☆"));
        assert!(text.contains("18°C"));
        assert!(text.contains("Humidity 72%  Wind 12 km/h"));
        assert!(text.contains("Tomorrow"));
        assert!(text.contains("demo data: Unable to connect. Check your internet connection."));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn test_render_empty_view() {
        let view = DashboardView {
            weather: None,
            forecast: &[],
            favorites: &[],
            suggestions: &[],
            is_favorite: false,
            loading: true,
            last_updated: None,
            fallback: None,
            theme: Theme::Light,
        };
        assert_eq!(render(&view, NOW, true), "Loading weather...\n");
    }
}
