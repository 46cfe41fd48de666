//! Normalization of raw API values into the display model.
//!
//! The forecast endpoint answers with one slot per 3-hour interval; the
//! dashboard shows one entry per calendar day.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::types::ForecastDay;

/// Maximum number of days kept from a forecast response
pub const MAX_FORECAST_DAYS: usize = 5;

const MPS_TO_KMH: f64 = 3.6;

/// One 3-hour forecast slot, already unpacked from the response body
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSlot {
    pub timestamp: i64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub condition: String,
    pub icon: String,
}

/// Round to the nearest integer, halves toward positive infinity (-2.5 -> -2, 2.5 -> 3).
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

/// Convert m/s to whole km/h.
pub fn wind_kmh(meters_per_second: f64) -> i32 {
    round_half_up(meters_per_second * MPS_TO_KMH)
}

/// Calendar date of `timestamp` as seen at `utc_offset` seconds from UTC.
pub fn local_date(timestamp: i64, utc_offset: i32) -> Option<NaiveDate> {
    let offset = FixedOffset::east_opt(utc_offset)?;
    let utc = DateTime::from_timestamp(timestamp, 0)?;
    Some(utc.with_timezone(&offset).date_naive())
}

/// Collapse 3-hour slots into at most [`MAX_FORECAST_DAYS`] daily entries.
///
/// The first slot seen for each calendar date wins; later slots for the same
/// date are ignored even when they carry a wider min/max range. Slots are
/// taken in the order given, which the API already sorts chronologically.
pub fn daily_forecast<I>(slots: I, utc_offset: i32) -> Vec<ForecastDay>
where
    I: IntoIterator<Item = ForecastSlot>,
{
    let mut seen: HashSet<NaiveDate> = HashSet::new();
    let mut days = Vec::with_capacity(MAX_FORECAST_DAYS);

    for slot in slots {
        if days.len() == MAX_FORECAST_DAYS {
            break;
        }
        let Some(date) = local_date(slot.timestamp, utc_offset) else {
            tracing::debug!("Skipping forecast slot with invalid timestamp {}", slot.timestamp);
            continue;
        };
        if !seen.insert(date) {
            continue;
        }
        days.push(ForecastDay {
            date: slot.timestamp,
            temp_min: round_half_up(slot.temp_min),
            temp_max: round_half_up(slot.temp_max),
            condition: slot.condition,
            icon: slot.icon,
        });
    }

    days
}
