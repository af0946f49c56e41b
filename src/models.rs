//! Data models for the station rollup pipeline.
//!
//! Raw samples flow one way: `RawSample` → `HourlyRecord` → `WeatherRecord`
//! → `PeriodStats`. Every output value is produced fresh per call and never
//! mutated afterwards.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---

/// One timestamped reading from a station.
///
/// Numeric fields may be non-finite when the sensor faulted; the reducers
/// treat those as absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    // ---
    /// Absolute instant, carried over the wire as UNIX milliseconds.
    #[serde(rename = "timestamp_millis", with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub dew_point: f64,
    /// Instantaneous precipitation intensity (mm/h).
    pub rain_rate: f64,
    /// Monotonic rain counter (mm) that resets at station-defined intervals.
    pub rain_accumulator: f64,
}

impl RawSample {
    // ---
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

/// One local calendar hour of one sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRecord {
    // ---
    /// `YYYY-MM-DDTHH` in the local timezone.
    pub hour_key: String,
    /// `YYYY-MM-DD` of the local day this hour belongs to.
    pub date_key: String,
    pub sample_count: usize,
    pub temperature_avg: f64,
    pub humidity_avg: f64,
    pub pressure_avg: f64,
    pub dew_point_avg: f64,
    /// Highest rain rate seen in the hour, floored at 0.
    pub rainfall_tot: f64,
}

/// One calendar day of one sensor.
///
/// `rainfall_tot` depends on the producing reducer: the sum of hourly rate
/// maxima for [`RainfallSource::RateBased`], the counter delta for
/// [`RainfallSource::CounterBased`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    // ---
    pub date: String,
    pub sample_count: usize,
    pub temperature_avg: f64,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub humidity_avg: f64,
    pub humidity_min: f64,
    pub humidity_max: f64,
    pub pressure_avg: f64,
    pub pressure_min: f64,
    pub pressure_max: f64,
    pub dew_point_avg: f64,
    /// No wind sensor is deployed yet; always 0.
    pub wind_speed_avg: f64,
    pub rainfall_tot: f64,
}

/// Summary of an arbitrary date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    // ---
    pub day_count: usize,
    pub temperature_avg: f64,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub humidity_avg: f64,
    pub humidity_min: f64,
    pub humidity_max: f64,
    pub pressure_avg: f64,
    pub pressure_min: f64,
    pub pressure_max: f64,
    pub dew_point_avg: f64,
    pub total_rain: f64,
    pub avg_rain_per_day: f64,
    pub max_daily_rain: f64,
    pub rainy_day_count: usize,
    pub dry_day_count: usize,
}

// ---

/// Which physical rainfall quantity a daily report is built from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RainfallSource {
    // ---
    /// `rain_rate`: hourly maxima summed over the local day.
    #[default]
    #[serde(rename = "rate")]
    RateBased,
    /// `rain_accumulator`: max − min over the UTC day.
    #[serde(rename = "counter")]
    CounterBased,
}

/// How the hourly stage treats non-finite values when averaging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AveragePolicy {
    // ---
    /// Non-finite values count as 0 and the divisor is the sample count.
    #[default]
    ZeroFill,
    /// Only finite values are summed and counted.
    FiniteOnly,
}

impl FromStr for AveragePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        match s.trim().to_ascii_lowercase().as_str() {
            "zero_fill" => Ok(Self::ZeroFill),
            "finite_only" => Ok(Self::FiniteOnly),
            other => Err(anyhow!(
                "unknown average policy '{}', expected zero_fill or finite_only",
                other
            )),
        }
    }
}

impl fmt::Display for AveragePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroFill => f.write_str("zero_fill"),
            Self::FiniteOnly => f.write_str("finite_only"),
        }
    }
}

/// Half-open `[start, end)` fetch window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    // ---
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    // ---
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> anyhow::Result<Self> {
        // ---
        if end <= start {
            return Err(anyhow!(
                "window end {} must be after start {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            ));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}
