//! Period statistics over an arbitrary range of daily records.

use tracing::debug;

use super::finite_extent;
use crate::models::{PeriodStats, RawSample, WeatherRecord};

// ---

/// Fold daily records and the period's raw samples into one summary.
///
/// Averages are the plain mean of the daily averages: every day weighs the
/// same regardless of its sample count. Extrema are read from `samples`.
/// A day is rainy when `rainfall_tot > 0` and dry when it is exactly 0.
/// No days yields [`PeriodStats::default`].
pub fn period_stats(days: &[WeatherRecord], samples: &[RawSample]) -> PeriodStats {
    // ---
    if days.is_empty() {
        debug!("No daily records, returning empty period stats");
        return PeriodStats::default();
    }

    let day_count = days.len();
    let day_mean = |field: fn(&WeatherRecord) -> f64| -> f64 {
        days.iter().map(field).sum::<f64>() / day_count as f64
    };

    let (temperature_min, temperature_max) = finite_extent(samples.iter().map(|s| s.temperature));
    let (humidity_min, humidity_max) = finite_extent(samples.iter().map(|s| s.humidity));
    let (pressure_min, pressure_max) = finite_extent(samples.iter().map(|s| s.pressure));

    let total_rain: f64 = days.iter().map(|d| d.rainfall_tot).sum();
    let max_daily_rain = days.iter().map(|d| d.rainfall_tot).fold(0.0_f64, f64::max);
    let rainy_day_count = days.iter().filter(|d| d.rainfall_tot > 0.0).count();
    let dry_day_count = days.iter().filter(|d| d.rainfall_tot == 0.0).count();

    PeriodStats {
        day_count,
        temperature_avg: day_mean(|d| d.temperature_avg),
        temperature_min,
        temperature_max,
        humidity_avg: day_mean(|d| d.humidity_avg),
        humidity_min,
        humidity_max,
        pressure_avg: day_mean(|d| d.pressure_avg),
        pressure_min,
        pressure_max,
        dew_point_avg: day_mean(|d| d.dew_point_avg),
        total_rain,
        avg_rain_per_day: total_rain / day_count as f64,
        max_daily_rain,
        rainy_day_count,
        dry_day_count,
    }
}
