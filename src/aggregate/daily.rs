//! Daily reducers.
//!
//! [`aggregate_daily_local`] re-aggregates hourly records over the local day
//! (rate-based rainfall). [`aggregate_daily_utc_counter`] buckets by UTC day
//! and reads the rain counter; it fills nothing but `rainfall_tot` and
//! `sample_count`.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::bucket::{LocalPolicy, UtcPolicy};
use super::finite_extent;
use super::hourly::{aggregate_hourly, mean};
use crate::models::{AveragePolicy, HourlyRecord, RawSample, WeatherRecord};

// ---

/// Local-day records with sample-weighted averages and raw-sample extrema.
///
/// Under [`AveragePolicy::ZeroFill`] averages are
/// `Σ(hourly_avg × hourly_count) / Σ hourly_count` over the day's hours.
/// Under [`AveragePolicy::FiniteOnly`] they are the mean of the day's finite
/// raw readings, since an hour with no finite reading reports 0. Min/max come straight from the raw samples of the day so
/// hourly smoothing never clips an extreme. `rainfall_tot` is the sum of the
/// hourly rain-rate maxima.
pub fn aggregate_daily_local(
    samples: &[RawSample],
    policy: &LocalPolicy,
    averaging: AveragePolicy,
) -> Vec<WeatherRecord> {
    // ---
    let hourly = aggregate_hourly(samples, policy, averaging);

    let mut hours_by_day: BTreeMap<&str, Vec<&HourlyRecord>> = BTreeMap::new();
    for record in &hourly {
        hours_by_day
            .entry(record.date_key.as_str())
            .or_default()
            .push(record);
    }

    // Extrema are grouped from timestamps again, not from the hourly buckets.
    let mut samples_by_day: BTreeMap<String, Vec<&RawSample>> = BTreeMap::new();
    for sample in samples {
        samples_by_day
            .entry(policy.date_key(sample.timestamp))
            .or_default()
            .push(sample);
    }

    let records: Vec<WeatherRecord> = hours_by_day
        .into_iter()
        .map(|(date, hours)| {
            let raw = samples_by_day.get(date).map(Vec::as_slice).unwrap_or(&[]);
            reduce_local_day(date, &hours, raw, averaging)
        })
        .collect();

    debug!(
        "Reduced {} hourly records into {} local-day records",
        hourly.len(),
        records.len()
    );
    records
}

fn reduce_local_day(
    date: &str,
    hours: &[&HourlyRecord],
    raw: &[&RawSample],
    averaging: AveragePolicy,
) -> WeatherRecord {
    // ---
    let counted: usize = hours.iter().map(|h| h.sample_count).sum();
    let total_samples = if counted == 0 {
        warn!("Day {} has hourly records but no samples; using divisor 1", date);
        1
    } else {
        counted
    };

    let weighted = |field: fn(&HourlyRecord) -> f64| -> f64 {
        hours
            .iter()
            .map(|h| field(h) * h.sample_count as f64)
            .sum::<f64>()
            / total_samples as f64
    };
    let average = |hourly_avg: fn(&HourlyRecord) -> f64, reading: fn(&RawSample) -> f64| -> f64 {
        match averaging {
            AveragePolicy::ZeroFill => weighted(hourly_avg),
            AveragePolicy::FiniteOnly => mean(raw.iter().map(|s| reading(*s)), averaging),
        }
    };

    let (temperature_min, temperature_max) = finite_extent(raw.iter().map(|s| s.temperature));
    let (humidity_min, humidity_max) = finite_extent(raw.iter().map(|s| s.humidity));
    let (pressure_min, pressure_max) = finite_extent(raw.iter().map(|s| s.pressure));

    WeatherRecord {
        date: date.to_string(),
        sample_count: counted,
        temperature_avg: average(|h| h.temperature_avg, |s| s.temperature),
        temperature_min,
        temperature_max,
        humidity_avg: average(|h| h.humidity_avg, |s| s.humidity),
        humidity_min,
        humidity_max,
        pressure_avg: average(|h| h.pressure_avg, |s| s.pressure),
        pressure_min,
        pressure_max,
        dew_point_avg: average(|h| h.dew_point_avg, |s| s.dew_point),
        wind_speed_avg: 0.0,
        rainfall_tot: hours.iter().map(|h| h.rainfall_tot).sum(),
    }
}

/// UTC-day records for accumulated-rainfall reporting.
///
/// `rainfall_tot` is `max − min` of the finite `rain_accumulator` values of
/// the day, or 0 with fewer than two finite values. A counter reset inside
/// the day is not detected and undercounts. Every other measurement
/// statistic stays 0; `sample_count` is the one exception and carries the
/// number of samples in the UTC day.
pub fn aggregate_daily_utc_counter(samples: &[RawSample]) -> Vec<WeatherRecord> {
    // ---
    let policy = UtcPolicy;

    let mut by_day: BTreeMap<String, Vec<&RawSample>> = BTreeMap::new();
    for sample in samples {
        by_day
            .entry(policy.date_key(sample.timestamp))
            .or_default()
            .push(sample);
    }

    let records: Vec<WeatherRecord> = by_day
        .into_iter()
        .map(|(date, day)| {
            let finite: Vec<f64> = day
                .iter()
                .map(|s| s.rain_accumulator)
                .filter(|v| v.is_finite())
                .collect();

            let rainfall_tot = if finite.len() >= 2 {
                let (low, high) = finite_extent(finite.iter().copied());
                high - low
            } else {
                0.0
            };

            WeatherRecord {
                date,
                sample_count: day.len(),
                rainfall_tot,
                ..WeatherRecord::default()
            }
        })
        .collect();

    debug!(
        "Reduced {} samples into {} UTC-day counter records",
        samples.len(),
        records.len()
    );
    records
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{DateTime, Utc};

    fn sample(ts: &str) -> RawSample {
        // ---
        RawSample {
            timestamp: ts.parse::<DateTime<Utc>>().unwrap(),
            temperature: 25.0,
            humidity: 75.0,
            pressure: 1008.0,
            dew_point: 21.0,
            rain_rate: 0.0,
            rain_accumulator: 0.0,
        }
    }

    fn with_temp(ts: &str, temperature: f64) -> RawSample {
        RawSample {
            temperature,
            ..sample(ts)
        }
    }

    fn with_rate(ts: &str, rain_rate: f64) -> RawSample {
        RawSample {
            rain_rate,
            ..sample(ts)
        }
    }

    fn with_counter(ts: &str, rain_accumulator: f64) -> RawSample {
        RawSample {
            rain_accumulator,
            ..sample(ts)
        }
    }

    fn daily(samples: &[RawSample]) -> Vec<WeatherRecord> {
        aggregate_daily_local(samples, &LocalPolicy::default(), AveragePolicy::ZeroFill)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_input_yields_no_days() {
        // ---
        assert!(daily(&[]).is_empty());
        assert!(aggregate_daily_utc_counter(&[]).is_empty());
    }

    #[test]
    fn test_weighted_average_across_uneven_hours() {
        // ---
        // One sample at 10 in the first hour, three at 20 in the second.
        let records = daily(&[
            with_temp("2024-05-10T08:15:00+07:00", 10.0),
            with_temp("2024-05-10T09:05:00+07:00", 20.0),
            with_temp("2024-05-10T09:25:00+07:00", 20.0),
            with_temp("2024-05-10T09:45:00+07:00", 20.0),
        ]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].temperature_avg, 17.5);
        assert_eq!(records[0].sample_count, 4);
    }

    #[test]
    fn test_extrema_come_from_raw_samples() {
        // ---
        let records = daily(&[
            with_temp("2024-05-10T08:15:00+07:00", 10.0),
            with_temp("2024-05-10T08:45:00+07:00", 20.0),
            with_temp("2024-05-10T13:00:00+07:00", f64::NAN),
            with_temp("2024-05-10T17:30:00+07:00", 30.0),
        ]);

        assert_eq!(records[0].temperature_min, 10.0);
        assert_eq!(records[0].temperature_max, 30.0);
    }

    #[test]
    fn test_finite_only_ignores_fully_faulted_hour() {
        // ---
        let samples = [
            with_temp("2024-05-10T08:10:00+07:00", f64::NAN),
            with_temp("2024-05-10T08:40:00+07:00", f64::NAN),
            with_temp("2024-05-10T09:20:00+07:00", 20.0),
        ];

        let finite_only =
            aggregate_daily_local(&samples, &LocalPolicy::default(), AveragePolicy::FiniteOnly);
        assert_eq!(finite_only.len(), 1);
        assert_eq!(finite_only[0].temperature_avg, 20.0);
        assert_eq!(finite_only[0].humidity_avg, 75.0);
        assert_eq!(finite_only[0].sample_count, 3);

        // Zero fill keeps the faulted hour in the weighting.
        let zero_fill = daily(&samples);
        assert!(approx(zero_fill[0].temperature_avg, 20.0 / 3.0));
    }

    #[test]
    fn test_finite_only_all_faulted_day_averages_to_zero() {
        // ---
        let samples = [
            with_temp("2024-05-10T08:10:00+07:00", f64::NAN),
            with_temp("2024-05-10T11:10:00+07:00", f64::NEG_INFINITY),
        ];

        let records =
            aggregate_daily_local(&samples, &LocalPolicy::default(), AveragePolicy::FiniteOnly);
        assert_eq!(records[0].temperature_avg, 0.0);
        assert_eq!(records[0].dew_point_avg, 21.0);
    }

    #[test]
    fn test_all_non_finite_extrema_default_to_zero() {
        // ---
        let records = daily(&[
            with_temp("2024-05-10T08:15:00+07:00", f64::NAN),
            with_temp("2024-05-10T09:15:00+07:00", f64::INFINITY),
        ]);

        assert_eq!(records[0].temperature_min, 0.0);
        assert_eq!(records[0].temperature_max, 0.0);
        assert_eq!(records[0].humidity_min, 75.0);
    }

    #[test]
    fn test_day_count_matches_hourly_counts() {
        // ---
        let samples = vec![
            sample("2024-05-10T00:00:00+07:00"),
            sample("2024-05-10T00:30:00+07:00"),
            sample("2024-05-10T23:59:59+07:00"),
            sample("2024-05-11T00:00:00+07:00"),
            sample("2024-05-09T12:00:00+07:00"),
        ];
        let records = daily(&samples);

        let dates: Vec<&str> = records.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, ["2024-05-09", "2024-05-10", "2024-05-11"]);

        let counts: Vec<usize> = records.iter().map(|r| r.sample_count).collect();
        assert_eq!(counts, [1, 3, 1]);

        let hourly = aggregate_hourly(&samples, &LocalPolicy::default(), AveragePolicy::ZeroFill);
        for record in &records {
            let from_hours: usize = hourly
                .iter()
                .filter(|h| h.date_key == record.date)
                .map(|h| h.sample_count)
                .sum();
            assert_eq!(from_hours, record.sample_count);
        }
    }

    #[test]
    fn test_rate_rainfall_sums_hourly_maxima() {
        // ---
        let records = daily(&[
            with_rate("2024-05-10T14:05:00+07:00", 0.0),
            with_rate("2024-05-10T14:25:00+07:00", 2.5),
            with_rate("2024-05-10T14:45:00+07:00", 1.0),
            with_rate("2024-05-10T15:10:00+07:00", 4.0),
            with_rate("2024-05-10T15:40:00+07:00", 3.0),
        ]);

        assert_eq!(records[0].rainfall_tot, 6.5);
        assert_eq!(records[0].wind_speed_avg, 0.0);
    }

    #[test]
    fn test_local_day_boundary_splits_at_local_midnight() {
        // ---
        // 16:59Z is 23:59 in Jakarta, 17:00Z is midnight of the next day.
        let records = daily(&[
            with_temp("2024-05-10T16:59:00Z", 24.0),
            with_temp("2024-05-10T17:00:00Z", 26.0),
        ]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, "2024-05-10");
        assert_eq!(records[1].date, "2024-05-11");
    }

    #[test]
    fn test_counter_delta_over_utc_day() {
        // ---
        let records = aggregate_daily_utc_counter(&[
            with_counter("2024-05-10T01:00:00Z", 5.0),
            with_counter("2024-05-10T09:00:00Z", 7.2),
            with_counter("2024-05-10T20:00:00Z", 9.8),
            with_counter("2024-05-11T03:00:00Z", 11.0),
        ]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, "2024-05-10");
        assert!(approx(records[0].rainfall_tot, 4.8));
        assert_eq!(records[0].sample_count, 3);

        // Single sample day has no delta.
        assert_eq!(records[1].date, "2024-05-11");
        assert_eq!(records[1].rainfall_tot, 0.0);
    }

    #[test]
    fn test_counter_zeroes_non_rain_fields() {
        // ---
        let records = aggregate_daily_utc_counter(&[
            with_counter("2024-05-10T01:00:00Z", 1.0),
            with_counter("2024-05-10T02:00:00Z", 2.0),
        ]);

        let expected = WeatherRecord {
            date: "2024-05-10".to_string(),
            sample_count: 2,
            rainfall_tot: 1.0,
            ..WeatherRecord::default()
        };
        assert_eq!(records[0], expected);
    }

    #[test]
    fn test_counter_needs_two_finite_values() {
        // ---
        let records = aggregate_daily_utc_counter(&[
            with_counter("2024-05-10T01:00:00Z", 3.0),
            with_counter("2024-05-10T02:00:00Z", f64::NAN),
            with_counter("2024-05-10T03:00:00Z", f64::INFINITY),
        ]);

        assert_eq!(records[0].rainfall_tot, 0.0);
    }

    #[test]
    fn test_counter_uses_utc_not_local_day() {
        // ---
        // 00:30 in Jakarta on Jan 1 is still Dec 31 in UTC.
        let records = aggregate_daily_utc_counter(&[
            with_counter("2024-01-01T00:30:00+07:00", 1.0),
            with_counter("2024-01-01T06:30:00+07:00", 2.0),
        ]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, "2023-12-31");
    }

    #[test]
    fn test_counter_reset_mid_day_undercounts() {
        // ---
        // 3.0 mm before the reset and 1.0 mm after it: 4.0 mm fell, max − min reports 3.0.
        let records = aggregate_daily_utc_counter(&[
            with_counter("2024-05-10T01:00:00Z", 0.0),
            with_counter("2024-05-10T05:00:00Z", 3.0),
            with_counter("2024-05-10T06:00:00Z", 0.0),
            with_counter("2024-05-10T09:00:00Z", 1.0),
        ]);

        assert_eq!(records[0].rainfall_tot, 3.0);
    }
}
