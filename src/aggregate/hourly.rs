//! Hourly reducer: raw samples → one record per local hour.

use std::collections::BTreeMap;

use tracing::debug;

use super::bucket::LocalPolicy;
use crate::models::{AveragePolicy, HourlyRecord, RawSample};

// ---

/// Group samples by local hour and reduce each group.
///
/// Output is sorted ascending by `hour_key`. An empty input yields an empty
/// output. Averages follow `averaging`; `rainfall_tot` is the largest finite
/// rain rate in the hour, floored at 0.
pub fn aggregate_hourly(
    samples: &[RawSample],
    policy: &LocalPolicy,
    averaging: AveragePolicy,
) -> Vec<HourlyRecord> {
    // ---
    let mut buckets: BTreeMap<String, (String, Vec<&RawSample>)> = BTreeMap::new();
    for sample in samples {
        let keys = policy.keys(sample.timestamp);
        buckets
            .entry(keys.hour_key)
            .or_insert_with(|| (keys.date_key, Vec::new()))
            .1
            .push(sample);
    }

    let records: Vec<HourlyRecord> = buckets
        .into_iter()
        .map(|(hour_key, (date_key, bucket))| reduce_hour(hour_key, date_key, &bucket, averaging))
        .collect();

    debug!(
        "Reduced {} samples into {} hourly records",
        samples.len(),
        records.len()
    );
    records
}

fn reduce_hour(
    hour_key: String,
    date_key: String,
    bucket: &[&RawSample],
    averaging: AveragePolicy,
) -> HourlyRecord {
    // ---
    let rainfall_tot = bucket
        .iter()
        .map(|s| s.rain_rate)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);

    HourlyRecord {
        hour_key,
        date_key,
        sample_count: bucket.len(),
        temperature_avg: mean(bucket.iter().map(|s| s.temperature), averaging),
        humidity_avg: mean(bucket.iter().map(|s| s.humidity), averaging),
        pressure_avg: mean(bucket.iter().map(|s| s.pressure), averaging),
        dew_point_avg: mean(bucket.iter().map(|s| s.dew_point), averaging),
        rainfall_tot,
    }
}

/// Mean of one field under the given non-finite policy; 0 when nothing counts.
pub(super) fn mean(values: impl Iterator<Item = f64>, averaging: AveragePolicy) -> f64 {
    // ---
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        match (v.is_finite(), averaging) {
            (true, _) => {
                sum += v;
                count += 1;
            }
            (false, AveragePolicy::ZeroFill) => count += 1,
            (false, AveragePolicy::FiniteOnly) => {}
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{DateTime, Utc};

    fn sample(ts: &str, temperature: f64, rain_rate: f64) -> RawSample {
        // ---
        RawSample {
            timestamp: ts.parse::<DateTime<Utc>>().unwrap(),
            temperature,
            humidity: 70.0,
            pressure: 1010.0,
            dew_point: 22.0,
            rain_rate,
            rain_accumulator: 0.0,
        }
    }

    fn hourly(samples: &[RawSample]) -> Vec<HourlyRecord> {
        aggregate_hourly(samples, &LocalPolicy::default(), AveragePolicy::ZeroFill)
    }

    #[test]
    fn test_empty_input_yields_no_records() {
        assert!(hourly(&[]).is_empty());
    }

    #[test]
    fn test_rain_rate_takes_hourly_max() {
        // ---
        let records = hourly(&[
            sample("2024-03-05T10:05:00+07:00", 26.0, 0.0),
            sample("2024-03-05T10:25:00+07:00", 26.0, 2.5),
            sample("2024-03-05T10:45:00+07:00", 26.0, 1.0),
        ]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rainfall_tot, 2.5);
        assert_eq!(records[0].hour_key, "2024-03-05T10");
        assert_eq!(records[0].date_key, "2024-03-05");
    }

    #[test]
    fn test_rain_rate_ignores_non_finite_and_floors_at_zero() {
        // ---
        let records = hourly(&[
            sample("2024-03-05T10:05:00+07:00", 26.0, f64::NAN),
            sample("2024-03-05T10:25:00+07:00", 26.0, -3.0),
            sample("2024-03-05T11:05:00+07:00", 26.0, f64::INFINITY),
        ]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rainfall_tot, 0.0);
        assert_eq!(records[1].rainfall_tot, 0.0);
    }

    #[test]
    fn test_partition_counts_every_sample_once_and_sorts() {
        // ---
        let samples = vec![
            sample("2024-03-05T12:10:00+07:00", 30.0, 0.0),
            sample("2024-03-05T09:59:59+07:00", 24.0, 0.0),
            sample("2024-03-05T12:50:00+07:00", 31.0, 0.0),
            sample("2024-03-04T23:10:00+07:00", 23.0, 0.0),
            sample("2024-03-05T10:00:00+07:00", 25.0, 0.0),
        ];
        let records = hourly(&samples);

        let keys: Vec<&str> = records.iter().map(|r| r.hour_key.as_str()).collect();
        assert_eq!(
            keys,
            [
                "2024-03-04T23",
                "2024-03-05T09",
                "2024-03-05T10",
                "2024-03-05T12"
            ]
        );

        let total: usize = records.iter().map(|r| r.sample_count).sum();
        assert_eq!(total, samples.len());
        assert!(records.iter().all(|r| r.sample_count >= 1));
        assert_eq!(records[3].temperature_avg, 30.5);
    }

    #[test]
    fn test_zero_fill_biases_average_toward_zero() {
        // ---
        let samples = [
            sample("2024-03-05T10:05:00+07:00", 20.0, 0.0),
            sample("2024-03-05T10:25:00+07:00", f64::NAN, 0.0),
        ];

        let zero_fill = aggregate_hourly(&samples, &LocalPolicy::default(), AveragePolicy::ZeroFill);
        assert_eq!(zero_fill[0].temperature_avg, 10.0);

        let finite_only =
            aggregate_hourly(&samples, &LocalPolicy::default(), AveragePolicy::FiniteOnly);
        assert_eq!(finite_only[0].temperature_avg, 20.0);
        assert_eq!(finite_only[0].sample_count, 2);
    }

    #[test]
    fn test_all_non_finite_field_averages_to_zero() {
        // ---
        let samples = [
            sample("2024-03-05T10:05:00+07:00", f64::NAN, 0.0),
            sample("2024-03-05T10:25:00+07:00", f64::NEG_INFINITY, 0.0),
        ];

        for averaging in [AveragePolicy::ZeroFill, AveragePolicy::FiniteOnly] {
            let records = aggregate_hourly(&samples, &LocalPolicy::default(), averaging);
            assert_eq!(records[0].temperature_avg, 0.0);
            assert_eq!(records[0].humidity_avg, 70.0);
        }
    }
}
