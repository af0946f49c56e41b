//! Time-series aggregation core.
//!
//! Pure, synchronous reducers over fully materialized sample slices. Every
//! call recomputes from scratch and returns freshly allocated records, so
//! concurrent callers share nothing. No reducer fails: empty or non-finite
//! input degrades to empty sequences and zeros.
//!
//! Gateway for the `bucket`, `hourly`, `daily` and `period` modules
//! (EMBP); callers outside `aggregate` go through these re-exports or the
//! [`Aggregator`] facade.

use chrono_tz::Tz;

use crate::config::Config;
use crate::models::{
    AveragePolicy, HourlyRecord, PeriodStats, RainfallSource, RawSample, WeatherRecord,
};

mod bucket;
mod daily;
mod hourly;
mod period;

pub use bucket::{BucketKeys, LocalPolicy, UtcPolicy, DEFAULT_LOCAL_TZ};
pub use daily::{aggregate_daily_local, aggregate_daily_utc_counter};
pub use hourly::aggregate_hourly;
pub use period::period_stats;

// ---

/// Immutable aggregation settings plus the entry points callers use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aggregator {
    // ---
    local: LocalPolicy,
    averaging: AveragePolicy,
}

impl Aggregator {
    // ---
    pub fn new(local_tz: Tz, averaging: AveragePolicy) -> Self {
        Self {
            local: LocalPolicy::new(local_tz),
            averaging,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.local_timezone, config.average_policy)
    }

    pub fn local_policy(&self) -> &LocalPolicy {
        &self.local
    }

    pub fn averaging(&self) -> AveragePolicy {
        self.averaging
    }

    pub fn hourly(&self, samples: &[RawSample]) -> Vec<HourlyRecord> {
        aggregate_hourly(samples, &self.local, self.averaging)
    }

    /// Daily records for the rainfall quantity the caller asks for.
    pub fn daily(&self, samples: &[RawSample], source: RainfallSource) -> Vec<WeatherRecord> {
        // ---
        match source {
            RainfallSource::RateBased => aggregate_daily_local(samples, &self.local, self.averaging),
            RainfallSource::CounterBased => aggregate_daily_utc_counter(samples),
        }
    }

    pub fn period(&self, days: &[WeatherRecord], samples: &[RawSample]) -> PeriodStats {
        period_stats(days, samples)
    }
}

/// Smallest and largest finite value, or `(0, 0)` when there is none.
pub(crate) fn finite_extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    // ---
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((low, high)) => Some((low.min(v), high.max(v))),
        })
        .unwrap_or((0.0, 0.0))
}
