//! Sample storage boundary.
//!
//! The aggregation core never fetches anything itself; route handlers pull
//! a fully materialized window from a [`SampleStore`] and hand the slice to
//! the reducers. Two stores exist: Postgres for the service and an
//! in-memory map for tests and local runs without a database.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{RawSample, TimeWindow};

// ---

/// Where raw samples are read from and written to.
#[async_trait]
pub trait SampleStore: Send + Sync {
    // ---
    /// Samples of `sensor_id` with `window.start <= timestamp < window.end`,
    /// ascending by timestamp.
    async fn fetch_samples(&self, sensor_id: &str, window: &TimeWindow) -> Result<Vec<RawSample>>;

    /// Persist samples for `sensor_id`, returning how many were written.
    async fn insert_samples(&self, sensor_id: &str, samples: &[RawSample]) -> Result<u64>;
}

// ---

/// Postgres-backed store over the `weather_samples` table.
#[derive(Debug, Clone)]
pub struct PgSampleStore {
    pool: PgPool,
}

impl PgSampleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row shape of `weather_samples`.
#[derive(Debug, sqlx::FromRow)]
struct SampleRow {
    // ---
    recorded_at: DateTime<Utc>,
    temperature: f64,
    humidity: f64,
    pressure: f64,
    dew_point: f64,
    rain_rate: f64,
    rain_accumulator: f64,
}

impl From<SampleRow> for RawSample {
    fn from(row: SampleRow) -> Self {
        RawSample {
            timestamp: row.recorded_at,
            temperature: row.temperature,
            humidity: row.humidity,
            pressure: row.pressure,
            dew_point: row.dew_point,
            rain_rate: row.rain_rate,
            rain_accumulator: row.rain_accumulator,
        }
    }
}

#[async_trait]
impl SampleStore for PgSampleStore {
    // ---
    async fn fetch_samples(&self, sensor_id: &str, window: &TimeWindow) -> Result<Vec<RawSample>> {
        // ---
        let rows: Vec<SampleRow> = sqlx::query_as(
            r#"
            SELECT recorded_at, temperature, humidity, pressure,
                   dew_point, rain_rate, rain_accumulator
            FROM weather_samples
            WHERE sensor_id = $1
              AND recorded_at >= $2
              AND recorded_at <  $3
            ORDER BY recorded_at
            "#,
        )
        .bind(sensor_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to fetch samples for '{}': {}", sensor_id, e))?;

        tracing::debug!("Fetched {} samples for sensor {}", rows.len(), sensor_id);
        Ok(rows.into_iter().map(RawSample::from).collect())
    }

    async fn insert_samples(&self, sensor_id: &str, samples: &[RawSample]) -> Result<u64> {
        // ---
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for sample in samples {
            let result = sqlx::query(
                r#"
                INSERT INTO weather_samples (
                    sensor_id, recorded_at, temperature, humidity,
                    pressure, dew_point, rain_rate, rain_accumulator
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (sensor_id, recorded_at) DO NOTHING
                "#,
            )
            .bind(sensor_id)
            .bind(sample.timestamp)
            .bind(sample.temperature)
            .bind(sample.humidity)
            .bind(sample.pressure)
            .bind(sample.dew_point)
            .bind(sample.rain_rate)
            .bind(sample.rain_accumulator)
            .execute(&mut *tx)
            .await?;

            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }
}

// ---

/// Process-local store keyed by sensor id, then by timestamp.
#[derive(Debug, Default)]
pub struct MemorySampleStore {
    samples: Mutex<HashMap<String, BTreeMap<DateTime<Utc>, RawSample>>>,
}

impl MemorySampleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SampleStore for MemorySampleStore {
    // ---
    async fn fetch_samples(&self, sensor_id: &str, window: &TimeWindow) -> Result<Vec<RawSample>> {
        // ---
        let guard = self
            .samples
            .lock()
            .map_err(|_| anyhow!("sample store lock poisoned"))?;

        // `range` panics on an inverted window.
        if window.end <= window.start {
            return Ok(Vec::new());
        }

        let found: Vec<RawSample> = guard
            .get(sensor_id)
            .map(|all| {
                all.range(window.start..window.end)
                    .map(|(_, sample)| *sample)
                    .collect()
            })
            .unwrap_or_default();
        Ok(found)
    }

    async fn insert_samples(&self, sensor_id: &str, samples: &[RawSample]) -> Result<u64> {
        // ---
        let mut guard = self
            .samples
            .lock()
            .map_err(|_| anyhow!("sample store lock poisoned"))?;

        let stored = guard.entry(sensor_id.to_string()).or_default();
        let mut written = 0;
        for sample in samples {
            // Same uniqueness as the (sensor_id, recorded_at) key in Postgres.
            if let Entry::Vacant(slot) = stored.entry(sample.timestamp) {
                slot.insert(*sample);
                written += 1;
            }
        }
        Ok(written)
    }
}
