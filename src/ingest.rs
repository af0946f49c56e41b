//! Ingestion from the upstream station feed.
//!
//! The feed is cursor paginated: each page carries a `results` array and an
//! optional `next_cursor`. Items that do not parse are logged and skipped;
//! a missing measurement becomes NaN so the reducers treat it as absent.

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::RawSample;
use crate::store::SampleStore;

// ---

/// One item of the station feed.
#[derive(Debug, Clone, Deserialize)]
pub struct StationReading {
    // ---
    pub sensor_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp_millis: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub dew_point: Option<f64>,
    pub rain_rate: Option<f64>,
    pub rain_accumulator: Option<f64>,
}

impl StationReading {
    // ---
    pub fn to_sample(&self) -> RawSample {
        // ---
        let absent = |v: Option<f64>| v.unwrap_or(f64::NAN);
        RawSample {
            timestamp: self.timestamp_millis,
            temperature: absent(self.temperature),
            humidity: absent(self.humidity),
            pressure: absent(self.pressure),
            dew_point: absent(self.dew_point),
            rain_rate: absent(self.rain_rate),
            rain_accumulator: absent(self.rain_accumulator),
        }
    }
}

/// Outcome of one ingest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub fetched: usize,
    pub stored: u64,
}

/// Parse one feed page into readings plus the cursor of the next page.
pub fn parse_page(page: &Value, page_number: u32) -> (Vec<StationReading>, Option<String>) {
    // ---
    let mut readings = Vec::new();

    match page.get("results").and_then(|d| d.as_array()) {
        Some(items) => {
            tracing::debug!("Page {} has {} items", page_number, items.len());
            for (i, item) in items.iter().enumerate() {
                match StationReading::deserialize(item) {
                    Ok(reading) => readings.push(reading),
                    Err(e) => {
                        tracing::debug!(
                            "Skipping item {} on page {}: {} - Raw item: {}",
                            i,
                            page_number,
                            e,
                            item
                        );
                    }
                }
            }
        }
        None => {
            tracing::debug!(
                "Page {} response missing 'results' field or not an array",
                page_number
            );
        }
    }

    let cursor = page
        .get("next_cursor")
        .and_then(|c| c.as_str())
        .map(String::from);

    (readings, cursor)
}

/// Fetch every page of the station feed, up to `max_pages`.
pub async fn fetch_station_samples(base_url: &str, max_pages: u32) -> Result<Vec<StationReading>> {
    // ---
    let client = reqwest::Client::new();
    let mut all_readings = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page_count = 0;

    loop {
        if page_count >= max_pages {
            tracing::debug!(
                "Hit page limit of {}, stopping with {} readings",
                max_pages,
                all_readings.len()
            );
            break;
        }
        page_count += 1;

        let mut request = client.get(base_url);
        if let Some(ref cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        tracing::debug!("Fetching page {} from {}", page_count, base_url);
        let page: Value = request.send().await?.error_for_status()?.json().await?;

        let (readings, next) = parse_page(&page, page_count);
        all_readings.extend(readings);
        cursor = next;

        if cursor.is_none() {
            break;
        }
    }

    tracing::info!(
        "Fetched {} readings from {} pages",
        all_readings.len(),
        page_count
    );
    Ok(all_readings)
}

/// Write readings through `store`, one batch per sensor.
pub async fn store_readings(
    store: &dyn SampleStore,
    readings: &[StationReading],
) -> Result<IngestReport> {
    // ---
    let mut by_sensor: BTreeMap<&str, Vec<RawSample>> = BTreeMap::new();
    for reading in readings {
        by_sensor
            .entry(reading.sensor_id.as_str())
            .or_default()
            .push(reading.to_sample());
    }

    let mut stored = 0;
    for (sensor_id, samples) in &by_sensor {
        let written = store.insert_samples(sensor_id, samples).await?;
        tracing::debug!("Stored {}/{} samples for {}", written, samples.len(), sensor_id);
        stored += written;
    }

    Ok(IngestReport {
        fetched: readings.len(),
        stored,
    })
}
