//! Weather station rollups.
//!
//! Turns irregular streams of raw station samples into hourly, daily and
//! period summaries, and serves them over HTTP. The reducers live in
//! [`aggregate`]; everything else is the service shell around them.

pub mod aggregate;
pub mod config;
pub mod ingest;
pub mod models;
pub mod routes;
pub mod schema;
pub mod store;

pub use aggregate::Aggregator;
pub use config::Config;
pub use models::{
    AveragePolicy, HourlyRecord, PeriodStats, RainfallSource, RawSample, TimeWindow, WeatherRecord,
};
pub use store::{MemorySampleStore, PgSampleStore, SampleStore};
