//! Configuration loader for the `wxstation-rollup` service.
//!
//! All runtime settings and their defaults live here, read from environment
//! variables (with optional `.env` support provided by the caller). The
//! aggregation core only ever sees the immutable [`Config`] snapshot built
//! at startup.
use std::{env, net::SocketAddr};

use anyhow::{anyhow, Result};
use chrono_tz::Tz;

use crate::aggregate::DEFAULT_LOCAL_TZ;
use crate::models::AveragePolicy;

/// Parse an optional environment variable through `FromStr`, with a default.
macro_rules! parse_env_or {
    ($get:expr, $var_name:expr, $ty:ty, $default:expr) => {
        $get($var_name)
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Read a required string environment variable.
macro_rules! require_env {
    ($get:expr, $var_name:expr) => {
        $get($var_name).ok_or_else(|| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed service configuration.
///
/// Immutable after loading.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Upstream station feed; ingestion is disabled when unset.
    pub station_api_url: Option<String>,

    /// Maximum number of feed pages to fetch per ingest run.
    pub api_max_pages: u32,

    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,

    /// Zone for local-day bucketing (dashboards, monthly reports).
    pub local_timezone: Tz,

    /// Non-finite handling in the hourly averages.
    pub average_policy: AveragePolicy,
}

/// Load configuration from the process environment.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `STATION_API_URL` – upstream station feed (default: unset)
/// - `API_MAX_PAGES` – max feed pages per ingest (default: 100)
/// - `LISTEN_ADDR` – bind address (default: `0.0.0.0:8080`)
/// - `LOCAL_TIMEZONE` – IANA zone name (default: `Asia/Jakarta`)
/// - `AVERAGE_POLICY` – `zero_fill` or `finite_only` (default: `zero_fill`)
pub fn load_from_env() -> Result<Config> {
    load_with(|name| env::var(name).ok())
}

/// Load configuration through an arbitrary variable lookup.
///
/// Empty values count as unset.
pub fn load_with<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let db_url = require_env!(get, "DATABASE_URL");
    let station_api_url = get("STATION_API_URL");
    let db_pool_max = parse_env_or!(get, "DB_POOL_MAX", u32, 5);
    let api_max_pages = parse_env_or!(get, "API_MAX_PAGES", u32, 100);
    let listen_addr = parse_env_or!(
        get,
        "LISTEN_ADDR",
        SocketAddr,
        SocketAddr::from(([0, 0, 0, 0], 8080))
    );
    let local_timezone = parse_env_or!(get, "LOCAL_TIMEZONE", Tz, DEFAULT_LOCAL_TZ);
    let average_policy = parse_env_or!(get, "AVERAGE_POLICY", AveragePolicy, AveragePolicy::default());

    Ok(Config {
        db_url,
        db_pool_max,
        station_api_url,
        api_max_pages,
        listen_addr,
        local_timezone,
        average_policy,
    })
}

impl Config {
    /// Database URL with the password replaced by `****`.
    pub fn masked_db_url(&self) -> String {
        // ---
        let Some(at_pos) = self.db_url.rfind('@') else {
            return self.db_url.clone();
        };
        match self.db_url[..at_pos].rfind(':') {
            // The colon of "scheme://" is not a password separator.
            Some(colon_pos) if !self.db_url[colon_pos..].starts_with("://") => {
                format!("{}:****{}", &self.db_url[..colon_pos], &self.db_url[at_pos..])
            }
            _ => self.db_url.clone(),
        }
    }

    /// Log the loaded configuration, masking the database password.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL    : {}", self.masked_db_url());
        tracing::info!("  DB_POOL_MAX     : {}", self.db_pool_max);
        tracing::info!(
            "  STATION_API_URL : {}",
            self.station_api_url.as_deref().unwrap_or("(ingest disabled)")
        );
        tracing::info!("  API_MAX_PAGES   : {}", self.api_max_pages);
        tracing::info!("  LISTEN_ADDR     : {}", self.listen_addr);
        tracing::info!("  LOCAL_TIMEZONE  : {}", self.local_timezone.name());
        tracing::info!("  AVERAGE_POLICY  : {}", self.average_policy);
    }
}
