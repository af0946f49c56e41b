//! Application entry point for the `wxstation-rollup` service.
//!
//! Startup sequence:
//! - Load configuration from environment variables or `.env`
//! - Initialize structured logging/tracing
//! - Establish a PostgreSQL connection pool and ensure the schema exists
//! - Mount all API routes via the `routes` gateway (EMBP pattern)
//! - Bind the Axum HTTP server and serve requests
//!
//! # Environment Variables
//! See [`wxstation_rollup::config::load_from_env`] for service settings, plus:
//! - `ROLLUP_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `ROLLUP_SPAN_EVENTS` (optional) – span event mode for tracing
//! - `FORCE_COLOR` (optional) – force ANSI colors on or off
use std::{env, sync::Arc};

use anyhow::Result;
use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use sqlx::postgres::PgPoolOptions;
use tracing::Level;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use wxstation_rollup::routes::{self, AppState};
use wxstation_rollup::{config, schema, PgSampleStore};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!("Connecting to database: {}", cfg.masked_db_url());

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(&cfg.db_url)
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to connect to database '{}': {}",
                cfg.masked_db_url(),
                e
            )
        })?;

    tracing::info!("Successfully connected to database");

    schema::create_schema(&pool).await?;

    let addr = cfg.listen_addr;
    let state = AppState::new(Arc::new(PgSampleStore::new(pool)), cfg);
    let app: Router = routes::router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Install the global tracing subscriber.
///
/// Target, file and line number are always printed. Call once, before any
/// tracing macro fires.
fn init_tracing() {
    // ---
    let span_mode = env::var("ROLLUP_SPAN_EVENTS").ok();
    let force_color = env::var("FORCE_COLOR").ok();

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events(span_mode.as_deref()))
        .with_env_filter(log_filter())
        .with_ansi(use_color(force_color.as_deref()))
        .compact()
        .init();
}

/// `RUST_LOG` when it parses, otherwise `ROLLUP_LOG_LEVEL` with sqlx query
/// logging held at `warn`.
fn log_filter() -> EnvFilter {
    // ---
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = default_level(env::var("ROLLUP_LOG_LEVEL").ok().as_deref());
        EnvFilter::new(format!(
            "{},sqlx::query=warn",
            level.as_str().to_ascii_lowercase()
        ))
    })
}

/// Unknown or missing levels fall back to `debug`.
fn default_level(requested: Option<&str>) -> Level {
    requested
        .and_then(|v| v.trim().parse::<Level>().ok())
        .unwrap_or(Level::DEBUG)
}

/// `"full"`, `"enter_exit"`, `"none"`; anything else logs span CLOSE only.
fn span_events(mode: Option<&str>) -> FmtSpan {
    match mode.map(str::trim) {
        Some("full") => FmtSpan::FULL,
        Some("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        Some("none") => FmtSpan::NONE,
        _ => FmtSpan::CLOSE,
    }
}

/// `FORCE_COLOR` wins in either direction; otherwise follow TTY detection.
fn use_color(force: Option<&str>) -> bool {
    // ---
    match force.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("1" | "true" | "yes") => true,
        Some("0" | "false" | "no") => false,
        _ => std::io::stdout().is_terminal(),
    }
}
