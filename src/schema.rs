//! Database schema management for `wxstation-rollup`.
//!
//! Ensures the sample table exists before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create the `weather_samples` table (idempotent).
///
/// Numeric columns are `DOUBLE PRECISION` so faulted readings (NaN, ±∞)
/// survive storage and reach the reducers as non-finite values. The
/// `(sensor_id, recorded_at)` primary key is also the index window fetches
/// scan.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS weather_samples (
            sensor_id         TEXT             NOT NULL,
            recorded_at       TIMESTAMPTZ      NOT NULL,
            temperature       DOUBLE PRECISION NOT NULL,
            humidity          DOUBLE PRECISION NOT NULL,
            pressure          DOUBLE PRECISION NOT NULL,
            dew_point         DOUBLE PRECISION NOT NULL,
            rain_rate         DOUBLE PRECISION NOT NULL,
            rain_accumulator  DOUBLE PRECISION NOT NULL,
            PRIMARY KEY (sensor_id, recorded_at)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!("Schema ready: weather_samples");
    Ok(())
}
