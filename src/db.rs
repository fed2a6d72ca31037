//! Database module - PostgreSQL connection and migrations

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Create database connection pool.
///
/// Connections are opened on first use so the service can serve
/// predictions while the database is unreachable.
pub fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(database_url)
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Served predictions (audit trail)
CREATE TABLE IF NOT EXISTS predictions (
    id UUID PRIMARY KEY,
    run_id VARCHAR(64),
    client_id VARCHAR(255) NOT NULL,
    raw_input TEXT NOT NULL,
    processed_input JSONB NOT NULL,
    prediction_prob DOUBLE PRECISION NOT NULL,
    predicted_class SMALLINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_predictions_client ON predictions(client_id);
CREATE INDEX IF NOT EXISTS idx_predictions_created ON predictions(created_at);
"#;
