//! Database pool lifecycle and schema registration.
//!
//! The database is optional: the gateway must keep serving proxy and static
//! traffic without one, with dependent application features degraded.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;

/// Connect the process-wide pool.
///
/// Returns `None` when no URL is configured or the connection attempt fails;
/// either way the rest of startup continues. A connection failure is a
/// degraded mode, not a fatal one.
pub async fn connect(config: &DatabaseConfig) -> Option<PgPool> {
    let url = match &config.url {
        Some(url) => url,
        None => {
            tracing::info!("no database configured, running without one");
            return None;
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(url)
        .await;

    match pool {
        Ok(pool) => {
            tracing::info!(
                max_connections = config.max_connections,
                "database pool initialized"
            );
            Some(pool)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "database connection failed, continuing without a database"
            );
            None
        }
    }
}

/// Run the embedded migrations that create the gateway-maintained tables.
///
/// Only called when a pool exists. A migration failure is fatal: serving
/// requests against a half-registered schema is worse than not starting.
pub async fn register_schema(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("database schema registered");
    Ok(())
}

/// Prune operation records older than `retention_days`.
///
/// Called by the periodic cleanup task; errors are reported to the caller
/// and logged there, never fatal.
pub async fn prune_operation_records(pool: &PgPool, retention_days: u32) -> sqlx::Result<u64> {
    let result =
        sqlx::query("DELETE FROM operation_records WHERE created_at < now() - make_interval(days => $1)")
            .bind(retention_days as i32)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}
