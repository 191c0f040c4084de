//! Periodic maintenance tasks.

use std::sync::Arc;
use std::time::Duration;

use crate::context::AppContext;
use crate::db;

/// Arm the cleanup timer: an interval loop that prunes old operation
/// records whenever a database handle exists.
///
/// Fire-and-forget; errors are logged and never stop the loop.
pub fn start_cleanup(ctx: Arc<AppContext>) {
    let period = Duration::from_secs(ctx.config.tasks.cleanup_interval_secs);
    let retention_days = ctx.config.tasks.retention_days;

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately; skip it.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let pool = match &ctx.db {
                Some(pool) => pool,
                None => {
                    tracing::debug!("cleanup tick skipped, no database");
                    continue;
                }
            };

            match db::prune_operation_records(pool, retention_days).await {
                Ok(pruned) => {
                    tracing::info!(pruned, retention_days, "operation records pruned");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "operation record cleanup failed");
                }
            }
        }
    });

    tracing::info!(
        period_secs = period.as_secs(),
        retention_days,
        "cleanup timer armed"
    );
}
