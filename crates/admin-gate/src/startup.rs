//! Startup sequencing.
//!
//! Strictly ordered bring-up: config and logging are already live when
//! [`run`] is entered (done in `main`, before anything else can log), then
//! origin resolution, database, timers, schema, the background front-door
//! listener, and finally the primary listener, which owns the process
//! lifetime. Each step gates the next; the database is the only optional
//! branch.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::oneshot;

use crate::config::GateConfig;
use crate::context::AppContext;
use crate::frontdoor::forward::Forwarder;
use crate::{db, frontdoor, server, tasks};

pub async fn run(config: GateConfig) -> anyhow::Result<()> {
    // Origin resolution happens before any listener exists: a malformed
    // origin must abort startup, not surface per-request.
    let forwarder = Forwarder::new(
        &config.frontdoor.upstream_origin,
        Duration::from_secs(config.frontdoor.upstream_timeout_secs),
    )
    .context("upstream origin configuration rejected")?;

    // Database step: absent or unreachable means degraded mode, with the
    // schema and close-on-shutdown steps skipped.
    let pool = db::connect(&config.database).await;

    let ctx = Arc::new(AppContext { config, db: pool });

    tasks::start_cleanup(ctx.clone());

    if let Some(pool) = &ctx.db {
        db::register_schema(pool)
            .await
            .context("schema registration failed")?;
    }

    // The front door is a background task gated on the primary listener's
    // readiness signal. Its failure handling is a policy decision:
    // required=false logs and moves on, required=true brings the process
    // down with it.
    let (ready_tx, ready_rx) = oneshot::channel();
    let frontdoor_ctx = ctx.clone();
    let frontdoor_handle = tokio::spawn(async move {
        if let Err(e) = frontdoor::run(frontdoor_ctx, forwarder, ready_rx).await {
            tracing::error!(error = %e, "front door listener failed");
            return Err(e);
        }
        Ok(())
    });

    let primary = server::run_primary(ctx.clone(), ready_tx);

    if ctx.config.frontdoor.required {
        tokio::pin!(primary);
        tokio::select! {
            result = &mut primary => result?,
            joined = frontdoor_handle => match joined {
                // Clean front-door exit (e.g. missing asset bundle) still
                // leaves the primary listener owning the process.
                Ok(Ok(())) => primary.await?,
                Ok(Err(e)) => return Err(e.context("front door is required")),
                Err(e) => return Err(anyhow::Error::from(e).context("front door task panicked")),
            },
        }
    } else {
        // Independent failure domains: the handle is deliberately not
        // awaited, the supervising task above already logs failures.
        primary.await?;
    }

    // Normal shutdown: release the database handle exactly once. Skipped
    // cleanly when the process ran degraded.
    if let Some(pool) = &ctx.db {
        pool.close().await;
        tracing::info!("database pool closed");
    }

    Ok(())
}
