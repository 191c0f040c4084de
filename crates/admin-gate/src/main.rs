//! admin-gate: process front door and startup orchestration for the admin
//! platform. One public port serves both reverse-proxied API traffic and
//! the pre-built frontend bundle; the primary service port stays internal.

mod config;
mod context;
mod db;
mod frontdoor;
mod server;
mod startup;
mod tasks;

use config::GateConfig;

fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1).cloned())
        .or_else(|| args.get(1).filter(|a| !a.starts_with('-')).cloned())
        .or_else(|| std::env::var("ADMIN_GATE_CONFIG").ok())
        .unwrap_or_else(|| "admin-gate.toml".to_string());

    // Config first, logging second: nothing may log before the subscriber
    // exists, and the subscriber needs the config.
    let config = GateConfig::load(&config_path)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        gate_tracing::init_tracing(&config.tracing);

        tracing::info!(
            config_path = %config_path,
            primary_address = %config.server.listen_address,
            frontdoor_address = %config.frontdoor.listen_address,
            upstream_origin = %config.frontdoor.upstream_origin,
            "starting admin-gate"
        );

        startup::run(config).await
    })
}
