//! Shared application context.

use sqlx::PgPool;

use crate::config::GateConfig;

/// Process-wide resources, constructed once by the startup sequence and
/// passed by `Arc` to every component that needs them.
///
/// Read-only after construction: the request hot path takes no locks.
pub struct AppContext {
    pub config: GateConfig,
    /// `None` when no database is configured or the connection failed;
    /// dependent steps (schema registration, cleanup queries, close on
    /// shutdown) are skipped in that case.
    pub db: Option<PgPool>,
}
