// src/health/mod.rs
mod error;
mod http;
mod mongo;
mod postgres;

pub use error::{BoxError, CheckError};
pub use http::HttpCheck;
pub use mongo::{
    connection_uri, DocumentConnector, DocumentSession, MongoCheck, MongoConnector,
};
pub use postgres::{
    normalize_ssl_mode, PgConnector, PostgresCheck, SqlConnector, SqlSession,
    VERIFICATION_QUERY,
};

use crate::config::PingConfig;
use crate::retry::{RetryPolicy, RetryStrategy};
use async_trait::async_trait;
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Passed,
    /// Not configured; no I/O was attempted.
    Skipped,
}

/// One independently configured dependency.
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether every field the check needs is present.
    fn is_configured(&self) -> bool;

    /// Run a single attempt. Unconfigured checks return
    /// [`CheckOutcome::Skipped`] without touching the network.
    async fn check(&self) -> Result<CheckOutcome, CheckError>;
}

/// Ping until the first success, giving up after `config.attempts` tries.
pub(crate) async fn ping_until_ready<F, Fut>(
    operation: &str,
    config: &PingConfig,
    ping: F,
) -> Result<(), CheckError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), CheckError>>,
{
    RetryStrategy::new(RetryPolicy::bounded(config.attempts, config.delay()))
        .execute(operation, ping)
        .await
        .map_err(CheckError::from)
}
