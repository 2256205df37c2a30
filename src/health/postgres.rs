// src/health/postgres.rs
use super::{ping_until_ready, CheckError, CheckOutcome, ReadinessCheck};
use crate::config::PostgresConfig;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use sqlx::Connection;
use tracing::{debug, info};

/// Lists the non-template databases; a live server always has at least one.
pub const VERIFICATION_QUERY: &str =
    "SELECT datname FROM pg_database WHERE datistemplate = false";

/// Map the loose SSL flag accepted on the command line to a libpq mode.
///
/// Empty and `false` disable TLS, `true` requires it, and any other value is
/// passed through as an already valid mode name.
pub fn normalize_ssl_mode(mode: &str) -> String {
    if mode.is_empty() {
        return "disable".to_string();
    }

    match mode.to_ascii_lowercase().as_str() {
        "true" => "require".to_string(),
        "false" => "disable".to_string(),
        _ => mode.to_string(),
    }
}

/// An open handle to the relational database.
#[async_trait]
pub trait SqlSession: Send + Sync {
    async fn ping(&self) -> Result<(), CheckError>;

    /// Run `query` and return the number of rows it affected.
    async fn execute(&self, query: &str) -> Result<u64, CheckError>;

    async fn close(&self);
}

#[async_trait]
pub trait SqlConnector: Send + Sync {
    async fn open(&self, config: &PostgresConfig) -> Result<Box<dyn SqlSession>, CheckError>;
}

/// Opens sqlx sessions against a real server.
#[derive(Debug, Default, Clone, Copy)]
pub struct PgConnector;

#[async_trait]
impl SqlConnector for PgConnector {
    async fn open(&self, config: &PostgresConfig) -> Result<Box<dyn SqlSession>, CheckError> {
        let target = format!("{}:{}", config.host, config.port);
        let ssl_mode: PgSslMode = normalize_ssl_mode(&config.ssl_mode)
            .parse()
            .map_err(|e: sqlx::Error| CheckError::transport(target.as_str(), e))?;

        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .ssl_mode(ssl_mode)
            .application_name(env!("CARGO_PKG_NAME"));

        // Lazy: the first ping is what actually dials the server.
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(config.connect_timeout())
            .connect_lazy_with(options);

        Ok(Box::new(PgSession { pool, target }))
    }
}

struct PgSession {
    pool: PgPool,
    target: String,
}

#[async_trait]
impl SqlSession for PgSession {
    async fn ping(&self) -> Result<(), CheckError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| CheckError::transport(self.target.as_str(), e))?;
        conn.ping()
            .await
            .map_err(|e| CheckError::transport(self.target.as_str(), e))
    }

    async fn execute(&self, query: &str) -> Result<u64, CheckError> {
        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map(|result| result.rows_affected())
            .map_err(|e| CheckError::Query(e.into()))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

pub struct PostgresCheck {
    config: PostgresConfig,
    connector: Box<dyn SqlConnector>,
}

impl PostgresCheck {
    pub fn new(config: PostgresConfig) -> Self {
        Self::with_connector(config, PgConnector)
    }

    pub fn with_connector(config: PostgresConfig, connector: impl SqlConnector + 'static) -> Self {
        Self {
            config,
            connector: Box::new(connector),
        }
    }

    async fn verify(&self, session: &dyn SqlSession) -> Result<(), CheckError> {
        ping_until_ready("ping postgres database", &self.config.ping, || session.ping()).await?;

        let rows = session.execute(VERIFICATION_QUERY).await?;
        if rows == 0 {
            return Err(CheckError::EmptyResult(VERIFICATION_QUERY.to_string()));
        }
        debug!(rows, "verification query succeeded");
        Ok(())
    }
}

#[async_trait]
impl ReadinessCheck for PostgresCheck {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn is_configured(&self) -> bool {
        !self.config.user.is_empty() && !self.config.password.is_empty()
    }

    async fn check(&self) -> Result<CheckOutcome, CheckError> {
        if !self.is_configured() {
            info!("skipping postgres database readiness check");
            return Ok(CheckOutcome::Skipped);
        }

        info!(
            host = %self.config.host,
            port = self.config.port,
            database = %self.config.database,
            "validating postgres database connection"
        );

        let session = self.connector.open(&self.config).await?;
        let result = self.verify(session.as_ref()).await;
        session.close().await;
        result?;

        info!("postgres database '{}' instance is up and running", self.config.host);
        Ok(CheckOutcome::Passed)
    }
}
