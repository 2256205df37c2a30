// src/config/models.rs
use crate::health::normalize_ssl_mode;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub namespace: String,
    pub http: HttpCheckConfig,
    pub postgres: PostgresConfig,
    pub mongo: MongoConfig,
    pub retry: RetryConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpCheckConfig {
    #[serde(deserialize_with = "deserialize_url_list")]
    pub urls: Vec<String>,
    pub timeout_secs: u64,
    /// Accept self-signed and otherwise invalid certificates.
    pub insecure_skip_verify: bool,
}

impl HttpCheckConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub ssl_mode: String,
    pub connect_timeout_secs: u64,
    pub ping: PingConfig,
}

impl PostgresConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub connect_timeout_secs: u64,
    pub ping: PingConfig,
}

impl MongoConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Bounded ping loop run inside a database stage.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PingConfig {
    pub attempts: u32,
    pub delay_secs: u64,
}

impl PingConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    pub delay_secs: u64,
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// Where to write the text exposition once every stage is ready.
    pub file: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid readiness check URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported postgres SSL mode {0:?}")]
    InvalidSslMode(String),

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for raw in &self.http.urls {
            let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
                url: raw.clone(),
                reason: e.to_string(),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidUrl {
                    url: raw.clone(),
                    reason: format!("unsupported scheme {}", url.scheme()),
                });
            }
        }

        let ssl_mode = normalize_ssl_mode(&self.postgres.ssl_mode);
        if !matches!(
            ssl_mode.as_str(),
            "disable" | "allow" | "prefer" | "require" | "verify-ca" | "verify-full"
        ) {
            return Err(ConfigError::InvalidSslMode(self.postgres.ssl_mode.clone()));
        }

        if self.http.timeout_secs == 0 {
            return Err(ConfigError::NotPositive("http.timeout_secs"));
        }
        if self.postgres.connect_timeout_secs == 0 {
            return Err(ConfigError::NotPositive("postgres.connect_timeout_secs"));
        }
        if self.mongo.connect_timeout_secs == 0 {
            return Err(ConfigError::NotPositive("mongo.connect_timeout_secs"));
        }
        if self.postgres.ping.attempts == 0 {
            return Err(ConfigError::NotPositive("postgres.ping.attempts"));
        }
        if self.mongo.ping.attempts == 0 {
            return Err(ConfigError::NotPositive("mongo.ping.attempts"));
        }

        Ok(())
    }
}

/// Splits a comma separated list, trimming entries and dropping blanks.
pub fn split_url_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn deserialize_url_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum UrlList {
        Csv(String),
        List(Vec<String>),
    }

    Ok(match UrlList::deserialize(deserializer)? {
        UrlList::Csv(raw) => split_url_list(&raw),
        UrlList::List(urls) => urls
            .iter()
            .flat_map(|entry| split_url_list(entry))
            .collect(),
    })
}
