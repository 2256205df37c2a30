// src/config/mod.rs
mod models;

pub use models::*;

use crate::cli::Cli;
use anyhow::{Context, Result};
use ::config::builder::DefaultState;
use ::config::{ConfigBuilder, Environment, File};
use std::collections::HashMap;

/// Prefix of the environment variables read by [`load_config`],
/// e.g. `READINESS_POSTGRES__PASSWORD`.
pub const ENV_PREFIX: &str = "READINESS";

/// Assemble the configuration snapshot: built-in defaults, then the optional
/// config file, then `READINESS_*` environment variables, then CLI flags.
pub fn load_config(cli: &Cli) -> Result<Config> {
    load_config_with_env(cli, None)
}

/// Same as [`load_config`] but reads environment variables from `env` when
/// given instead of the process environment.
pub fn load_config_with_env(cli: &Cli, env: Option<HashMap<String, String>>) -> Result<Config> {
    let namespace = cli
        .namespace
        .as_deref()
        .map(str::trim)
        .filter(|ns| !ns.is_empty())
        .unwrap_or(DEFAULT_NAMESPACE)
        .to_string();

    let mut builder = defaults(&namespace).context("Failed to set configuration defaults")?;

    if let Some(path) = &cli.config {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .source(env),
    );

    let config: Config = overrides(builder, cli)
        .context("Failed to apply command line flags")?
        .build()
        .context("Failed to assemble configuration")?
        .try_deserialize()
        .context("Failed to parse configuration")?;

    config.validate()?;
    Ok(config)
}

fn defaults(namespace: &str) -> Result<ConfigBuilder<DefaultState>, ::config::ConfigError> {
    ::config::Config::builder()
        .set_default("namespace", namespace)?
        .set_default("http.urls", "")?
        .set_default("http.timeout_secs", 10_i64)?
        .set_default("http.insecure_skip_verify", true)?
        .set_default(
            "postgres.host",
            format!("postgresql.{}.svc.cluster.local", namespace),
        )?
        .set_default("postgres.port", 5432_i64)?
        .set_default("postgres.database", "postgres")?
        .set_default("postgres.user", "")?
        .set_default("postgres.password", "")?
        .set_default("postgres.ssl_mode", "disable")?
        .set_default("postgres.connect_timeout_secs", 10_i64)?
        .set_default("postgres.ping.attempts", 10_i64)?
        .set_default("postgres.ping.delay_secs", 5_i64)?
        .set_default("mongo.host", format!("mongodb.{}.svc.cluster.local", namespace))?
        .set_default("mongo.port", 27017_i64)?
        .set_default("mongo.database", "")?
        .set_default("mongo.user", "")?
        .set_default("mongo.password", "")?
        .set_default("mongo.connect_timeout_secs", 10_i64)?
        .set_default("mongo.ping.attempts", 10_i64)?
        .set_default("mongo.ping.delay_secs", 5_i64)?
        .set_default("retry.delay_secs", 5_i64)
}

fn overrides(
    builder: ConfigBuilder<DefaultState>,
    cli: &Cli,
) -> Result<ConfigBuilder<DefaultState>, ::config::ConfigError> {
    builder
        .set_override_option("http.urls", cli.http_readiness_check_urls.clone())?
        .set_override_option("http.timeout_secs", cli.http_timeout_secs.map(as_i64))?
        .set_override_option("http.insecure_skip_verify", cli.http_insecure_skip_verify)?
        .set_override_option("postgres.host", cli.postgres_host.clone())?
        .set_override_option("postgres.port", cli.postgres_port.map(i64::from))?
        .set_override_option("postgres.database", cli.postgres_database.clone())?
        .set_override_option("postgres.user", cli.postgres_user.clone())?
        .set_override_option("postgres.password", cli.postgres_password.clone())?
        .set_override_option("postgres.ssl_mode", cli.postgres_ssl_mode.clone())?
        .set_override_option("mongo.host", cli.mongo_host.clone())?
        .set_override_option("mongo.port", cli.mongo_port.map(i64::from))?
        .set_override_option("mongo.database", cli.mongo_database.clone())?
        .set_override_option("mongo.user", cli.mongo_user.clone())?
        .set_override_option("mongo.password", cli.mongo_password.clone())?
        .set_override_option("retry.delay_secs", cli.retry_delay_secs.map(as_i64))?
        .set_override_option(
            "metrics.file",
            cli.metrics_file
                .as_ref()
                .map(|path| path.to_string_lossy().into_owned()),
        )
}

fn as_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
