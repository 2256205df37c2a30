//! Command line interface for readiness-init
//!
//! Every flag is optional; anything not given on the command line falls back
//! to the config file, then `READINESS_*` environment variables, then the
//! built-in defaults (see [`crate::config::load_config`]).

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Blocks until the HTTP endpoints, PostgreSQL and MongoDB a workload depends
/// on are reachable
#[derive(Parser, Debug, Default)]
#[command(name = "readiness-init")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    POD_NAMESPACE                    Namespace used to derive database hosts (default: default)
    READINESS_HTTP__URLS             HTTP readiness check URLs separated by ','
    READINESS_POSTGRES__USER         Postgres database user
    READINESS_POSTGRES__PASSWORD     Postgres database password
    READINESS_MONGO__DATABASE        Mongo database name
    READINESS_MONGO__USER            Mongo database user
    READINESS_MONGO__PASSWORD        Mongo database password
    RUST_LOG                         Log filter (default: readiness_init=info)

Any configuration key can be set as READINESS_<SECTION>__<KEY>.
A stage whose credentials are empty is skipped.
"#)]
pub struct Cli {
    /// HTTP readiness check URLs separated by ','
    #[arg(short = 'c', long, value_name = "URLS")]
    pub http_readiness_check_urls: Option<String>,

    /// Per request timeout of the HTTP readiness check, in seconds
    #[arg(long, value_name = "SECS")]
    pub http_timeout_secs: Option<u64>,

    /// Skip TLS certificate verification for HTTP readiness checks [default: true]
    #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
    pub http_insecure_skip_verify: Option<bool>,

    /// Postgres database host [default: postgresql.<namespace>.svc.cluster.local]
    #[arg(short = 's', long)]
    pub postgres_host: Option<String>,

    /// Postgres database port [default: 5432]
    #[arg(short = 'o', long)]
    pub postgres_port: Option<u16>,

    /// Postgres database name [default: postgres]
    #[arg(short = 'b', long)]
    pub postgres_database: Option<String>,

    /// Postgres database user
    #[arg(short = 'u', long)]
    pub postgres_user: Option<String>,

    /// Postgres database password
    #[arg(short = 'p', long)]
    pub postgres_password: Option<String>,

    /// Postgres database SSL mode; "true" means require [default: disable]
    #[arg(short = 'l', long)]
    pub postgres_ssl_mode: Option<String>,

    /// Mongo database host [default: mongodb.<namespace>.svc.cluster.local]
    #[arg(short = 'm', long)]
    pub mongo_host: Option<String>,

    /// Mongo database port [default: 27017]
    #[arg(short = 'r', long)]
    pub mongo_port: Option<u16>,

    /// Mongo database name
    #[arg(short = 'g', long)]
    pub mongo_database: Option<String>,

    /// Mongo database user
    #[arg(short = 'e', long)]
    pub mongo_user: Option<String>,

    /// Mongo database password
    #[arg(short = 'd', long)]
    pub mongo_password: Option<String>,

    /// Seconds to wait before retrying a failed stage [default: 5]
    #[arg(long, value_name = "SECS")]
    pub retry_delay_secs: Option<u64>,

    /// Namespace the database hosts live in
    #[arg(short = 'n', long, env = "POD_NAMESPACE")]
    pub namespace: Option<String>,

    /// Configuration file (YAML, JSON or TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write Prometheus metrics to this file once ready
    #[arg(long, value_name = "FILE")]
    pub metrics_file: Option<PathBuf>,
}
