// src/main.rs
use anyhow::Result;
use clap::Parser;
use readiness_init::{cli::Cli, config, metrics::MetricsRegistry, readiness::Orchestrator};
use tokio::signal;
use tracing::{info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("readiness_init=info,sqlx=warn,mongodb=warn")),
        )
        .init();

    // Load configuration
    let config = config::load_config(&cli)?;
    info!(namespace = %config.namespace, "starting readiness checks");

    let metrics_registry = MetricsRegistry::new()?;
    let orchestrator =
        Orchestrator::from_config(&config).with_metrics(metrics_registry.collector());

    let span = info_span!("readiness", run_id = %Uuid::new_v4());
    tokio::select! {
        result = orchestrator.run().instrument(span) => {
            let report = result?;
            for stage in &report.stages {
                info!(
                    stage = stage.stage,
                    outcome = ?stage.outcome,
                    attempts = stage.attempts,
                    elapsed = ?stage.elapsed,
                    "stage ready"
                );
            }
        }
        _ = shutdown_signal() => {
            anyhow::bail!("shutdown signal received before dependencies were ready");
        }
    }

    if let Some(path) = &config.metrics.file {
        metrics_registry.write_textfile(path).await?;
        info!(path = %path.display(), "metrics written");
    }

    info!("all dependencies are ready");
    Ok(())
}

// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
