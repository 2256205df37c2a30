// src/metrics/collector.rs
use crate::health::CheckOutcome;
use anyhow::{Context, Result};
use prometheus::{Encoder, GaugeVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }

    /// Write the text exposition to `path` for a node-exporter textfile
    /// collector. The file is replaced atomically.
    pub async fn write_textfile(&self, path: &Path) -> Result<()> {
        let staging = path.with_extension("prom.tmp");
        tokio::fs::write(&staging, self.gather()?)
            .await
            .with_context(|| format!("Failed to write metrics to {}", staging.display()))?;
        tokio::fs::rename(&staging, path)
            .await
            .with_context(|| format!("Failed to move metrics into {}", path.display()))?;
        Ok(())
    }
}

pub struct MetricsCollector {
    pub stage_attempts_total: IntCounterVec,
    pub stage_failures_total: IntCounterVec,
    pub stage_skipped: IntGaugeVec,
    pub stage_duration_seconds: GaugeVec,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let stage_attempts_total = IntCounterVec::new(
            Opts::new(
                "readiness_stage_attempts_total",
                "Readiness check attempts per stage",
            ),
            &["stage"],
        )?;
        registry.register(Box::new(stage_attempts_total.clone()))?;

        let stage_failures_total = IntCounterVec::new(
            Opts::new(
                "readiness_stage_failures_total",
                "Failed readiness check attempts per stage",
            ),
            &["stage"],
        )?;
        registry.register(Box::new(stage_failures_total.clone()))?;

        let stage_skipped = IntGaugeVec::new(
            Opts::new(
                "readiness_stage_skipped",
                "Stage skipped because it is not configured (1=skipped, 0=checked)",
            ),
            &["stage"],
        )?;
        registry.register(Box::new(stage_skipped.clone()))?;

        let stage_duration_seconds = GaugeVec::new(
            Opts::new(
                "readiness_stage_duration_seconds",
                "Time until the stage became ready",
            ),
            &["stage"],
        )?;
        registry.register(Box::new(stage_duration_seconds.clone()))?;

        Ok(Self {
            stage_attempts_total,
            stage_failures_total,
            stage_skipped,
            stage_duration_seconds,
        })
    }

    pub fn record_attempt(&self, stage: &str) {
        self.stage_attempts_total.with_label_values(&[stage]).inc();
    }

    pub fn record_failure(&self, stage: &str) {
        self.stage_failures_total.with_label_values(&[stage]).inc();
    }

    pub fn record_ready(&self, stage: &str, outcome: CheckOutcome, elapsed: Duration) {
        let skipped = if outcome == CheckOutcome::Skipped { 1 } else { 0 };
        self.stage_skipped.with_label_values(&[stage]).set(skipped);
        self.stage_duration_seconds
            .with_label_values(&[stage])
            .set(elapsed.as_secs_f64());
    }
}
