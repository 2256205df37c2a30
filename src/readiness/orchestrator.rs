// src/readiness/orchestrator.rs
use crate::config::Config;
use crate::health::{CheckError, CheckOutcome, HttpCheck, MongoCheck, PostgresCheck, ReadinessCheck};
use crate::metrics::MetricsCollector;
use crate::retry::{RetryPolicy, RetryStrategy};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: &'static str,
    pub outcome: CheckOutcome,
    pub attempts: u32,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct ReadinessReport {
    pub stages: Vec<StageReport>,
}

impl ReadinessReport {
    pub fn skipped(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| s.outcome == CheckOutcome::Skipped)
            .count()
    }
}

/// Only reachable with a bounded retry policy.
#[derive(Debug, thiserror::Error)]
#[error("{stage} readiness check failed after {attempts} attempts: {source}")]
pub struct StageFailed {
    pub stage: &'static str,
    pub attempts: u32,
    #[source]
    pub source: CheckError,
}

/// Runs the stages one after the other, each until it succeeds.
pub struct Orchestrator {
    stages: Vec<Box<dyn ReadinessCheck>>,
    strategy: RetryStrategy,
    metrics: Option<Arc<MetricsCollector>>,
}

impl Orchestrator {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            stages: Vec::new(),
            strategy: RetryStrategy::new(policy),
            metrics: None,
        }
    }

    /// HTTP endpoints first, then PostgreSQL, then MongoDB.
    pub fn from_config(config: &Config) -> Self {
        Self::new(RetryPolicy::from(&config.retry))
            .with_stage(HttpCheck::new(config.http.clone()))
            .with_stage(PostgresCheck::new(config.postgres.clone()))
            .with_stage(MongoCheck::new(config.mongo.clone()))
    }

    pub fn with_stage(mut self, stage: impl ReadinessCheck + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self) -> Result<ReadinessReport, StageFailed> {
        let mut report = ReadinessReport::default();

        for stage in &self.stages {
            report.stages.push(self.run_stage(stage.as_ref()).await?);
        }

        info!(
            stages = report.stages.len(),
            skipped = report.skipped(),
            "all readiness checks passed"
        );
        Ok(report)
    }

    async fn run_stage(&self, stage: &dyn ReadinessCheck) -> Result<StageReport, StageFailed> {
        let name = stage.name();
        let operation = format!("validate {} readiness", name);
        let attempts = AtomicU32::new(0);
        let metrics = self.metrics.as_deref();
        let started = Instant::now();

        let outcome = self
            .strategy
            .execute(&operation, || async {
                attempts.fetch_add(1, Ordering::Relaxed);
                if let Some(metrics) = metrics {
                    metrics.record_attempt(name);
                }

                let result = stage.check().await;
                if let (Err(_), Some(metrics)) = (&result, metrics) {
                    metrics.record_failure(name);
                }
                result
            })
            .await
            .map_err(|e| StageFailed {
                stage: name,
                attempts: e.attempts,
                source: e.last,
            })?;

        let elapsed = started.elapsed();
        if let Some(metrics) = metrics {
            metrics.record_ready(name, outcome, elapsed);
        }

        Ok(StageReport {
            stage: name,
            outcome,
            attempts: attempts.into_inner(),
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fails a fixed number of times, then passes; logs every call.
    struct Scripted {
        name: &'static str,
        failures: u32,
        calls: AtomicU32,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Scripted {
        fn new(name: &'static str, failures: u32, log: &Arc<Mutex<Vec<&'static str>>>) -> Self {
            Self {
                name,
                failures,
                calls: AtomicU32::new(0),
                log: log.clone(),
            }
        }
    }

    #[async_trait]
    impl ReadinessCheck for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn check(&self) -> Result<CheckOutcome, CheckError> {
            self.log.lock().unwrap().push(self.name);
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(CheckError::transport(self.name, "connection refused"))
            } else {
                Ok(CheckOutcome::Passed)
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stages_run_in_order_each_until_success() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let orchestrator = Orchestrator::new(RetryPolicy::forever(Duration::from_secs(5)))
            .with_stage(Scripted::new("http", 0, &log))
            .with_stage(Scripted::new("postgres", 2, &log))
            .with_stage(Scripted::new("mongo", 1, &log));

        let report = orchestrator.run().await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["http", "postgres", "postgres", "postgres", "mongo", "mongo"]
        );
        let attempts: Vec<u32> = report.stages.iter().map(|s| s.attempts).collect();
        assert_eq!(attempts, vec![1, 3, 2]);
        assert_eq!(report.stages[1].elapsed, Duration::from_secs(10));
        assert_eq!(report.skipped(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_policy_reports_the_failing_stage() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let orchestrator = Orchestrator::new(RetryPolicy::bounded(3, Duration::from_secs(1)))
            .with_stage(Scripted::new("http", 0, &log))
            .with_stage(Scripted::new("postgres", u32::MAX, &log))
            .with_stage(Scripted::new("mongo", 0, &log));

        let err = orchestrator.run().await.unwrap_err();

        assert_eq!(err.stage, "postgres");
        assert_eq!(err.attempts, 3);
        assert!(!log.lock().unwrap().contains(&"mongo"));
    }

    #[tokio::test]
    async fn test_metrics_count_attempts_and_failures() {
        let registry = crate::metrics::MetricsRegistry::new().unwrap();
        let metrics = registry.collector();
        let log = Arc::new(Mutex::new(Vec::new()));
        let orchestrator = Orchestrator::new(RetryPolicy::forever(Duration::ZERO))
            .with_stage(Scripted::new("postgres", 2, &log))
            .with_metrics(metrics.clone());

        orchestrator.run().await.unwrap();

        assert_eq!(
            metrics.stage_attempts_total.with_label_values(&["postgres"]).get(),
            3
        );
        assert_eq!(
            metrics.stage_failures_total.with_label_values(&["postgres"]).get(),
            2
        );
        assert_eq!(metrics.stage_skipped.with_label_values(&["postgres"]).get(), 0);
    }
}
