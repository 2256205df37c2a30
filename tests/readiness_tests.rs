// tests/readiness_tests.rs
use readiness_init::cli::Cli;
use readiness_init::config::{load_config_with_env, Config};
use readiness_init::health::CheckOutcome;
use readiness_init::metrics::MetricsRegistry;
use readiness_init::readiness::Orchestrator;
use std::collections::HashMap;
use std::time::Duration;

fn config_from(cli: Cli) -> Config {
    load_config_with_env(&cli, Some(HashMap::new())).unwrap()
}

#[tokio::test]
async fn test_unconfigured_stages_are_all_skipped() {
    let config = config_from(Cli::default());
    let registry = MetricsRegistry::new().unwrap();
    let orchestrator = Orchestrator::from_config(&config).with_metrics(registry.collector());

    assert_eq!(orchestrator.stage_names(), vec!["http", "postgres", "mongo"]);

    let report = tokio::time::timeout(Duration::from_secs(1), orchestrator.run())
        .await
        .expect("skipped stages must not wait")
        .unwrap();

    assert_eq!(report.skipped(), 3);
    for stage in &report.stages {
        assert_eq!(stage.outcome, CheckOutcome::Skipped);
        assert_eq!(stage.attempts, 1);
    }

    let text = String::from_utf8(registry.gather().unwrap()).unwrap();
    for stage in ["http", "postgres", "mongo"] {
        assert!(text.contains(&format!(r#"readiness_stage_skipped{{stage="{}"}} 1"#, stage)));
    }
}

#[tokio::test]
async fn test_http_stage_passes_through_the_orchestrator() {
    let mut server = mockito::Server::new_async().await;
    let ready = server
        .mock("GET", "/api/ready")
        .with_status(503)
        .with_body("warming up")
        .create_async()
        .await;
    let health = server
        .mock("GET", "/health")
        .with_body("ok")
        .create_async()
        .await;

    let config = config_from(Cli {
        http_readiness_check_urls: Some(format!(
            "{url}/api/ready, {url}/health",
            url = server.url()
        )),
        ..Cli::default()
    });

    let report = Orchestrator::from_config(&config).run().await.unwrap();

    assert_eq!(report.stages[0].outcome, CheckOutcome::Passed);
    assert_eq!(report.stages[0].attempts, 1);
    assert_eq!(report.skipped(), 2);
    ready.assert_async().await;
    health.assert_async().await;
}

#[tokio::test]
async fn test_metrics_textfile_is_written() {
    let dir = std::env::temp_dir().join(format!("readiness-init-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("readiness.prom");

    let registry = MetricsRegistry::new().unwrap();
    let config = config_from(Cli::default());
    Orchestrator::from_config(&config)
        .with_metrics(registry.collector())
        .run()
        .await
        .unwrap();
    registry.write_textfile(&path).await.unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("readiness_stage_attempts_total"));
    assert!(!path.with_extension("prom.tmp").exists());

    std::fs::remove_dir_all(&dir).unwrap();
}
