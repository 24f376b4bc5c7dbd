//! Command Line Flow Integration Test
//!
//! Drives the runner from parsed arguments to rendered output against
//! paper targets:
//! - Credential detection from a config file fixture
//! - Trade, dry run, holdings and health requests
//! - Text and JSON output

use clap::Parser;
use shotgun_core::Target;
use shotgun_dispatch::{EngineConfig, RetryConfig};
use shotgun_gateway::{AdapterRegistry, PaperAdapter};
use shotgun_ports::AdapterError;
use shotgun_runner::{App, Cli, OutputFormat, Request, RunError, ShotgunConfig, run, select_targets};
use std::collections::HashMap;
use std::sync::Arc;

const TARGETS: &str = r#"{
    "targets": [
        { "name": "Tradier", "rate_limit": { "requests": 50, "interval_ms": 1000 },
          "credential_env": ["TRADIER_ACCESS_TOKEN"] },
        { "name": "Public", "rate_limit": { "requests": 50, "interval_ms": 1000 },
          "credential_env": ["PUBLIC_API_SECRET"] },
        { "name": "Webull", "enabled": false }
    ],
    "engine": { "batch_timeout_ms": 10000, "retry": { "initial_backoff_ms": 10 } }
}"#;

fn targets() -> Vec<Target> {
    let env: HashMap<&str, &str> = [("TRADIER_ACCESS_TOKEN", "token")].into_iter().collect();
    ShotgunConfig::from_json(TARGETS)
        .unwrap()
        .resolve_targets_with(|var| env.get(var).map(|v| v.to_string()))
        .unwrap()
}

fn engine_config() -> EngineConfig {
    ShotgunConfig::from_json(TARGETS).unwrap().engine
}

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("shotgun").chain(args.iter().copied())).unwrap()
}

fn request(args: &[&str]) -> (Request, bool, OutputFormat) {
    let cli = parse(args);
    (cli.request().unwrap(), cli.dry_run, cli.output)
}

#[tokio::test]
async fn test_buy_reports_every_enabled_target() {
    let _ = env_logger::try_init();
    let app = App::paper(targets(), engine_config()).unwrap();
    let (req, dry_run, output) = request(&["buy", "10", "TSLA"]);

    let text = app.handle(req, dry_run, output).await.unwrap();
    let lines: Vec<&str> = text.lines().collect();

    // Webull is disabled and left out entirely
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "SUCCESS Tradier: Bought 10 TSLA @ 100 on 1 account(s)");
    assert_eq!(lines[1], "SKIPPED Public: credentials not configured");
    assert!(lines[2].starts_with("Summary: 1 succeeded, 0 failed, 1 skipped"));
}

#[tokio::test]
async fn test_dry_run_sends_nothing() {
    let app = App::paper(targets(), engine_config()).unwrap();
    let (req, dry_run, output) = request(&["sell", "3", "AAPL", "180", "--dry-run"]);

    let text = app.handle(req, dry_run, output).await.unwrap();
    assert!(text.contains("DRY-RUN Tradier: would dispatch SELL 3 AAPL @ 180"));
    assert!(text.contains("DRY-RUN Public: would skip (no credentials)"));
    assert!(!text.contains("Webull"));
    assert!(app.engine().sessions().active_targets().is_empty());
}

#[tokio::test]
async fn test_every_target_failing_still_produces_report() {
    let targets = targets();
    let adapters = AdapterRegistry::new()
        .with(Arc::new(
            PaperAdapter::new("Tradier")
                .always_fail(AdapterError::AuthenticationRejected("expired token".into())),
        ))
        .unwrap()
        .with(Arc::new(PaperAdapter::new("Public")))
        .unwrap()
        .with(Arc::new(PaperAdapter::new("Webull")))
        .unwrap();
    let app = App::with_adapters(
        targets,
        adapters,
        EngineConfig::default().with_retry(RetryConfig::no_retry()),
    );
    let (req, dry_run, _) = request(&["buy", "1", "SPY"]);

    let json = app.handle(req, dry_run, OutputFormat::Json).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["summary"]["failed"], 1);
    assert_eq!(value["summary"]["succeeded"], 0);
    assert_eq!(value["report"]["outcomes"][0]["status"], "Failure");
}

#[tokio::test]
async fn test_holdings_and_health() {
    let app = App::paper(targets(), engine_config()).unwrap();

    let (req, dry_run, output) = request(&["holdings"]);
    let text = app.handle(req, dry_run, output).await.unwrap();
    assert!(text.starts_with("SUCCESS Tradier: 0 position(s) across 1 account(s)"));

    let (req, dry_run, output) = request(&["health"]);
    let text = app.handle(req, dry_run, output).await.unwrap();
    assert!(text.contains("ACTIVE Tradier: 1 account(s)"));
    assert!(text.contains("ABSENT Public"));
    assert!(text.ends_with("Summary: 1 of 2 session(s) active"));

    app.close();
    assert!(app.engine().sessions().active_targets().is_empty());
}

#[tokio::test]
async fn test_target_selection() {
    let selected = select_targets(targets(), &["webull".to_string()]).unwrap();
    let app = App::paper(selected, engine_config()).unwrap();
    let (req, dry_run, output) = request(&["buy", "2", "F"]);

    let text = app.handle(req, dry_run, output).await.unwrap();
    assert!(text.starts_with("SUCCESS Webull: Bought 2 F"));
    assert_eq!(text.lines().count(), 2);
}

#[tokio::test]
async fn test_paper_accounts_need_explicit_flag() {
    let err = run(&parse(&["buy", "10", "TSLA"])).await.unwrap_err();
    assert!(matches!(&err, RunError::Usage(msg) if msg.contains("--paper")));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_unreadable_batch_file_exits_as_usage() {
    let err = run(&parse(&["--paper", "--from-file", "/nonexistent/orders.json"]))
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Usage(_)));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_health_reconnect_logs_in_again() {
    let tradier = Arc::new(PaperAdapter::new("Tradier"));
    let adapters = AdapterRegistry::new()
        .with(tradier.clone())
        .unwrap()
        .with(Arc::new(PaperAdapter::new("Public")))
        .unwrap();
    let app = App::with_adapters(targets(), adapters, engine_config());

    let (req, dry_run, output) = request(&["holdings"]);
    app.handle(req, dry_run, output).await.unwrap();
    assert_eq!(app.engine().cache().len(), 1);

    let (req, dry_run, output) = request(&["health", "--reconnect"]);
    let text = app.handle(req, dry_run, output).await.unwrap();
    assert!(text.contains("ACTIVE Tradier"));
    assert_eq!(tradier.connect_calls(), 2);
    assert!(app.engine().cache().is_empty());
}
