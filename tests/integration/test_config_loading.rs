//! Integration tests for the shipped configuration and demo route

use crate::TestUtils;
use arbitrage_executor::{route::Route, ArbitrageExecutor, ExecutorConfig};
use std::path::PathBuf;

fn repo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

#[test]
fn test_shipped_config_is_valid() {
    let config = ExecutorConfig::from_file(repo_path("config/executor.toml")).unwrap();
    config.validate().unwrap();

    assert_eq!(config.deployment.min_profit_bps, 50);
    assert_eq!(config.deployment.owner, TestUtils::owner());
    assert_eq!(config.venues.len(), 2);
}

#[tokio::test]
async fn test_demo_route_settles_on_shipped_venues() {
    let config = ExecutorConfig::from_file(repo_path("config/executor.toml")).unwrap();
    let content = std::fs::read_to_string(repo_path("demos/routes/round_trip.json")).unwrap();
    let route: Route = serde_json::from_str(&content).unwrap();

    let (engine, _book) = ArbitrageExecutor::simulated(&config).unwrap();
    let before = engine.custody_balance().await;
    let result = engine.submit_route(&TestUtils::submitter(), &route).await;

    let receipt = result.receipt().unwrap_or_else(|| panic!("{:?}", result));
    assert!(receipt.realized_bps >= 50);
    assert_eq!(engine.custody_balance().await, before + receipt.realized_profit);
    assert_eq!(receipt.gas_cost, engine.estimate_gas_cost(2).gas_cost);
}
