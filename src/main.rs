use arbitrage_executor::{
    api,
    config::{ConfigValidator, ExecutorConfig},
    engine::ArbitrageExecutor,
    route::{Identity, Route},
    utils::{format_ratio_bps, format_units, logger, metrics},
    ArbitrageError, ExecutionResult, Result,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "arbitrage-executor")]
#[command(about = "Atomic multi-venue arbitrage executor")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/executor.toml")]
    config: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log file path
    #[arg(long, default_value = "logs/executor.log")]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a route against the simulated venues
    Execute {
        /// Route file (JSON)
        #[arg(short, long)]
        route: PathBuf,

        /// Submitter identity
        #[arg(long, default_value = "0x0000000000000000000000000000000000000001")]
        caller: String,
    },
    /// Validate configuration
    Validate,
    /// Show engine status
    Status,
    /// Estimate gas cost for a route length
    Estimate {
        /// Number of legs
        #[arg(long, default_value_t = 2)]
        legs: usize,
    },
    /// Serve the HTTP API over the simulated venues
    Serve {
        /// Listen address, overriding `server.listen_addr`
        #[arg(long)]
        listen: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    logger::init(&cli.log_level, &cli.log_file)?;

    info!("Starting Arbitrage Executor v{}", arbitrage_executor::VERSION);

    let config = ExecutorConfig::from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config.display());

    match cli.command {
        Commands::Execute { route, caller } => execute_route(config, &route, Identity::new(caller)).await,
        Commands::Validate => validate_config(config),
        Commands::Status => show_status(config).await,
        Commands::Estimate { legs } => estimate_gas(config, legs),
        Commands::Serve { listen } => serve(config, listen).await,
    }
}

fn load_route(path: &Path) -> Result<Route> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ArbitrageError::DataParsing(format!("Failed to read route {}: {}", path.display(), e)))?;
    let route = serde_json::from_str(&content)
        .map_err(|e| ArbitrageError::DataParsing(format!("Failed to parse route {}: {}", path.display(), e)))?;
    Ok(route)
}

async fn execute_route(config: ExecutorConfig, route_path: &Path, caller: Identity) -> Result<()> {
    if config.monitoring.enable_metrics {
        metrics::install_exporter(&config.monitoring.metrics_listen_addr)?;
    }

    let route = load_route(route_path)?;
    let (engine, _book) = ArbitrageExecutor::simulated(&config)?;
    let decimals = config.deployment.stable_decimals;

    info!("Submitting {}-leg route from {}", route.len(), route_path.display());
    let result = engine.submit_route(&caller, &route).await;

    match &result {
        ExecutionResult::Success(receipt) => {
            info!("✅ Route settled");
            println!("Route settled:");
            println!("  Profit: {} ({})", format_units(receipt.realized_profit, decimals), format_ratio_bps(receipt.realized_bps));
            println!("  Gas cost: {}", format_units(receipt.gas_cost, decimals));
            println!("  Custody: {}", format_units(receipt.custody_after, decimals));
        }
        ExecutionResult::Reverted(reason) => {
            error!("❌ Route reverted: {}", reason);
            println!("Route reverted [{}]: {}", reason.code(), reason);
        }
    }
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

fn validate_config(config: ExecutorConfig) -> Result<()> {
    info!("Validating configuration...");

    match config.validate() {
        Ok(_) => {
            info!("✅ Configuration is valid");
            println!("Configuration validation passed!");
        }
        Err(e) => {
            error!("❌ Configuration validation failed: {}", e);
            return Err(e);
        }
    }

    Ok(())
}

async fn show_status(config: ExecutorConfig) -> Result<()> {
    info!("Checking engine status...");

    let (engine, _book) = ArbitrageExecutor::simulated(&config)?;
    let status = engine.status().await;
    let decimals = config.deployment.stable_decimals;

    println!("Engine Status:");
    println!("  Version: {}", arbitrage_executor::VERSION);
    println!("  Owner: {}", status.owner);
    println!("  Stable asset: {}", status.stable_asset);
    println!("  Threshold: {} bps", status.min_profit_bps);
    println!("  Custody: {}", format_units(status.custody_balance, decimals));
    println!(
        "  Venues: {}",
        status.venues.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
    );

    Ok(())
}

fn estimate_gas(config: ExecutorConfig, legs: usize) -> Result<()> {
    let (engine, _book) = ArbitrageExecutor::simulated(&config)?;
    let estimate = engine.estimate_gas_cost(legs);

    println!("Gas estimate for {} legs:", estimate.legs);
    println!("  Gas: {}", estimate.gas_used);
    println!("  Price: {} base units/gas", estimate.gas_price);
    println!("  Cost: {}", format_units(estimate.gas_cost, config.deployment.stable_decimals));

    Ok(())
}

async fn serve(mut config: ExecutorConfig, listen: Option<String>) -> Result<()> {
    if let Some(listen_addr) = listen {
        ConfigValidator::validate_socket_addr(&listen_addr, "Listen address")?;
        config.server.listen_addr = listen_addr;
    }
    if config.monitoring.enable_metrics {
        metrics::install_exporter(&config.monitoring.metrics_listen_addr)?;
    }

    let (engine, _book) = ArbitrageExecutor::simulated(&config)?;
    info!(
        venues = engine.venues().len(),
        min_profit_bps = config.deployment.min_profit_bps,
        "Engine ready"
    );
    api::serve(Arc::new(engine), &config.server).await
}
