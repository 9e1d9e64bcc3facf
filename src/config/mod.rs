//! Configuration management module

pub mod settings;

pub use settings::*;

use crate::{
    route::{AssetId, Identity, VenueId, DEFAULT_MAX_LEGS},
    settlement::DEFAULT_RECORD_LIMIT,
    ArbitrageError, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Prefix for environment overrides, e.g. `EXECUTOR__DEPLOYMENT__MIN_PROFIT_BPS`
pub const ENV_PREFIX: &str = "EXECUTOR";

/// Main configuration structure for the executor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Deployment-time parameters
    pub deployment: DeploymentConfig,
    /// Execution configuration
    pub execution: ExecutionConfig,
    /// Monitoring configuration
    pub monitoring: MonitoringConfig,
    /// HTTP API
    #[serde(default)]
    pub server: ServerConfig,
    /// Simulated venues available to the engine
    #[serde(default)]
    pub venues: Vec<VenueConfig>,
}

/// Parameters fixed when the engine is deployed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Stable settlement asset contract address
    pub stable_asset: AssetId,
    /// Decimals of the stable asset, used for display only
    pub stable_decimals: u32,
    /// Administrative identity
    pub owner: Identity,
    /// Initial minimum profit threshold in basis points
    pub min_profit_bps: u32,
    /// Stable-asset balance placed in custody at deployment
    pub initial_custody: u64,
}

/// Execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Maximum number of legs per route
    pub max_legs: usize,
    /// Largest accepted shortfall of a fresh oracle quote below a leg's minimum output
    pub slippage_tolerance_bps: u32,
    /// Gas accounting
    pub gas: GasConfig,
}

/// Gas accounting, priced in the stable asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasConfig {
    /// Fixed gas per execution
    pub base_gas: u64,
    /// Additional gas per leg
    pub gas_per_leg: u64,
    /// Stable-asset base units per gas unit
    pub gas_price: u64,
    /// Highest gas price the engine accepts
    #[serde(default = "default_max_gas_price")]
    pub max_gas_price: u64,
}

fn default_max_gas_price() -> u64 {
    ConfigDefaults::MAX_GAS_PRICE
}

/// Monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Enable metrics collection
    pub enable_metrics: bool,
    /// Prometheus exporter listen address
    pub metrics_listen_addr: String,
    /// Enable per-trade logging
    pub enable_trade_logging: bool,
    /// Settled trades kept in memory for history queries
    #[serde(default = "default_trade_history_limit")]
    pub trade_history_limit: usize,
}

fn default_trade_history_limit() -> usize {
    DEFAULT_RECORD_LIMIT
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address for `serve`
    pub listen_addr: String,
    /// Allow cross-origin requests from any origin
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: ConfigDefaults::SERVER_LISTEN_ADDR.to_string(),
            enable_cors: true,
        }
    }
}

/// Simulated venue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    /// Venue identifier referenced by route legs
    pub id: VenueId,
    /// Swap fee in basis points
    pub fee_bps: u32,
    /// Amount the venue under-delivers relative to its quote, in basis points
    #[serde(default)]
    pub shortfall_bps: u32,
    /// Probability that a swap is rejected (0.0 to 1.0)
    #[serde(default)]
    pub rejection_probability: f64,
    /// Tradable pairs
    #[serde(default)]
    pub pairs: Vec<PairConfig>,
}

/// Exchange rate of one directed pair: `out = in * rate_numerator / rate_denominator`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairConfig {
    /// Asset sold
    pub asset_in: AssetId,
    /// Asset bought
    pub asset_out: AssetId,
    /// Rate numerator
    pub rate_numerator: u64,
    /// Rate denominator
    pub rate_denominator: u64,
}

impl ExecutorConfig {
    /// Load configuration from a TOML file, then apply `EXECUTOR__*` environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ArbitrageError::Config(format!(
                "Failed to read config file: {} does not exist",
                path.display()
            ))
            .into());
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ArbitrageError::Config(format!("Failed to load config: {}", e)))?;

        let config: ExecutorConfig = settings
            .try_deserialize()
            .map_err(|e| ArbitrageError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Parse configuration from a TOML string without environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ExecutorConfig = toml::from_str(content)
            .map_err(|e| ArbitrageError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let deployment = &self.deployment;
        ConfigValidator::validate_address(deployment.stable_asset.as_str(), "Stable asset")?;
        ConfigValidator::validate_address(deployment.owner.as_str(), "Owner")?;
        ConfigValidator::validate_bps(deployment.min_profit_bps, "Minimum profit threshold")?;

        if deployment.stable_decimals > 28 {
            return Err(ArbitrageError::Config("Stable decimals must be at most 28".to_string()).into());
        }

        if self.execution.max_legs == 0 {
            return Err(ArbitrageError::Config("Maximum legs must be greater than 0".to_string()).into());
        }
        ConfigValidator::validate_bps(self.execution.slippage_tolerance_bps, "Slippage tolerance")?;

        let gas = &self.execution.gas;
        ConfigValidator::validate_positive(gas.max_gas_price, "Maximum gas price")?;
        if gas.gas_price > gas.max_gas_price {
            return Err(ArbitrageError::Config(format!(
                "Gas price {} exceeds maximum {}",
                gas.gas_price, gas.max_gas_price
            ))
            .into());
        }
        ConfigValidator::validate_socket_addr(&self.server.listen_addr, "Server listen address")?;

        ConfigValidator::validate_positive(self.monitoring.trade_history_limit as u64, "Trade history limit")?;
        if self.monitoring.enable_metrics {
            ConfigValidator::validate_socket_addr(&self.monitoring.metrics_listen_addr, "Metrics listen address")?;
        }

        let mut seen = HashSet::new();
        for venue in &self.venues {
            if venue.id.as_str().is_empty() {
                return Err(ArbitrageError::Config("Venue id cannot be empty".to_string()).into());
            }
            if !seen.insert(venue.id.clone()) {
                return Err(ArbitrageError::Config(format!("Duplicate venue id: {}", venue.id)).into());
            }
            ConfigValidator::validate_bps(venue.fee_bps, "Venue fee")?;
            ConfigValidator::validate_bps(venue.shortfall_bps, "Venue shortfall")?;
            ConfigValidator::validate_probability(venue.rejection_probability, "Venue rejection probability")?;

            for pair in &venue.pairs {
                ConfigValidator::validate_positive(pair.rate_numerator, "Rate numerator")?;
                ConfigValidator::validate_positive(pair.rate_denominator, "Rate denominator")?;
            }
        }

        Ok(())
    }

    /// Serialize the configuration to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self)
            .map_err(|e| ArbitrageError::Config(format!("Failed to serialize config: {}", e)).into())
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        let usdc = AssetId::new(ConfigDefaults::STABLE_ASSET);
        let weth = AssetId::new(ConfigDefaults::WRAPPED_ETHER);

        // 1 USDC (6 decimals) buys 1/3000 WETH (18 decimals) on one venue, sells at 3015 on the other
        let venue = |id: &str, buy_price: u64, sell_price: u64| VenueConfig {
            id: VenueId::new(id),
            fee_bps: 0,
            shortfall_bps: 0,
            rejection_probability: 0.0,
            pairs: vec![
                PairConfig {
                    asset_in: usdc.clone(),
                    asset_out: weth.clone(),
                    rate_numerator: 1_000_000_000_000,
                    rate_denominator: buy_price,
                },
                PairConfig {
                    asset_in: weth.clone(),
                    asset_out: usdc.clone(),
                    rate_numerator: sell_price,
                    rate_denominator: 1_000_000_000_000,
                },
            ],
        };

        Self {
            deployment: DeploymentConfig {
                stable_asset: usdc.clone(),
                stable_decimals: ConfigDefaults::STABLE_DECIMALS,
                owner: Identity::new(ConfigDefaults::OWNER),
                min_profit_bps: ConfigDefaults::MIN_PROFIT_BPS,
                initial_custody: ConfigDefaults::INITIAL_CUSTODY,
            },
            execution: ExecutionConfig {
                max_legs: DEFAULT_MAX_LEGS,
                slippage_tolerance_bps: ConfigDefaults::SLIPPAGE_TOLERANCE_BPS,
                gas: GasConfig {
                    base_gas: ConfigDefaults::BASE_GAS,
                    gas_per_leg: ConfigDefaults::GAS_PER_LEG,
                    gas_price: ConfigDefaults::GAS_PRICE,
                    max_gas_price: ConfigDefaults::MAX_GAS_PRICE,
                },
            },
            monitoring: MonitoringConfig {
                enable_metrics: false,
                metrics_listen_addr: ConfigDefaults::METRICS_LISTEN_ADDR.to_string(),
                enable_trade_logging: true,
                trade_history_limit: DEFAULT_RECORD_LIMIT,
            },
            server: ServerConfig::default(),
            venues: vec![venue("uniswap", 3000, 3000), venue("sushiswap", 3015, 3015)],
        }
    }
}
