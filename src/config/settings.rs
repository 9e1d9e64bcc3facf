//! Settings validation and defaults

use crate::{ArbitrageError, Result};
use std::net::SocketAddr;

/// Basis-point scale: 10_000 bps = 100%
pub const BPS_SCALE: u32 = 10_000;

/// Configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a `0x`-prefixed 20-byte hex address
    pub fn validate_address(value: &str, name: &str) -> Result<()> {
        let digits = value.strip_prefix("0x").ok_or_else(|| {
            ArbitrageError::Config(format!("{} must start with 0x", name))
        })?;

        if digits.len() != 40 {
            return Err(ArbitrageError::Config(
                format!("{} must be 20 bytes (40 hex characters)", name)
            ).into());
        }

        hex::decode(digits)
            .map_err(|e| ArbitrageError::Config(format!("{} is not valid hex: {}", name, e)))?;

        Ok(())
    }

    /// Validate a basis-point value (0 to 10_000)
    pub fn validate_bps(value: u32, name: &str) -> Result<()> {
        if value > BPS_SCALE {
            return Err(ArbitrageError::Config(
                format!("{} must be between 0 and {} bps", name, BPS_SCALE)
            ).into());
        }
        Ok(())
    }

    /// Validate a probability value (0.0 to 1.0)
    pub fn validate_probability(value: f64, name: &str) -> Result<()> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ArbitrageError::Config(
                format!("{} must be between 0.0 and 1.0", name)
            ).into());
        }
        Ok(())
    }

    /// Validate a strictly positive integer
    pub fn validate_positive(value: u64, name: &str) -> Result<()> {
        if value == 0 {
            return Err(ArbitrageError::Config(
                format!("{} must be positive", name)
            ).into());
        }
        Ok(())
    }

    /// Validate a `host:port` socket address
    pub fn validate_socket_addr(value: &str, name: &str) -> Result<()> {
        value.parse::<SocketAddr>()
            .map_err(|e| ArbitrageError::Config(format!("{} is invalid: {}", name, e)))?;
        Ok(())
    }
}

/// Configuration defaults
pub struct ConfigDefaults;

impl ConfigDefaults {
    /// Default stable settlement asset (USDC on the deployment chain)
    pub const STABLE_ASSET: &'static str = "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238";

    /// Default intermediate asset used by the sample venues
    pub const WRAPPED_ETHER: &'static str = "0x4200000000000000000000000000000000000006";

    /// Default stable asset decimals
    pub const STABLE_DECIMALS: u32 = 6;

    /// Default administrative identity
    pub const OWNER: &'static str = "0x90F79bf6EB2c4f870365E785982E1f101E93b906";

    /// Default minimum profit threshold in basis points (0.50%)
    pub const MIN_PROFIT_BPS: u32 = 50;

    /// Default custody at deployment (1,000 USDC)
    pub const INITIAL_CUSTODY: u64 = 1_000_000_000;

    /// Default oracle deviation tolerance in basis points
    pub const SLIPPAGE_TOLERANCE_BPS: u32 = 50;

    /// Default fixed gas per execution
    pub const BASE_GAS: u64 = 21_000;

    /// Default gas per leg
    pub const GAS_PER_LEG: u64 = 50_000;

    /// Default gas price in stable base units
    pub const GAS_PRICE: u64 = 1;

    /// Default ceiling on the gas price
    pub const MAX_GAS_PRICE: u64 = 100;

    /// Default Prometheus listen address
    pub const METRICS_LISTEN_ADDR: &'static str = "127.0.0.1:9000";

    /// Default HTTP API listen address
    pub const SERVER_LISTEN_ADDR: &'static str = "127.0.0.1:8080";
}
