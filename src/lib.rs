//! Arbitrage Executor
//!
//! An engine that receives a proposed multi-venue trade route, re-validates every
//! leg against fresh oracle quotes, checks that the round trip clears a minimum
//! profit threshold in the stable settlement asset, and settles it atomically or
//! reverts without touching custody.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod connectors;
pub mod engine;
pub mod route;
pub mod settlement;
pub mod utils;

// Re-export commonly used types
pub use config::ExecutorConfig;
pub use connectors::{PriceOracle, Venue, VenueRegistry};
pub use engine::{ArbitrageExecutor, EngineError, ExecutionResult, RevertReason, TradeReceipt};
pub use route::{AssetId, Identity, Leg, Route, VenueId};
pub use settlement::{SettlementLedger, TradeRecord};

/// Result type used throughout the application
pub type Result<T> = anyhow::Result<T>;

/// Infrastructure error types for the executor
#[derive(thiserror::Error, Debug)]
pub enum ArbitrageError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    DataParsing(String),

    /// Venue wiring error
    #[error("Venue error: {0}")]
    Venue(String),

    /// Monitoring setup error
    #[error("Monitoring error: {0}")]
    Monitoring(String),
}

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
