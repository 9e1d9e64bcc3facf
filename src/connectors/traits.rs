//! Venue and oracle traits and common types

use crate::route::{AssetId, VenueId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Swap request sent to a venue for one leg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    /// Execution this swap belongs to
    pub execution_id: uuid::Uuid,
    /// Leg index within the route
    pub leg_index: usize,
    /// Asset sold
    pub asset_in: AssetId,
    /// Asset bought
    pub asset_out: AssetId,
    /// Exact amount sold
    pub amount_in: u128,
    /// Minimum acceptable output
    pub min_amount_out: u128,
}

/// Fill reported by a venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapFill {
    /// Amount the venue consumed
    pub amount_in: u128,
    /// Amount the venue delivered
    pub amount_out: u128,
}

/// Venue-side failures
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VenueError {
    /// The venue does not trade this pair
    #[error("unsupported pair {asset_in} -> {asset_out}")]
    UnsupportedPair {
        /// Asset sold
        asset_in: AssetId,
        /// Asset bought
        asset_out: AssetId,
    },

    /// The venue refused the swap
    #[error("swap rejected: {0}")]
    Rejected(String),

    /// Arithmetic overflow while pricing the swap
    #[error("amount overflow")]
    Overflow,
}

/// Oracle-side failures
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// No quote available for the pair on this venue
    #[error("no quote for {asset_in} -> {asset_out} on {venue}")]
    NoQuote {
        /// Venue identifier
        venue: VenueId,
        /// Asset sold
        asset_in: AssetId,
        /// Asset bought
        asset_out: AssetId,
    },

    /// Oracle could not be reached
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}

/// A trading venue able to execute one leg of a route
#[async_trait]
pub trait Venue: Send + Sync {
    /// Venue identifier
    fn id(&self) -> &VenueId;

    /// Execute a swap and report what was actually exchanged
    async fn swap(&self, request: &SwapRequest) -> std::result::Result<SwapFill, VenueError>;
}

/// Untrusted source of execution-time quotes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Expected output for selling `amount_in` of `asset_in` for `asset_out` on `venue`
    async fn quote(
        &self,
        venue: &VenueId,
        asset_in: &AssetId,
        asset_out: &AssetId,
        amount_in: u128,
    ) -> std::result::Result<u128, OracleError>;
}
