//! Execution outcomes and error taxonomy

use crate::route::{AssetId, Identity, RouteError, VenueId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one submitted route. Never partially applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionResult {
    /// Route settled; custody grew by the realised profit
    Success(TradeReceipt),
    /// Route reverted; custody and threshold are unchanged
    Reverted(RevertReason),
}

impl ExecutionResult {
    /// Whether the route settled
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success(_))
    }

    /// Receipt of a settled route
    pub fn receipt(&self) -> Option<&TradeReceipt> {
        match self {
            ExecutionResult::Success(receipt) => Some(receipt),
            ExecutionResult::Reverted(_) => None,
        }
    }

    /// Realised profit of a settled route
    pub fn realized_profit(&self) -> Option<u128> {
        self.receipt().map(|receipt| receipt.realized_profit)
    }

    /// Gas cost of a settled route
    pub fn gas_cost(&self) -> Option<u128> {
        self.receipt().map(|receipt| receipt.gas_cost)
    }

    /// Reason of a reverted route
    pub fn revert_reason(&self) -> Option<&RevertReason> {
        match self {
            ExecutionResult::Success(_) => None,
            ExecutionResult::Reverted(reason) => Some(reason),
        }
    }
}

/// Per-leg fill as executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegFill {
    /// Venue that filled the leg
    pub venue: VenueId,
    /// Asset sold
    pub asset_in: AssetId,
    /// Asset bought
    pub asset_out: AssetId,
    /// Amount sold
    pub amount_in: u128,
    /// Amount received
    pub amount_out: u128,
    /// Oracle quote fetched immediately before the swap
    pub oracle_quote: u128,
}

/// Receipt of a settled execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReceipt {
    /// Execution identifier
    pub execution_id: Uuid,
    /// Identity that submitted the route
    pub submitter: Identity,
    /// Stable amount drawn from custody by the first leg
    pub principal: u128,
    /// Stable amount returned by the last leg
    pub final_output: u128,
    /// `final_output - principal`
    pub realized_profit: u128,
    /// Floor of `realized_profit * 10_000 / principal`
    pub realized_bps: u128,
    /// Gas units charged to the submitter
    pub gas_used: u64,
    /// Gas cost in stable base units, paid by the submitter
    pub gas_cost: u128,
    /// Custody balance after settlement
    pub custody_after: u128,
    /// Fills in leg order
    pub legs: Vec<LegFill>,
    /// Settlement time
    pub settled_at: DateTime<Utc>,
}

impl TradeReceipt {
    /// Realised profit net of gas; negative when gas exceeded the profit
    pub fn net_profit(&self) -> i128 {
        self.realized_profit as i128 - self.gas_cost as i128
    }
}

/// Why an execution attempt reverted
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevertReason {
    /// Route failed structural validation before any state change
    #[error("invalid route: {0}")]
    InvalidRoute(RouteError),

    /// A leg delivered less than its declared minimum
    #[error("leg {leg} delivered {actual_amount_out}, minimum {min_amount_out}")]
    SlippageExceeded {
        /// Leg index
        leg: usize,
        /// Declared minimum output
        min_amount_out: u128,
        /// Amount actually delivered
        actual_amount_out: u128,
    },

    /// Fresh oracle quote fell too far below the leg's declared minimum
    #[error("leg {leg} oracle quote {oracle_quote} deviates {deviation_bps} bps from {min_amount_out} (tolerance {tolerance_bps} bps)")]
    PriceDeviation {
        /// Leg index
        leg: usize,
        /// Declared minimum output
        min_amount_out: u128,
        /// Fresh oracle quote
        oracle_quote: u128,
        /// Shortfall in basis points, rounded up
        deviation_bps: u32,
        /// Configured tolerance
        tolerance_bps: u32,
    },

    /// Oracle returned no usable quote
    #[error("leg {leg} oracle unavailable: {message}")]
    OracleUnavailable {
        /// Leg index
        leg: usize,
        /// Oracle error
        message: String,
    },

    /// Venue call failed or reported an inconsistent fill
    #[error("leg {leg} venue {venue} failed: {message}")]
    VenueFailure {
        /// Leg index
        leg: usize,
        /// Venue identifier
        venue: VenueId,
        /// Venue error
        message: String,
    },

    /// Round trip profit below the configured threshold
    #[error("profit {profit} ({realized_bps} bps) below threshold {threshold_bps} bps")]
    ProfitBelowThreshold {
        /// `final_output - principal`, possibly negative
        profit: i128,
        /// Realised ratio in basis points, truncated toward zero
        realized_bps: i128,
        /// Threshold in force
        threshold_bps: u32,
    },

    /// Custody cannot fund the first leg
    #[error("insufficient custody: required {required}, available {available}")]
    InsufficientBalance {
        /// Principal required
        required: u128,
        /// Custody available
        available: u128,
    },

    /// Ledger refused to apply the settlement
    #[error("settlement failed: {0}")]
    Settlement(String),

    /// Submitted while another route was in flight on the engine
    #[error("reentrant call rejected: execution in progress")]
    Reentrancy,
}

impl RevertReason {
    /// Stable machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            RevertReason::InvalidRoute(_) => "INPUT_VALIDATION",
            RevertReason::SlippageExceeded { .. } => "SLIPPAGE_EXCEEDED",
            RevertReason::PriceDeviation { .. } => "PRICE_DEVIATION",
            RevertReason::OracleUnavailable { .. } => "ORACLE_UNAVAILABLE",
            RevertReason::VenueFailure { .. } => "VENUE_FAILURE",
            RevertReason::ProfitBelowThreshold { .. } => "PROFIT_BELOW_THRESHOLD",
            RevertReason::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            RevertReason::Settlement(_) => "SETTLEMENT_FAILURE",
            RevertReason::Reentrancy => "REENTRANCY",
        }
    }
}

impl From<RouteError> for RevertReason {
    fn from(error: RouteError) -> Self {
        RevertReason::InvalidRoute(error)
    }
}

/// Errors from administrative operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Caller is not the configured owner
    #[error("unauthorized caller: {caller}")]
    Unauthorized {
        /// Rejected identity
        caller: Identity,
    },

    /// Threshold outside 0..=10_000 bps
    #[error("invalid threshold: {0} bps")]
    InvalidThreshold(u32),

    /// Zero amount
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// Empty identity
    #[error("identity cannot be empty")]
    InvalidIdentity,

    /// Withdrawal larger than custody
    #[error("insufficient custody: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Amount requested
        requested: u128,
        /// Custody available
        available: u128,
    },

    /// Ledger refused the operation
    #[error("ledger error: {0}")]
    Ledger(String),

    /// Administrative call made while a route was in flight
    #[error("reentrant call rejected: execution in progress")]
    Reentrancy,
}
