//! Execution phases and engine statistics

use crate::route::{AssetId, Identity, VenueId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Lifecycle of one execution attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionPhase {
    /// Route accepted, no leg started
    Pending,
    /// Leg `leg` is running
    LegsInProgress {
        /// Index of the running leg
        leg: usize,
    },
    /// Final output cleared the profit threshold
    ProfitChecked,
    /// Ledger committed
    Settled,
    /// Attempt abandoned; no state was changed
    Reverted,
}

impl ExecutionPhase {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionPhase::Settled | ExecutionPhase::Reverted)
    }

    /// Whether `next` is a legal successor of this phase
    pub fn can_advance_to(&self, next: ExecutionPhase) -> bool {
        use ExecutionPhase::*;
        match (*self, next) {
            (Pending, LegsInProgress { leg: 0 }) => true,
            (LegsInProgress { leg }, LegsInProgress { leg: next_leg }) => next_leg == leg + 1,
            (LegsInProgress { .. }, ProfitChecked) => true,
            (ProfitChecked, Settled) => true,
            (Pending | LegsInProgress { .. } | ProfitChecked, Reverted) => true,
            _ => false,
        }
    }

    /// Move to `next`, rejecting illegal transitions
    pub fn advance(&mut self, next: ExecutionPhase) -> std::result::Result<(), PhaseError> {
        if !self.can_advance_to(next) {
            return Err(PhaseError { from: *self, to: next });
        }
        *self = next;
        Ok(())
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionPhase::Pending => write!(f, "pending"),
            ExecutionPhase::LegsInProgress { leg } => write!(f, "leg {}", leg),
            ExecutionPhase::ProfitChecked => write!(f, "profit-checked"),
            ExecutionPhase::Settled => write!(f, "settled"),
            ExecutionPhase::Reverted => write!(f, "reverted"),
        }
    }
}

/// Illegal phase transition
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("illegal phase transition from {from} to {to}")]
pub struct PhaseError {
    /// Phase before the attempted transition
    pub from: ExecutionPhase,
    /// Rejected target phase
    pub to: ExecutionPhase,
}

/// Execution statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionStatistics {
    /// Routes submitted
    pub total_attempts: u64,
    /// Routes settled
    pub settled: u64,
    /// Routes reverted
    pub reverted: u64,
    /// Reverts keyed by reason code
    pub reverts_by_reason: BTreeMap<String, u64>,
    /// Sum of realised profit over settled routes
    pub total_realized_profit: u128,
    /// Sum of gas cost over settled routes
    pub total_gas_cost: u128,
    /// Average attempt latency
    pub avg_execution_time_ms: f64,
    /// Last settlement timestamp
    pub last_execution: Option<i64>,
}

impl ExecutionStatistics {
    /// Record a settled attempt
    pub fn record_settlement(&mut self, realized_profit: u128, gas_cost: u128, elapsed: Duration) {
        self.record_attempt(elapsed);
        self.settled += 1;
        self.total_realized_profit = self.total_realized_profit.saturating_add(realized_profit);
        self.total_gas_cost = self.total_gas_cost.saturating_add(gas_cost);
        self.last_execution = Some(chrono::Utc::now().timestamp());
    }

    /// Record a reverted attempt
    pub fn record_revert(&mut self, code: &str, elapsed: Duration) {
        self.record_attempt(elapsed);
        self.reverted += 1;
        *self.reverts_by_reason.entry(code.to_string()).or_insert(0) += 1;
    }

    /// Settled share of all attempts, in percent
    pub fn success_rate(&self) -> f64 {
        if self.total_attempts == 0 {
            return 0.0;
        }
        self.settled as f64 / self.total_attempts as f64 * 100.0
    }

    fn record_attempt(&mut self, elapsed: Duration) {
        self.total_attempts += 1;
        let total_time = self.avg_execution_time_ms * (self.total_attempts - 1) as f64
            + elapsed.as_secs_f64() * 1_000.0;
        self.avg_execution_time_ms = total_time / self.total_attempts as f64;
    }
}

/// Gas estimate for a route of a given length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasEstimate {
    /// Number of legs
    pub legs: usize,
    /// Gas units
    pub gas_used: u64,
    /// Stable base units per gas unit
    pub gas_price: u64,
    /// Total cost in stable base units
    pub gas_cost: u128,
}

/// Snapshot of engine state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Engine instance identifier
    pub instance_id: Uuid,
    /// Administrative identity
    pub owner: Identity,
    /// Stable settlement asset
    pub stable_asset: AssetId,
    /// Threshold in force
    pub min_profit_bps: u32,
    /// Committed custody balance
    pub custody_balance: u128,
    /// Whether an execution is in flight
    pub executing: bool,
    /// Registered venues
    pub venues: Vec<VenueId>,
    /// Trades settled since deployment
    pub trades_recorded: u64,
    /// Execution statistics
    pub statistics: ExecutionStatistics,
}
