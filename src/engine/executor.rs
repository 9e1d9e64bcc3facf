//! Atomic trade executor
//!
//! A route claims the executing flag before it touches any state. While the
//! flag is held every state-changing entry point fails fast with
//! `Reentrancy`, whichever task the call comes from. Every balance movement
//! of an attempt is staged on a private [`LedgerTransaction`] and committed in
//! one step once the last leg has cleared the profit check, so readers only
//! ever see the balance before or after a whole route.
//!
//! [`LedgerTransaction`]: crate::settlement::LedgerTransaction

use super::{
    result::{EngineError, ExecutionResult, LegFill, RevertReason, TradeReceipt},
    state::{EngineStatus, ExecutionPhase, ExecutionStatistics, GasEstimate},
    verifier::ProfitVerifier,
};
use crate::{
    config::{ExecutorConfig, GasConfig, BPS_SCALE},
    connectors::{OracleAdapter, PriceOracle, RateBook, SimulatedOracle, SwapRequest, VenueRegistry},
    route::{AssetId, Identity, Leg, Route, MAX_AMOUNT},
    settlement::{LedgerError, SettlementLedger, TradeRecord},
    utils::{format_units, metrics as telemetry},
    Result,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};
use uuid::Uuid;

/// State that changes only at commit points
struct CommittedState {
    owner: Identity,
    min_profit_bps: u32,
    ledger: SettlementLedger,
}

/// Exclusive claim on the executing flag, released when the attempt ends
struct ExecutingGuard<'a>(&'a AtomicBool);

impl<'a> ExecutingGuard<'a> {
    /// `None` if another route already holds the flag
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ExecutingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Arbitrage execution engine
pub struct ArbitrageExecutor {
    /// Instance identifier
    instance_id: Uuid,
    /// Stable settlement asset
    stable_asset: AssetId,
    /// Stable asset decimals, for logs
    stable_decimals: u32,
    /// Maximum legs per route
    max_legs: usize,
    /// Gas accounting
    gas: GasConfig,
    /// Per-leg and per-trade logging
    trade_logging: bool,
    /// Registered venues
    venues: VenueRegistry,
    /// Execution-time oracle checks
    oracle: OracleAdapter,
    /// Owner, threshold and custody
    state: RwLock<CommittedState>,
    /// Serialises executions and administrative calls
    execution_lock: Mutex<()>,
    /// Held by the route in flight; state-changing calls fail while it is set
    executing: AtomicBool,
    /// Execution statistics
    statistics: RwLock<ExecutionStatistics>,
}

impl ArbitrageExecutor {
    /// Deploy an engine over the given venues and oracle
    pub fn new(config: &ExecutorConfig, venues: VenueRegistry, oracle: Arc<dyn PriceOracle>) -> Result<Self> {
        config.validate()?;

        let deployment = &config.deployment;
        let ledger = SettlementLedger::with_record_limit(
            deployment.stable_asset.clone(),
            deployment.initial_custody as u128,
            config.monitoring.trade_history_limit,
        );
        let instance_id = Uuid::new_v4();

        info!(
            %instance_id,
            stable_asset = %deployment.stable_asset,
            owner = %deployment.owner,
            min_profit_bps = deployment.min_profit_bps,
            custody = %format_units(ledger.balance(), deployment.stable_decimals),
            venues = venues.len(),
            "Arbitrage executor deployed"
        );
        telemetry::record_state(ledger.balance(), deployment.min_profit_bps);

        Ok(Self {
            instance_id,
            stable_asset: deployment.stable_asset.clone(),
            stable_decimals: deployment.stable_decimals,
            max_legs: config.execution.max_legs,
            gas: config.execution.gas.clone(),
            trade_logging: config.monitoring.enable_trade_logging,
            venues,
            oracle: OracleAdapter::new(oracle, config.execution.slippage_tolerance_bps),
            state: RwLock::new(CommittedState {
                owner: deployment.owner.clone(),
                min_profit_bps: deployment.min_profit_bps,
                ledger,
            }),
            execution_lock: Mutex::new(()),
            executing: AtomicBool::new(false),
            statistics: RwLock::new(ExecutionStatistics::default()),
        })
    }

    /// Deploy an engine over the simulated venues described in `config`
    pub fn simulated(config: &ExecutorConfig) -> Result<(Self, RateBook)> {
        let (venues, book) = VenueRegistry::simulated(&config.venues)?;
        let oracle = Arc::new(SimulatedOracle::new(book.clone()));
        Ok((Self::new(config, venues, oracle)?, book))
    }

    /// Execute `route` atomically on behalf of `submitter`.
    ///
    /// The first leg's principal is drawn from custody. Either the whole route
    /// settles and custody grows by the realised profit, or nothing changes.
    /// Reverts with `Reentrancy` if another route is in flight on this engine.
    pub async fn submit_route(&self, submitter: &Identity, route: &Route) -> ExecutionResult {
        let execution_id = Uuid::new_v4();
        let started = Instant::now();
        telemetry::record_attempt();

        let outcome = if self.is_executing() {
            Err(RevertReason::Reentrancy)
        } else if let Err(e) = route.validate(&self.stable_asset, self.max_legs, |venue| self.venues.contains(venue)) {
            Err(RevertReason::InvalidRoute(e))
        } else {
            match ExecutingGuard::claim(&self.executing) {
                Some(_executing) => {
                    let _lock = self.execution_lock.lock().await;
                    self.execute(execution_id, submitter, route).await
                }
                None => Err(RevertReason::Reentrancy),
            }
        };

        self.finish(execution_id, submitter, outcome, started).await
    }

    /// Update the minimum profit threshold; returns the previous value
    pub async fn set_min_profit_bps(&self, caller: &Identity, bps: u32) -> std::result::Result<u32, EngineError> {
        self.administer(caller, "set_min_profit_bps", |state| {
            if bps > BPS_SCALE {
                return Err(EngineError::InvalidThreshold(bps));
            }
            Ok(std::mem::replace(&mut state.min_profit_bps, bps))
        })
        .await
    }

    /// Withdraw `amount` from custody; returns the remaining balance
    pub async fn withdraw(&self, caller: &Identity, amount: u128) -> std::result::Result<u128, EngineError> {
        self.administer(caller, "withdraw", |state| {
            if amount == 0 {
                return Err(EngineError::InvalidAmount);
            }
            let stable = state.ledger.stable_asset().clone();
            state.ledger.debit(&stable, amount).map_err(|e| match e {
                LedgerError::InsufficientBalance { requested, available } => {
                    EngineError::InsufficientBalance { requested, available }
                }
                LedgerError::ZeroAmount => EngineError::InvalidAmount,
                other => EngineError::Ledger(other.to_string()),
            })
        })
        .await
    }

    /// Hand the administrative role to `new_owner`
    pub async fn transfer_ownership(&self, caller: &Identity, new_owner: Identity) -> std::result::Result<(), EngineError> {
        self.administer(caller, "transfer_ownership", move |state| {
            if new_owner.as_str().is_empty() {
                return Err(EngineError::InvalidIdentity);
            }
            state.owner = new_owner;
            Ok(())
        })
        .await
    }

    /// Threshold in force
    pub async fn min_profit_bps(&self) -> u32 {
        self.state.read().await.min_profit_bps
    }

    /// Committed custody balance
    pub async fn custody_balance(&self) -> u128 {
        self.state.read().await.ledger.balance()
    }

    /// Administrative identity
    pub async fn owner(&self) -> Identity {
        self.state.read().await.owner.clone()
    }

    /// Up to `limit` of the most recent settled trades, oldest first
    pub async fn trade_history(&self, limit: usize) -> Vec<TradeRecord> {
        self.state.read().await.ledger.recent_records(limit)
    }

    /// Execution statistics
    pub async fn statistics(&self) -> ExecutionStatistics {
        self.statistics.read().await.clone()
    }

    /// Snapshot of the engine
    pub async fn status(&self) -> EngineStatus {
        let statistics = self.statistics().await;
        let state = self.state.read().await;
        EngineStatus {
            instance_id: self.instance_id,
            owner: state.owner.clone(),
            stable_asset: self.stable_asset.clone(),
            min_profit_bps: state.min_profit_bps,
            custody_balance: state.ledger.balance(),
            executing: self.is_executing(),
            venues: self.venues.ids(),
            trades_recorded: state.ledger.trades_settled(),
            statistics,
        }
    }

    /// Stable settlement asset
    pub fn stable_asset(&self) -> &AssetId {
        &self.stable_asset
    }

    /// Decimals of the stable asset
    pub fn stable_decimals(&self) -> u32 {
        self.stable_decimals
    }

    /// Longest route accepted
    pub fn max_legs(&self) -> usize {
        self.max_legs
    }

    /// Gas accounting parameters
    pub fn gas_config(&self) -> &GasConfig {
        &self.gas
    }

    /// Engine instance identifier
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Registered venues
    pub fn venues(&self) -> &VenueRegistry {
        &self.venues
    }

    /// Whether a route is in flight
    pub fn is_executing(&self) -> bool {
        self.executing.load(Ordering::SeqCst)
    }

    /// Gas charged to the submitter of a route with `legs` legs
    pub fn estimate_gas_cost(&self, legs: usize) -> GasEstimate {
        let gas_used = self
            .gas
            .base_gas
            .saturating_add(self.gas.gas_per_leg.saturating_mul(legs as u64));
        GasEstimate {
            legs,
            gas_used,
            gas_price: self.gas.gas_price,
            gas_cost: gas_used as u128 * self.gas.gas_price as u128,
        }
    }

    async fn execute(
        &self,
        execution_id: Uuid,
        submitter: &Identity,
        route: &Route,
    ) -> std::result::Result<TradeReceipt, RevertReason> {
        let mut phase = ExecutionPhase::Pending;

        let outcome = self.apply_route(execution_id, submitter, route, &mut phase).await;
        if let Err(reason) = &outcome {
            let failed_at = phase;
            if let Err(e) = phase.advance(ExecutionPhase::Reverted) {
                error!(%execution_id, error = %e, "Revert from terminal phase");
            }
            debug!(%execution_id, phase = %failed_at, code = reason.code(), "Execution abandoned");
        }
        outcome
    }

    async fn apply_route(
        &self,
        execution_id: Uuid,
        submitter: &Identity,
        route: &Route,
        phase: &mut ExecutionPhase,
    ) -> std::result::Result<TradeReceipt, RevertReason> {
        let (min_profit_bps, mut txn) = {
            let state = self.state.read().await;
            (state.min_profit_bps, state.ledger.begin())
        };

        let principal = route.principal();
        txn.debit(&self.stable_asset, principal).map_err(|e| match e {
            LedgerError::InsufficientBalance { requested, available } => RevertReason::InsufficientBalance {
                required: requested,
                available,
            },
            other => settlement_failure(other),
        })?;

        let mut amount_held = principal;
        let mut fills = Vec::with_capacity(route.len());
        for (index, leg) in route.legs.iter().enumerate() {
            advance(phase, ExecutionPhase::LegsInProgress { leg: index })?;

            let oracle_quote = self.oracle.check_leg(index, leg, amount_held).await?;
            let amount_out = self.swap_leg(execution_id, index, leg, amount_held).await?;

            if self.trade_logging {
                crate::log_leg!(info, execution_id, index, leg.venue, amount_held, amount_out, oracle_quote = %oracle_quote, "Leg filled");
            }
            fills.push(LegFill {
                venue: leg.venue.clone(),
                asset_in: leg.asset_in.clone(),
                asset_out: leg.asset_out.clone(),
                amount_in: amount_held,
                amount_out,
                oracle_quote,
            });
            amount_held = amount_out;
        }

        let check = ProfitVerifier::verify(principal, amount_held, min_profit_bps)?;
        advance(phase, ExecutionPhase::ProfitChecked)?;

        txn.credit(&self.stable_asset, amount_held).map_err(settlement_failure)?;

        let gas = self.estimate_gas_cost(route.len());
        let settled_at = chrono::Utc::now();
        let record = TradeRecord {
            execution_id,
            submitter: submitter.clone(),
            venues: route.legs.iter().map(|leg| leg.venue.clone()).collect(),
            principal,
            final_output: amount_held,
            realized_profit: check.profit,
            realized_bps: check.realized_bps,
            gas_cost: gas.gas_cost,
            settled_at,
        };

        if !phase.can_advance_to(ExecutionPhase::Settled) {
            return Err(RevertReason::Settlement(format!("cannot settle from phase {}", phase)));
        }
        let custody_after = {
            let mut state = self.state.write().await;
            txn.commit(&mut state.ledger, record).map_err(settlement_failure)?
        };
        *phase = ExecutionPhase::Settled;

        Ok(TradeReceipt {
            execution_id,
            submitter: submitter.clone(),
            principal,
            final_output: amount_held,
            realized_profit: check.profit,
            realized_bps: check.realized_bps,
            gas_used: gas.gas_used,
            gas_cost: gas.gas_cost,
            custody_after,
            legs: fills,
            settled_at,
        })
    }

    /// Run one leg on its venue and check what came back
    async fn swap_leg(
        &self,
        execution_id: Uuid,
        index: usize,
        leg: &Leg,
        amount_in: u128,
    ) -> std::result::Result<u128, RevertReason> {
        let venue_failure = |message: String| RevertReason::VenueFailure {
            leg: index,
            venue: leg.venue.clone(),
            message,
        };

        let venue = self
            .venues
            .get(&leg.venue)
            .ok_or_else(|| venue_failure("venue not registered".to_string()))?;

        let request = SwapRequest {
            execution_id,
            leg_index: index,
            asset_in: leg.asset_in.clone(),
            asset_out: leg.asset_out.clone(),
            amount_in,
            min_amount_out: leg.min_amount_out,
        };
        let fill = venue.swap(&request).await.map_err(|e| venue_failure(e.to_string()))?;

        if fill.amount_in != amount_in {
            return Err(venue_failure(format!(
                "venue consumed {} of {}",
                fill.amount_in, amount_in
            )));
        }
        if fill.amount_out > MAX_AMOUNT {
            return Err(venue_failure(format!("output {} outside supported range", fill.amount_out)));
        }
        if fill.amount_out < leg.min_amount_out {
            return Err(RevertReason::SlippageExceeded {
                leg: index,
                min_amount_out: leg.min_amount_out,
                actual_amount_out: fill.amount_out,
            });
        }

        Ok(fill.amount_out)
    }

    async fn finish(
        &self,
        execution_id: Uuid,
        submitter: &Identity,
        outcome: std::result::Result<TradeReceipt, RevertReason>,
        started: Instant,
    ) -> ExecutionResult {
        let elapsed = started.elapsed();
        match outcome {
            Ok(receipt) => {
                self.statistics
                    .write()
                    .await
                    .record_settlement(receipt.realized_profit, receipt.gas_cost, elapsed);
                telemetry::record_settlement(receipt.realized_profit, receipt.gas_cost, elapsed);
                telemetry::record_state(receipt.custody_after, self.min_profit_bps().await);

                if self.trade_logging {
                    crate::log_settlement!(
                        info,
                        execution_id,
                        submitter,
                        "settled",
                        profit = %format_units(receipt.realized_profit, self.stable_decimals),
                        realized_bps = %receipt.realized_bps,
                        gas_cost = %format_units(receipt.gas_cost, self.stable_decimals),
                        custody = %format_units(receipt.custody_after, self.stable_decimals),
                        "Route settled"
                    );
                }
                ExecutionResult::Success(receipt)
            }
            Err(reason) => {
                self.statistics.write().await.record_revert(reason.code(), elapsed);
                telemetry::record_revert(reason.code(), elapsed);

                crate::log_settlement!(warn, execution_id, submitter, reason.code(), reason = %reason, "Route reverted");
                ExecutionResult::Reverted(reason)
            }
        }
    }

    /// Owner-only mutation of committed state, serialised with executions
    async fn administer<T, F>(
        &self,
        caller: &Identity,
        operation: &'static str,
        apply: F,
    ) -> std::result::Result<T, EngineError>
    where
        F: FnOnce(&mut CommittedState) -> std::result::Result<T, EngineError>,
    {
        let result = self.apply_admin(caller, apply).await;
        match &result {
            Ok(_) => {
                telemetry::record_admin(operation, "applied");
                crate::log_admin!(info, operation, caller, "Administrative operation applied");
            }
            Err(e) => {
                telemetry::record_admin(operation, "rejected");
                crate::log_admin!(warn, operation, caller, error = %e, "Administrative operation rejected");
            }
        }
        result
    }

    async fn apply_admin<T, F>(&self, caller: &Identity, apply: F) -> std::result::Result<T, EngineError>
    where
        F: FnOnce(&mut CommittedState) -> std::result::Result<T, EngineError>,
    {
        if self.is_executing() {
            return Err(EngineError::Reentrancy);
        }

        let _lock = self.execution_lock.lock().await;
        let mut state = self.state.write().await;
        if state.owner != *caller {
            return Err(EngineError::Unauthorized { caller: caller.clone() });
        }

        let value = apply(&mut state)?;
        telemetry::record_state(state.ledger.balance(), state.min_profit_bps);
        Ok(value)
    }
}

impl std::fmt::Debug for ArbitrageExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArbitrageExecutor")
            .field("instance_id", &self.instance_id)
            .field("stable_asset", &self.stable_asset)
            .field("venues", &self.venues)
            .field("executing", &self.is_executing())
            .finish()
    }
}

fn advance(phase: &mut ExecutionPhase, next: ExecutionPhase) -> std::result::Result<(), RevertReason> {
    phase
        .advance(next)
        .map_err(|e| RevertReason::Settlement(e.to_string()))
}

fn settlement_failure(error: LedgerError) -> RevertReason {
    RevertReason::Settlement(error.to_string())
}
