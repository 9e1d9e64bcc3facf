//! Execution-time oracle boundary
//!
//! Quotes are fetched per leg at the moment the leg runs, never ahead of time,
//! and compared against the leg's declared minimum output.

use super::traits::PriceOracle;
use crate::{
    config::BPS_SCALE,
    engine::RevertReason,
    route::Leg,
};
use std::sync::Arc;
use tracing::debug;

/// Validates each leg against a fresh quote from an untrusted oracle
#[derive(Clone)]
pub struct OracleAdapter {
    oracle: Arc<dyn PriceOracle>,
    tolerance_bps: u32,
}

impl OracleAdapter {
    /// Create a new adapter
    pub fn new(oracle: Arc<dyn PriceOracle>, tolerance_bps: u32) -> Self {
        Self {
            oracle,
            tolerance_bps: tolerance_bps.min(BPS_SCALE),
        }
    }

    /// Accepted shortfall in basis points
    pub fn tolerance_bps(&self) -> u32 {
        self.tolerance_bps
    }

    /// Re-quote `leg` for the amount actually held and reject it if the quote
    /// sits further below the leg's minimum output than the tolerance allows.
    pub async fn check_leg(
        &self,
        leg_index: usize,
        leg: &Leg,
        amount_in: u128,
    ) -> std::result::Result<u128, RevertReason> {
        let quote = self
            .oracle
            .quote(&leg.venue, &leg.asset_in, &leg.asset_out, amount_in)
            .await
            .map_err(|e| RevertReason::OracleUnavailable {
                leg: leg_index,
                message: e.to_string(),
            })?;

        let deviation_bps = shortfall_bps(leg.min_amount_out, quote);
        debug!(
            leg = leg_index,
            venue = %leg.venue,
            amount_in = %amount_in,
            quote = %quote,
            min_amount_out = %leg.min_amount_out,
            deviation_bps = deviation_bps,
            "Oracle quote fetched"
        );

        if deviation_bps > self.tolerance_bps {
            return Err(RevertReason::PriceDeviation {
                leg: leg_index,
                min_amount_out: leg.min_amount_out,
                oracle_quote: quote,
                deviation_bps,
                tolerance_bps: self.tolerance_bps,
            });
        }

        Ok(quote)
    }
}

/// Shortfall of `quote` below `expected` in basis points, rounded up.
///
/// Zero when the quote meets or beats the expectation. `expected` must be
/// non-zero and at most [`crate::route::MAX_AMOUNT`].
pub fn shortfall_bps(expected: u128, quote: u128) -> u32 {
    if quote >= expected || expected == 0 {
        return 0;
    }
    let gap = (expected - quote) * BPS_SCALE as u128;
    let bps = gap.div_ceil(expected);
    bps.min(BPS_SCALE as u128) as u32
}
