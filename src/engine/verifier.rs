//! Round-trip profit verification

use super::result::RevertReason;
use crate::{config::BPS_SCALE, route::RouteError};
use serde::{Deserialize, Serialize};

/// Profit of a round trip that cleared the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitCheck {
    /// `final_output - principal`
    pub profit: u128,
    /// Floor of `profit * 10_000 / principal`
    pub realized_bps: u128,
}

/// Decides whether a completed round trip may settle.
///
/// A route settles only when `profit / principal >= threshold_bps / 10_000`,
/// compared exactly in integers. Anything else, including a loss, reverts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfitVerifier;

impl ProfitVerifier {
    /// Check `final_output` against `principal` and the threshold in force
    pub fn verify(
        principal: u128,
        final_output: u128,
        threshold_bps: u32,
    ) -> std::result::Result<ProfitCheck, RevertReason> {
        if principal == 0 {
            return Err(RevertReason::InvalidRoute(RouteError::ZeroAmount { leg: 0 }));
        }

        let scale = BPS_SCALE as u128;
        let signed_profit = final_output as i128 - principal as i128;
        let signed_bps = signed_profit.saturating_mul(scale as i128) / principal as i128;
        let below = |realized_bps: i128| RevertReason::ProfitBelowThreshold {
            profit: signed_profit,
            realized_bps,
            threshold_bps,
        };

        if final_output <= principal {
            // Zero threshold still demands a strictly positive profit
            return Err(below(signed_bps));
        }

        let profit = final_output - principal;
        let (scaled_profit, required) = match (
            profit.checked_mul(scale),
            principal.checked_mul(threshold_bps as u128),
        ) {
            (Some(scaled_profit), Some(required)) => (scaled_profit, required),
            _ => return Err(below(signed_bps)),
        };

        if scaled_profit < required {
            return Err(below(signed_bps));
        }

        Ok(ProfitCheck {
            profit,
            realized_bps: scaled_profit / principal,
        })
    }
}
