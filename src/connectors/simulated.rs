//! Simulated venues and oracle backed by a shared rate book

use super::traits::{OracleError, PriceOracle, SwapFill, SwapRequest, Venue, VenueError};
use crate::{
    config::{VenueConfig, BPS_SCALE},
    route::{AssetId, VenueId},
};
use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Exchange rate: `out = in * numerator / denominator`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    /// Rate numerator
    pub numerator: u128,
    /// Rate denominator
    pub denominator: u128,
}

impl Rate {
    /// Create a new rate
    pub fn new(numerator: u128, denominator: u128) -> Self {
        Self { numerator, denominator }
    }

    /// Convert an input amount, truncating
    pub fn apply(&self, amount: u128) -> Option<u128> {
        if self.denominator == 0 {
            return None;
        }
        amount.checked_mul(self.numerator).map(|value| value / self.denominator)
    }
}

type PairKey = (VenueId, AssetId, AssetId);

#[derive(Debug, Default)]
struct BookInner {
    rates: HashMap<PairKey, Rate>,
    fees: HashMap<VenueId, u32>,
}

/// Shared, mutable table of venue rates and fees
#[derive(Debug, Clone, Default)]
pub struct RateBook {
    inner: Arc<RwLock<BookInner>>,
}

impl RateBook {
    /// Create an empty rate book
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a rate book from venue configuration
    pub fn from_config(venues: &[VenueConfig]) -> Self {
        let mut inner = BookInner::default();
        for venue in venues {
            inner.fees.insert(venue.id.clone(), venue.fee_bps.min(BPS_SCALE));
            for pair in &venue.pairs {
                inner.rates.insert(
                    (venue.id.clone(), pair.asset_in.clone(), pair.asset_out.clone()),
                    Rate::new(pair.rate_numerator as u128, pair.rate_denominator as u128),
                );
            }
        }
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Set or replace the rate of a directed pair on a venue
    pub async fn set_rate(&self, venue: &VenueId, asset_in: &AssetId, asset_out: &AssetId, rate: Rate) {
        let mut inner = self.inner.write().await;
        inner
            .rates
            .insert((venue.clone(), asset_in.clone(), asset_out.clone()), rate);
    }

    /// Set the swap fee of a venue
    pub async fn set_fee(&self, venue: &VenueId, fee_bps: u32) {
        let mut inner = self.inner.write().await;
        inner.fees.insert(venue.clone(), fee_bps.min(BPS_SCALE));
    }

    /// Current rate of a directed pair
    pub async fn rate(&self, venue: &VenueId, asset_in: &AssetId, asset_out: &AssetId) -> Option<Rate> {
        let inner = self.inner.read().await;
        inner
            .rates
            .get(&(venue.clone(), asset_in.clone(), asset_out.clone()))
            .copied()
    }

    /// Output of a swap after the venue fee
    pub async fn price(
        &self,
        venue: &VenueId,
        asset_in: &AssetId,
        asset_out: &AssetId,
        amount_in: u128,
    ) -> std::result::Result<u128, VenueError> {
        let inner = self.inner.read().await;
        let rate = inner
            .rates
            .get(&(venue.clone(), asset_in.clone(), asset_out.clone()))
            .copied()
            .ok_or_else(|| VenueError::UnsupportedPair {
                asset_in: asset_in.clone(),
                asset_out: asset_out.clone(),
            })?;
        let fee_bps = inner.fees.get(venue).copied().unwrap_or(0);

        let gross = rate.apply(amount_in).ok_or(VenueError::Overflow)?;
        apply_bps_haircut(gross, fee_bps).ok_or(VenueError::Overflow)
    }
}

fn apply_bps_haircut(amount: u128, bps: u32) -> Option<u128> {
    let keep = (BPS_SCALE - bps.min(BPS_SCALE)) as u128;
    amount
        .checked_mul(keep)
        .map(|value| value / BPS_SCALE as u128)
}

/// Venue that fills swaps from the rate book
pub struct SimulatedVenue {
    id: VenueId,
    book: RateBook,
    shortfall_bps: u32,
    rejection_probability: f64,
}

impl SimulatedVenue {
    /// Create a venue that always delivers its quoted price
    pub fn new(id: VenueId, book: RateBook) -> Self {
        Self {
            id,
            book,
            shortfall_bps: 0,
            rejection_probability: 0.0,
        }
    }

    /// Create a venue from configuration
    pub fn from_config(config: &VenueConfig, book: RateBook) -> Self {
        Self {
            id: config.id.clone(),
            book,
            shortfall_bps: config.shortfall_bps.min(BPS_SCALE),
            rejection_probability: config.rejection_probability.clamp(0.0, 1.0),
        }
    }

    /// Deliver `bps` less than quoted on every fill
    pub fn with_shortfall_bps(mut self, bps: u32) -> Self {
        self.shortfall_bps = bps.min(BPS_SCALE);
        self
    }

    /// Reject swaps with the given probability
    pub fn with_rejection_probability(mut self, probability: f64) -> Self {
        self.rejection_probability = probability.clamp(0.0, 1.0);
        self
    }

    fn should_reject(&self) -> bool {
        if self.rejection_probability <= 0.0 {
            return false;
        }
        rand::thread_rng().gen::<f64>() < self.rejection_probability
    }
}

#[async_trait]
impl Venue for SimulatedVenue {
    fn id(&self) -> &VenueId {
        &self.id
    }

    async fn swap(&self, request: &SwapRequest) -> std::result::Result<SwapFill, VenueError> {
        if self.should_reject() {
            warn!(venue = %self.id, leg = request.leg_index, "Simulated venue rejected swap");
            return Err(VenueError::Rejected("rejected in simulation".to_string()));
        }

        let quoted = self
            .book
            .price(&self.id, &request.asset_in, &request.asset_out, request.amount_in)
            .await?;
        let delivered = apply_bps_haircut(quoted, self.shortfall_bps).ok_or(VenueError::Overflow)?;

        debug!(
            venue = %self.id,
            leg = request.leg_index,
            amount_in = %request.amount_in,
            amount_out = %delivered,
            "Simulated swap filled"
        );

        Ok(SwapFill {
            amount_in: request.amount_in,
            amount_out: delivered,
        })
    }
}

/// Oracle quoting straight from the rate book
#[derive(Clone)]
pub struct SimulatedOracle {
    book: RateBook,
}

impl SimulatedOracle {
    /// Create an oracle over the rate book
    pub fn new(book: RateBook) -> Self {
        Self { book }
    }
}

#[async_trait]
impl PriceOracle for SimulatedOracle {
    async fn quote(
        &self,
        venue: &VenueId,
        asset_in: &AssetId,
        asset_out: &AssetId,
        amount_in: u128,
    ) -> std::result::Result<u128, OracleError> {
        self.book
            .price(venue, asset_in, asset_out, amount_in)
            .await
            .map_err(|e| match e {
                VenueError::UnsupportedPair { .. } => OracleError::NoQuote {
                    venue: venue.clone(),
                    asset_in: asset_in.clone(),
                    asset_out: asset_out.clone(),
                },
                other => OracleError::Unavailable(other.to_string()),
            })
    }
}
