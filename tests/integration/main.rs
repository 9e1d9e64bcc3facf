//! Integration tests for the arbitrage executor

pub mod test_atomicity;
pub mod test_concurrency;
pub mod test_config_loading;
pub mod test_profit_threshold;

use arbitrage_executor::{
    config::{ConfigDefaults, ExecutorConfig},
    connectors::{Rate, RateBook, SimulatedOracle, SimulatedVenue, SwapFill, SwapRequest, Venue, VenueError},
    route::{AssetId, Identity, Leg, Route, VenueId},
    ArbitrageExecutor, VenueRegistry,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// USDC on the deployment chain
pub const USDC: &str = "0x1c7d4b196cb0c7b01d743fbc6116a902379c7238";
/// Wrapped ether
pub const WETH: &str = "0x4200000000000000000000000000000000000006";
/// A second intermediate asset
pub const DAI: &str = "0x50c5725949a6f0c72e6c4a641f24049a917db0cb";

/// Venue quoting every intermediate pair 1:1
pub const PASS_THROUGH: &str = "alpha";
/// Same rates as [`PASS_THROUGH`], but misbehaves on request
pub const FAULTY_PASS_THROUGH: &str = "faulty-alpha";
/// Venue paying 1% on the way back into USDC
pub const EXIT: &str = "exit";
/// Same rates as [`EXIT`], but misbehaves on request
pub const FAULTY_EXIT: &str = "faulty-exit";

/// How a scripted venue misbehaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fill honestly
    None,
    /// Refuse the swap
    Reject,
    /// Claim success but deliver one unit under the minimum
    ShortChange,
    /// Report consuming more than it was given
    Overconsume,
}

/// Venue priced from the shared book with an injectable fault
pub struct ScriptedVenue {
    id: VenueId,
    book: RateBook,
    fault: Fault,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl ScriptedVenue {
    /// Create an honest venue
    pub fn new(id: &str, book: RateBook) -> Self {
        Self {
            id: VenueId::new(id),
            book,
            fault: Fault::None,
            delay: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Misbehave on every swap
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = fault;
        self
    }

    /// Sleep inside every swap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Highest number of swaps seen in flight at once
    pub fn max_in_flight(&self) -> Arc<AtomicUsize> {
        self.max_in_flight.clone()
    }
}

#[async_trait]
impl Venue for ScriptedVenue {
    fn id(&self) -> &VenueId {
        &self.id
    }

    async fn swap(&self, request: &SwapRequest) -> Result<SwapFill, VenueError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        let priced = self
            .book
            .price(&self.id, &request.asset_in, &request.asset_out, request.amount_in)
            .await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let amount_out = priced?;
        match self.fault {
            Fault::None => Ok(SwapFill { amount_in: request.amount_in, amount_out }),
            Fault::Reject => Err(VenueError::Rejected("scripted rejection".to_string())),
            Fault::ShortChange => Ok(SwapFill {
                amount_in: request.amount_in,
                amount_out: request.min_amount_out - 1,
            }),
            Fault::Overconsume => Ok(SwapFill {
                amount_in: request.amount_in + 1,
                amount_out,
            }),
        }
    }
}

/// Test utilities for integration tests
pub struct TestUtils;

impl TestUtils {
    /// Configured owner
    pub fn owner() -> Identity {
        Identity::new(ConfigDefaults::OWNER)
    }

    /// Some unprivileged submitter
    pub fn submitter() -> Identity {
        Identity::new("0x00000000000000000000000000000000000000aa")
    }

    /// Configuration with the given custody and no configured venues
    pub fn create_test_config(initial_custody: u64) -> ExecutorConfig {
        let mut config = ExecutorConfig::default();
        config.deployment.initial_custody = initial_custody;
        config.monitoring.enable_trade_logging = false;
        config.venues.clear();
        config
    }

    /// Rate book for the pass-through and exit venues, faulty twins included.
    ///
    /// `exit_numerator / 10_000` is paid on every asset sold back into USDC.
    pub async fn create_rate_book(exit_numerator: u128) -> RateBook {
        let book = RateBook::new();
        let assets = [USDC, WETH, DAI].map(AssetId::new);

        for venue in [PASS_THROUGH, FAULTY_PASS_THROUGH].map(VenueId::new) {
            for asset_in in &assets {
                for asset_out in &assets {
                    if asset_in != asset_out {
                        book.set_rate(&venue, asset_in, asset_out, Rate::new(1, 1)).await;
                    }
                }
            }
        }
        for venue in [EXIT, FAULTY_EXIT].map(VenueId::new) {
            for asset_in in &assets {
                book.set_rate(&venue, asset_in, &AssetId::new(USDC), Rate::new(exit_numerator, 10_000))
                    .await;
            }
        }
        book
    }

    /// Engine over honest venues, with faulty twins that misbehave with `fault`
    pub async fn create_engine(
        initial_custody: u64,
        exit_numerator: u128,
        fault: Fault,
    ) -> (Arc<ArbitrageExecutor>, RateBook) {
        let config = Self::create_test_config(initial_custody);
        let book = Self::create_rate_book(exit_numerator).await;

        let mut venues = VenueRegistry::new();
        venues
            .register(Arc::new(SimulatedVenue::new(VenueId::new(PASS_THROUGH), book.clone())))
            .unwrap();
        venues
            .register(Arc::new(SimulatedVenue::new(VenueId::new(EXIT), book.clone())))
            .unwrap();
        for id in [FAULTY_PASS_THROUGH, FAULTY_EXIT] {
            venues
                .register(Arc::new(ScriptedVenue::new(id, book.clone()).with_fault(fault)))
                .unwrap();
        }

        let oracle = Arc::new(SimulatedOracle::new(book.clone()));
        let engine = ArbitrageExecutor::new(&config, venues, oracle).unwrap();
        (Arc::new(engine), book)
    }

    /// Round trip of `leg_count` legs funded with `principal`; the last leg exits
    /// through [`EXIT`]. The leg at `faulty_leg`, if any, uses a faulty twin.
    pub fn create_route(leg_count: usize, principal: u128, faulty_leg: Option<usize>) -> Route {
        let asset_at = |position: usize| {
            if position == 0 || position == leg_count {
                USDC
            } else if position % 2 == 1 {
                WETH
            } else {
                DAI
            }
        };

        let legs = (0..leg_count)
            .map(|index| {
                let exit = index == leg_count - 1;
                let venue = match (exit, faulty_leg == Some(index)) {
                    (true, true) => FAULTY_EXIT,
                    (true, false) => EXIT,
                    (false, true) => FAULTY_PASS_THROUGH,
                    (false, false) => PASS_THROUGH,
                };
                Leg::new(venue, asset_at(index), asset_at(index + 1), principal, principal)
            })
            .collect();
        Route::new(legs)
    }
}
