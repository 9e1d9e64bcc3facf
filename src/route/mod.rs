//! Trade routes submitted to the executor
//!
//! A [`Route`] is an ordered list of [`Leg`]s that starts and ends in the stable
//! settlement asset. Routes are caller-supplied and live for a single execution;
//! [`Route::validate`] rejects malformed input before any state is touched.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest amount accepted anywhere in a route.
///
/// Keeps `amount * 10_000` inside `u128` for every basis-point computation.
pub const MAX_AMOUNT: u128 = u128::MAX / 10_000;

/// Default maximum number of legs in a route
pub const DEFAULT_MAX_LEGS: usize = 10;

macro_rules! normalized_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier, trimmed and lower-cased
            pub fn new(value: impl AsRef<str>) -> Self {
                Self(value.as_ref().trim().to_lowercase())
            }

            /// Borrow the normalized string form
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

normalized_id!(
    /// Asset identifier (token contract address)
    AssetId
);

normalized_id!(
    /// Venue identifier (DEX, pool or exchange name)
    VenueId
);

normalized_id!(
    /// Caller identity used for access control
    Identity
);

/// One venue-level exchange within a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    /// Venue that executes this leg
    pub venue: VenueId,
    /// Asset sold on this leg
    pub asset_in: AssetId,
    /// Asset bought on this leg
    pub asset_out: AssetId,
    /// Quoted input amount in base units of `asset_in`
    pub amount_in: u128,
    /// Minimum acceptable output in base units of `asset_out`
    pub min_amount_out: u128,
}

impl Leg {
    /// Create a new leg
    pub fn new(
        venue: impl Into<VenueId>,
        asset_in: impl Into<AssetId>,
        asset_out: impl Into<AssetId>,
        amount_in: u128,
        min_amount_out: u128,
    ) -> Self {
        Self {
            venue: venue.into(),
            asset_in: asset_in.into(),
            asset_out: asset_out.into(),
            amount_in,
            min_amount_out,
        }
    }
}

/// Ordered sequence of legs forming a round trip through the stable asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Legs in execution order
    pub legs: Vec<Leg>,
}

/// Reasons a route is rejected before execution
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteError {
    /// Route has no legs
    #[error("route is empty")]
    Empty,

    /// Route has more legs than the engine accepts
    #[error("route has {count} legs, maximum is {max}")]
    TooManyLegs {
        /// Number of legs submitted
        count: usize,
        /// Configured maximum
        max: usize,
    },

    /// A leg carries a zero amount
    #[error("leg {leg} has a zero amount")]
    ZeroAmount {
        /// Leg index
        leg: usize,
    },

    /// A leg carries an amount above [`MAX_AMOUNT`]
    #[error("leg {leg} amount exceeds the supported range")]
    AmountTooLarge {
        /// Leg index
        leg: usize,
    },

    /// First leg does not spend the stable asset
    #[error("route must start in {expected}, starts in {found}")]
    WrongEntryAsset {
        /// Stable settlement asset
        expected: AssetId,
        /// Asset found on the first leg
        found: AssetId,
    },

    /// Last leg does not buy the stable asset
    #[error("route must end in {expected}, ends in {found}")]
    WrongExitAsset {
        /// Stable settlement asset
        expected: AssetId,
        /// Asset found on the last leg
        found: AssetId,
    },

    /// A leg does not spend what the previous leg bought
    #[error("leg {leg} spends {found} but the previous leg buys {expected}")]
    BrokenChain {
        /// Leg index
        leg: usize,
        /// Asset bought by the previous leg
        expected: AssetId,
        /// Asset spent by this leg
        found: AssetId,
    },

    /// A leg quotes more input than the previous leg guarantees
    #[error("leg {leg} quotes input {amount_in} above the previous minimum output {guaranteed}")]
    UnfundedLeg {
        /// Leg index
        leg: usize,
        /// Quoted input
        amount_in: u128,
        /// Previous leg's minimum output
        guaranteed: u128,
    },

    /// A leg names a venue the engine does not know
    #[error("leg {leg} uses unknown venue {venue}")]
    UnknownVenue {
        /// Leg index
        leg: usize,
        /// Venue identifier
        venue: VenueId,
    },
}

impl Route {
    /// Create a route from legs
    pub fn new(legs: Vec<Leg>) -> Self {
        Self { legs }
    }

    /// Number of legs
    pub fn len(&self) -> usize {
        self.legs.len()
    }

    /// Whether the route has no legs
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Principal drawn from custody by the first leg
    pub fn principal(&self) -> u128 {
        self.legs.first().map(|leg| leg.amount_in).unwrap_or(0)
    }

    /// Check every structural invariant of the route.
    ///
    /// `is_known_venue` decides whether a venue identifier is registered.
    pub fn validate<F>(
        &self,
        stable_asset: &AssetId,
        max_legs: usize,
        is_known_venue: F,
    ) -> std::result::Result<(), RouteError>
    where
        F: Fn(&VenueId) -> bool,
    {
        let (first, last) = match (self.legs.first(), self.legs.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(RouteError::Empty),
        };

        if self.legs.len() > max_legs {
            return Err(RouteError::TooManyLegs {
                count: self.legs.len(),
                max: max_legs,
            });
        }

        if &first.asset_in != stable_asset {
            return Err(RouteError::WrongEntryAsset {
                expected: stable_asset.clone(),
                found: first.asset_in.clone(),
            });
        }

        if &last.asset_out != stable_asset {
            return Err(RouteError::WrongExitAsset {
                expected: stable_asset.clone(),
                found: last.asset_out.clone(),
            });
        }

        for (index, leg) in self.legs.iter().enumerate() {
            if leg.amount_in == 0 || leg.min_amount_out == 0 {
                return Err(RouteError::ZeroAmount { leg: index });
            }
            if leg.amount_in > MAX_AMOUNT || leg.min_amount_out > MAX_AMOUNT {
                return Err(RouteError::AmountTooLarge { leg: index });
            }
            if !is_known_venue(&leg.venue) {
                return Err(RouteError::UnknownVenue {
                    leg: index,
                    venue: leg.venue.clone(),
                });
            }
        }

        for (index, pair) in self.legs.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            let leg = index + 1;

            if current.asset_in != previous.asset_out {
                return Err(RouteError::BrokenChain {
                    leg,
                    expected: previous.asset_out.clone(),
                    found: current.asset_in.clone(),
                });
            }
            if current.amount_in > previous.min_amount_out {
                return Err(RouteError::UnfundedLeg {
                    leg,
                    amount_in: current.amount_in,
                    guaranteed: previous.min_amount_out,
                });
            }
        }

        Ok(())
    }
}
