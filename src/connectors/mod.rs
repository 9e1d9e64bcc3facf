//! Venue and oracle connectors
//!
//! Venues and the oracle are external collaborators; the engine treats their
//! answers as untrusted and checks them at execution time.

pub mod oracle;
pub mod simulated;
pub mod traits;

pub use oracle::OracleAdapter;
pub use simulated::{Rate, RateBook, SimulatedOracle, SimulatedVenue};
pub use traits::*;

use crate::{config::VenueConfig, route::VenueId, ArbitrageError, Result};
use indexmap::IndexMap;
use std::sync::Arc;

/// Registered venues, in registration order
#[derive(Clone, Default)]
pub struct VenueRegistry {
    venues: IndexMap<VenueId, Arc<dyn Venue>>,
}

impl VenueRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a venue; identifiers must be unique
    pub fn register(&mut self, venue: Arc<dyn Venue>) -> Result<()> {
        let id = venue.id().clone();
        if self.venues.contains_key(&id) {
            return Err(ArbitrageError::Venue(format!("Venue already registered: {}", id)).into());
        }
        self.venues.insert(id, venue);
        Ok(())
    }

    /// Builder-style registration
    pub fn with_venue(mut self, venue: Arc<dyn Venue>) -> Result<Self> {
        self.register(venue)?;
        Ok(self)
    }

    /// Look up a venue
    pub fn get(&self, id: &VenueId) -> Option<Arc<dyn Venue>> {
        self.venues.get(id).cloned()
    }

    /// Whether a venue is registered
    pub fn contains(&self, id: &VenueId) -> bool {
        self.venues.contains_key(id)
    }

    /// Registered identifiers in registration order
    pub fn ids(&self) -> Vec<VenueId> {
        self.venues.keys().cloned().collect()
    }

    /// Number of registered venues
    pub fn len(&self) -> usize {
        self.venues.len()
    }

    /// Whether no venue is registered
    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    /// Build simulated venues from configuration, sharing one rate book
    pub fn simulated(configs: &[VenueConfig]) -> Result<(Self, RateBook)> {
        let book = RateBook::from_config(configs);
        let mut registry = Self::new();
        for config in configs {
            registry.register(Arc::new(SimulatedVenue::from_config(config, book.clone())))?;
        }
        Ok((registry, book))
    }
}

impl std::fmt::Debug for VenueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VenueRegistry")
            .field("venues", &self.ids())
            .finish()
    }
}
