//! Utility modules

pub mod amount;
pub mod logger;
pub mod metrics;

pub use amount::*;
pub use logger::*;
