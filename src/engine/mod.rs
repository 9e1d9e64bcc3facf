//! Execution engine
//!
//! - [`verifier`]: integer profit check against the basis-point threshold
//! - [`executor`]: leg sequencing, atomic settlement, owner operations
//! - [`state`]: execution phases and statistics
//! - [`result`]: outcomes and error taxonomy

pub mod executor;
pub mod result;
pub mod state;
pub mod verifier;

pub use executor::ArbitrageExecutor;
pub use result::{EngineError, ExecutionResult, LegFill, RevertReason, TradeReceipt};
pub use state::{EngineStatus, ExecutionPhase, ExecutionStatistics, GasEstimate, PhaseError};
pub use verifier::{ProfitCheck, ProfitVerifier};
