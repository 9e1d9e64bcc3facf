//! Logging utilities

use crate::{ArbitrageError, Result};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Registry,
};

/// Initialize logging to the console and a daily-rotated file
pub fn init<P: AsRef<Path>>(log_level: &str, log_file: P) -> Result<()> {
    // Create log directory if it doesn't exist
    if let Some(parent) = log_file.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = RollingFileAppender::new(
        Rotation::DAILY,
        log_file.as_ref().parent().unwrap_or(Path::new(".")),
        log_file
            .as_ref()
            .file_name()
            .unwrap_or(std::ffi::OsStr::new("executor.log")),
    );

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    // Trade logs are parsed downstream, so the file sink is JSON
    let file_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_thread_ids(true)
        .with_current_span(false)
        .with_ansi(false)
        .with_writer(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ArbitrageError::Monitoring(format!("Failed to install subscriber: {}", e)))?;

    Ok(())
}

/// Initialize console-only logging
pub fn init_console(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    Registry::default()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| ArbitrageError::Monitoring(format!("Failed to install subscriber: {}", e)))?;

    Ok(())
}

/// Log a filled leg with structured fields
#[macro_export]
macro_rules! log_leg {
    ($level:ident, $execution_id:expr, $leg:expr, $venue:expr, $amount_in:expr, $amount_out:expr, $($field:tt)*) => {
        tracing::$level!(
            execution_id = %$execution_id,
            leg = $leg,
            venue = %$venue,
            amount_in = %$amount_in,
            amount_out = %$amount_out,
            $($field)*
        );
    };
}

/// Log a settlement or revert with structured fields
#[macro_export]
macro_rules! log_settlement {
    ($level:ident, $execution_id:expr, $submitter:expr, $outcome:expr, $($field:tt)*) => {
        tracing::$level!(
            execution_id = %$execution_id,
            submitter = %$submitter,
            outcome = %$outcome,
            $($field)*
        );
    };
}

/// Log an administrative operation with structured fields
#[macro_export]
macro_rules! log_admin {
    ($level:ident, $operation:expr, $caller:expr, $($field:tt)*) => {
        tracing::$level!(
            operation = %$operation,
            caller = %$caller,
            $($field)*
        );
    };
}
