//! cfgmgmt-log - logging setup shared by the cfgmgmt binaries
//!
//! Wraps `tracing-subscriber` behind a small [`Config`] so every entry point
//! initialises logging the same way:
//!
//! ```rust,no_run
//! let _guard = cfgmgmt_log::init_from_env().expect("logger");
//! tracing::info!("ready");
//! ```
#![forbid(unsafe_code)]

mod builder;
mod config;
mod core;

pub use crate::builder::{LoggerBuilder, LoggerGuard};
pub use crate::config::{Config, DisplayConfig, Fields, Format};
pub use crate::core::{LogError, LogResult};

/// Initialise logging from `CFGMGMT_LOG` / `RUST_LOG` and `CFGMGMT_LOG_FORMAT`.
pub fn init_from_env() -> LogResult<LoggerGuard> {
    LoggerBuilder::from_config(Config::from_env()).build()
}

/// Initialise logging with an explicit configuration.
pub fn init_with(config: Config) -> LogResult<LoggerGuard> {
    LoggerBuilder::from_config(config).build()
}
