//! Application Layer
//!
//! Process-level concerns: configuration loading and logging setup.

pub mod config;
pub mod logging;

pub use config::{GatewayConfig, LoggingConfig, ServerConfig, TaskConfig};
pub use logging::{init_logging, LoggingGuard};
