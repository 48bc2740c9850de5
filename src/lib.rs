//! toolgate Library
//!
//! A gateway that aggregates tool catalogs from MCP backends and runs
//! tool calls as tracked asynchronous tasks:
//! - Backend session management and catalog aggregation
//! - Task lifecycle bookkeeping with delayed cleanup
//! - HTTP interface with Server-Sent Events progress streams

pub mod app;
pub mod client;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod infrastructure;
pub mod server;

pub use error::{GatewayError, Result};
pub use gateway::{Gateway, ServiceStatus};
