//! Domain Layer
//!
//! Core gateway logic: backend abstractions, the aggregated tool catalog,
//! agent visibility, and task management.

pub mod agents;
pub mod backend;
pub mod catalog;
pub mod task;

pub use agents::AgentToolMap;
pub use backend::{BackendConnector, BackendSession, SessionHandle, ToolDescriptor};
pub use catalog::{Catalog, CatalogAggregator, RefreshReport};
