//! Task Management
//!
//! Task model, store, dispatch, streaming and cleanup.

pub mod dispatch;
pub mod model;
pub mod reaper;
pub mod store;
pub mod stream;

pub use dispatch::Dispatcher;
pub use model::{TaskId, TaskRecord, TaskSnapshot, TaskStatus, TaskUpdate, ToolArgs};
pub use reaper::spawn_reaper;
pub use store::{TaskStore, TerminalEvent, UpdateOutcome};
pub use stream::{subscribe, StreamEvent};
