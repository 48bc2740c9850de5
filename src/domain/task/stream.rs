//! Task Event Streamer
//!
//! Turns a task id into a finite stream of status snapshots by polling
//! the store.

use super::model::{TaskId, TaskSnapshot};
use super::store::TaskStore;
use futures::Stream;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Event delivered to a subscriber
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The task's status changed since the last event
    Snapshot(TaskSnapshot),
    /// The task does not exist (never created or already reaped)
    Missing,
}

/// Subscribe to a task.
///
/// The first poll happens immediately. A snapshot is emitted only when the
/// status differs from the last one emitted; the stream ends after a
/// terminal snapshot or a single `Missing`.
pub fn subscribe(
    store: Arc<TaskStore>,
    id: TaskId,
    poll_interval: Duration,
) -> impl Stream<Item = StreamEvent> + Send + 'static {
    async_stream::stream! {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = None;

        loop {
            ticker.tick().await;

            let Ok(record) = store.get(&id).await else {
                tracing::debug!(task_id = %id, "Subscribed task not found");
                yield StreamEvent::Missing;
                break;
            };

            if last != Some(record.status) {
                last = Some(record.status);
                let terminal = record.status.is_terminal();
                yield StreamEvent::Snapshot(record.snapshot());
                if terminal {
                    break;
                }
            }
        }
    }
}
