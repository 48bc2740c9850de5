//! Task Reaper
//!
//! Deletes task records a fixed grace period after they finish.

use super::model::TaskId;
use super::store::{TaskStore, TerminalEvent};
use futures::StreamExt;
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::time::DelayQueue;

/// Spawn the reaper loop.
///
/// Runs until the store is dropped (which closes the event channel).
pub fn spawn_reaper(
    store: Weak<TaskStore>,
    events: UnboundedReceiver<TerminalEvent>,
    grace: Duration,
) -> JoinHandle<()> {
    tokio::spawn(run_reaper(store, events, grace))
}

async fn run_reaper(
    store: Weak<TaskStore>,
    mut events: UnboundedReceiver<TerminalEvent>,
    grace: Duration,
) {
    let mut queue: DelayQueue<TaskId> = DelayQueue::new();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    tracing::debug!(
                        task_id = %event.id,
                        status = %event.status,
                        grace_secs = grace.as_secs(),
                        "Scheduling task cleanup"
                    );
                    queue.insert(event.id, grace);
                }
                None => break,
            },
            Some(expired) = queue.next(), if !queue.is_empty() => {
                let id = expired.into_inner();
                let Some(store) = store.upgrade() else { break };
                if store.remove(&id).await.is_some() {
                    tracing::debug!(task_id = %id, "Task record reclaimed");
                }
            }
        }
    }

    tracing::debug!(pending = queue.len(), "Reaper stopped");
}
