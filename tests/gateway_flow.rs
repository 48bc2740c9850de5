//! End-to-end task flows through the gateway, with fake backends
//!
//! Run with: cargo test --test gateway_flow

mod common;

use common::{args, config_for, FakeBackend, FakeConnector};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use toolgate::domain::task::{StreamEvent, TaskId, TaskStatus};
use toolgate::{Gateway, GatewayError, ServiceStatus};

async fn gateway(connector: FakeConnector, backends: &[&str]) -> (Arc<Gateway>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(backends, &dir.path().join("agent_tools.json"));
    let gateway = Arc::new(Gateway::new(&config, Arc::new(connector)).unwrap());
    gateway.refresh().await;
    (gateway, dir)
}

fn statuses(events: &[StreamEvent]) -> Vec<TaskStatus> {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Snapshot(s) => Some(s.status),
            StreamEvent::Missing => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_round_completes() {
    let connector = FakeConnector::new().with_backend("math", FakeBackend::math());
    let (gateway, _dir) = gateway(connector, &["math"]).await;

    let id = gateway.call_tool("round", args(json!({"a": 1.23456}))).await.unwrap();
    let events: Vec<_> = gateway.subscribe(id).collect().await;

    let observed = statuses(&events);
    assert_eq!(observed.last(), Some(&TaskStatus::Completed));
    assert!(observed.windows(2).all(|w| w[0] != w[1]));

    let record = gateway.task(&id).await.unwrap();
    assert_eq!(record.status, TaskStatus::Completed);
    assert_eq!(record.result, Some(json!(1.23)));
    assert!(record.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_tool_creates_no_task() {
    let connector = FakeConnector::new().with_backend("math", FakeBackend::math());
    let (gateway, _dir) = gateway(connector.clone(), &["math"]).await;

    let err = gateway.call_tool("does_not_exist", args(json!({}))).await.unwrap_err();
    assert!(matches!(err, GatewayError::ToolNotFound { ref tool } if tool == "does_not_exist"));
    assert!(gateway.store().is_empty().await);
    assert_eq!(connector.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failure_is_captured() {
    let connector = FakeConnector::new().with_backend("math", FakeBackend::math());
    let (gateway, _dir) = gateway(connector, &["math"]).await;

    let id = gateway.call_tool("divide_by_zero", args(json!({}))).await.unwrap();
    let events: Vec<_> = gateway.subscribe(id).collect().await;

    match events.last() {
        Some(StreamEvent::Snapshot(s)) => {
            assert_eq!(s.status, TaskStatus::Failed);
            assert_eq!(s.error.as_deref(), Some("division by zero"));
            assert!(s.result.is_none());
        }
        other => panic!("unexpected final event: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_tool_cancelled_stays_cancelled() {
    let connector = FakeConnector::new().with_backend("math", FakeBackend::math());
    let (gateway, _dir) = gateway(connector.clone(), &["math"]).await;

    let id = gateway.call_tool("slow_sum", args(json!({}))).await.unwrap();

    let subscriber = {
        let gateway = gateway.clone();
        tokio::spawn(async move { gateway.subscribe(id).collect::<Vec<_>>().await })
    };

    tokio::time::sleep(Duration::from_secs(2)).await;
    let record = gateway.cancel(&id).await.unwrap();
    assert_eq!(record.status, TaskStatus::Cancelled);

    let events = subscriber.await.unwrap();
    let observed = statuses(&events);
    assert_eq!(observed.last(), Some(&TaskStatus::Cancelled));
    assert!(!observed.contains(&TaskStatus::Completed));

    // The backend call still finishes, but cannot downgrade the task
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(connector.call_count(), 1);
    let record = gateway.task(&id).await.unwrap();
    assert_eq!(record.status, TaskStatus::Cancelled);
    assert!(record.result.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_completion_keeps_result() {
    let connector = FakeConnector::new().with_backend("math", FakeBackend::math());
    let (gateway, _dir) = gateway(connector, &["math"]).await;

    let id = gateway.call_tool("round", args(json!({"a": 2.5}))).await.unwrap();
    let _: Vec<_> = gateway.subscribe(id).collect().await;

    let record = gateway.cancel(&id).await.unwrap();
    assert_eq!(record.status, TaskStatus::Completed);
    assert_eq!(record.result, Some(json!(2.5)));
}

#[tokio::test(start_paused = true)]
async fn test_late_subscriber_sees_terminal_first() {
    let connector = FakeConnector::new().with_backend("math", FakeBackend::math());
    let (gateway, _dir) = gateway(connector, &["math"]).await;

    let id = gateway.call_tool("round", args(json!({"a": 1.0}))).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let events: Vec<_> = gateway.subscribe(id).collect().await;
    assert_eq!(statuses(&events), vec![TaskStatus::Completed]);
}

#[tokio::test(start_paused = true)]
async fn test_reaped_task_is_missing() {
    let connector = FakeConnector::new().with_backend("math", FakeBackend::math());
    let (gateway, _dir) = gateway(connector, &["math"]).await;

    let id = gateway.call_tool("round", args(json!({"a": 1.0}))).await.unwrap();
    tokio::time::sleep(Duration::from_secs(301)).await;

    let events: Vec<_> = gateway.subscribe(id).collect().await;
    assert_eq!(events, vec![StreamEvent::Missing]);
    assert!(matches!(
        gateway.task(&id).await,
        Err(GatewayError::TaskNotFound { .. })
    ));
    assert!(matches!(
        gateway.cancel(&id).await,
        Err(GatewayError::TaskNotFound { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_unknown_task_is_missing() {
    let connector = FakeConnector::new().with_backend("math", FakeBackend::math());
    let (gateway, _dir) = gateway(connector, &["math"]).await;

    let events: Vec<_> = gateway.subscribe(TaskId::new()).collect().await;
    assert_eq!(events, vec![StreamEvent::Missing]);
}

#[tokio::test(start_paused = true)]
async fn test_one_backend_down_still_ready() {
    let connector = FakeConnector::new().with_backend("math", FakeBackend::math());
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&["math", "search"], &dir.path().join("agent_tools.json"));
    let gateway = Gateway::new(&config, Arc::new(connector)).unwrap();

    assert_eq!(gateway.health(), ServiceStatus::Unready);

    let report = gateway.refresh().await;
    assert_eq!(report.connected, vec!["math".to_string()]);
    assert!(matches!(
        &report.unavailable[..],
        [GatewayError::BackendUnavailable { backend, .. }] if backend == "search"
    ));

    assert_eq!(gateway.health(), ServiceStatus::Ok);
    let names: Vec<_> = gateway.list_tools().await.into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["round", "slow_sum", "divide_by_zero"]);
}

#[tokio::test(start_paused = true)]
async fn test_collision_first_backend_wins() {
    let connector = FakeConnector::new()
        .with_backend("math", FakeBackend::math())
        .with_backend("text", FakeBackend::text());
    let (gateway, _dir) = gateway(connector, &["math", "text"]).await;

    let tools = gateway.list_tools().await;
    let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["round", "slow_sum", "divide_by_zero", "echo"]);
    assert_eq!(tools[0].description.as_deref(), Some("round from math"));

    // "round" still routes to the math backend
    let id = gateway.call_tool("round", args(json!({"a": 3.14159}))).await.unwrap();
    let _: Vec<_> = gateway.subscribe(id).collect().await;
    assert_eq!(gateway.task(&id).await.unwrap().result, Some(json!(3.14)));
}

#[tokio::test(start_paused = true)]
async fn test_agent_visibility_and_reset() {
    let connector = FakeConnector::new()
        .with_backend("math", FakeBackend::math())
        .with_backend("text", FakeBackend::text());
    let (gateway, dir) = gateway(connector, &["math", "text"]).await;
    let path = dir.path().join("agent_tools.json");

    // No mapping file yet: everyone sees everything
    assert_eq!(gateway.tools_for_agent("writer").await.len(), 4);

    std::fs::write(&path, r#"{"writer": ["echo", "round"], "idle": []}"#).unwrap();
    assert_eq!(gateway.reset().await, ServiceStatus::Ok);

    let names: Vec<_> = gateway
        .tools_for_agent("writer")
        .await
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["round", "echo"]);
    assert_eq!(gateway.tools_for_agent("idle").await.len(), 4);

    // A broken mapping reports an error and keeps the previous one
    std::fs::write(&path, "{broken").unwrap();
    assert_eq!(gateway.reset().await, ServiceStatus::Error);
    assert_eq!(gateway.tools_for_agent("writer").await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_clears_catalog() {
    let connector = FakeConnector::new().with_backend("math", FakeBackend::math());
    let (gateway, _dir) = gateway(connector, &["math"]).await;

    gateway.shutdown().await;
    assert_eq!(gateway.health(), ServiceStatus::Unready);
    assert!(gateway.list_tools().await.is_empty());
}
