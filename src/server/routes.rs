//! HTTP handlers

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ApiError;
use super::AppState;
use crate::domain::backend::ToolDescriptor;
use crate::domain::task::{StreamEvent, TaskId, TaskRecord, ToolArgs};
use crate::error::GatewayError;
use crate::gateway::ServiceStatus;

/// Data of the `error` event sent for unknown or reaped tasks
pub const MISSING_TASK_MESSAGE: &str = "The task does not exist or has been cleared.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: ServiceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResponse {
    pub task_id: TaskId,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.health(),
    })
}

pub(crate) async fn reset(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.reset().await,
    })
}

pub(crate) async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolDescriptor>> {
    Json(state.list_tools().await)
}

pub(crate) async fn agent_tools(
    State(state): State<AppState>,
    Path(agent): Path<String>,
) -> Json<Vec<ToolDescriptor>> {
    Json(state.tools_for_agent(&agent).await)
}

pub(crate) async fn call_tool(
    State(state): State<AppState>,
    Path(tool): Path<String>,
    body: Bytes,
) -> Result<Json<CallToolResponse>, ApiError> {
    let args = parse_args(&body)?;
    let task_id = state.call_tool(&tool, args).await?;
    Ok(Json(CallToolResponse { task_id }))
}

/// Empty body means no arguments; anything else must be a JSON object
fn parse_args(body: &[u8]) -> Result<ToolArgs, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ToolArgs::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(args)) => Ok(args),
        Ok(_) => Err(ApiError::bad_request("tool arguments must be a JSON object")),
        Err(e) => Err(ApiError::bad_request(format!("invalid JSON body: {e}"))),
    }
}

pub(crate) async fn callback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let events: BoxStream<'static, StreamEvent> = match id.parse::<TaskId>() {
        Ok(id) => state.subscribe(id).boxed(),
        Err(_) => stream::iter([StreamEvent::Missing]).boxed(),
    };

    Sse::new(events.map(to_sse_event)).keep_alive(KeepAlive::default())
}

fn to_sse_event(event: StreamEvent) -> Result<Event, axum::Error> {
    match event {
        StreamEvent::Snapshot(snapshot) => Event::default().json_data(snapshot),
        StreamEvent::Missing => Ok(Event::default().event("error").data(MISSING_TASK_MESSAGE)),
    }
}

pub(crate) async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskRecord>, ApiError> {
    let id = parse_task_id(&id)?;
    Ok(Json(state.cancel(&id).await?))
}

pub(crate) async fn task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskRecord>, ApiError> {
    let id = parse_task_id(&id)?;
    Ok(Json(state.task(&id).await?))
}

/// Malformed ids can never name a task, so they read as not-found
fn parse_task_id(raw: &str) -> Result<TaskId, ApiError> {
    raw.parse().map_err(|_| {
        GatewayError::TaskNotFound {
            id: raw.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_args() {
        assert!(parse_args(b"").unwrap().is_empty());
        assert!(parse_args(b"  \n").unwrap().is_empty());
        assert_eq!(
            Value::Object(parse_args(br#"{"a": 1.23456}"#).unwrap()),
            json!({"a": 1.23456})
        );
        assert_eq!(parse_args(b"[1, 2]").unwrap_err().status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(parse_args(b"{oops").unwrap_err().status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_task_id() {
        assert!(parse_task_id("nope").is_err());
        let id = TaskId::new();
        assert_eq!(parse_task_id(&id.to_string()).unwrap(), id);
    }
}
