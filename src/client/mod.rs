//! Gateway Client
//!
//! Submits a tool call over HTTP and follows its event stream until the
//! task settles.

pub mod sse;

pub use sse::{SseDecoder, SseFrame};

use crate::domain::backend::ToolDescriptor;
use crate::domain::task::{TaskId, TaskRecord, TaskSnapshot, TaskStatus, ToolArgs};
use crate::error::{ClientError, ClientResult};
use crate::server::error::ApiErrorResponse;
use crate::server::{CallToolResponse, StatusResponse};
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Final outcome of a followed tool call
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Completed(Value),
    Failed(String),
    Cancelled,
    /// The task disappeared (reaped or never existed)
    Missing,
}

/// HTTP client for a running gateway
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: String,
    http: Client,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> ClientResult<StatusResponse> {
        let resp = self.http.get(self.url("/health")).send().await?;
        decode(resp).await
    }

    pub async fn list_tools(&self) -> ClientResult<Vec<ToolDescriptor>> {
        let resp = self.http.get(self.url("/get_tool")).send().await?;
        decode(resp).await
    }

    /// Submit a call and return the task id
    pub async fn call_tool(&self, tool: &str, args: &ToolArgs) -> ClientResult<TaskId> {
        let resp = self
            .http
            .post(self.url(&format!("/call_tool/{tool}")))
            .json(args)
            .send()
            .await?;
        let body: CallToolResponse = decode(resp).await?;
        Ok(body.task_id)
    }

    pub async fn cancel(&self, id: &TaskId) -> ClientResult<TaskRecord> {
        let resp = self.http.get(self.url(&format!("/cancel/{id}"))).send().await?;
        decode(resp).await
    }

    /// Follow `/callback/{id}` until a final status
    pub async fn wait(&self, id: &TaskId) -> ClientResult<CallOutcome> {
        let resp = self.http.get(self.url(&format!("/callback/{id}"))).send().await?;
        let resp = check(resp).await?;

        let mut stream = resp.bytes_stream();
        let mut decoder = SseDecoder::new();

        while let Some(chunk) = stream.next().await {
            for frame in decoder.push(&chunk?) {
                if let Some(outcome) = interpret(id, frame)? {
                    return Ok(outcome);
                }
            }
        }

        Err(ClientError::StreamEnded {
            task_id: id.to_string(),
        })
    }

    /// Submit a call and wait for its outcome
    pub async fn call_and_wait(&self, tool: &str, args: &ToolArgs) -> ClientResult<CallOutcome> {
        let id = self.call_tool(tool, args).await?;
        tracing::debug!(task_id = %id, tool, "Task created, following events");
        self.wait(&id).await
    }
}

fn interpret(id: &TaskId, frame: SseFrame) -> ClientResult<Option<CallOutcome>> {
    if frame.event.as_deref() == Some("error") {
        tracing::debug!(task_id = %id, message = %frame.data, "Task missing");
        return Ok(Some(CallOutcome::Missing));
    }

    let snapshot: TaskSnapshot =
        serde_json::from_str(&frame.data).map_err(|e| ClientError::Decode(e.to_string()))?;
    tracing::debug!(task_id = %id, status = %snapshot.status, "Status update");

    Ok(match snapshot.status {
        TaskStatus::Completed => Some(CallOutcome::Completed(snapshot.result.unwrap_or(Value::Null))),
        TaskStatus::Failed => Some(CallOutcome::Failed(snapshot.error.unwrap_or_default())),
        TaskStatus::Cancelled => Some(CallOutcome::Cancelled),
        TaskStatus::Pending | TaskStatus::Running => None,
    })
}

async fn check(resp: Response) -> ClientResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorResponse>(&text)
        .map(|body| body.error.message)
        .unwrap_or(text);
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> ClientResult<T> {
    let resp = check(resp).await?;
    Ok(resp.json().await?)
}
