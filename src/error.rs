//! Toolgate Error Types
//!
//! Centralized error handling using thiserror for type-safe errors.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::task::{TaskId, TaskStatus};

/// Top-level error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Tool '{tool}' not found")]
    ToolNotFound { tool: String },

    #[error("Backend '{backend}' unavailable: {reason}")]
    BackendUnavailable { backend: String, reason: String },

    #[error("Task '{id}' does not exist or has been cleared")]
    TaskNotFound { id: String },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging initialization failed: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a backend session (connection or tool execution)
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    #[error("Connection failed to backend '{backend}': {reason}")]
    ConnectionFailed { backend: String, reason: String },

    #[error("Backend '{backend}' not responding (timeout: {timeout_ms}ms)")]
    Timeout { backend: String, timeout_ms: u64 },

    #[error("Tool call failed: {tool} - {error}")]
    ToolCallFailed { tool: String, error: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid backend configuration: {0}")]
    InvalidConfig(String),
}

/// Task bookkeeping errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Task '{id}' not found")]
    NotFound { id: TaskId },

    #[error("Invalid task state transition: {from} -> {to}")]
    InvalidStateTransition { from: TaskStatus, to: TaskStatus },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the HTTP gateway client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gateway returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed event from gateway: {0}")]
    Decode(String),

    #[error("Event stream for task '{task_id}' ended before a final status")]
    StreamEnded { task_id: String },
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Result type alias for backend operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Result type alias for task operations
pub type TaskResult<T> = std::result::Result<T, TaskError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for client operations
pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackendError::Timeout {
            backend: "math".to_string(),
            timeout_ms: 500,
        };
        assert_eq!(err.to_string(), "Backend 'math' not responding (timeout: 500ms)");

        let err = GatewayError::ToolNotFound {
            tool: "does_not_exist".to_string(),
        };
        assert_eq!(err.to_string(), "Tool 'does_not_exist' not found");
    }

    #[test]
    fn test_error_conversion() {
        let backend_err = BackendError::ConnectionFailed {
            backend: "search".to_string(),
            reason: "spawn failed".to_string(),
        };
        let err: GatewayError = backend_err.into();
        assert!(matches!(err, GatewayError::Backend(_)));
    }

    #[test]
    fn test_transition_error_display() {
        let err = TaskError::InvalidStateTransition {
            from: TaskStatus::Completed,
            to: TaskStatus::Running,
        };
        assert_eq!(err.to_string(), "Invalid task state transition: completed -> running");
    }
}
