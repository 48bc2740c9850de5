//! Backend Server Configuration
//!
//! Configuration types for tool-provider (MCP server) connections.

use crate::error::{BackendError, BackendResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Transport type for a backend connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum McpTransport {
    /// Standard I/O transport (child process)
    Stdio {
        /// Command to execute
        command: String,
        /// Command arguments
        #[serde(default)]
        args: Vec<String>,
        /// Working directory
        #[serde(default)]
        working_dir: Option<PathBuf>,
        /// Environment variables
        #[serde(default)]
        env: HashMap<String, String>,
    },
    /// Script run over stdio; the interpreter is picked from the extension
    Script {
        /// Path to a `.py` or `.js` server script
        script: PathBuf,
        /// Virtual environment used for `.py` scripts
        #[serde(default)]
        venv: Option<PathBuf>,
    },
    /// Streamable HTTP transport
    Http {
        /// Endpoint URL
        url: String,
    },
}

/// Backend server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Unique backend name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Transport configuration
    pub transport: McpTransport,
    /// Disabled backends are skipped on refresh
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Connect + catalog timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_timeout() -> u64 {
    30000 // 30 seconds
}

fn default_true() -> bool {
    true
}

/// A fully resolved child-process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: HashMap<String, String>,
}

impl McpServerConfig {
    /// Create a new stdio backend configuration
    pub fn stdio(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self::with_transport(
            name,
            McpTransport::Stdio {
                command: command.into(),
                args: Vec::new(),
                working_dir: None,
                env: HashMap::new(),
            },
        )
    }

    /// Create a new script backend configuration
    pub fn script(name: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self::with_transport(
            name,
            McpTransport::Script {
                script: script.into(),
                venv: None,
            },
        )
    }

    /// Create a new HTTP backend configuration
    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::with_transport(name, McpTransport::Http { url: url.into() })
    }

    fn with_transport(name: impl Into<String>, transport: McpTransport) -> Self {
        Self {
            name: name.into(),
            description: None,
            transport,
            enabled: true,
            timeout_ms: default_timeout(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Enable or disable the backend
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Add command arguments (for stdio transport)
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        if let McpTransport::Stdio { args: ref mut a, .. } = self.transport {
            *a = args;
        }
        self
    }

    /// Add environment variable (for stdio transport)
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let McpTransport::Stdio { env: ref mut e, .. } = self.transport {
            e.insert(key.into(), value.into());
        }
        self
    }

    /// Set the virtual environment (for script transport)
    pub fn with_venv(mut self, dir: impl Into<PathBuf>) -> Self {
        if let McpTransport::Script { venv: ref mut v, .. } = self.transport {
            *v = Some(dir.into());
        }
        self
    }

    /// Check if this backend is reached over HTTP
    pub fn is_http(&self) -> bool {
        matches!(self.transport, McpTransport::Http { .. })
    }

    /// Resolve the child process to spawn; `None` for HTTP backends
    pub fn process_spec(&self) -> BackendResult<Option<ProcessSpec>> {
        match &self.transport {
            McpTransport::Stdio {
                command,
                args,
                working_dir,
                env,
            } => Ok(Some(ProcessSpec {
                command: command.clone(),
                args: args.clone(),
                working_dir: working_dir.clone(),
                env: env.clone(),
            })),
            McpTransport::Script { script, venv } => {
                resolve_script(script, venv.as_deref()).map(Some)
            }
            McpTransport::Http { .. } => Ok(None),
        }
    }
}

fn venv_bin_dir(venv: &Path) -> PathBuf {
    if cfg!(windows) {
        venv.join("Scripts")
    } else {
        venv.join("bin")
    }
}

fn venv_python(venv: &Path) -> PathBuf {
    if cfg!(windows) {
        venv_bin_dir(venv).join("python.exe")
    } else {
        venv_bin_dir(venv).join("python")
    }
}

/// Pick the interpreter for a server script.
///
/// `.py` uses the venv interpreter when a venv is given (its bin dir is
/// prepended to `PATH`), plain `python` otherwise. `.js` uses `node`.
fn resolve_script(script: &Path, venv: Option<&Path>) -> BackendResult<ProcessSpec> {
    let extension = script.extension().and_then(|e| e.to_str()).unwrap_or("");
    let script_arg = script.to_string_lossy().to_string();

    match extension {
        "py" => {
            let mut env = HashMap::new();
            let command = match venv {
                Some(venv) => {
                    let python = venv_python(venv);
                    if !python.exists() {
                        return Err(BackendError::InvalidConfig(format!(
                            "Python interpreter not found in virtual environment: {}",
                            python.display()
                        )));
                    }
                    let inherited = std::env::var_os("PATH").unwrap_or_default();
                    let mut paths = vec![venv_bin_dir(venv)];
                    paths.extend(std::env::split_paths(&inherited));
                    let joined = std::env::join_paths(paths)
                        .map_err(|e| BackendError::InvalidConfig(e.to_string()))?;
                    env.insert("PATH".to_string(), joined.to_string_lossy().to_string());
                    python.to_string_lossy().to_string()
                }
                None => "python".to_string(),
            };
            Ok(ProcessSpec {
                command,
                args: vec![script_arg],
                working_dir: None,
                env,
            })
        }
        "js" => Ok(ProcessSpec {
            command: "node".to_string(),
            args: vec![script_arg],
            working_dir: None,
            env: HashMap::new(),
        }),
        _ => Err(BackendError::InvalidConfig(format!(
            "Server script must be a .py or .js file: {}",
            script.display()
        ))),
    }
}
