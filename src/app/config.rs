//! Configuration Management
//!
//! Loads the gateway configuration from a TOML file. Every field has a
//! default, so an empty file (or no file at all) yields a usable config.

use crate::error::{ConfigError, ConfigResult};
use crate::infrastructure::mcp::McpServerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "TOOLGATE_CONFIG";

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Task bookkeeping settings
    #[serde(default)]
    pub tasks: TaskConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Path to the JSON agent -> tool names mapping
    #[serde(default = "default_agent_tools")]
    pub agent_tools: PathBuf,

    /// Tool backends, in registration order
    #[serde(default)]
    pub backends: Vec<McpServerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Interval between status polls of a subscribed task
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long a finished task stays queryable
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "json", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Include timestamps
    #[serde(default = "default_true")]
    pub timestamps: bool,

    /// Include file/line info
    #[serde(default)]
    pub file_line: bool,

    /// Also write a daily-rotated log file
    #[serde(default)]
    pub file_output: bool,

    /// Log file directory
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8848
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_grace_period_secs() -> u64 {
    300
}

fn default_agent_tools() -> PathBuf {
    PathBuf::from("config/agent_tools.json")
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            tasks: TaskConfig::default(),
            logging: LoggingConfig::default(),
            agent_tools: default_agent_tools(),
            backends: Vec::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            grace_period_secs: default_grace_period_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            timestamps: true,
            file_line: false,
            file_output: false,
            file_path: None,
        }
    }
}

impl TaskConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    #[must_use]
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl GatewayConfig {
    /// Load configuration, searching the usual locations.
    ///
    /// Order: explicit path, `TOOLGATE_CONFIG`, `./toolgate.toml`,
    /// `<config dir>/toolgate/config.toml`, then built-in defaults.
    /// An explicit path (flag or env) must exist.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            return Self::load_with_file(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return Self::load_with_file(&expand_path(Path::new(&path)));
            }
        }

        for candidate in Self::search_paths() {
            if candidate.is_file() {
                return Self::load_with_file(&candidate);
            }
        }

        tracing::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_with_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml(&contents)?;
        tracing::info!(path = %path.display(), backends = config.backends.len(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("toolgate.toml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("toolgate").join("config.toml"));
        }
        paths
    }

    /// Reject configurations that would register ambiguous backends
    pub fn validate(&self) -> ConfigResult<()> {
        let mut seen = std::collections::HashSet::new();
        for backend in &self.backends {
            if backend.name.trim().is_empty() {
                return Err(ConfigError::Invalid("backend name must not be empty".into()));
            }
            if !seen.insert(backend.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate backend name '{}'",
                    backend.name
                )));
            }
        }
        Ok(())
    }

    /// Agent tools path with `~` and env vars expanded
    #[must_use]
    pub fn agent_tools_path(&self) -> PathBuf {
        expand_path(&self.agent_tools)
    }
}

/// Expand `~` and `$VARS` in a path, leaving it untouched on failure
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}
