//! Logging Initialization
//!
//! Configures tracing-subscriber for structured logging.
//!
//! `TOOLGATE_LOG` overrides the configured level with a full filter
//! directive (e.g. `toolgate=debug,rmcp=warn`).

use crate::app::config::LoggingConfig;
use crate::error::{GatewayError, Result};
use std::path::PathBuf;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, time::SystemTime},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Environment variable overriding the log filter
pub const LOG_ENV: &str = "TOOLGATE_LOG";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Keeps the background file writer alive; drop it on shutdown to flush
#[derive(Default)]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Initialize the logging system based on configuration
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "toolgate={level},tower_http={level}",
            level = parse_level(&config.level).as_str().to_lowercase()
        ))
    });

    let format = LogFormat::parse(&config.format);
    let console_layer = console_layer(config, format);

    let (file_layer, guard) = if config.file_output {
        let log_dir = config.file_path.clone().unwrap_or_else(default_log_dir);
        std::fs::create_dir_all(&log_dir)?;

        let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "toolgate.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| GatewayError::Logging(e.to_string()))?;

    tracing::info!(
        target: "toolgate::init",
        level = %config.level,
        format = ?format,
        file_output = config.file_output,
        "Logging initialized"
    );

    Ok(LoggingGuard { _file: guard })
}

fn console_layer<S>(config: &LoggingConfig, format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_level(true)
                .with_file(config.file_line)
                .with_line_number(config.file_line)
                .with_current_span(true);
            if config.timestamps {
                layer.with_timer(SystemTime).boxed()
            } else {
                layer.without_time().boxed()
            }
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_target(true)
                .with_level(true)
                .with_file(config.file_line)
                .with_line_number(config.file_line)
                .with_ansi(true);
            if config.timestamps {
                layer.with_timer(SystemTime).boxed()
            } else {
                layer.without_time().boxed()
            }
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(config.file_line)
                .with_line_number(config.file_line)
                .with_ansi(true);
            if config.timestamps {
                layer.with_timer(SystemTime).boxed()
            } else {
                layer.without_time().boxed()
            }
        }
    }
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("toolgate")
        .join("logs")
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("Info"), Level::INFO);
        assert_eq!(parse_level("warning"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
        assert_eq!(parse_level("unknown"), Level::INFO);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("COMPACT"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("other"), LogFormat::Pretty);
    }
}
