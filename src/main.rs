//! toolgate - Tool Invocation Gateway
//!
//! Serves the aggregated MCP tool catalog over HTTP and runs tool calls
//! as tracked background tasks.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolgate::app::{init_logging, GatewayConfig};
use toolgate::client::{CallOutcome, GatewayClient};
use toolgate::gateway::Gateway;
use toolgate::infrastructure::mcp::McpConnector;
use toolgate::server;

#[derive(Debug, Parser)]
#[command(name = "toolgate", version, about = "Tool invocation gateway for MCP backends")]
struct Cli {
    /// Configuration file (defaults to TOOLGATE_CONFIG, ./toolgate.toml, then the user config dir)
    #[arg(long, short, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the gateway (default when no subcommand is given)
    Serve(ServeArgs),
    /// Call a tool on a running gateway and wait for the result
    Call {
        /// Tool name
        tool: String,
        /// Arguments as a JSON object
        #[arg(long, value_name = "JSON", default_value = "{}")]
        args: String,
        /// Gateway base URL (defaults to the configured server address)
        #[arg(long, value_name = "URL")]
        url: Option<String>,
    },
}

#[derive(Debug, Default, clap::Args)]
struct ServeArgs {
    /// Bind address (overrides config)
    #[arg(long, value_name = "HOST")]
    host: Option<String>,
    /// Bind port (overrides config)
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = GatewayConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => {
            if let Some(host) = args.host {
                config.server.host = host;
            }
            if let Some(port) = args.port {
                config.server.port = port;
            }
            run_server(config).await
        }
        Commands::Call { tool, args, url } => {
            let url = url.unwrap_or_else(|| format!("http://{}", config.server.bind_address()));
            run_call(&url, &tool, &args).await
        }
    }
}

async fn run_server(config: GatewayConfig) -> Result<()> {
    let _log_guard = init_logging(&config.logging)?;

    let gateway = Arc::new(Gateway::new(&config, Arc::new(McpConnector))?);

    {
        let gateway = gateway.clone();
        tokio::spawn(async move {
            let report = gateway.refresh().await;
            for failure in &report.unavailable {
                tracing::warn!(error = %failure, "Backend skipped");
            }
        });
    }

    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown requested");
                    token.cancel();
                }
                Err(e) => tracing::warn!(error = %e, "Cannot listen for Ctrl-C"),
            }
        });
    }

    let addr = config.server.bind_address();
    let served = server::serve(&addr, gateway.clone(), token.cancelled_owned()).await;

    gateway.shutdown().await;
    served.with_context(|| format!("serving on {addr}"))?;
    Ok(())
}

async fn run_call(url: &str, tool: &str, raw_args: &str) -> Result<()> {
    let args = match serde_json::from_str::<Value>(raw_args).context("parsing --args")? {
        Value::Object(args) => args,
        _ => bail!("--args must be a JSON object"),
    };

    let client = GatewayClient::new(url);
    match client.call_and_wait(tool, &args).await? {
        CallOutcome::Completed(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        CallOutcome::Failed(error) => bail!("tool '{tool}' failed: {error}"),
        CallOutcome::Cancelled => bail!("tool '{tool}' was cancelled"),
        CallOutcome::Missing => bail!("task for '{tool}' does not exist or has been cleared"),
    }
}
