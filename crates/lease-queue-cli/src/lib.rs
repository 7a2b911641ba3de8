//! # Lease Queue CLI
//!
//! Command-line client for the lease queue HTTP service.
//!
//! This module provides CLI commands for:
//! - Submitting messages
//! - Leasing and acknowledging messages
//! - Inspecting queue statistics and service health
//! - Generating shell completions

pub mod client;

use clap::{CommandFactory, Parser, Subcommand};
use lease_queue_api::{DeliveredMessage, HealthResponse, StatsResponse};
use lease_queue_core::MessageId;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

pub use client::LeaseQueueClient;

// ============================================================================
// CLI Structure
// ============================================================================

/// Lease Queue CLI - produce and consume messages on a lease queue
#[derive(Parser)]
#[command(name = "lease-queue")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Client for the lease queue service")]
#[command(
    long_about = "Submits, leases and acknowledges messages on a lease queue service. \
                  Leased messages that are not acknowledged in time are redelivered."
)]
pub struct Cli {
    /// Base URL of the lease queue service
    #[arg(
        short,
        long,
        global = true,
        env = "LEASE_QUEUE_URL",
        default_value = "http://localhost:8080"
    )]
    pub server_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value = "10")]
    pub timeout: u64,

    /// Logging level
    #[arg(short, long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a message
    Send {
        /// Message text
        message: String,

        /// Auxiliary JSON payload delivered with the message
        #[arg(short, long, value_parser = parse_json)]
        payload: Option<serde_json::Value>,
    },

    /// Lease available messages
    Receive {
        /// Maximum number of messages to lease; all available when omitted
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        qty: Option<u32>,
    },

    /// Acknowledge a leased message
    Ack {
        /// Identifier of the leased message
        id: String,
    },

    /// Show message counts
    Stats,

    /// Check service health
    Health,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

fn parse_json(raw: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("payload is not valid JSON: {}", e))
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Request(_) => 1,
            CliError::Server { .. } => 2,
            CliError::InvalidArgument { .. } => 3,
            CliError::Serialization(_) => 4,
            CliError::Io(_) => 5,
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    initialize_logging(&cli.log_level);

    let output = execute(cli).await?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

/// Run a parsed command and return the text to print
pub async fn execute(cli: Cli) -> Result<String, CliError> {
    let format = cli.format;

    if let Commands::Completions { shell } = cli.command {
        info!(shell = ?shell, "Generating shell completions");
        clap_complete::generate(
            shell,
            &mut Cli::command(),
            "lease-queue",
            &mut std::io::stdout(),
        );
        return Ok(String::new());
    }

    let client = LeaseQueueClient::new(&cli.server_url, Duration::from_secs(cli.timeout))?;
    debug!(server_url = %client.base_url(), "Connecting to lease queue service");

    match cli.command {
        Commands::Send { message, payload } => {
            let id = client.send(&message, payload).await?;
            info!(message_id = %id, "Message submitted");
            render_id(&id, "Submitted", format)
        }
        Commands::Receive { qty } => {
            let messages = client.receive(qty).await?;
            info!(count = messages.len(), "Messages leased");
            render_messages(&messages, format)
        }
        Commands::Ack { id } => {
            let id: MessageId = id.parse().map_err(|e| CliError::InvalidArgument {
                arg: "id".to_string(),
                message: format!("{}", e),
            })?;
            let id = client.acknowledge(&id).await?;
            info!(message_id = %id, "Message acknowledged");
            render_id(&id, "Acknowledged", format)
        }
        Commands::Stats => render_stats(&client.stats().await?, format),
        Commands::Health => render_health(&client.health().await?, format),
        Commands::Completions { .. } => Ok(String::new()),
    }
}

fn initialize_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Output goes to stdout, so diagnostics go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// ============================================================================
// Output Rendering
// ============================================================================

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn render_id(id: &MessageId, verb: &str, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => to_json(&serde_json::json!({ "id": id })),
        OutputFormat::Text => Ok(format!("{} {}", verb, id)),
    }
}

fn render_messages(
    messages: &[DeliveredMessage],
    format: OutputFormat,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => to_json(messages),
        OutputFormat::Text if messages.is_empty() => Ok("No messages available".to_string()),
        OutputFormat::Text => {
            let mut lines = Vec::with_capacity(messages.len());
            for message in messages {
                let payload = match &message.payload {
                    Some(payload) => serde_json::to_string(payload)?,
                    None => "-".to_string(),
                };
                lines.push(format!("{}\t{}\t{}", message.id, message.message, payload));
            }
            Ok(lines.join("\n"))
        }
    }
}

fn render_stats(stats: &StatsResponse, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => to_json(stats),
        OutputFormat::Text => Ok(format!(
            "total:     {}\navailable: {}\nleased:    {}",
            stats.total, stats.available, stats.leased
        )),
    }
}

fn render_health(health: &HealthResponse, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => to_json(health),
        OutputFormat::Text => Ok(format!(
            "{} (version {}, lease {} ms)",
            health.status, health.version, health.lease_duration_ms
        )),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
