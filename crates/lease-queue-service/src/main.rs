//! # Lease Queue Service
//!
//! Binary entry point for the lease queue HTTP service.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes structured logging
//! - Creates the in-memory queue
//! - Starts the HTTP server from lease-queue-api
//!
//! Exit codes: `1` bind failure, `2` server failure, `3` configuration error.

use lease_queue_api::{start_server, LoggingConfig, ServiceConfig, ServiceError};
use lease_queue_core::QueueService;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

/// Operator-specified configuration file
const CONFIG_FILE_ENV: &str = "LQ_CONFIG_FILE";

#[tokio::main]
async fn main() {
    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (later sources override earlier ones):
    //  1. /etc/lease-queue/service.yaml
    //  2. ./config/service.yaml
    //  3. Path given by LQ_CONFIG_FILE
    //  4. Environment variables prefixed LQ__, e.g. LQ__SERVER__PORT=9090
    //  5. MESSAGE_PROCESSING_TIME_MS for the lease duration
    //
    // Logging is configured from the result, so a load failure is reported
    // through a default subscriber.
    // -------------------------------------------------------------------------
    let explicit_path = config_path_from_env();
    let service_config = match ServiceConfig::load(explicit_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            error!(error = %e, "Service configuration is invalid; aborting");
            std::process::exit(3);
        }
    };

    init_tracing(&service_config.logging);

    info!("Starting lease queue service");
    if let Some(path) = &explicit_path {
        info!(path = %path.display(), "Loaded configuration from explicit path");
    }

    let queue = Arc::new(QueueService::from_config(&service_config.queue));

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        lease_duration_ms = service_config.queue.lease_duration_ms,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(service_config, queue).await {
        error!("Server terminated with error: {}", e);
        std::process::exit(exit_code(&e));
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var_os(CONFIG_FILE_ENV)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
}

/// Default filter directives when `RUST_LOG` is not set
fn default_filter(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    format!(
        "lease_queue_service={level},lease_queue_api={level},lease_queue_core={level},tower_http=debug"
    )
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&logging.level).into());

    let (json, plain) = if logging.json_format {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .init();
}

fn exit_code(error: &ServiceError) -> i32 {
    match error {
        ServiceError::BindFailed { .. } => 1,
        ServiceError::ServerFailed { .. } => 2,
        ServiceError::Configuration(_) => 3,
    }
}
