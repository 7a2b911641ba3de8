//! # Lease Queue HTTP API
//!
//! HTTP transport for the lease queue.
//!
//! This service provides:
//! - `POST /messages` to submit a message
//! - `GET /messages?qty=N` to lease a batch of available messages
//! - `PUT /messages/{id}` to acknowledge a leased message
//! - `GET /stats`, `GET /health` and `GET /metrics` for operators
//!
//! Request validation and the mapping of queue errors onto HTTP status codes
//! live here; lease semantics live in `lease-queue-core`.

pub mod config;
pub mod errors;
pub mod metrics;
pub mod responses;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

pub use config::{ConfigError, LoggingConfig, ServerConfig, ServiceConfig};
pub use errors::ApiError;
pub use metrics::ServiceMetrics;
pub use responses::{
    DeliveredMessage, ErrorResponse, HealthResponse, MessageIdResponse, ReceiveResponse,
    SendMessageRequest, StatsResponse,
};

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{Json, Response},
    routing::{get, put},
    Router,
};
use lease_queue_core::{MessageId, MessageQueue, QueueError, Timestamp};
use responses::ReceiveParams;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, instrument, warn};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: ServiceConfig,

    /// The queue behind the HTTP surface
    pub queue: Arc<dyn MessageQueue>,

    /// Metrics collector for observability
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: ServiceConfig,
        queue: Arc<dyn MessageQueue>,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        Self {
            config,
            queue,
            metrics,
        }
    }

    /// Create application state with a fresh metrics registry
    pub fn with_queue(
        config: ServiceConfig,
        queue: Arc<dyn MessageQueue>,
    ) -> Result<Self, ServiceError> {
        let metrics = ServiceMetrics::new().map_err(|e| {
            ServiceError::Configuration(ConfigError::Invalid {
                message: format!("Failed to initialize metrics: {}", e),
            })
        })?;

        Ok(Self::new(config, queue, metrics))
    }
}

// ============================================================================
// Router and Server
// ============================================================================

/// Build the HTTP router
pub fn create_router(state: AppState) -> Router {
    let message_routes = Router::new()
        .route("/messages", get(receive_messages).post(send_message))
        .route("/messages/{message_id}", put(acknowledge_message))
        .route("/messages/{message_id}/", put(acknowledge_message));

    let operator_routes = Router::new()
        .route("/stats", get(get_statistics))
        .route("/health", get(handle_health_check))
        .route("/metrics", get(metrics_endpoint));

    let server = &state.config.server;
    let mut router = Router::new()
        .merge(message_routes)
        .merge(operator_routes)
        .layer(DefaultBodyLimit::max(server.max_body_size))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            metrics_middleware,
        ))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http());

    if server.enable_compression {
        router = router.layer(CompressionLayer::new());
    }
    if server.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}

/// Start HTTP server and serve until SIGINT/SIGTERM
pub async fn start_server(
    config: ServiceConfig,
    queue: Arc<dyn MessageQueue>,
) -> Result<(), ServiceError> {
    let state = AppState::with_queue(config.clone(), queue)?;
    let app = create_router(state);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: address.clone(),
            message: e.to_string(),
        })?;

    info!(address = %address, "Starting HTTP server");

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        info!(
            timeout_seconds = shutdown_timeout.as_secs(),
            "Initiating graceful shutdown"
        );
        let _ = shutdown_tx.send(true);
    });

    // In-flight requests get `shutdown_timeout` to finish once the signal arrives
    let drain_deadline = async move {
        let _ = shutdown_rx.changed().await;
        tokio::time::sleep(shutdown_timeout).await;
    };

    tokio::select! {
        result = server.into_future() => {
            result.map_err(|e| ServiceError::ServerFailed {
                message: e.to_string(),
            })?;
        }
        _ = drain_deadline => {
            warn!("Graceful shutdown timed out; abandoning in-flight requests");
        }
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C)"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

/// Parse the `qty` query parameter.
///
/// Any finite number of at least 1 is accepted; fractions are rounded down,
/// so `2.7` leases at most two messages.
fn parse_quantity(raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let quantity = raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|qty| qty.is_finite() && *qty >= 1.0)
            .map(|qty| qty.floor() as i64)
    });

    match quantity {
        Some(qty) if qty >= 1 => Ok(Some(qty)),
        _ => Err(ApiError::bad_request(format!(
            "qty must be a number greater than or equal to 1, got '{}'",
            raw
        ))),
    }
}

/// Lease a batch of available messages
#[instrument(skip(state))]
async fn receive_messages(
    State(state): State<AppState>,
    Query(params): Query<ReceiveParams>,
) -> Result<Json<ReceiveResponse>, ApiError> {
    let quantity = parse_quantity(params.qty.as_deref())?;

    let messages = state.queue.receive_batch(quantity).await?;
    state
        .metrics
        .messages_delivered_total
        .inc_by(messages.len() as u64);

    Ok(Json(ReceiveResponse {
        messages: messages.into_iter().map(DeliveredMessage::from).collect(),
    }))
}

/// Submit a new message
#[instrument(skip_all)]
async fn send_message(
    State(state): State<AppState>,
    request: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<MessageIdResponse>, ApiError> {
    let Json(request) = request.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let body = request
        .message
        .ok_or_else(|| ApiError::bad_request("message is required"))?;

    let id = state.queue.submit(body, request.payload).await?;
    state.metrics.messages_submitted_total.inc();

    Ok(Json(MessageIdResponse { id }))
}

/// Acknowledge a leased message
#[instrument(skip(state))]
async fn acknowledge_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> Result<Json<MessageIdResponse>, ApiError> {
    let id: MessageId = message_id.parse().map_err(QueueError::from)?;

    match state.queue.acknowledge(&id).await {
        Ok(id) => {
            state.metrics.messages_acknowledged_total.inc();
            Ok(Json(MessageIdResponse { id }))
        }
        Err(e) => {
            state.metrics.record_rejected_acknowledgement(e.kind().as_str());
            Err(e.into())
        }
    }
}

// ============================================================================
// Operator Handlers
// ============================================================================

/// Message counts by lease state
#[instrument(skip(state))]
async fn get_statistics(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.queue.stats().await?;
    Ok(Json(stats.into()))
}

/// Basic health check endpoint
#[instrument(skip(state))]
async fn handle_health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Timestamp::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        lease_duration_ms: state.config.queue.lease_duration_ms,
    })
}

/// Prometheus metrics endpoint
#[instrument(skip_all)]
async fn metrics_endpoint(State(state): State<AppState>) -> Result<String, StatusCode> {
    state.metrics.encode().map_err(|e| {
        error!(error = %e, "Failed to encode metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware with correlation ID tracking
///
/// Extracts the `x-correlation-id` header or generates one, records it on the
/// request span, and echoes it on the response.
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::Span::current().record("correlation_id", correlation_id.as_str());
    request.extensions_mut().insert(correlation_id.clone());

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert("x-correlation-id", header_value);
    }

    let status = response.status();
    if status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}

/// Records request count and duration
async fn metrics_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    state
        .metrics
        .record_http_request(method.as_str(), response.status().as_u16(), start.elapsed());
    response
}

// ============================================================================
// Errors
// ============================================================================

/// Server lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}
