//! Common test utilities for lease-queue integration tests
//!
//! This module provides:
//! - A router-backed test harness over a real `QueueService`
//! - Request helpers returning status and decoded JSON body
//! - A helper that serves the router on an ephemeral port

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use lease_queue_api::{create_router, AppState, ServiceConfig};
use lease_queue_core::QueueService;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Router over a fresh in-memory queue
pub struct TestApp {
    pub router: Router,
    #[allow(dead_code)]
    pub state: AppState,
}

impl TestApp {
    pub fn with_lease(lease: Duration) -> Self {
        let mut config = ServiceConfig::default();
        config.queue.lease_duration_ms = lease.as_millis() as u64;

        let queue = Arc::new(QueueService::from_config(&config.queue));
        let state = AppState::with_queue(config, queue).expect("app state");

        Self {
            router: create_router(state.clone()),
            state,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    /// Submit a message and return its identifier
    pub async fn submit(&self, text: &str) -> String {
        let request = Request::builder()
            .method("POST")
            .uri("/messages")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "message": text }).to_string()))
            .unwrap();

        let (status, body) = self.request(request).await;
        assert_eq!(status, StatusCode::OK, "submit failed: {body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Lease messages and return `(id, message)` pairs
    pub async fn receive(&self, qty: Option<u32>) -> Vec<(String, String)> {
        let uri = match qty {
            Some(qty) => format!("/messages?qty={qty}"),
            None => "/messages".to_string(),
        };
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

        let (status, body) = self.request(request).await;
        assert_eq!(status, StatusCode::OK, "receive failed: {body}");
        body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| {
                (
                    m["id"].as_str().unwrap().to_string(),
                    m["message"].as_str().unwrap().to_string(),
                )
            })
            .collect()
    }

    pub async fn acknowledge(&self, id: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("PUT")
            .uri(format!("/messages/{id}"))
            .body(Body::empty())
            .unwrap();
        self.request(request).await
    }

    #[allow(dead_code)]
    pub async fn stats(&self) -> Value {
        let request = Request::builder().uri("/stats").body(Body::empty()).unwrap();
        self.request(request).await.1
    }
}

/// Serve the router on an ephemeral local port, returning its base URL
#[allow(dead_code)]
pub async fn serve(app: &TestApp) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let router = app.router.clone();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{address}")
}
