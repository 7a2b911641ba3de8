//! HTTP client for the lease queue service.

use crate::CliError;
use lease_queue_api::{
    DeliveredMessage, ErrorResponse, HealthResponse, MessageIdResponse, ReceiveResponse,
    SendMessageRequest, StatsResponse,
};
use lease_queue_core::MessageId;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Thin wrapper over the service's HTTP routes
#[derive(Debug, Clone)]
pub struct LeaseQueueClient {
    base_url: String,
    http: reqwest::Client,
}

impl LeaseQueueClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CliError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(CliError::InvalidArgument {
                arg: "server-url".to_string(),
                message: format!("'{}' is not an http(s) URL", base_url),
            });
        }

        reqwest::Url::parse(trimmed).map_err(|e| CliError::InvalidArgument {
            arg: "server-url".to_string(),
            message: format!("'{}' is not a valid URL: {}", base_url, e),
        })?;

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: trimmed.to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL of a single message, with the id escaped as one path segment
    fn message_url(&self, id: &MessageId) -> Result<reqwest::Url, CliError> {
        let invalid = |message: String| CliError::InvalidArgument {
            arg: "server-url".to_string(),
            message,
        };

        let mut url = reqwest::Url::parse(&self.url("/messages")).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("'{}' cannot carry a path", self.base_url)))?
            .push(id.as_str());
        Ok(url)
    }

    /// Submit a message, returning its identifier
    pub async fn send(
        &self,
        message: &str,
        payload: Option<serde_json::Value>,
    ) -> Result<MessageId, CliError> {
        let request = SendMessageRequest {
            message: Some(message.to_string()),
            payload,
        };

        let response = self
            .http
            .post(self.url("/messages"))
            .json(&request)
            .send()
            .await?;
        let body: MessageIdResponse = decode(response).await?;
        Ok(body.id)
    }

    /// Lease up to `qty` messages; `None` leases all available
    pub async fn receive(&self, qty: Option<u32>) -> Result<Vec<DeliveredMessage>, CliError> {
        let mut request = self.http.get(self.url("/messages"));
        if let Some(qty) = qty {
            request = request.query(&[("qty", qty)]);
        }

        let body: ReceiveResponse = decode(request.send().await?).await?;
        Ok(body.messages)
    }

    /// Acknowledge a leased message
    pub async fn acknowledge(&self, id: &MessageId) -> Result<MessageId, CliError> {
        let response = self
            .http
            .put(self.message_url(id)?)
            .send()
            .await?;
        let body: MessageIdResponse = decode(response).await?;
        Ok(body.id)
    }

    pub async fn stats(&self) -> Result<StatsResponse, CliError> {
        decode(self.http.get(self.url("/stats")).send().await?).await
    }

    pub async fn health(&self) -> Result<HealthResponse, CliError> {
        decode(self.http.get(self.url("/health")).send().await?).await
    }
}

/// Decode a success body, or turn an error body into [`CliError::Server`]
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, CliError> {
    let status = response.status();
    debug!(status = %status, url = %response.url(), "Received response");

    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let text = response.text().await?;
    let message = match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(error) => error.error,
        Err(_) if text.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => text,
    };

    Err(CliError::Server {
        status: status.as_u16(),
        message,
    })
}
