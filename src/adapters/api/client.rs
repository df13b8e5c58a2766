//! Analytics ingestion API client

use crate::config::{ApiConfig, SecretString};
use crate::domain::{Result, StorefeedError, TransportError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::time::Duration;

/// What the ingestion endpoint answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Carries batch payloads to the ingestion endpoint
///
/// An HTTP error status is a normal response. Only failures to get any
/// response at all are errors.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// POST one batch payload
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] on connection failure, timeout, or when
    /// the request cannot be built.
    async fn post_batch(&self, payload: &Value) -> Result<TransportResponse>;

    /// Human-readable target for logs
    fn describe(&self) -> String;
}

/// `reqwest`-backed transport with bearer authentication
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    token: SecretString,
}

impl HttpTransport {
    /// Build a transport from the API configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(30)))
            .user_agent(concat!("storefeed/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                StorefeedError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
        })
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(error.to_string())
    } else if error.is_builder() {
        TransportError::InvalidRequest(error.to_string())
    } else {
        TransportError::ConnectionFailed(error.to_string())
    }
}

/// Body of a received response
///
/// The status code was already received, so the attempt is still recorded
/// when the body cannot be read; the read failure becomes the body.
fn response_body<E: std::fmt::Display>(
    status: u16,
    body: std::result::Result<String, E>,
) -> String {
    match body {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(status, error = %e, "Failed to read response body");
            format!("unreadable response body: {e}")
        }
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn post_batch(&self, payload: &Value) -> Result<TransportResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.token.expose_secret().as_ref())
            .json(payload)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let body = response_body(status, response.text().await);

        tracing::debug!(status, endpoint = %self.endpoint, "Batch POST answered");
        Ok(TransportResponse { status, body })
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}

/// Transport that never touches the network and accepts everything
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunTransport;

#[async_trait]
impl ApiTransport for DryRunTransport {
    async fn post_batch(&self, payload: &Value) -> Result<TransportResponse> {
        tracing::info!(
            events = payload.as_array().map(Vec::len).unwrap_or(0),
            "Dry run: batch not sent"
        );
        Ok(TransportResponse {
            status: 200,
            body: String::new(),
        })
    }

    fn describe(&self) -> String {
        "dry run".to_string()
    }
}
