//! Accident-risk prediction client
//!
//! The prediction service may be reachable through several addresses (tunnel,
//! emulator host alias, localhost) and which one works is only known at run
//! time. `PredictionClient` tries them in priority order, one request each,
//! and returns the first prediction it gets.

mod models;
pub mod advisory;
pub use models::*;
pub use advisory::advisory_for;

use std::time::Instant;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::Client;

use crate::config::{Endpoint, PredictionConfig};
use crate::core::{ClientBuilder, PredictionSource, ServiceClient};
use crate::error::{AttemptFailure, ErrorContext, Result, ServiceError};
use crate::services::common::{build_http_client, parse_error_response};
use crate::util::{generate_scan_id, join_url, measure_time_async};

/// Endpoint-fallback client for `GET /predict`
#[derive(Debug, Clone)]
pub struct PredictionClient {
    /// HTTP client carrying the timeout and default headers
    http_client: Client,

    /// Candidate endpoints in priority order
    endpoints: Vec<Endpoint>,

    /// Path requested on every endpoint
    request_path: String,
}

impl PredictionClient {
    /// Create a client from a validated configuration
    pub fn new_with_config(config: &PredictionConfig) -> Result<Self> {
        config.validate()?;

        let http_client = build_http_client(None, config.timeout)?;

        Ok(Self::from_parts(
            http_client,
            config.endpoints.clone(),
            config.request_path.clone(),
        ))
    }

    /// Create a new builder for the prediction client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_parts(http_client: Client, endpoints: Vec<Endpoint>, request_path: String) -> Self {
        Self {
            http_client,
            endpoints,
            request_path,
        }
    }

    /// One request against one endpoint, no retry
    async fn attempt(&self, endpoint: &Endpoint) -> Result<PredictionResult> {
        let url = join_url(&endpoint.url, &self.request_path);

        let response = self.http_client
            .get(&url)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(parse_error_response(response).await);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(ServiceError::parsing("Empty response body"));
        }

        let json: serde_json::Value = serde_json::from_str(&body)?;
        if !json.is_object() {
            return Err(ServiceError::parsing("Response body is not a JSON object"));
        }

        let payload: PredictionPayload = serde_json::from_value(json)?;
        Ok(payload.normalize())
    }
}

#[async_trait]
impl PredictionSource for PredictionClient {
    async fn scan(&self) -> Result<ScanOutcome> {
        let scan_id = generate_scan_id();
        let started = Instant::now();
        let mut failures = Vec::with_capacity(self.endpoints.len());

        for endpoint in &self.endpoints {
            debug!("[scan {}] Attempting: {}", scan_id, endpoint);

            let (result, took) = measure_time_async(|| self.attempt(endpoint)).await;

            match result {
                Ok(prediction) => {
                    let elapsed = started.elapsed();
                    info!(
                        "[scan {}] Connected to {} after {} failed attempt(s) in {}ms",
                        scan_id,
                        endpoint.label,
                        failures.len(),
                        elapsed.as_millis()
                    );

                    return Ok(ScanOutcome {
                        prediction,
                        endpoint: endpoint.clone(),
                        elapsed,
                        failures,
                    });
                }
                Err(err) => {
                    warn!("[scan {}] Failed {} after {}ms: {}", scan_id, endpoint.label, took.as_millis(), err);

                    let context = ErrorContext::for_endpoint(
                        endpoint.label.clone(),
                        join_url(&endpoint.url, &self.request_path),
                    )
                    .with("elapsed_ms", took.as_millis());

                    failures.push(AttemptFailure {
                        label: endpoint.label.clone(),
                        url: endpoint.url.clone(),
                        error: err.with_context(context),
                    });
                }
            }
        }

        let err = ServiceError::exhausted(failures);
        error!("[scan {}] {}", scan_id, err);

        Err(err.with_context_value("scan_id", scan_id))
    }
}

#[async_trait]
impl ServiceClient for PredictionClient {
    fn name(&self) -> &str {
        "prediction"
    }

    fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    async fn health_check(&self) -> Result<bool> {
        match self.scan().await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("Prediction service health check failed: {}", e);
                Ok(false)
            }
        }
    }
}
