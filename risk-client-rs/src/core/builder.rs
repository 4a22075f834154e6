//! Client builder implementation
//!
//! Provides a builder for creating and configuring the prediction client.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Client as ReqwestClient;

use crate::config::{Endpoint, PredictionConfig};
use crate::error::{Result, ServiceError};
use crate::services::common::default_headers;
use crate::services::prediction::PredictionClient;
use crate::services::UserAgent;

/// Builder for the prediction client
pub struct ClientBuilder {
    /// Candidate endpoints in priority order
    endpoints: Vec<Endpoint>,

    /// Path requested on every endpoint
    request_path: String,

    /// Custom headers to include with all requests
    custom_headers: HashMap<String, String>,

    /// Timeout of one endpoint attempt
    timeout: Duration,

    /// User agent
    user_agent: UserAgent,

    /// Enable response decompression
    compression: bool,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::from_config(&PredictionConfig::default())
    }
}

impl ClientBuilder {
    /// Create a new client builder with the compiled-in defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder seeded from a loaded configuration
    pub fn from_config(config: &PredictionConfig) -> Self {
        Self {
            endpoints: config.endpoints.clone(),
            request_path: config.request_path.clone(),
            custom_headers: HashMap::new(),
            timeout: config.timeout,
            user_agent: UserAgent::default(),
            compression: true,
        }
    }

    /// Replace the endpoint list
    pub fn endpoints(mut self, endpoints: Vec<Endpoint>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Drop all endpoints, typically followed by `endpoint` calls
    pub fn clear_endpoints(mut self) -> Self {
        self.endpoints.clear();
        self
    }

    /// Append an endpoint after the ones already configured
    pub fn endpoint(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.endpoints.push(Endpoint::new(label, url));
        self
    }

    /// Set the request path
    pub fn request_path(mut self, path: impl Into<String>) -> Self {
        self.request_path = path.into();
        self
    }

    /// Add a custom header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.insert(key.into(), value.into());
        self
    }

    /// Set the timeout of one endpoint attempt
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: UserAgent) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Enable or disable compression
    pub fn compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    /// Build an HTTP client with the configured settings
    pub fn build_http_client(&self) -> Result<ReqwestClient> {
        let mut headers = default_headers(&self.user_agent)?;

        for (key, value) in &self.custom_headers {
            let header_name = HeaderName::from_str(key)
                .map_err(|e| ServiceError::configuration(format!("Invalid header name: {}", e)))?;

            let header_value = HeaderValue::from_str(value)
                .map_err(|e| ServiceError::configuration(format!("Invalid header value: {}", e)))?;

            headers.insert(header_name, header_value);
        }

        ReqwestClient::builder()
            .timeout(self.timeout)
            .gzip(self.compression)
            .default_headers(headers)
            .build()
            .map_err(|e| ServiceError::configuration(format!("Failed to build HTTP client: {}", e)))
    }

    /// Build the prediction client
    pub fn build(self) -> Result<PredictionClient> {
        if self.endpoints.is_empty() {
            return Err(ServiceError::configuration("At least one endpoint is required"));
        }

        for endpoint in &self.endpoints {
            endpoint.validate()?;
        }

        if self.timeout.is_zero() {
            return Err(ServiceError::configuration("Timeout must be greater than zero"));
        }

        let http_client = self.build_http_client()?;

        Ok(PredictionClient::from_parts(
            http_client,
            self.endpoints,
            self.request_path,
        ))
    }
}
