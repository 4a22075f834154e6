//! Common utilities for service clients
//!
//! This module provides the HTTP plumbing shared by the prediction client.

use std::fmt;
use std::time::Duration;
use reqwest::{header, Client};

use crate::error::{mapping, ErrorContext, Result, ServiceError};

/// UserAgent structure for identifying the client to upstream services
#[derive(Debug, Clone)]
pub struct UserAgent {
    /// Application name
    pub app_name: String,

    /// Version string
    pub version: String,

    /// Optional extra info
    pub extra: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: "Risk-Client".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            extra: Some("prediction-client".to_string()),
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.version)?;

        if let Some(ref extra) = self.extra {
            write!(f, " ({})", extra)?;
        }

        Ok(())
    }
}

/// Headers sent with every prediction request
pub fn default_headers(user_agent: &UserAgent) -> Result<header::HeaderMap> {
    let mut headers = header::HeaderMap::new();

    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&user_agent.to_string()).map_err(|e| {
            ServiceError::configuration(format!("Invalid user agent: {}", e))
        })?,
    );
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
    headers.insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-cache"));

    Ok(headers)
}

/// Build a standard HTTP client with the JSON / no-cache headers and a per-request timeout
pub fn build_http_client(
    user_agent: Option<UserAgent>,
    timeout: Duration,
) -> Result<Client> {
    let headers = default_headers(&user_agent.unwrap_or_default())?;

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .gzip(true)
        .build()
        .map_err(|e| {
            ServiceError::configuration(format!("Failed to build HTTP client: {}", e))
        })
}

/// Parse error response from HTTP response
pub async fn parse_error_response(response: reqwest::Response) -> ServiceError {
    let status = response.status();

    // Try to get the response body
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => format!("Failed to read error response: {}", e),
    };

    mapping::map_http_error(status, &body).with_context(
        ErrorContext::new()
            .status_code(status.as_u16())
            .with("category", mapping::classify_http_error(status)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_display() {
        let ua = UserAgent {
            app_name: "Risk-Monitor".to_string(),
            version: "1.2.3".to_string(),
            extra: None,
        };
        assert_eq!(ua.to_string(), "Risk-Monitor/1.2.3");
    }

    #[test]
    fn test_default_headers() {
        let headers = default_headers(&UserAgent::default()).unwrap();
        assert_eq!(headers[header::ACCEPT], "application/json");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert!(headers.contains_key(header::USER_AGENT));
    }
}
