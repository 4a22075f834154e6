//! Error handling for the risk client
//!
//! This module provides the error system used across the crate:
//! - Categorizes failures of a single endpoint attempt (network, timeout, HTTP status, parsing)
//! - Aggregates every attempt of a fallback scan into one exhaustion error
//! - Adds endpoint context to errors for better debugging
//! - Provides convenient Result type alias

use std::fmt;
use std::collections::HashMap;
use thiserror::Error;

pub mod mapping;

/// Result type for risk client operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Main error type for the risk client
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Network or connection errors
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Non-2xx responses from the prediction service
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
    },

    /// Response parsing errors
    #[error("Parsing error: {0}")]
    Parsing(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unexpected or internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Every endpoint of a fallback scan failed
    #[error("{}", exhausted_message(.attempts))]
    Exhausted {
        attempts: Vec<AttemptFailure>,
    },

    /// A poller scan is already outstanding
    #[error("A prediction scan is already in progress")]
    ScanInProgress,

    /// Errors with additional context
    #[error("{inner}")]
    WithContext {
        inner: Box<ServiceError>,
        context: ErrorContext,
    },
}

impl ServiceError {
    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        ServiceError::Network(message.into())
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        ServiceError::Timeout(message.into())
    }

    /// Create an HTTP status error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        ServiceError::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a parsing error
    pub fn parsing(message: impl Into<String>) -> Self {
        ServiceError::Parsing(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        ServiceError::Configuration(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        ServiceError::Internal(message.into())
    }

    /// Create the aggregated error for a scan where every endpoint failed
    pub fn exhausted(attempts: Vec<AttemptFailure>) -> Self {
        ServiceError::Exhausted { attempts }
    }

    /// Add context to an existing error
    pub fn with_context(self, context: ErrorContext) -> Self {
        ServiceError::WithContext {
            inner: Box::new(self),
            context,
        }
    }

    /// Add a single context key/value to an existing error
    pub fn with_context_value(self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        let mut context = ErrorContext::new();
        context.add(key, value);
        self.with_context(context)
    }

    /// Get the HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ServiceError::Http { status, .. } => Some(*status),
            ServiceError::WithContext { inner, context } => {
                context.status_code.or_else(|| inner.status_code())
            }
            _ => None,
        }
    }

    /// Get the endpoint label if available
    pub fn endpoint_label(&self) -> Option<&str> {
        match self {
            ServiceError::WithContext { inner, context } => {
                context.endpoint_label.as_deref().or_else(|| inner.endpoint_label())
            }
            _ => None,
        }
    }

    /// Strip any context wrappers and return the underlying error
    pub fn root(&self) -> &ServiceError {
        match self {
            ServiceError::WithContext { inner, .. } => inner.root(),
            other => other,
        }
    }

    /// Attempts recorded by an exhausted scan, empty for any other error
    pub fn attempts(&self) -> &[AttemptFailure] {
        match self.root() {
            ServiceError::Exhausted { attempts } => attempts,
            _ => &[],
        }
    }

    /// Check if this error was caused by the endpoint not answering in time
    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), ServiceError::Timeout(_))
    }

    /// Check if this is a failure of a single endpoint that the scan recovers from
    pub fn is_endpoint_failure(&self) -> bool {
        matches!(
            self.root(),
            ServiceError::Network(_)
                | ServiceError::Timeout(_)
                | ServiceError::Http { .. }
                | ServiceError::Parsing(_)
        )
    }
}

/// One failed endpoint attempt within a fallback scan
#[derive(Debug)]
pub struct AttemptFailure {
    /// Human-readable endpoint label
    pub label: String,

    /// Base URL of the endpoint
    pub url: String,

    /// Why the attempt failed
    pub error: ServiceError,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.label, self.url, self.error)
    }
}

fn exhausted_message(attempts: &[AttemptFailure]) -> String {
    let mut message = String::from("Cannot connect to server. Tried:\n");

    let tried: Vec<String> = attempts
        .iter()
        .map(|attempt| format!("• {} ({})", attempt.label, attempt.url))
        .collect();
    message.push_str(&tried.join("\n"));

    let final_error = attempts
        .last()
        .map(|attempt| attempt.error.to_string())
        .unwrap_or_else(|| "no endpoints configured".to_string());
    message.push_str(&format!("\n\nFinal error: {}", final_error));

    message
}

/// Error context information
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Request timestamp
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,

    /// HTTP status code if applicable
    pub status_code: Option<u16>,

    /// Label of the endpoint that was called
    pub endpoint_label: Option<String>,

    /// Full URL that was called
    pub url: Option<String>,

    /// Additional context data
    pub data: HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: Some(chrono::Utc::now()),
            status_code: None,
            endpoint_label: None,
            url: None,
            data: HashMap::new(),
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new error context for a specific endpoint
    pub fn for_endpoint(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            endpoint_label: Some(label.into()),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Add an HTTP status code
    pub fn status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Add a context value
    pub fn add<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.data.insert(key.into(), value.to_string());
    }

    /// Add a context value and return self (builder pattern)
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.add(key, value);
        self
    }
}

/// Convert reqwest errors to ServiceError
impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        let service_error = if err.is_timeout() {
            ServiceError::timeout(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            ServiceError::network(format!("Connection error: {}", err))
        } else if err.is_redirect() {
            ServiceError::network(format!("Too many redirects: {}", err))
        } else if err.is_decode() || err.is_body() {
            ServiceError::parsing(format!("Response decode error: {}", err))
        } else if err.is_request() {
            ServiceError::network(format!("Request failed: {}", err))
        } else {
            ServiceError::internal(format!("HTTP client error: {}", err))
        };

        // Add status code if available
        match err.status() {
            Some(status) => service_error.with_context(ErrorContext::new().status_code(status.as_u16())),
            None => service_error,
        }
    }
}

/// Convert serde_json errors to ServiceError
impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::parsing(format!("JSON error: {}", err))
    }
}
