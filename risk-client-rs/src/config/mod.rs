//! Configuration management for the prediction client
//!
//! This module provides utilities for loading and validating the endpoint list
//! and timing configuration, with support for environment variables.

use std::env;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use once_cell::sync::Lazy;
use url::Url;

use crate::error::{Result, ServiceError};
use crate::util::parse_duration;

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get an integer configuration value
    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value.trim().parse::<i64>()
            .map_err(|e| ServiceError::configuration(format!("Invalid integer for key {}: {}", key, e)))
    }

    /// Get a boolean configuration value
    fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get_string(key)?;
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(ServiceError::configuration(format!("Invalid boolean value for key {}: {}", key, value))),
        }
    }

    /// Get a duration configuration value ("10s", "20m", "250ms", bare seconds)
    fn get_duration(&self, key: &str) -> Result<Duration> {
        let value = self.get_string(key)?;
        parse_duration(&value)
            .ok_or_else(|| ServiceError::configuration(format!("Invalid duration for key {}: {}", key, value)))
    }

    /// Get a boolean that may be absent; a present but malformed value is an error
    fn get_optional_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get_string(key) {
            Ok(_) => self.get_bool(key).map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Get a string configuration value with a default
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get a boolean configuration value with a default
    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,
}

impl EnvConfigProvider {
    /// Create a new environment variable config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Format a configuration key as an environment variable
    pub(crate) fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        // Uppercase and replace non-alphanumeric with underscores
        env_key.push_str(&key.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));

        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key)
            .map_err(|e| {
                match e {
                    env::VarError::NotPresent => {
                        ServiceError::configuration(format!("Environment variable not set: {}", env_key))
                    }
                    env::VarError::NotUnicode(_) => {
                        ServiceError::configuration(format!("Environment variable is not valid unicode: {}", env_key))
                    }
                }
            })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    /// Create a new empty memory config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory config provider with initial values
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ServiceError::configuration(format!("Configuration key not found: {}", key)))
    }
}

/// A composite config provider that tries multiple providers in order
#[derive(Default)]
pub struct CompositeConfigProvider {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl CompositeConfigProvider {
    /// Create a new composite config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider to the chain
    pub fn add_provider(&mut self, provider: impl ConfigProvider + 'static) {
        self.providers.push(Box::new(provider));
    }
}

impl ConfigProvider for CompositeConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        for provider in &self.providers {
            if let Ok(value) = provider.get_string(key) {
                return Ok(value);
            }
        }

        Err(ServiceError::configuration(format!("Configuration key not found in any provider: {}", key)))
    }
}

/// Global default configuration provider
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> = Lazy::new(|| {
    Arc::new(EnvConfigProvider::new().with_prefix("RISK"))
});

/// One candidate address of the prediction service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Base URL, without the request path
    pub url: String,

    /// Human-readable label used in logs and errors
    pub label: String,
}

impl Endpoint {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }

    /// Check that the label is present and the URL is an absolute http(s) URL
    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(ServiceError::configuration(format!("Endpoint label is required for {}", self.url)));
        }

        let parsed = Url::parse(&self.url)
            .map_err(|e| ServiceError::configuration(format!("Invalid URL for endpoint {}: {}", self.label, e)))?;

        match parsed.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ServiceError::configuration(format!(
                "Unsupported scheme '{}' for endpoint {}",
                scheme, self.label
            ))),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.url)
    }
}

/// Compiled-in endpoints, in the order they are tried
pub fn default_endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::new(
            "Primary WiFi Connection",
            "https://53a3-2402-d000-8110-24c-71a9-d44d-c3f7-3797.ngrok-free.app",
        ),
        Endpoint::new("Android Emulator", "http://10.0.2.2:8000"),
        Endpoint::new("Localhost", "http://localhost:8000"),
    ]
}

/// Parse an endpoint list of the form `label=url;label=url`
///
/// Entries are separated by `;` or newlines. The order of the entries is the
/// order in which the endpoints are tried.
pub fn parse_endpoints(raw: &str) -> Result<Vec<Endpoint>> {
    let mut endpoints = Vec::new();

    for entry in raw.split(|c: char| c == ';' || c == '\n') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let (label, url) = entry.split_once('=')
            .ok_or_else(|| ServiceError::configuration(format!("Endpoint entry must be label=url: {}", entry)))?;

        let endpoint = Endpoint::new(label.trim(), url.trim());
        endpoint.validate()?;
        endpoints.push(endpoint);
    }

    if endpoints.is_empty() {
        return Err(ServiceError::configuration("Endpoint list is empty"));
    }

    Ok(endpoints)
}

/// Configuration for the prediction client and poller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Candidate endpoints in priority order
    pub endpoints: Vec<Endpoint>,

    /// Path requested on every endpoint
    pub request_path: String,

    /// Timeout of a single endpoint attempt
    pub timeout: Duration,

    /// Time between scheduled scans
    pub poll_interval: Duration,

    /// Number of failure messages the poller keeps
    pub max_attempt_history: usize,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            request_path: "/predict".to_string(),
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(20 * 60),
            max_attempt_history: 50,
        }
    }
}

impl PredictionConfig {
    /// Load configuration from a config provider, falling back to defaults for absent keys
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let defaults = Self::default();

        let endpoints = match provider.get_string("endpoints") {
            Ok(raw) => parse_endpoints(&raw)?,
            Err(_) => defaults.endpoints,
        };

        let request_path = provider.get_string_or("request_path", &defaults.request_path);

        // Present-but-malformed values are errors, absent ones take the default
        let timeout = match provider.get_string("timeout") {
            Ok(_) => provider.get_duration("timeout")?,
            Err(_) => defaults.timeout,
        };

        let poll_interval = match provider.get_string("poll_interval") {
            Ok(_) => provider.get_duration("poll_interval")?,
            Err(_) => defaults.poll_interval,
        };

        let max_attempt_history = match provider.get_string("max_attempt_history") {
            Ok(_) => {
                let value = provider.get_int("max_attempt_history")?;
                usize::try_from(value).map_err(|_| {
                    ServiceError::configuration(format!("max_attempt_history must not be negative: {}", value))
                })?
            }
            Err(_) => defaults.max_attempt_history,
        };

        let config = Self {
            endpoints,
            request_path,
            timeout,
            poll_interval,
            max_attempt_history,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the `RISK_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_provider(&**DEFAULT_PROVIDER)
    }

    /// Validate this configuration
    pub fn validate(&self) -> Result<()> {
        if self.endpoints.is_empty() {
            return Err(ServiceError::configuration("At least one endpoint is required"));
        }

        for endpoint in &self.endpoints {
            endpoint.validate()?;
        }

        if self.request_path.trim().is_empty() {
            return Err(ServiceError::configuration("Request path is required"));
        }

        if self.timeout.is_zero() {
            return Err(ServiceError::configuration("Timeout must be greater than zero"));
        }

        if self.poll_interval.is_zero() {
            return Err(ServiceError::configuration("Poll interval must be greater than zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config_provider() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("key1", "value1");
        provider.set("key2", "123");

        assert_eq!(provider.get_string("key1").unwrap(), "value1");
        assert_eq!(provider.get_int("key2").unwrap(), 123);
        assert!(provider.get_string("key3").is_err());
    }

    #[test]
    fn test_env_config_provider_format_key() {
        let provider = EnvConfigProvider::new().with_prefix("RISK");

        assert_eq!(provider.format_key("poll_interval"), "RISK_POLL_INTERVAL");
        assert_eq!(provider.format_key("request-path"), "RISK_REQUEST_PATH");
    }

    #[test]
    fn test_default_endpoints_order() {
        let labels: Vec<String> = default_endpoints().into_iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["Primary WiFi Connection", "Android Emulator", "Localhost"]);
    }

    #[test]
    fn test_endpoint_display() {
        let endpoint = Endpoint::new("Localhost", "http://localhost:8000");
        assert_eq!(endpoint.to_string(), "Localhost (http://localhost:8000)");
    }
}
