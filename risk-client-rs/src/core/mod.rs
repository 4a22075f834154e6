//! Core abstractions for the risk client
//!
//! This module provides the trait interfaces shared by clients and the poller:
//!
//! - `ServiceClient`: The base trait for all service clients
//! - `PredictionSource`: Anything that can produce a prediction scan
//! - `ClientBuilder`: Builder pattern for creating clients

pub mod builder;
pub use builder::ClientBuilder;

use async_trait::async_trait;

use crate::config::Endpoint;
use crate::error::Result;
use crate::services::prediction::{PredictionResult, ScanOutcome};

/// Base trait for all service clients
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// The client name/identifier
    fn name(&self) -> &str;

    /// Candidate endpoints in the order they are tried
    fn endpoints(&self) -> &[Endpoint];

    /// Health check for the service
    async fn health_check(&self) -> Result<bool>;
}

/// Source of accident-risk predictions
#[async_trait]
pub trait PredictionSource: Send + Sync {
    /// Run one fallback scan and report which endpoint answered
    async fn scan(&self) -> Result<ScanOutcome>;

    /// Run one fallback scan and return only the prediction
    async fn fetch_prediction(&self) -> Result<PredictionResult> {
        Ok(self.scan().await?.prediction)
    }
}
