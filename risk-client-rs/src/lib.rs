//! # Risk Client
//!
//! Client for the accident-risk prediction service.
//!
//! This crate provides:
//!
//! - An endpoint-fallback client that tries each configured address of the
//!   service in order and returns the first prediction it gets
//! - Typed, normalized prediction records and spoken advisory text
//! - A scheduled poller with start/stop and a one-scan-at-a-time guarantee
//! - Configuration management utilities
//!
//! ## Architecture
//!
//! - `PredictionSource`: Anything that can run a fallback scan
//! - `PredictionClient`: The HTTP implementation of `PredictionSource`
//! - `PredictionPoller`: Drives a `PredictionSource` on a schedule
//! - `ServiceError`: Error taxonomy, including the aggregated exhaustion error

pub mod core;
pub use core::{ClientBuilder, PredictionSource, ServiceClient};

pub mod services;
pub use services::prediction::{
    advisory_for, PredictionClient, PredictionResult, RiskLevel, ScanOutcome,
};

pub mod error;
pub use error::{AttemptFailure, ErrorContext, Result, ServiceError};

pub mod config;
pub use config::{ConfigProvider, Endpoint, PredictionConfig};

pub mod poller;
pub use poller::{PollStatus, PredictionPoller};

pub mod util;

#[cfg(test)]
mod tests;

/// Create a client builder seeded with the compiled-in endpoints
pub fn client() -> ClientBuilder {
    ClientBuilder::new()
}

/// Create a prediction client from the `RISK_*` environment variables
pub fn client_from_env() -> Result<PredictionClient> {
    let config = PredictionConfig::from_env()?;
    PredictionClient::new_with_config(&config)
}
