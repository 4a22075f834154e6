//! Service client implementations
//!
//! This module contains the prediction service client and its shared plumbing.

pub mod prediction;
pub(crate) mod common;

pub use common::UserAgent;
