//! Unit tests for the risk client
//!
//! This module contains tests for various components of the crate.

pub mod error_tests;
pub mod poller_tests;
