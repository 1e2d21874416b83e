//! Common test utilities for known-canonical integration tests

#[allow(dead_code)]
pub mod fixtures;

pub use fixtures::*;
