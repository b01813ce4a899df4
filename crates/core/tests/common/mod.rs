//! Common test utilities and helpers for integration tests.
//!
//! This module provides shared functionality across all integration tests
//! including:
//! - Test fixtures (courses, stores, a ready-made engine harness)
//! - Custom assertions
//! - Mock triggers and steps

pub mod assertions;
pub mod fixtures;
pub mod mock_subplugins;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_subplugins::*;
