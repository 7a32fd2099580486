//! Ward testing infrastructure
//!
//! Shared setup for integration and property tests: ready-to-use providers
//! and services over the memory backend, identity helpers, proptest
//! strategies and a tracing subscriber for test output.
//!
//! ```toml
//! [dev-dependencies]
//! ward-testkit = { workspace = true }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod fixtures;
pub mod logging;
pub mod strategies;

pub use fixtures::*;
pub use logging::init_test_tracing;
