//! Test utilities for outbound ports
//!
//! This module provides fake implementations of outbound port traits for testing.
//! These fakes are available when the `testing` feature is enabled.
//!
//! # Usage
//!
//! Add to your Cargo.toml:
//! ```toml
//! [dev-dependencies]
//! favsync-client = { workspace = true, features = ["testing"] }
//! ```
//!
//! Then import the fakes:
//! ```ignore
//! use favsync_client::ports::outbound::testing::ScriptedGateway;
//! ```

#[cfg(any(test, feature = "testing"))]
mod scripted_gateway;

#[cfg(any(test, feature = "testing"))]
pub use scripted_gateway::{GatewayCall, ScriptedGateway};
