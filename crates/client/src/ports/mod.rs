//! Client port definitions.
//!
//! Outbound ports are the only way the favorites cache reaches the network.

pub mod outbound;
