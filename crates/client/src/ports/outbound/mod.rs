//! Outbound ports - Interfaces for external services
//!
//! These ports define the contracts that infrastructure adapters must implement,
//! allowing application services to interact with external systems without
//! depending on concrete implementations.

pub mod favorites_gateway;
pub mod testing;

pub use favorites_gateway::{FavoritesGateway, TransportError};

#[cfg(any(test, feature = "testing"))]
pub use favorites_gateway::MockFavoritesGateway;
