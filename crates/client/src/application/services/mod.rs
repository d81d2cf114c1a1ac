//! Application services
//!
//! Services depend on port traits, not concrete infrastructure implementations.

pub mod favorites_service;

pub use favorites_service::{FavoritesService, ToggleOutcome};
