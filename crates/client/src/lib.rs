//! Favsync client crate.
//!
//! Client-side cache of the signed-in user's favorites: membership lookups,
//! a bounded preview, and a paged list, kept coherent under optimistic
//! add/remove. The HTTP adapter and the `favsync` binary sit on top.

pub mod application;
pub mod config;
pub mod infrastructure;
pub mod ports;
pub mod presentation;
pub mod state;

// Re-export commonly used entrypoints
pub use application::{FavoritesError, FavoritesService, ToggleOutcome};
pub use config::{ClientConfig, FavoritesConfig};
pub use infrastructure::HttpFavoritesGateway;
pub use ports::outbound::{FavoritesGateway, TransportError};
pub use presentation::{FavoritesSession, MembershipView, PagedView, PreviewView};
pub use state::FavoritesState;
