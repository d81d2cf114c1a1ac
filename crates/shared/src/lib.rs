//! Favsync Shared - wire contracts of the remote favorites API
//!
//! This crate contains the JSON shapes exchanged with the favorites service:
//! - Query parameters for the list endpoints
//! - Response bodies for ids, preview, and paged lists
//! - The error body returned on non-2xx responses
//!
//! # Design Principles
//!
//! 1. **No business logic** - Pure data types and serialization
//! 2. **camelCase on the wire** - Rust field names stay snake_case
//! 3. **Lenient decoding** - unknown fields are ignored, optional fields default

pub mod requests;
pub mod responses;

pub use requests::{PageQuery, PreviewQuery};
pub use responses::{
    ErrorBody, FavoriteIdsResponse, FavoritePreviewResponse, FavoritesPageResponse,
    ItemSummaryData,
};

/// Relative API paths, joined onto the configured base URL
pub mod paths {
    pub const FAVORITE_IDS: &str = "favorites/ids";
    pub const FAVORITE_PREVIEW: &str = "favorites/preview";
    /// Collection path; a single favorite is addressed by appending its id
    /// as one percent-encoded segment (POST adds, DELETE removes).
    pub const FAVORITES: &str = "favorites";
}
