//! Favsync Domain - vocabulary shared by the wire contracts and the client cache.

pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::ItemSummary;
pub use error::DomainError;
pub use ids::ItemId;
pub use value_objects::{FavoritesPage, PageMeta, PageRequest, MAX_PAGE_LIMIT};
