//! Value objects - Immutable objects defined by their attributes

mod page;

pub use page::{FavoritesPage, PageMeta, PageRequest, MAX_PAGE_LIMIT};
