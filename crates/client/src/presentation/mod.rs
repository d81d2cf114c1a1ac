//! Presentation layer
//!
//! Thin read/act handles over [`FavoritesService`](crate::application::FavoritesService)
//! for whatever UI sits on top. Views never hold state of their own; every
//! read is a snapshot of the shared cache.

pub mod favorites_views;

pub use favorites_views::{FavoritesSession, MembershipView, PagedView, PreviewView};
