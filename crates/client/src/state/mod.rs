//! Cache State for the favorites synchronization engine
//!
//! The state is an immutable value: every transition returns a new
//! `FavoritesState` whose collections are fresh `Arc`s, so a snapshot handed to
//! a view never changes underneath it.

mod favorites_state;
mod optimistic;

pub use favorites_state::{FavoritesState, LoadTicket, Loader};
pub use optimistic::OptimisticToggle;
