//! Domain entities

mod item_summary;

pub use item_summary::{ItemSummary, NO_LOCATION_LABEL, NO_PRICE_LABEL};
