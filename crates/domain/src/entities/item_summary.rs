//! Lightweight summary of a favorited item, as shown in previews and lists.

use serde::{Deserialize, Serialize};

use crate::ItemId;

/// Label shown when an item carries neither a location nor a city.
pub const NO_LOCATION_LABEL: &str = "Location unavailable";

/// Label shown when an item carries no nightly price.
pub const NO_PRICE_LABEL: &str = "Price on request";

/// Summary of a favorited item.
///
/// Every field except `id` and `title` is optional upstream. Callers must not
/// probe the optional fields themselves to build labels; the display helpers
/// below are the single fallback policy:
///
/// - location: `location`, then `city`, then [`NO_LOCATION_LABEL`]
/// - price: `"{price:.2} {currency}"`, the bare price when the currency is
///   missing, or [`NO_PRICE_LABEL`] when there is no price
/// - image: passed through, `None` means "render a placeholder"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: ItemId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_night: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ItemSummary {
    /// Create a summary with only the mandatory fields set
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            location: None,
            city: None,
            price_per_night: None,
            currency: None,
            image: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_price(mut self, price_per_night: f64, currency: Option<&str>) -> Self {
        self.price_per_night = Some(price_per_night);
        self.currency = currency.map(str::to_string);
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn display_location(&self) -> &str {
        non_blank(self.location.as_deref())
            .or_else(|| non_blank(self.city.as_deref()))
            .unwrap_or(NO_LOCATION_LABEL)
    }

    pub fn display_price(&self) -> String {
        match (self.price_per_night, non_blank(self.currency.as_deref())) {
            (Some(price), Some(currency)) => format!("{price:.2} {currency}"),
            (Some(price), None) => format!("{price:.2}"),
            (None, _) => NO_PRICE_LABEL.to_string(),
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        non_blank(self.image.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
