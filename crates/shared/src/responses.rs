//! Response bodies of the favorites API

use serde::{Deserialize, Serialize};

use favsync_domain::{FavoritesPage, ItemId, ItemSummary, PageMeta};

/// Body of `GET favorites/ids`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteIdsResponse {
    #[serde(default)]
    pub ids: Vec<String>,
}

impl FavoriteIdsResponse {
    pub fn into_ids(self) -> impl Iterator<Item = ItemId> {
        self.ids.into_iter().map(ItemId::from)
    }
}

/// Item summary as serialized by the API.
///
/// Older endpoints send `city`, newer ones `location`; both are kept and the
/// domain type decides which one to display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummaryData {
    pub id: String,
    #[serde(default)]
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

impl From<ItemSummaryData> for ItemSummary {
    fn from(data: ItemSummaryData) -> Self {
        Self {
            id: ItemId::from(data.id),
            title: data.title,
            location: data.location,
            city: data.city,
            price_per_night: data.price_per_night,
            currency: data.currency,
            image: data.image,
        }
    }
}

/// Body of `GET favorites/preview`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FavoritePreviewResponse {
    #[serde(default)]
    pub items: Vec<ItemSummaryData>,
}

impl FavoritePreviewResponse {
    pub fn into_items(self) -> Vec<ItemSummary> {
        self.items.into_iter().map(ItemSummary::from).collect()
    }
}

/// Body of `GET favorites?page=&limit=`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesPageResponse {
    #[serde(default)]
    pub items: Vec<ItemSummaryData>,
    pub page: u32,
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
}

impl From<FavoritesPageResponse> for FavoritesPage {
    fn from(response: FavoritesPageResponse) -> Self {
        Self {
            items: response.items.into_iter().map(ItemSummary::from).collect(),
            meta: PageMeta {
                page: response.page,
                limit: response.limit,
                total: response.total,
                total_pages: response.total_pages,
            },
        }
    }
}

/// Error body returned alongside non-2xx statuses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}
