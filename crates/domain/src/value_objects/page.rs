//! Pagination value objects for the full favorites list

use serde::{Deserialize, Serialize};

use crate::{DomainError, ItemId, ItemSummary};

/// Upper bound on `limit` accepted for a single page request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A validated request for one page of favorites (pages are 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Result<Self, DomainError> {
        if page == 0 {
            return Err(DomainError::validation("page numbers start at 1"));
        }
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(DomainError::validation(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}, got {limit}"
            )));
        }
        Ok(Self { page, limit })
    }

    /// First page with the given limit
    pub fn first(limit: u32) -> Result<Self, DomainError> {
        Self::new(1, limit)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// Metadata describing where a page sits in the whole collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl PageMeta {
    /// Metadata of a collection that has not been loaded yet
    pub fn empty(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            total: 0,
            total_pages: 0,
        }
    }

    /// Same page and limit with a different total; `total_pages` is recomputed
    pub fn with_total(self, total: u64) -> Self {
        let total_pages = if self.limit == 0 {
            0
        } else {
            u32::try_from(total.div_ceil(u64::from(self.limit))).unwrap_or(u32::MAX)
        };
        Self {
            total,
            total_pages,
            ..self
        }
    }
}

/// One materialized page of the user's favorites
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoritesPage {
    pub items: Vec<ItemSummary>,
    pub meta: PageMeta,
}

impl FavoritesPage {
    pub fn empty(limit: u32) -> Self {
        Self {
            items: Vec::new(),
            meta: PageMeta::empty(limit),
        }
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    /// True when the page number lies past the last page the server reported
    pub fn is_beyond_last_page(&self) -> bool {
        self.meta.page > self.meta.total_pages.max(1)
    }

    /// Copy of this page without `id`.
    ///
    /// The id is known to have been a favorite, so the total shrinks by one
    /// even when the item sits on another page.
    pub fn without_item(&self, id: &ItemId) -> Self {
        let items: Vec<ItemSummary> = self
            .items
            .iter()
            .filter(|item| &item.id != id)
            .cloned()
            .collect();
        Self {
            items,
            meta: self.meta.with_total(self.meta.total.saturating_sub(1)),
        }
    }
}
