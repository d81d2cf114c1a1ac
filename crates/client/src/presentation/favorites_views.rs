//! Favorites view adapters
//!
//! `FavoritesSession` is the entry point a UI holds on to: it follows the
//! auth state and hands out the three views. Each view answers one question
//! (is this item a favorite, what goes in the preview strip, what is on page
//! N) and returns `Arc` snapshots that stay valid after the cache moves on.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;

use favsync_domain::{FavoritesPage, ItemId, ItemSummary, PageMeta, PageRequest};

use crate::application::{FavoritesError, FavoritesService, ToggleOutcome};
use crate::state::{FavoritesState, Loader};

/// Handle shared by every favorites view for the signed-in user
#[derive(Clone)]
pub struct FavoritesSession {
    service: Arc<FavoritesService>,
}

impl FavoritesSession {
    pub fn new(service: Arc<FavoritesService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<FavoritesService> {
        &self.service
    }

    /// Forward a sign-in/sign-out to the cache
    pub fn on_auth_changed(&self, signed_in: bool) {
        self.service.set_enabled(signed_in);
    }

    pub fn is_signed_in(&self) -> bool {
        self.service.is_enabled()
    }

    pub fn membership(&self) -> MembershipView {
        MembershipView {
            service: Arc::clone(&self.service),
        }
    }

    /// Preview sized from config
    pub fn preview(&self) -> PreviewView {
        self.preview_with_limit(self.service.config().preview_limit)
    }

    pub fn preview_with_limit(&self, limit: u32) -> PreviewView {
        PreviewView {
            service: Arc::clone(&self.service),
            limit,
        }
    }

    pub fn paged(&self) -> PagedView {
        PagedView {
            service: Arc::clone(&self.service),
        }
    }

    /// Change notifications for re-rendering
    pub fn subscribe(&self) -> watch::Receiver<FavoritesState> {
        self.service.subscribe()
    }
}

/// Heart-button view: membership lookups and toggles
#[derive(Clone)]
pub struct MembershipView {
    service: Arc<FavoritesService>,
}

impl MembershipView {
    pub fn is_favorite(&self, item_id: &ItemId) -> bool {
        self.service.is_favorite(item_id)
    }

    /// True while a toggle for this item is waiting on the server
    pub fn is_busy(&self, item_id: &ItemId) -> bool {
        self.service.is_busy(item_id)
    }

    pub fn ids(&self) -> Arc<HashSet<ItemId>> {
        self.service.membership()
    }

    pub fn count(&self) -> usize {
        self.service.favorite_count()
    }

    pub async fn toggle(&self, item_id: &ItemId) -> Result<ToggleOutcome, FavoritesError> {
        self.service.toggle_favorite(item_id).await
    }

    /// Load the membership set if it is not already loading
    pub async fn refresh(&self) -> Result<(), FavoritesError> {
        self.service.ensure_ids().await
    }
}

/// Preview strip: the most recent favorites, fetched on first read
#[derive(Clone)]
pub struct PreviewView {
    service: Arc<FavoritesService>,
    limit: u32,
}

impl PreviewView {
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Fetch if needed, then return at most `limit` cached items.
    pub async fn items(&self) -> Result<Arc<[ItemSummary]>, FavoritesError> {
        self.service.ensure_preview(self.limit).await?;
        Ok(self.service.preview_up_to(self.limit))
    }

    /// Whatever is cached right now, without touching the network
    pub fn cached(&self) -> Arc<[ItemSummary]> {
        self.service.preview_up_to(self.limit)
    }

    pub fn is_stale(&self) -> bool {
        self.service.snapshot().is_preview_stale()
    }
}

/// Full favorites list, one page at a time
#[derive(Clone)]
pub struct PagedView {
    service: Arc<FavoritesService>,
}

impl PagedView {
    /// Load `page` and return exactly that page.
    ///
    /// Bad page numbers are rejected before any request. If another page load
    /// is in flight this waits for it to settle and then loads its own page.
    /// While signed out the result is an empty page.
    pub async fn page(&self, page: u32, limit: u32) -> Result<Arc<FavoritesPage>, FavoritesError> {
        let request = PageRequest::new(page, limit)?;
        let mut changes = self.service.subscribe();
        loop {
            if let Some(loaded) = self.service.load_page(request).await? {
                return Ok(loaded);
            }
            if !self.service.is_enabled() {
                return Ok(Arc::new(FavoritesPage {
                    items: Vec::new(),
                    meta: PageMeta {
                        page,
                        ..PageMeta::empty(limit)
                    },
                }));
            }
            tracing::debug!(page, limit, "Waiting for another favorites page load");
            let settled = changes
                .wait_for(|state| !state.is_enabled() || !state.is_loading(Loader::Page))
                .await
                .is_ok();
            if !settled {
                return Ok(self.service.page());
            }
        }
    }

    /// First page at the configured page size
    pub async fn first_page(&self) -> Result<Arc<FavoritesPage>, FavoritesError> {
        self.page(1, self.service.config().page_size).await
    }

    pub fn cached(&self) -> Arc<FavoritesPage> {
        self.service.page()
    }

    pub fn is_stale(&self) -> bool {
        self.service.snapshot().is_all_stale()
    }
}
