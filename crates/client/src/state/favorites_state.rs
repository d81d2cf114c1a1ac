//! Immutable favorites cache state and its transitions.

use std::collections::HashSet;
use std::sync::Arc;

use favsync_domain::{FavoritesPage, ItemId, ItemSummary};

/// The three loaders that populate the cache from the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loader {
    Ids,
    Preview,
    Page,
}

/// Issued when a load starts; the result may only be committed if the ticket
/// still matches the state it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    loader: Loader,
    epoch: u64,
    revision: u64,
}

impl LoadTicket {
    pub fn loader(&self) -> Loader {
        self.loader
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct InFlight {
    ids: bool,
    preview: bool,
    page: bool,
}

impl InFlight {
    fn get(&self, loader: Loader) -> bool {
        match loader {
            Loader::Ids => self.ids,
            Loader::Preview => self.preview,
            Loader::Page => self.page,
        }
    }

    fn set(mut self, loader: Loader, value: bool) -> Self {
        match loader {
            Loader::Ids => self.ids = value,
            Loader::Preview => self.preview = value,
            Loader::Page => self.page = value,
        }
        self
    }
}

/// Snapshot of everything the favorites cache knows.
///
/// `epoch` moves forward whenever the session is enabled or disabled, so results of calls
/// started under a previous session can be recognised and dropped.
/// `preview_revision` / `page_revision` change whenever the corresponding list
/// is edited or invalidated locally; a fetch that raced such a change lands
/// but leaves the list stale.
/// `struck` holds items removed locally in this session. Fetched lists never
/// bring them back, since a fetch can read the server before the removal
/// reaches it; an item leaves `struck` once it is a favorite again.
#[derive(Debug, Clone)]
pub struct FavoritesState {
    enabled: bool,
    epoch: u64,
    page_size: u32,
    membership: Arc<HashSet<ItemId>>,
    preview: Arc<[ItemSummary]>,
    preview_limit: u32,
    page: Arc<FavoritesPage>,
    busy: Arc<HashSet<ItemId>>,
    struck: Arc<HashSet<ItemId>>,
    preview_stale: bool,
    all_stale: bool,
    preview_revision: u64,
    page_revision: u64,
    in_flight: InFlight,
}

impl FavoritesState {
    /// Empty, disabled state; `page_size` shapes the placeholder page metadata
    pub fn new(page_size: u32) -> Self {
        Self {
            enabled: false,
            epoch: 0,
            page_size,
            membership: Arc::new(HashSet::new()),
            preview: Arc::from(Vec::new()),
            preview_limit: 0,
            page: Arc::new(FavoritesPage::empty(page_size)),
            busy: Arc::new(HashSet::new()),
            struck: Arc::new(HashSet::new()),
            preview_stale: false,
            all_stale: false,
            preview_revision: 0,
            page_revision: 0,
            in_flight: InFlight::default(),
        }
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn membership(&self) -> Arc<HashSet<ItemId>> {
        Arc::clone(&self.membership)
    }

    pub fn is_favorite(&self, item_id: &ItemId) -> bool {
        self.membership.contains(item_id)
    }

    pub fn favorite_count(&self) -> usize {
        self.membership.len()
    }

    pub fn preview(&self) -> Arc<[ItemSummary]> {
        Arc::clone(&self.preview)
    }

    /// At most `limit` items of the preview
    pub fn preview_up_to(&self, limit: u32) -> Arc<[ItemSummary]> {
        let limit = limit as usize;
        if self.preview.len() <= limit {
            return Arc::clone(&self.preview);
        }
        Arc::from(&self.preview[..limit])
    }

    pub fn page(&self) -> Arc<FavoritesPage> {
        Arc::clone(&self.page)
    }

    pub fn busy(&self) -> Arc<HashSet<ItemId>> {
        Arc::clone(&self.busy)
    }

    pub fn is_busy(&self, item_id: &ItemId) -> bool {
        self.busy.contains(item_id)
    }

    pub fn is_preview_stale(&self) -> bool {
        self.preview_stale
    }

    pub fn is_all_stale(&self) -> bool {
        self.all_stale
    }

    pub fn is_loading(&self, loader: Loader) -> bool {
        self.in_flight.get(loader)
    }

    /// The preview can be served without a fetch
    pub fn preview_is_fresh(&self) -> bool {
        !self.preview_stale && !self.preview.is_empty()
    }

    /// Fresh, and fetched with a limit of at least `limit`
    pub fn serves_preview(&self, limit: u32) -> bool {
        self.preview_is_fresh() && self.preview_limit >= limit
    }

    /// True when a result issued under `ticket` may still be written
    pub fn accepts(&self, ticket: &LoadTicket) -> bool {
        self.enabled && self.epoch == ticket.epoch
    }

    // ------------------------------------------------------------------------
    // Transitions (each returns a new state)
    // ------------------------------------------------------------------------

    /// Enabling opens a new epoch; disabling also wipes every view.
    #[must_use]
    pub(crate) fn with_enabled(&self, enabled: bool) -> Self {
        if !enabled {
            return Self {
                epoch: self.epoch + 1,
                ..Self::new(self.page_size)
            };
        }
        if self.enabled {
            return self.clone();
        }
        Self {
            enabled: true,
            epoch: self.epoch + 1,
            ..self.clone()
        }
    }

    /// Mark `loader` in flight, or `None` when it already is.
    #[must_use]
    pub(crate) fn begin_load(&self, loader: Loader) -> Option<(Self, LoadTicket)> {
        if self.in_flight.get(loader) {
            return None;
        }
        let revision = match loader {
            Loader::Ids => 0,
            Loader::Preview => self.preview_revision,
            Loader::Page => self.page_revision,
        };
        let ticket = LoadTicket {
            loader,
            epoch: self.epoch,
            revision,
        };
        let next = Self {
            in_flight: self.in_flight.set(loader, true),
            ..self.clone()
        };
        Some((next, ticket))
    }

    #[must_use]
    pub(crate) fn finish_load(&self, ticket: &LoadTicket) -> Self {
        Self {
            in_flight: self.in_flight.set(ticket.loader, false),
            ..self.clone()
        }
    }

    /// Replace the membership set wholesale.
    ///
    /// Items with a toggle still in flight keep their local membership, since
    /// the fetched set cannot know about a mutation the server has not
    /// confirmed yet.
    #[must_use]
    pub(crate) fn with_membership(&self, mut ids: HashSet<ItemId>) -> Self {
        for item_id in self.busy.iter() {
            if self.membership.contains(item_id) {
                ids.insert(item_id.clone());
            } else {
                ids.remove(item_id);
            }
        }
        let struck: HashSet<ItemId> = self
            .struck
            .iter()
            .filter(|item_id| !ids.contains(*item_id))
            .cloned()
            .collect();
        Self {
            membership: Arc::new(ids),
            struck: Arc::new(struck),
            ..self.clone()
        }
    }

    /// Store a fetched preview, cut to `limit`, minus locally removed items
    #[must_use]
    pub(crate) fn with_preview(
        &self,
        items: Vec<ItemSummary>,
        limit: u32,
        ticket: &LoadTicket,
    ) -> Self {
        let items: Vec<ItemSummary> = items
            .into_iter()
            .filter(|item| !self.struck.contains(&item.id))
            .take(limit as usize)
            .collect();
        Self {
            preview: Arc::from(items),
            preview_limit: limit,
            preview_stale: ticket.revision != self.preview_revision,
            ..self.clone()
        }
    }

    #[must_use]
    pub(crate) fn with_page(&self, page: FavoritesPage, ticket: &LoadTicket) -> Self {
        let mut page = page;
        for item_id in self.struck.iter() {
            if page.contains(item_id) {
                page = page.without_item(item_id);
            }
        }
        Self {
            page: Arc::new(page),
            all_stale: ticket.revision != self.page_revision,
            ..self.clone()
        }
    }

    #[must_use]
    pub(crate) fn with_busy(&self, item_id: &ItemId) -> Self {
        let mut busy = (*self.busy).clone();
        busy.insert(item_id.clone());
        Self {
            busy: Arc::new(busy),
            ..self.clone()
        }
    }

    #[must_use]
    pub(crate) fn without_busy(&self, item_id: &ItemId) -> Self {
        if !self.busy.contains(item_id) {
            return self.clone();
        }
        let mut busy = (*self.busy).clone();
        busy.remove(item_id);
        Self {
            busy: Arc::new(busy),
            ..self.clone()
        }
    }

    /// Set one item's membership, leaving every other id untouched
    #[must_use]
    pub(crate) fn with_favorite(&self, item_id: &ItemId, favorite: bool) -> Self {
        let mut membership = (*self.membership).clone();
        let mut struck = Arc::clone(&self.struck);
        if favorite {
            membership.insert(item_id.clone());
            if struck.contains(item_id) {
                let mut remaining = (*struck).clone();
                remaining.remove(item_id);
                struck = Arc::new(remaining);
            }
        } else {
            membership.remove(item_id);
        }
        Self {
            membership: Arc::new(membership),
            struck,
            ..self.clone()
        }
    }

    /// Strike an item from both lists and keep it out of later fetches.
    /// Staleness flags are left as they are.
    #[must_use]
    pub(crate) fn without_list_item(&self, item_id: &ItemId) -> Self {
        let preview: Vec<ItemSummary> = self
            .preview
            .iter()
            .filter(|item| &item.id != item_id)
            .cloned()
            .collect();
        let mut struck = (*self.struck).clone();
        struck.insert(item_id.clone());
        Self {
            preview: Arc::from(preview),
            page: Arc::new(self.page.without_item(item_id)),
            struck: Arc::new(struck),
            preview_revision: self.preview_revision + 1,
            page_revision: self.page_revision + 1,
            ..self.clone()
        }
    }

    #[must_use]
    pub(crate) fn invalidated(&self, preview: bool, all: bool) -> Self {
        Self {
            preview_stale: self.preview_stale || preview,
            all_stale: self.all_stale || all,
            preview_revision: self.preview_revision + u64::from(preview),
            page_revision: self.page_revision + u64::from(all),
            ..self.clone()
        }
    }
}
