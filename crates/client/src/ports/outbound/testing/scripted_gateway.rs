//! In-memory favorites server for tests.
//!
//! Unlike `MockFavoritesGateway`, this fake keeps real server-side state
//! (favorites survive an add and show up in the next preview) and can hold
//! calls open, so tests can interleave operations "before the first resolves".

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;

use favsync_domain::{FavoritesPage, ItemId, ItemSummary, PageMeta, PageRequest};

use crate::ports::outbound::{FavoritesGateway, TransportError};

/// A call observed by the fake, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    FetchIds,
    FetchPreview { limit: u32 },
    FetchPage { page: u32, limit: u32 },
    Add(ItemId),
    Remove(ItemId),
}

#[derive(Default)]
struct State {
    catalog: HashMap<ItemId, ItemSummary>,
    // most recent first
    favorites: Vec<ItemId>,
    calls: Vec<GatewayCall>,
    fetch_failure: Option<TransportError>,
    mutation_failure: Option<TransportError>,
}

/// Scriptable `FavoritesGateway` backed by an in-memory favorites list.
#[derive(Clone)]
pub struct ScriptedGateway {
    state: Arc<Mutex<State>>,
    hold: Arc<watch::Sender<bool>>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        let (hold, _) = watch::channel(false);
        Self {
            state: Arc::new(Mutex::new(State::default())),
            hold: Arc::new(hold),
        }
    }
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item the server knows about; favorited when `favorite` is set
    pub fn with_item(self, item: ItemSummary, favorite: bool) -> Self {
        {
            let mut s = self.state.lock().unwrap();
            if favorite {
                s.favorites.push(item.id.clone());
            }
            s.catalog.insert(item.id.clone(), item);
        }
        self
    }

    /// Make every subsequent fetch fail with `error`
    pub fn fail_fetches(&self, error: TransportError) {
        self.state.lock().unwrap().fetch_failure = Some(error);
    }

    /// Make every subsequent add/remove fail with `error`
    pub fn fail_mutations(&self, error: TransportError) {
        self.state.lock().unwrap().mutation_failure = Some(error);
    }

    pub fn clear_failures(&self) {
        let mut s = self.state.lock().unwrap();
        s.fetch_failure = None;
        s.mutation_failure = None;
    }

    /// Park every call after it is recorded, until `release` is called
    pub fn hold(&self) {
        self.hold.send_replace(true);
    }

    pub fn release(&self) {
        self.hold.send_replace(false);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, matches: impl Fn(&GatewayCall) -> bool) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| matches(c))
            .count()
    }

    pub fn server_favorites(&self) -> Vec<ItemId> {
        self.state.lock().unwrap().favorites.clone()
    }

    fn record(&self, call: GatewayCall) {
        self.state.lock().unwrap().calls.push(call);
    }

    async fn wait_for_release(&self) {
        let mut rx = self.hold.subscribe();
        let _ = rx.wait_for(|held| !*held).await;
    }

    fn favorite_summaries(&self) -> Result<Vec<ItemSummary>, TransportError> {
        let s = self.state.lock().unwrap();
        if let Some(err) = s.fetch_failure.clone() {
            return Err(err);
        }
        Ok(s.favorites
            .iter()
            .map(|id| {
                s.catalog
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| ItemSummary::new(id.clone(), id.to_string()))
            })
            .collect())
    }

    fn mutate(&self, item_id: &ItemId, add: bool) -> Result<(), TransportError> {
        let mut s = self.state.lock().unwrap();
        if let Some(err) = s.mutation_failure.clone() {
            return Err(err);
        }
        s.favorites.retain(|id| id != item_id);
        if add {
            s.favorites.insert(0, item_id.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl FavoritesGateway for ScriptedGateway {
    async fn fetch_membership_ids(&self) -> Result<HashSet<ItemId>, TransportError> {
        self.record(GatewayCall::FetchIds);
        self.wait_for_release().await;
        Ok(self
            .favorite_summaries()?
            .into_iter()
            .map(|item| item.id)
            .collect())
    }

    async fn fetch_preview(&self, limit: u32) -> Result<Vec<ItemSummary>, TransportError> {
        self.record(GatewayCall::FetchPreview { limit });
        self.wait_for_release().await;
        let mut items = self.favorite_summaries()?;
        items.truncate(limit as usize);
        Ok(items)
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<FavoritesPage, TransportError> {
        self.record(GatewayCall::FetchPage {
            page: request.page(),
            limit: request.limit(),
        });
        self.wait_for_release().await;
        let all = self.favorite_summaries()?;
        let meta = PageMeta {
            page: request.page(),
            limit: request.limit(),
            total: 0,
            total_pages: 0,
        }
        .with_total(all.len() as u64);
        let start = ((request.page() - 1) * request.limit()) as usize;
        let items = all
            .into_iter()
            .skip(start)
            .take(request.limit() as usize)
            .collect();
        Ok(FavoritesPage { items, meta })
    }

    async fn add_favorite(&self, item_id: &ItemId) -> Result<(), TransportError> {
        self.record(GatewayCall::Add(item_id.clone()));
        self.wait_for_release().await;
        self.mutate(item_id, true)
    }

    async fn remove_favorite(&self, item_id: &ItemId) -> Result<(), TransportError> {
        self.record(GatewayCall::Remove(item_id.clone()));
        self.wait_for_release().await;
        self.mutate(item_id, false)
    }
}
