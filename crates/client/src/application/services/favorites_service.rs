//! Favorites Service - the cache coordinator
//!
//! Populates, invalidates, and mutates the favorites cache. Three independent
//! views are served from one state value (membership set, bounded preview,
//! one page of the full list); toggles are applied optimistically and rolled
//! back exactly when the gateway rejects them.
//!
//! State lives in a `watch` channel: writers replace the whole value under the
//! channel's lock and never hold it across an `.await`, readers get cheap
//! `Arc`-backed snapshots, and views can subscribe to changes.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;

use favsync_domain::{FavoritesPage, ItemId, ItemSummary, PageRequest};

use crate::application::FavoritesError;
use crate::config::FavoritesConfig;
use crate::ports::outbound::FavoritesGateway;
use crate::state::{FavoritesState, LoadTicket, Loader, OptimisticToggle};

/// What a call to [`FavoritesService::toggle_favorite`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The item is now a favorite
    Added,
    /// The item is no longer a favorite
    Removed,
    /// Nothing happened: the session is disabled or the item is already busy
    Ignored,
}

/// Cache coordinator for the current user's favorites
pub struct FavoritesService {
    gateway: Arc<dyn FavoritesGateway>,
    config: FavoritesConfig,
    state: watch::Sender<FavoritesState>,
}

impl FavoritesService {
    /// Create a disabled service; call `set_enabled(true)` once a user is signed in
    pub fn new(gateway: Arc<dyn FavoritesGateway>, config: FavoritesConfig) -> Self {
        let (state, _) = watch::channel(FavoritesState::new(config.page_size));
        Self {
            gateway,
            config,
            state,
        }
    }

    pub fn config(&self) -> &FavoritesConfig {
        &self.config
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Current state; never changes after it is returned
    pub fn snapshot(&self) -> FavoritesState {
        self.state.borrow().clone()
    }

    /// Receiver notified after every state change
    pub fn subscribe(&self) -> watch::Receiver<FavoritesState> {
        self.state.subscribe()
    }

    pub fn is_enabled(&self) -> bool {
        self.state.borrow().is_enabled()
    }

    /// Membership as currently cached; only accurate once `ensure_ids` has run
    pub fn is_favorite(&self, item_id: &ItemId) -> bool {
        self.state.borrow().is_favorite(item_id)
    }

    pub fn is_busy(&self, item_id: &ItemId) -> bool {
        self.state.borrow().is_busy(item_id)
    }

    pub fn favorite_count(&self) -> usize {
        self.state.borrow().favorite_count()
    }

    pub fn membership(&self) -> Arc<HashSet<ItemId>> {
        self.state.borrow().membership()
    }

    pub fn preview(&self) -> Arc<[ItemSummary]> {
        self.state.borrow().preview()
    }

    /// At most `limit` items of the cached preview
    pub fn preview_up_to(&self, limit: u32) -> Arc<[ItemSummary]> {
        self.state.borrow().preview_up_to(limit)
    }

    pub fn page(&self) -> Arc<FavoritesPage> {
        self.state.borrow().page()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Gate every other operation on the user's sign-in state.
    ///
    /// Disabling wipes all cached views; results of calls still in flight are
    /// discarded when they land.
    pub fn set_enabled(&self, enabled: bool) {
        self.state.send_modify(|state| {
            if state.is_enabled() != enabled {
                tracing::info!(enabled, "Favorites session state changed");
            }
            *state = state.with_enabled(enabled);
        });
    }

    // ========================================================================
    // Invalidation
    // ========================================================================

    /// Force the next `ensure_preview` to refetch
    pub fn invalidate_preview(&self) {
        self.commit("invalidate_preview", |state| state.invalidated(true, false));
    }

    /// Mark the paged list stale
    pub fn invalidate_all(&self) {
        self.commit("invalidate_all", |state| state.invalidated(false, true));
    }

    pub fn invalidate(&self) {
        self.commit("invalidate", |state| state.invalidated(true, true));
    }

    // ========================================================================
    // Loaders
    // ========================================================================

    /// Fetch the membership set and replace the cached one wholesale.
    ///
    /// A no-op while disabled or while another membership fetch is in flight.
    pub async fn ensure_ids(&self) -> Result<(), FavoritesError> {
        let Some(load) = self.begin_load(Loader::Ids, |_| false) else {
            return Ok(());
        };

        let ids = self.gateway.fetch_membership_ids().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to fetch favorite ids");
            e
        })?;

        let count = ids.len();
        if load.commit(|state, _| state.with_membership(ids)) {
            tracing::debug!(count, "Favorite ids loaded");
        }
        Ok(())
    }

    /// Fetch the preview unless a fresh, non-empty one fetched with at least
    /// `limit` items is cached. The stored preview never exceeds `limit`.
    pub async fn ensure_preview(&self, limit: u32) -> Result<(), FavoritesError> {
        let load = self.begin_load(Loader::Preview, |state| state.serves_preview(limit));
        let Some(load) = load else {
            return Ok(());
        };

        let items = self.gateway.fetch_preview(limit).await.map_err(|e| {
            tracing::warn!(error = %e, limit, "Failed to fetch favorites preview");
            e
        })?;

        let count = items.len();
        if load.commit(|state, ticket| state.with_preview(items, limit, ticket)) {
            tracing::debug!(count, limit, "Favorites preview loaded");
        }
        Ok(())
    }

    /// Fetch one page of the full list and replace the cached page.
    ///
    /// There is no freshness short-circuit: callers refetch on page change or
    /// after invalidation. A page past the last one is stored as returned.
    pub async fn load_all(&self, request: PageRequest) -> Result<(), FavoritesError> {
        self.load_page(request).await.map(drop)
    }

    /// `load_all` that reports what it stored: `Some(page)` when this call
    /// fetched and committed, `None` when it was skipped (disabled, another
    /// page load in flight) or its result was discarded.
    pub async fn load_page(
        &self,
        request: PageRequest,
    ) -> Result<Option<Arc<FavoritesPage>>, FavoritesError> {
        let Some(load) = self.begin_load(Loader::Page, |_| false) else {
            return Ok(None);
        };

        let page = self.gateway.fetch_page(request).await.map_err(|e| {
            tracing::warn!(
                error = %e,
                page = request.page(),
                limit = request.limit(),
                "Failed to fetch favorites page"
            );
            e
        })?;

        if page.is_beyond_last_page() {
            tracing::warn!(
                page = page.meta.page,
                total_pages = page.meta.total_pages,
                "Requested favorites page is past the last page"
            );
        }

        let count = page.items.len();
        let mut stored = None;
        let committed = load.commit(|state, ticket| {
            let next = state.with_page(page, ticket);
            stored = Some(next.page());
            next
        });
        if committed {
            tracing::debug!(count, page = request.page(), "Favorites page loaded");
        }
        Ok(stored)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Flip an item's favorite status.
    ///
    /// Membership changes immediately. On removal the item is also struck from
    /// the preview and the page; on add both lists are marked stale instead.
    /// If the gateway rejects the change, membership for this item is restored,
    /// both lists are marked stale, and `MutationConflict` is returned.
    ///
    /// A second toggle of the same item while the first is in flight is
    /// ignored, not queued.
    pub async fn toggle_favorite(&self, item_id: &ItemId) -> Result<ToggleOutcome, FavoritesError> {
        let mut started = None;
        self.state.send_if_modified(|state| {
            if !state.is_enabled() {
                tracing::debug!(item_id = %item_id, "Toggle ignored: favorites disabled");
                return false;
            }
            if state.is_busy(item_id) {
                tracing::debug!(item_id = %item_id, "Toggle ignored: item already busy");
                return false;
            }
            let command = OptimisticToggle::capture(state, item_id.clone());
            *state = command.apply(&state.with_busy(item_id));
            started = Some((command, state.epoch()));
            true
        });
        let Some((command, epoch)) = started else {
            return Ok(ToggleOutcome::Ignored);
        };

        let _busy = BusyGuard {
            state: &self.state,
            item_id,
            epoch,
        };

        let result = if command.is_removal() {
            self.gateway.remove_favorite(item_id).await
        } else {
            self.gateway.add_favorite(item_id).await
        };

        match result {
            Ok(()) => {
                let outcome = if command.is_removal() {
                    ToggleOutcome::Removed
                } else {
                    ToggleOutcome::Added
                };
                tracing::debug!(item_id = %item_id, ?outcome, "Favorite toggled");
                Ok(outcome)
            }
            Err(source) => {
                let rolled_back = commit_in_epoch(&self.state, epoch, |state| {
                    command.rollback(state)
                });
                tracing::warn!(
                    item_id = %item_id,
                    error = %source,
                    rolled_back,
                    "Favorite update failed, optimistic change reverted"
                );
                Err(FavoritesError::mutation_conflict(item_id.clone(), source))
            }
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn commit(&self, op: &'static str, f: impl FnOnce(&FavoritesState) -> FavoritesState) {
        self.state.send_if_modified(|state| {
            if !state.is_enabled() {
                tracing::debug!(op, "Skipped: favorites disabled");
                return false;
            }
            *state = f(state);
            true
        });
    }

    /// Claim `loader` unless disabled, already in flight, or `is_cached` says
    /// the view can be served as is.
    fn begin_load(
        &self,
        loader: Loader,
        is_cached: impl Fn(&FavoritesState) -> bool,
    ) -> Option<LoadGuard<'_>> {
        let mut ticket = None;
        self.state.send_if_modified(|state| {
            if !state.is_enabled() {
                tracing::debug!(?loader, "Load skipped: favorites disabled");
                return false;
            }
            if is_cached(state) {
                tracing::debug!(?loader, "Load skipped: cache is fresh");
                return false;
            }
            match state.begin_load(loader) {
                Some((next, issued)) => {
                    *state = next;
                    ticket = Some(issued);
                    true
                }
                None => {
                    tracing::debug!(?loader, "Load skipped: already in flight");
                    false
                }
            }
        });
        ticket.map(|ticket| LoadGuard {
            state: &self.state,
            ticket,
        })
    }
}

/// Apply `f` only if the session that started the operation is still current.
fn commit_in_epoch(
    state: &watch::Sender<FavoritesState>,
    epoch: u64,
    f: impl FnOnce(&FavoritesState) -> FavoritesState,
) -> bool {
    state.send_if_modified(|current| {
        if !current.is_enabled() || current.epoch() != epoch {
            tracing::warn!(epoch, "Discarding result from a previous favorites session");
            return false;
        }
        *current = f(current);
        true
    })
}

/// In-flight marker for one loader; released on drop, even if the future is cancelled.
struct LoadGuard<'a> {
    state: &'a watch::Sender<FavoritesState>,
    ticket: LoadTicket,
}

impl LoadGuard<'_> {
    /// Write a fetched result and release the loader in one step; the drop
    /// that follows then finds nothing left to release.
    fn commit(self, f: impl FnOnce(&FavoritesState, &LoadTicket) -> FavoritesState) -> bool {
        let ticket = self.ticket;
        commit_in_epoch(self.state, ticket.epoch(), |state| {
            f(state, &ticket).finish_load(&ticket)
        })
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        let ticket = self.ticket;
        self.state.send_if_modified(|state| {
            if !state.accepts(&ticket) || !state.is_loading(ticket.loader()) {
                return false;
            }
            *state = state.finish_load(&ticket);
            true
        });
    }
}

/// Busy marker for one item; cleared on drop whatever the outcome.
struct BusyGuard<'a> {
    state: &'a watch::Sender<FavoritesState>,
    item_id: &'a ItemId,
    epoch: u64,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let (item_id, epoch) = (self.item_id, self.epoch);
        self.state.send_if_modified(|state| {
            if state.epoch() != epoch || !state.is_busy(item_id) {
                return false;
            }
            *state = state.without_busy(item_id);
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::testing::{GatewayCall, ScriptedGateway};
    use crate::ports::outbound::{MockFavoritesGateway, TransportError};
    use mockall::predicate::eq;

    fn id(value: &str) -> ItemId {
        ItemId::from(value)
    }

    fn ids(values: &[&str]) -> HashSet<ItemId> {
        values.iter().copied().map(ItemId::from).collect()
    }

    fn item(value: &str) -> ItemSummary {
        ItemSummary::new(value, format!("Stay {value}")).with_city("Porto")
    }

    fn service_with(gateway: impl FavoritesGateway + 'static) -> FavoritesService {
        FavoritesService::new(Arc::new(gateway), FavoritesConfig::default())
    }

    fn enabled_with(gateway: &ScriptedGateway) -> FavoritesService {
        let service = service_with(gateway.clone());
        service.set_enabled(true);
        service
    }

    fn first_page() -> PageRequest {
        PageRequest::first(12).unwrap()
    }

    #[tokio::test]
    async fn ensure_ids_populates_membership() {
        let mut gateway = MockFavoritesGateway::new();
        gateway
            .expect_fetch_membership_ids()
            .times(1)
            .returning(|| Ok(ids(&["a", "b"])));

        let service = service_with(gateway);
        assert!(!service.is_enabled());
        service.set_enabled(true);

        service.ensure_ids().await.unwrap();

        assert!(service.is_favorite(&id("a")));
        assert!(service.is_favorite(&id("b")));
        assert!(!service.is_favorite(&id("c")));
        assert_eq!(service.favorite_count(), 2);
    }

    #[tokio::test]
    async fn disabled_service_never_calls_gateway() {
        // no expectations: any call would panic
        let service = service_with(MockFavoritesGateway::new());

        service.ensure_ids().await.unwrap();
        service.ensure_preview(6).await.unwrap();
        service.load_all(first_page()).await.unwrap();
        let outcome = service.toggle_favorite(&id("a")).await.unwrap();

        assert_eq!(outcome, ToggleOutcome::Ignored);
        assert!(!service.is_favorite(&id("a")));
        assert!(service.snapshot().busy().is_empty());
    }

    #[tokio::test]
    async fn disable_resets_every_view() {
        let gateway = ScriptedGateway::new()
            .with_item(item("a"), true)
            .with_item(item("b"), true);
        let service = enabled_with(&gateway);
        service.ensure_ids().await.unwrap();
        service.ensure_preview(6).await.unwrap();
        service.load_all(first_page()).await.unwrap();
        service.invalidate();

        service.set_enabled(false);

        let state = service.snapshot();
        assert!(state.membership().is_empty());
        assert!(state.preview().is_empty());
        assert!(state.page().items.is_empty());
        assert!(state.busy().is_empty());
        assert!(!state.is_preview_stale());
        assert!(!state.is_all_stale());
    }

    #[tokio::test]
    async fn disable_during_toggle_clears_busy_and_drops_late_result() {
        let gateway = ScriptedGateway::new().with_item(item("a"), false);
        let service = enabled_with(&gateway);
        gateway.hold();

        let a = id("a");

        let (outcome, ()) = tokio::join!(service.toggle_favorite(&a), async {
            assert!(service.is_busy(&a));
            service.set_enabled(false);
            gateway.release();
        });

        assert_eq!(outcome.unwrap(), ToggleOutcome::Added);
        let state = service.snapshot();
        assert!(!state.is_enabled());
        assert!(state.membership().is_empty());
        assert!(state.busy().is_empty());
    }

    #[tokio::test]
    async fn second_toggle_while_busy_is_dropped() {
        let gateway = ScriptedGateway::new().with_item(item("x"), false);
        let service = enabled_with(&gateway);
        gateway.hold();

        let x = id("x");

        let (first, second) = tokio::join!(service.toggle_favorite(&x), async {
            let second = service.toggle_favorite(&x).await;
            gateway.release();
            second
        });

        assert_eq!(first.unwrap(), ToggleOutcome::Added);
        assert_eq!(second.unwrap(), ToggleOutcome::Ignored);
        assert_eq!(gateway.count(|c| matches!(c, GatewayCall::Add(_))), 1);
        assert!(service.is_favorite(&id("x")));
        assert!(!service.is_busy(&id("x")));
    }

    #[tokio::test]
    async fn toggle_can_be_reissued_after_completion() {
        let gateway = ScriptedGateway::new().with_item(item("x"), false);
        let service = enabled_with(&gateway);

        assert_eq!(
            service.toggle_favorite(&id("x")).await.unwrap(),
            ToggleOutcome::Added
        );
        assert_eq!(
            service.toggle_favorite(&id("x")).await.unwrap(),
            ToggleOutcome::Removed
        );
        assert_eq!(
            gateway.calls(),
            vec![GatewayCall::Add(id("x")), GatewayCall::Remove(id("x"))]
        );
    }

    #[tokio::test]
    async fn toggles_on_different_items_do_not_lose_updates() {
        let gateway = ScriptedGateway::new()
            .with_item(item("a"), false)
            .with_item(item("b"), false);
        let service = enabled_with(&gateway);
        gateway.hold();

        let (a, b) = (id("a"), id("b"));

        let (added_a, added_b, ()) = tokio::join!(
            service.toggle_favorite(&a),
            service.toggle_favorite(&b),
            async { gateway.release() }
        );

        assert_eq!(added_a.unwrap(), ToggleOutcome::Added);
        assert_eq!(added_b.unwrap(), ToggleOutcome::Added);
        assert_eq!(*service.membership(), ids(&["a", "b"]));
        assert!(service.snapshot().busy().is_empty());
    }

    #[tokio::test]
    async fn successful_removal_strikes_item_from_both_lists() {
        let gateway = ScriptedGateway::new()
            .with_item(item("a"), true)
            .with_item(item("b"), true);
        let service = enabled_with(&gateway);
        service.ensure_ids().await.unwrap();
        service.ensure_preview(6).await.unwrap();
        service.load_all(first_page()).await.unwrap();
        assert!(service.page().contains(&id("a")));

        let outcome = service.toggle_favorite(&id("a")).await.unwrap();

        assert_eq!(outcome, ToggleOutcome::Removed);
        let state = service.snapshot();
        assert_eq!(*state.membership(), ids(&["b"]));
        assert!(state.preview().iter().all(|i| i.id != id("a")));
        assert!(!state.page().contains(&id("a")));
        assert_eq!(state.page().meta.total, 1);
        assert!(!state.is_preview_stale());
        assert!(!state.is_all_stale());
    }

    #[tokio::test]
    async fn removal_is_visible_before_gateway_confirms() {
        let gateway = ScriptedGateway::new().with_item(item("a"), true);
        let service = enabled_with(&gateway);
        service.ensure_ids().await.unwrap();
        service.ensure_preview(6).await.unwrap();
        gateway.hold();

        let a = id("a");

        let (outcome, ()) = tokio::join!(service.toggle_favorite(&a), async {
            assert!(!service.is_favorite(&a));
            assert!(service.preview().is_empty());
            gateway.release();
        });

        assert_eq!(outcome.unwrap(), ToggleOutcome::Removed);
    }

    #[tokio::test]
    async fn successful_add_marks_lists_stale_without_inserting() {
        let gateway = ScriptedGateway::new().with_item(item("b"), false);
        let service = enabled_with(&gateway);
        service.ensure_ids().await.unwrap();
        assert!(service.membership().is_empty());

        let outcome = service.toggle_favorite(&id("b")).await.unwrap();

        assert_eq!(outcome, ToggleOutcome::Added);
        let state = service.snapshot();
        assert_eq!(*state.membership(), ids(&["b"]));
        assert!(state.is_preview_stale());
        assert!(state.is_all_stale());
        assert!(state.preview().is_empty());

        // the next read self-heals from the server
        service.ensure_preview(6).await.unwrap();
        let state = service.snapshot();
        assert_eq!(state.preview().len(), 1);
        assert_eq!(state.preview()[0].id, id("b"));
        assert!(!state.is_preview_stale());
    }

    #[tokio::test]
    async fn failed_add_rolls_back_and_reports_conflict() {
        let mut gateway = MockFavoritesGateway::new();
        gateway
            .expect_fetch_membership_ids()
            .returning(|| Ok(ids(&["a"])));
        gateway
            .expect_add_favorite()
            .with(eq(id("c")))
            .times(1)
            .returning(|_| Err(TransportError::status(500, "storage unavailable")));
        let service = service_with(gateway);
        service.set_enabled(true);
        service.ensure_ids().await.unwrap();
        let before = service.membership();

        let err = service.toggle_favorite(&id("c")).await.unwrap_err();

        assert!(err.is_mutation_conflict());
        assert_eq!(err.to_string(), "Could not update favorites");
        assert_eq!(err.transport().and_then(|t| t.status_code()), Some(500));
        let state = service.snapshot();
        assert_eq!(*state.membership(), *before);
        assert!(state.is_preview_stale());
        assert!(state.is_all_stale());
        assert!(!state.is_busy(&id("c")));
    }

    #[tokio::test]
    async fn failed_remove_restores_membership_and_refetches_lists() {
        let gateway = ScriptedGateway::new()
            .with_item(item("a"), true)
            .with_item(item("b"), true);
        let service = enabled_with(&gateway);
        service.ensure_ids().await.unwrap();
        service.ensure_preview(6).await.unwrap();
        gateway.fail_mutations(TransportError::request_failed("connection reset"));

        let err = service.toggle_favorite(&id("a")).await.unwrap_err();

        assert!(err.is_mutation_conflict());
        let state = service.snapshot();
        assert_eq!(*state.membership(), ids(&["a", "b"]));
        assert!(state.is_preview_stale());
        assert!(state.is_all_stale());

        gateway.clear_failures();
        service.ensure_preview(6).await.unwrap();
        assert!(service.preview().iter().any(|i| i.id == id("a")));
    }

    #[tokio::test]
    async fn preview_is_fetched_once_until_invalidated() {
        let mut gateway = MockFavoritesGateway::new();
        gateway
            .expect_fetch_preview()
            .with(eq(6))
            .times(1)
            .returning(|_| Ok(vec![item("a"), item("b")]));
        let service = service_with(gateway);
        service.set_enabled(true);

        service.ensure_preview(6).await.unwrap();
        service.ensure_preview(6).await.unwrap();

        assert_eq!(service.preview().len(), 2);
    }

    #[tokio::test]
    async fn invalidated_preview_is_refetched() {
        let gateway = ScriptedGateway::new().with_item(item("a"), true);
        let service = enabled_with(&gateway);

        service.ensure_preview(6).await.unwrap();
        service.invalidate_preview();
        assert!(service.snapshot().is_preview_stale());
        service.ensure_preview(6).await.unwrap();

        assert_eq!(
            gateway.count(|c| matches!(c, GatewayCall::FetchPreview { .. })),
            2
        );
        assert!(!service.snapshot().is_preview_stale());
    }

    #[tokio::test]
    async fn empty_preview_is_not_a_cache_hit() {
        let gateway = ScriptedGateway::new();
        let service = enabled_with(&gateway);

        service.ensure_preview(6).await.unwrap();
        service.ensure_preview(6).await.unwrap();

        assert_eq!(
            gateway.count(|c| matches!(c, GatewayCall::FetchPreview { .. })),
            2
        );
    }

    #[tokio::test]
    async fn concurrent_ensure_ids_share_one_fetch() {
        let gateway = ScriptedGateway::new().with_item(item("a"), true);
        let service = enabled_with(&gateway);
        gateway.hold();

        let (first, second) = tokio::join!(service.ensure_ids(), async {
            let second = service.ensure_ids().await;
            gateway.release();
            second
        });

        first.unwrap();
        second.unwrap();
        assert_eq!(gateway.count(|c| *c == GatewayCall::FetchIds), 1);
        assert!(service.is_favorite(&id("a")));
        assert!(!service.snapshot().is_loading(Loader::Ids));
    }

    #[tokio::test]
    async fn load_all_always_fetches() {
        let gateway = ScriptedGateway::new()
            .with_item(item("a"), true)
            .with_item(item("b"), true)
            .with_item(item("c"), true);
        let service = enabled_with(&gateway);

        service.load_all(PageRequest::new(1, 2).unwrap()).await.unwrap();
        service.load_all(PageRequest::new(2, 2).unwrap()).await.unwrap();

        let page = service.page();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.meta.page, 2);
        assert_eq!(page.meta.total, 3);
        assert_eq!(page.meta.total_pages, 2);
        assert_eq!(
            gateway.count(|c| matches!(c, GatewayCall::FetchPage { .. })),
            2
        );
    }

    #[tokio::test]
    async fn load_all_past_last_page_stores_empty_page() {
        let gateway = ScriptedGateway::new().with_item(item("a"), true);
        let service = enabled_with(&gateway);

        service.load_all(PageRequest::new(5, 12).unwrap()).await.unwrap();

        let page = service.page();
        assert!(page.items.is_empty());
        assert_eq!(page.meta.page, 5);
        assert_eq!(page.meta.total, 1);
        assert!(page.is_beyond_last_page());
        assert!(!service.snapshot().is_all_stale());
    }

    #[tokio::test]
    async fn failed_loaders_leave_cache_untouched() {
        let gateway = ScriptedGateway::new().with_item(item("a"), true);
        let service = enabled_with(&gateway);
        service.ensure_ids().await.unwrap();
        service.ensure_preview(6).await.unwrap();
        service.invalidate();
        gateway.fail_fetches(TransportError::status(503, "maintenance"));

        let ids_err = service.ensure_ids().await.unwrap_err();
        let preview_err = service.ensure_preview(6).await.unwrap_err();
        let page_err = service.load_all(first_page()).await.unwrap_err();

        for err in [&ids_err, &preview_err, &page_err] {
            assert!(matches!(
                err,
                FavoritesError::Transport(TransportError::Status { status: 503, .. })
            ));
        }
        let state = service.snapshot();
        assert_eq!(*state.membership(), ids(&["a"]));
        assert_eq!(state.preview().len(), 1);
        assert!(state.is_preview_stale());
        assert!(state.is_all_stale());
        assert!(!state.is_loading(Loader::Ids));
        assert!(!state.is_loading(Loader::Preview));
        assert!(!state.is_loading(Loader::Page));

        // loaders are free again once the server recovers
        gateway.clear_failures();
        service.ensure_preview(6).await.unwrap();
        assert!(!service.snapshot().is_preview_stale());
    }

    #[tokio::test]
    async fn fetch_from_previous_session_is_discarded() {
        let gateway = ScriptedGateway::new().with_item(item("a"), true);
        let service = enabled_with(&gateway);
        gateway.hold();

        let (result, ()) = tokio::join!(service.ensure_ids(), async {
            service.set_enabled(false);
            service.set_enabled(true);
            gateway.release();
        });

        result.unwrap();
        let state = service.snapshot();
        assert!(state.is_enabled());
        assert!(state.membership().is_empty());
        assert!(!state.is_loading(Loader::Ids));
    }

    #[tokio::test]
    async fn preview_fetch_racing_an_add_stays_stale() {
        let gateway = ScriptedGateway::new()
            .with_item(item("a"), true)
            .with_item(item("b"), false);
        let service = enabled_with(&gateway);
        gateway.hold();

        let (preview, toggle) = tokio::join!(service.ensure_preview(6), async {
            // the add lands while the preview fetch is still open
            gateway.release();
            service.toggle_favorite(&id("b")).await
        });

        preview.unwrap();
        assert_eq!(toggle.unwrap(), ToggleOutcome::Added);
        assert!(service.snapshot().is_preview_stale());
    }

    #[tokio::test]
    async fn preview_fetch_racing_a_removal_never_brings_the_item_back() {
        let gateway = ScriptedGateway::new()
            .with_item(item("a"), true)
            .with_item(item("b"), true);
        let service = enabled_with(&gateway);
        service.ensure_ids().await.unwrap();
        service.ensure_preview(6).await.unwrap();
        service.invalidate_preview();
        gateway.hold();
        let a = id("a");

        let (outcome, preview, ()) = tokio::join!(
            service.toggle_favorite(&a),
            service.ensure_preview(6),
            async { gateway.release() }
        );

        assert_eq!(outcome.unwrap(), ToggleOutcome::Removed);
        preview.unwrap();
        let state = service.snapshot();
        assert!(!state.is_favorite(&a));
        let preview_items = state.preview();
        let ids: Vec<&str> = preview_items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
        assert!(!state.is_preview_stale());
    }

    #[tokio::test]
    async fn page_fetch_racing_a_removal_never_brings_the_item_back() {
        let gateway = ScriptedGateway::new()
            .with_item(item("a"), true)
            .with_item(item("b"), true);
        let service = enabled_with(&gateway);
        service.ensure_ids().await.unwrap();
        gateway.hold();
        let a = id("a");

        let (outcome, page, ()) = tokio::join!(
            service.toggle_favorite(&a),
            service.load_all(first_page()),
            async { gateway.release() }
        );

        assert_eq!(outcome.unwrap(), ToggleOutcome::Removed);
        page.unwrap();
        let page = service.page();
        assert!(!page.contains(&a));
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.meta.total, 1);
    }

    #[tokio::test]
    async fn removed_item_reappears_after_it_is_added_again() {
        let gateway = ScriptedGateway::new().with_item(item("a"), true);
        let service = enabled_with(&gateway);
        service.ensure_ids().await.unwrap();
        let a = id("a");

        service.toggle_favorite(&a).await.unwrap();
        service.toggle_favorite(&a).await.unwrap();
        service.ensure_preview(6).await.unwrap();

        assert!(service.is_favorite(&a));
        assert_eq!(service.preview().len(), 1);
        assert_eq!(service.preview()[0].id, a);
    }

    #[tokio::test]
    async fn preview_is_cut_to_the_requested_limit() {
        let mut gateway = MockFavoritesGateway::new();
        gateway
            .expect_fetch_preview()
            .with(eq(6))
            .times(1)
            .returning(|_| Ok((0..8).map(|n| item(&n.to_string())).collect()));
        let service = service_with(gateway);
        service.set_enabled(true);

        service.ensure_preview(6).await.unwrap();
        // a narrower request is served from cache
        service.ensure_preview(3).await.unwrap();

        assert_eq!(service.preview().len(), 6);
        assert_eq!(service.preview_up_to(3).len(), 3);
        assert_eq!(service.preview_up_to(10).len(), 6);
    }

    #[tokio::test]
    async fn wider_preview_request_refetches() {
        let gateway = ScriptedGateway::new()
            .with_item(item("a"), true)
            .with_item(item("b"), true)
            .with_item(item("c"), true);
        let service = enabled_with(&gateway);

        service.ensure_preview(2).await.unwrap();
        assert_eq!(service.preview().len(), 2);
        service.ensure_preview(3).await.unwrap();

        assert_eq!(service.preview().len(), 3);
        assert_eq!(
            gateway.calls(),
            vec![
                GatewayCall::FetchPreview { limit: 2 },
                GatewayCall::FetchPreview { limit: 3 }
            ]
        );
    }

    #[tokio::test]
    async fn load_page_reports_what_it_stored() {
        let gateway = ScriptedGateway::new().with_item(item("a"), true);
        let service = enabled_with(&gateway);
        gateway.hold();

        let (first, second, ()) = tokio::join!(
            service.load_page(first_page()),
            service.load_page(first_page()),
            async { gateway.release() }
        );

        let stored = first.unwrap().unwrap();
        assert_eq!(stored.items.len(), 1);
        assert!(second.unwrap().is_none());
        assert_eq!(
            gateway.count(|c| matches!(c, GatewayCall::FetchPage { .. })),
            1
        );
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let gateway = ScriptedGateway::new().with_item(item("a"), false);
        let service = enabled_with(&gateway);
        let mut changes = service.subscribe();

        service.toggle_favorite(&id("a")).await.unwrap();

        assert!(changes.has_changed().unwrap());
        assert!(changes.borrow_and_update().is_favorite(&id("a")));
    }
}
