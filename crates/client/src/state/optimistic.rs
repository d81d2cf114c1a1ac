//! Optimistic toggle command with its exact inverse.

use favsync_domain::ItemId;

use super::FavoritesState;

/// One user-triggered toggle, captured before anything is changed.
///
/// The direction is decided once from the membership at capture time. Removal
/// is applied to the list views directly (filtering invents nothing); an add
/// only marks them stale because the full summary is not known locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticToggle {
    item_id: ItemId,
    was_favorite: bool,
}

impl OptimisticToggle {
    pub fn capture(state: &FavoritesState, item_id: ItemId) -> Self {
        let was_favorite = state.is_favorite(&item_id);
        Self {
            item_id,
            was_favorite,
        }
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn is_removal(&self) -> bool {
        self.was_favorite
    }

    #[must_use]
    pub fn apply(&self, state: &FavoritesState) -> FavoritesState {
        let next = state.with_favorite(&self.item_id, !self.was_favorite);
        if self.was_favorite {
            next.without_list_item(&self.item_id)
        } else {
            next.invalidated(true, true)
        }
    }

    /// Restore this item's membership and force both lists to refetch.
    ///
    /// Only this item is touched, so toggles of other items that completed in
    /// the meantime survive.
    #[must_use]
    pub fn rollback(&self, state: &FavoritesState) -> FavoritesState {
        state
            .with_favorite(&self.item_id, self.was_favorite)
            .invalidated(true, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use favsync_domain::ItemSummary;
    use std::collections::HashSet;

    use crate::state::Loader;

    fn id(value: &str) -> ItemId {
        ItemId::from(value)
    }

    fn state_with(members: &[&str], preview: &[&str]) -> FavoritesState {
        let state = FavoritesState::new(12)
            .with_enabled(true)
            .with_membership(members.iter().copied().map(ItemId::from).collect());
        let (state, ticket) = state.begin_load(Loader::Preview).unwrap();
        state
            .with_preview(
                preview.iter().map(|i| ItemSummary::new(*i, *i)).collect(),
                6,
                &ticket,
            )
            .finish_load(&ticket)
    }

    #[test]
    fn test_removal_strikes_lists_without_staleness() {
        let state = state_with(&["a"], &["a", "b"]);
        let toggle = OptimisticToggle::capture(&state, id("a"));
        assert!(toggle.is_removal());

        let next = toggle.apply(&state);

        assert!(!next.is_favorite(&id("a")));
        assert!(next.preview().iter().all(|item| item.id != id("a")));
        assert!(!next.is_preview_stale());
        assert!(!next.is_all_stale());
    }

    #[test]
    fn test_add_marks_lists_stale_without_inserting() {
        let state = state_with(&[], &["x"]);
        let toggle = OptimisticToggle::capture(&state, id("b"));
        assert!(!toggle.is_removal());

        let next = toggle.apply(&state);

        assert!(next.is_favorite(&id("b")));
        assert_eq!(next.preview().len(), 1);
        assert!(next.is_preview_stale());
        assert!(next.is_all_stale());
    }

    #[test]
    fn test_rollback_is_exact_inverse_on_membership() {
        for members in [&["a", "c"][..], &["c"][..]] {
            let state = state_with(members, &["a"]);
            let before: HashSet<ItemId> = (*state.membership()).clone();
            let toggle = OptimisticToggle::capture(&state, id("a"));

            let rolled_back = toggle.rollback(&toggle.apply(&state));

            assert_eq!(*rolled_back.membership(), before);
            assert!(rolled_back.is_preview_stale());
            assert!(rolled_back.is_all_stale());
        }
    }

    #[test]
    fn test_rollback_preserves_other_items() {
        let state = state_with(&["a"], &[]);
        let toggle = OptimisticToggle::capture(&state, id("a"));
        let applied = toggle.apply(&state);

        // another item was added while "a" was in flight
        let applied = applied.with_favorite(&id("z"), true);
        let rolled_back = toggle.rollback(&applied);

        assert!(rolled_back.is_favorite(&id("a")));
        assert!(rolled_back.is_favorite(&id("z")));
    }
}
