//! Service layer error types
//!
//! Loaders hand transport failures through untouched; the toggle operation
//! replaces them with a domain-level conflict once local state is repaired.

use favsync_domain::{DomainError, ItemId};

use crate::ports::outbound::TransportError;

/// Errors returned by the favorites service
#[derive(Debug, Clone, thiserror::Error)]
pub enum FavoritesError {
    /// A gateway fetch failed; the cache was left as it was
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Adding or removing a favorite failed and the optimistic change was rolled back
    #[error("Could not update favorites")]
    MutationConflict {
        item_id: ItemId,
        #[source]
        source: TransportError,
    },

    /// A page request was rejected before reaching the gateway
    #[error("Invalid page request: {0}")]
    InvalidPage(#[from] DomainError),
}

impl FavoritesError {
    pub fn mutation_conflict(item_id: ItemId, source: TransportError) -> Self {
        Self::MutationConflict { item_id, source }
    }

    /// Check if this came from a failed toggle
    pub fn is_mutation_conflict(&self) -> bool {
        matches!(self, Self::MutationConflict { .. })
    }

    /// Underlying transport failure, for logging by the caller
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(err) | Self::MutationConflict { source: err, .. } => Some(err),
            Self::InvalidPage(_) => None,
        }
    }
}
