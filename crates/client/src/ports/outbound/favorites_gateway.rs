//! Favorites Gateway Port - request/response boundary to the remote favorites store
//!
//! The gateway is stateless from the cache's point of view: every call is an
//! independent round-trip and timeouts are the adapter's concern.

use std::collections::HashSet;

use async_trait::async_trait;
use favsync_domain::{FavoritesPage, ItemId, ItemSummary, PageRequest};

/// Network or HTTP failure reported by a gateway call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, connect, timeout)
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The server answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    pub fn request_failed(message: impl ToString) -> Self {
        Self::RequestFailed(message.to_string())
    }

    pub fn status(status: u16, message: impl ToString) -> Self {
        Self::Status {
            status,
            message: message.to_string(),
        }
    }

    pub fn invalid_response(message: impl ToString) -> Self {
        Self::InvalidResponse(message.to_string())
    }

    /// HTTP status, when the server answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if the server rejected the caller's credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status_code(), Some(401 | 403))
    }
}

/// Remote favorites store.
///
/// Object-safe so the composition root can hand an `Arc<dyn FavoritesGateway>`
/// to the cache without the cache knowing about HTTP.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FavoritesGateway: Send + Sync {
    /// Ids of every item the current user has favorited
    async fn fetch_membership_ids(&self) -> Result<HashSet<ItemId>, TransportError>;

    /// Most relevant favorites, at most `limit` of them, in server order
    async fn fetch_preview(&self, limit: u32) -> Result<Vec<ItemSummary>, TransportError>;

    /// One page of the full favorites collection
    async fn fetch_page(&self, request: PageRequest) -> Result<FavoritesPage, TransportError>;

    async fn add_favorite(&self, item_id: &ItemId) -> Result<(), TransportError>;

    async fn remove_favorite(&self, item_id: &ItemId) -> Result<(), TransportError>;
}
