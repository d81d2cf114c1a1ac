//! Query parameter types for the favorites list endpoints

use serde::{Deserialize, Serialize};

/// Query for `GET favorites/preview`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewQuery {
    pub limit: u32,
}

/// Query for `GET favorites`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
}

impl From<favsync_domain::PageRequest> for PageQuery {
    fn from(request: favsync_domain::PageRequest) -> Self {
        Self {
            page: request.page(),
            limit: request.limit(),
        }
    }
}
