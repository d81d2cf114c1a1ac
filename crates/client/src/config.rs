//! Client configuration, read from the environment at the composition root.

use std::time::Duration;

use url::Url;

/// Default base URL of the favorites API.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/";

/// Default request timeout in milliseconds (2 minutes)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;

/// Number of items shown by the compact preview.
pub const DEFAULT_PREVIEW_LIMIT: u32 = 6;

/// Page size used by the full list when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

pub const ENV_API_URL: &str = "FAVSYNC_API_URL";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "FAVSYNC_REQUEST_TIMEOUT_MS";
pub const ENV_PREVIEW_LIMIT: &str = "FAVSYNC_PREVIEW_LIMIT";
pub const ENV_PAGE_SIZE: &str = "FAVSYNC_PAGE_SIZE";

/// Settings the favorites cache itself needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FavoritesConfig {
    /// How many items the preview fetches
    pub preview_limit: u32,
    /// Page size of the full list when none is requested
    pub page_size: u32,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Full client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL the API paths are joined onto; a valid URL ending with `/`
    pub api_url: String,
    pub request_timeout: Duration,
    pub favorites: FavoritesConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            favorites: FavoritesConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = match lookup(ENV_API_URL) {
            Some(raw) => normalize_base_url(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Ignoring invalid {ENV_API_URL}");
                DEFAULT_API_URL.to_string()
            }),
            None => DEFAULT_API_URL.to_string(),
        };

        let request_timeout_ms = parse_number(&lookup, ENV_REQUEST_TIMEOUT_MS)
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
        let preview_limit = parse_number(&lookup, ENV_PREVIEW_LIMIT)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_PREVIEW_LIMIT);
        let page_size = parse_number(&lookup, ENV_PAGE_SIZE)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| (1..=favsync_domain::MAX_PAGE_LIMIT).contains(n))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self {
            api_url,
            request_timeout: Duration::from_millis(request_timeout_ms),
            favorites: FavoritesConfig {
                preview_limit,
                page_size,
            },
        }
    }
}

fn parse_number(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    lookup(key).and_then(|raw| raw.trim().parse().ok())
}

// A base URL without a trailing slash would have its last segment replaced by `Url::join`.
fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).ok().map(String::from)
}
