//! HTTP adapter for the remote favorites API

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use favsync_domain::{FavoritesPage, ItemId, ItemSummary, PageRequest};
use favsync_shared::{
    paths, ErrorBody, FavoriteIdsResponse, FavoritePreviewResponse, FavoritesPageResponse,
    PageQuery, PreviewQuery,
};

use crate::config::ClientConfig;
use crate::ports::outbound::{FavoritesGateway, TransportError};

/// `FavoritesGateway` over reqwest/JSON
#[derive(Clone)]
pub struct HttpFavoritesGateway {
    client: Client,
    base_url: Url,
}

impl HttpFavoritesGateway {
    /// `base_url` is the API root; a missing trailing slash is added so that
    /// relative paths join under it instead of replacing its last segment.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, url::ParseError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self {
            client,
            base_url: normalize_base(base_url)?,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, url::ParseError> {
        Self::new(&config.api_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|e| TransportError::request_failed(format!("Invalid URL for {path}: {e}")))
    }

    /// `{base}/favorites/{id}` with the id as a single escaped segment
    fn favorite_url(&self, item_id: &ItemId) -> Result<Url, TransportError> {
        let mut url = self.endpoint(paths::FAVORITES)?;
        url.path_segments_mut()
            .map_err(|_| TransportError::request_failed("API base URL cannot have a path"))?
            .push(item_id.as_str());
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::request_failed(e.to_string()))?;

        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| TransportError::invalid_response(e.to_string()))
    }
}

#[async_trait]
impl FavoritesGateway for HttpFavoritesGateway {
    async fn fetch_membership_ids(&self) -> Result<HashSet<ItemId>, TransportError> {
        let url = self.endpoint(paths::FAVORITE_IDS)?;
        let body: FavoriteIdsResponse = self.get_json(self.client.get(url)).await?;
        Ok(body.into_ids().collect())
    }

    async fn fetch_preview(&self, limit: u32) -> Result<Vec<ItemSummary>, TransportError> {
        let url = self.endpoint(paths::FAVORITE_PREVIEW)?;
        let body: FavoritePreviewResponse = self
            .get_json(self.client.get(url).query(&PreviewQuery { limit }))
            .await?;
        Ok(body.into_items())
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<FavoritesPage, TransportError> {
        let url = self.endpoint(paths::FAVORITES)?;
        let body: FavoritesPageResponse = self
            .get_json(self.client.get(url).query(&PageQuery::from(request)))
            .await?;
        Ok(body.into())
    }

    async fn add_favorite(&self, item_id: &ItemId) -> Result<(), TransportError> {
        let url = self.favorite_url(item_id)?;
        tracing::debug!(item_id = %item_id, "POST favorite");
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| TransportError::request_failed(e.to_string()))?;
        check_status(response).await.map(drop)
    }

    async fn remove_favorite(&self, item_id: &ItemId) -> Result<(), TransportError> {
        let url = self.favorite_url(item_id)?;
        tracing::debug!(item_id = %item_id, "DELETE favorite");
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| TransportError::request_failed(e.to_string()))?;
        check_status(response).await.map(drop)
    }
}

fn normalize_base(base_url: &str) -> Result<Url, url::ParseError> {
    let trimmed = base_url.trim();
    if trimmed.ends_with('/') {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("{trimmed}/"))
    }
}

/// Pass 2xx through; turn anything else into `TransportError::Status`
async fn check_status(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response
        .text()
        .await
        .map_err(|e| TransportError::request_failed(e.to_string()))?;
    Err(status_error(status.as_u16(), &text))
}

/// Prefer the API's own message; fall back to the raw body, then the status line.
fn status_error(status: u16, body: &str) -> TransportError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| format!("HTTP {status}"));
    TransportError::status(status, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(base: &str) -> HttpFavoritesGateway {
        HttpFavoritesGateway::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoints_join_under_base_path() {
        let gw = gateway("https://example.com/api");

        assert_eq!(gw.base_url().as_str(), "https://example.com/api/");
        assert_eq!(
            gw.endpoint(paths::FAVORITE_IDS).unwrap().as_str(),
            "https://example.com/api/favorites/ids"
        );
        assert_eq!(
            gw.endpoint(paths::FAVORITE_PREVIEW).unwrap().as_str(),
            "https://example.com/api/favorites/preview"
        );
    }

    #[test]
    fn favorite_url_escapes_the_id() {
        let gw = gateway("http://localhost:3000/api/");

        let url = gw.favorite_url(&ItemId::from("a/b c")).unwrap();

        assert_eq!(url.as_str(), "http://localhost:3000/api/favorites/a%2Fb%20c");
    }

    #[test]
    fn rejects_unparseable_base() {
        assert!(HttpFavoritesGateway::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn status_error_uses_api_message() {
        let err = status_error(409, r#"{"message":"Already a favorite","code":"CONFLICT"}"#);

        assert_eq!(
            err,
            TransportError::Status {
                status: 409,
                message: "Already a favorite".into()
            }
        );
    }

    #[test]
    fn status_error_falls_back_to_raw_text() {
        let err = status_error(502, "Bad Gateway\n");
        assert_eq!(err.status_code(), Some(502));
        assert_eq!(
            err,
            TransportError::Status {
                status: 502,
                message: "Bad Gateway".into()
            }
        );
    }

    #[test]
    fn status_error_with_empty_body() {
        let err = status_error(401, "");
        assert!(err.is_unauthorized());
        assert_eq!(
            err,
            TransportError::Status {
                status: 401,
                message: "HTTP 401".into()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_request_failed() {
        // port 9 (discard) is closed on test machines
        let gw = HttpFavoritesGateway::new("http://127.0.0.1:9/api/", Duration::from_secs(2))
            .unwrap();

        let err = gw.fetch_membership_ids().await.unwrap_err();

        assert!(matches!(err, TransportError::RequestFailed(_)));
    }
}
