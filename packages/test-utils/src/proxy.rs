//! Header-injecting client proxy
//!
//! Lets a single client (and so a single connection pool) serve many
//! client-level configurations, e.g. one set of credentials per test,
//! without touching the shared client's own defaults.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Url;
use tracing::debug;

use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiResult;
use crate::response::ApiResponse;

/// Overlay `overrides` on top of `base`.
///
/// Every name present in `overrides` replaces all of its values in `base`;
/// names only present in `base` are kept.
pub fn merge_headers(base: &HeaderMap, overrides: &HeaderMap) -> HeaderMap {
    let mut merged = base.clone();

    for name in overrides.keys() {
        merged.remove(name);
        for value in overrides.get_all(name) {
            merged.append(name.clone(), value.clone());
        }
    }

    merged
}

/// Proxy a shared client, injecting a fixed header set into every request
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use miia_test_utils::{assert_response_ok, ApiClient, ClientProxy};
/// use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
///
/// let api = Arc::new(api_fixture.resolve().await?);
///
/// let resp = assert_response_ok(api.post("/login").await?);
/// let token: String = resp.json::<serde_json::Value>()?["access_token"]
///     .as_str()
///     .unwrap()
///     .to_string();
///
/// let mut headers = HeaderMap::new();
/// headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
/// let auth_api = ClientProxy::new(api.clone(), headers);
/// ```
pub struct ClientProxy<C: ?Sized> {
    client: Arc<C>,
    headers: HeaderMap,
}

impl<C: ?Sized> Clone for ClientProxy<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            headers: self.headers.clone(),
        }
    }
}

impl<C: ?Sized> fmt::Debug for ClientProxy<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientProxy")
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl<C: ApiClient + ?Sized> ClientProxy<C> {
    /// Wrap `client`, keeping a private copy of `headers`
    pub fn new(client: Arc<C>, headers: HeaderMap) -> Self {
        Self { client, headers }
    }

    /// Headers injected into every request
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The wrapped client, for operations the proxy does not intercept
    pub fn inner(&self) -> &Arc<C> {
        &self.client
    }

    /// Headers to send given what the caller supplied
    fn effective_headers(&self, supplied: Option<HeaderMap>) -> HeaderMap {
        match supplied {
            None => self.headers.clone(),
            Some(supplied) if supplied == self.headers => supplied,
            Some(supplied) => {
                debug!(
                    proxy_headers = self.headers.len(),
                    overrides = supplied.len(),
                    "Merging request headers over proxy headers"
                );
                merge_headers(&self.headers, &supplied)
            }
        }
    }
}

#[async_trait]
impl<C: ApiClient + ?Sized> ApiClient for ClientProxy<C> {
    fn base_url(&self) -> &Url {
        self.client.base_url()
    }

    async fn send(&self, mut request: ApiRequest) -> ApiResult<ApiResponse> {
        let supplied = request.replace_headers(None);
        request.replace_headers(Some(self.effective_headers(supplied)));
        self.client.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};
    use reqwest::{Method, StatusCode};
    use std::sync::Mutex;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_static(value),
            );
        }
        map
    }

    /// Records the headers of every request it receives
    struct RecordingClient {
        base_url: Url,
        seen: Mutex<Vec<Option<HeaderMap>>>,
    }

    impl RecordingClient {
        fn new() -> Self {
            Self {
                base_url: Url::parse("http://testserver").unwrap(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn last_headers(&self) -> Option<HeaderMap> {
            self.seen
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .last()
                .cloned()
                .flatten()
        }
    }

    #[async_trait]
    impl ApiClient for RecordingClient {
        fn base_url(&self) -> &Url {
            &self.base_url
        }

        async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
            self.seen
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(request.header_map().cloned());

            Ok(ApiResponse::new(
                request.method().clone(),
                self.base_url.clone(),
                StatusCode::OK,
                HeaderMap::new(),
                "",
            ))
        }
    }

    #[test]
    fn test_merge_overrides_win() {
        let base = headers(&[("x-a", "1"), ("x-b", "2")]);
        let overrides = headers(&[("x-b", "3"), ("x-c", "4")]);

        let merged = merge_headers(&base, &overrides);

        assert_eq!(merged, headers(&[("x-a", "1"), ("x-b", "3"), ("x-c", "4")]));
    }

    #[test]
    fn test_merge_replaces_all_values_of_a_name() {
        let base = headers(&[("accept", "text/html"), ("accept", "text/plain")]);
        let overrides = headers(&[("accept", "application/json")]);

        let merged = merge_headers(&base, &overrides);

        let values: Vec<_> = merged.get_all("accept").iter().collect();
        assert_eq!(values, vec!["application/json"]);
    }

    #[test]
    fn test_merge_is_case_insensitive() {
        let base = headers(&[("x-api-key", "old")]);
        let mut overrides = HeaderMap::new();
        overrides.insert(
            HeaderName::from_bytes(b"X-API-Key").unwrap(),
            HeaderValue::from_static("new"),
        );

        let merged = merge_headers(&base, &overrides);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged["x-api-key"], "new");
    }

    #[test]
    fn test_proxy_headers_are_copied() {
        let mut original = headers(&[("x-a", "1")]);
        let proxy = ClientProxy::new(Arc::new(RecordingClient::new()), original.clone());

        original.insert("x-a", HeaderValue::from_static("changed"));

        assert_eq!(proxy.headers()["x-a"], "1");
    }

    #[tokio::test]
    async fn test_proxy_injects_headers_when_none_supplied() {
        let client = Arc::new(RecordingClient::new());
        let proxy = ClientProxy::new(client.clone(), headers(&[("x-header-1", "Loren")]));

        proxy.get("/").await.unwrap();

        assert_eq!(client.last_headers(), Some(headers(&[("x-header-1", "Loren")])));
    }

    #[tokio::test]
    async fn test_proxy_merges_supplied_headers() {
        let client = Arc::new(RecordingClient::new());
        let proxy = ClientProxy::new(
            client.clone(),
            headers(&[("x-header-1", "Loren"), ("x-header-2", "Ipsun")]),
        );

        proxy
            .request(Method::POST, "/", Some(headers(&[("x-header-2", "Dolor")])))
            .await
            .unwrap();

        assert_eq!(
            client.last_headers(),
            Some(headers(&[("x-header-1", "Loren"), ("x-header-2", "Dolor")]))
        );
    }

    #[tokio::test]
    async fn test_proxy_post_with_overrides_single_header() {
        let client = Arc::new(RecordingClient::new());
        let proxy = ClientProxy::new(
            client.clone(),
            headers(&[("x-header-1", "Loren"), ("x-header-2", "Ipsun")]),
        );

        let resp = proxy
            .post_with("/items", headers(&[("X-Header-1", "Dolor")]))
            .await
            .unwrap();

        assert_eq!(resp.method(), Method::POST);
        assert_eq!(
            client.last_headers(),
            Some(headers(&[("x-header-1", "Dolor"), ("x-header-2", "Ipsun")]))
        );
        assert_eq!(proxy.headers()["x-header-1"], "Loren");
    }

    #[tokio::test]
    async fn test_proxy_accepts_identical_headers_in_any_order() {
        let client = Arc::new(RecordingClient::new());
        let proxy = ClientProxy::new(client.clone(), headers(&[("x-a", "1"), ("x-b", "2")]));

        proxy
            .send(ApiRequest::get("/").headers(headers(&[("x-b", "2"), ("x-a", "1")])))
            .await
            .unwrap();

        assert_eq!(client.last_headers(), Some(headers(&[("x-a", "1"), ("x-b", "2")])));
    }

    #[tokio::test]
    async fn test_proxy_headers_never_mutated_by_requests() {
        let client = Arc::new(RecordingClient::new());
        let proxy = ClientProxy::new(client.clone(), headers(&[("x-a", "1")]));

        proxy
            .request(Method::GET, "/", Some(headers(&[("x-a", "2")])))
            .await
            .unwrap();
        proxy.get("/").await.unwrap();

        assert_eq!(proxy.headers(), &headers(&[("x-a", "1")]));
        assert_eq!(client.last_headers(), Some(headers(&[("x-a", "1")])));
    }

    #[tokio::test]
    async fn test_proxy_intercepts_every_request_method() {
        let client = Arc::new(RecordingClient::new());
        let proxy = ClientProxy::new(client.clone(), headers(&[("x-a", "1")]));

        proxy.get("/").await.unwrap();
        proxy.post("/").await.unwrap();
        proxy.put("/").await.unwrap();
        proxy.delete("/").await.unwrap();
        proxy.head("/").await.unwrap();
        proxy.options("/").await.unwrap();
        proxy.patch("/").await.unwrap();

        let overrides = || headers(&[("x-b", "2")]);
        proxy.get_with("/", overrides()).await.unwrap();
        proxy.post_with("/", overrides()).await.unwrap();
        proxy.put_with("/", overrides()).await.unwrap();
        proxy.delete_with("/", overrides()).await.unwrap();
        proxy.head_with("/", overrides()).await.unwrap();
        proxy.options_with("/", overrides()).await.unwrap();
        proxy.patch_with("/", overrides()).await.unwrap();

        let seen = client.seen.lock().unwrap_or_else(|e| e.into_inner());
        assert_eq!(seen.len(), 14);
        assert!(seen[..7]
            .iter()
            .all(|h| h.as_ref() == Some(&headers(&[("x-a", "1")]))));
        assert!(seen[7..]
            .iter()
            .all(|h| h.as_ref() == Some(&headers(&[("x-a", "1"), ("x-b", "2")]))));
    }

    #[test]
    fn test_proxy_delegates_base_url() {
        let client = Arc::new(RecordingClient::new());
        let proxy = ClientProxy::new(client.clone(), HeaderMap::new());
        assert_eq!(proxy.base_url().as_str(), "http://testserver/");
        assert!(Arc::ptr_eq(proxy.inner(), &client));
    }
}
