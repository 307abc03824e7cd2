//! The client capability used by fixtures, proxies and assertions

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use miia_shared_config::HttpTimeouts;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use serde::Serialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;

/// An outgoing request, relative to a client's base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    headers: Option<HeaderMap>,
    body: Option<Bytes>,
}

impl ApiRequest {
    /// Create a request without headers or body
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: None,
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn head(path: impl Into<String>) -> Self {
        Self::new(Method::HEAD, path)
    }

    pub fn options(path: impl Into<String>) -> Self {
        Self::new(Method::OPTIONS, path)
    }

    /// Replace the request headers with `headers`
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Add a single header, keeping the ones already set
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers
            .get_or_insert_with(HeaderMap::new)
            .append(name, value);
        self
    }

    /// Set a raw body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set the content type
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> ApiResult<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Headers supplied by the caller; `None` when none were given at all
    pub fn header_map(&self) -> Option<&HeaderMap> {
        self.headers.as_ref()
    }

    /// Swap the caller headers, returning the previous ones
    pub(crate) fn replace_headers(&mut self, headers: Option<HeaderMap>) -> Option<HeaderMap> {
        std::mem::replace(&mut self.headers, headers)
    }
}

/// Minimal HTTP client capability
///
/// Implementors only provide [`base_url`](ApiClient::base_url) and
/// [`send`](ApiClient::send). Every request method is provided on top of
/// `send`, so a wrapper that overrides `send` intercepts all of them.
///
/// Each verb comes in two forms: `get(path)` sends no caller headers and
/// `get_with(path, headers)` sends `headers` for that call only.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Base URL that relative request paths are resolved against
    fn base_url(&self) -> &Url;

    /// Issue a request and buffer its response
    async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse>;

    /// Issue `method path`, with `headers` if the caller has any
    async fn request(
        &self,
        method: Method,
        path: &str,
        headers: Option<HeaderMap>,
    ) -> ApiResult<ApiResponse> {
        let mut request = ApiRequest::new(method, path);
        request.replace_headers(headers);
        self.send(request).await
    }

    async fn get(&self, path: &str) -> ApiResult<ApiResponse> {
        self.request(Method::GET, path, None).await
    }

    async fn get_with(&self, path: &str, headers: HeaderMap) -> ApiResult<ApiResponse> {
        self.request(Method::GET, path, Some(headers)).await
    }

    async fn post(&self, path: &str) -> ApiResult<ApiResponse> {
        self.request(Method::POST, path, None).await
    }

    async fn post_with(&self, path: &str, headers: HeaderMap) -> ApiResult<ApiResponse> {
        self.request(Method::POST, path, Some(headers)).await
    }

    async fn put(&self, path: &str) -> ApiResult<ApiResponse> {
        self.request(Method::PUT, path, None).await
    }

    async fn put_with(&self, path: &str, headers: HeaderMap) -> ApiResult<ApiResponse> {
        self.request(Method::PUT, path, Some(headers)).await
    }

    async fn delete(&self, path: &str) -> ApiResult<ApiResponse> {
        self.request(Method::DELETE, path, None).await
    }

    async fn delete_with(&self, path: &str, headers: HeaderMap) -> ApiResult<ApiResponse> {
        self.request(Method::DELETE, path, Some(headers)).await
    }

    async fn head(&self, path: &str) -> ApiResult<ApiResponse> {
        self.request(Method::HEAD, path, None).await
    }

    async fn head_with(&self, path: &str, headers: HeaderMap) -> ApiResult<ApiResponse> {
        self.request(Method::HEAD, path, Some(headers)).await
    }

    async fn options(&self, path: &str) -> ApiResult<ApiResponse> {
        self.request(Method::OPTIONS, path, None).await
    }

    async fn options_with(&self, path: &str, headers: HeaderMap) -> ApiResult<ApiResponse> {
        self.request(Method::OPTIONS, path, Some(headers)).await
    }

    async fn patch(&self, path: &str) -> ApiResult<ApiResponse> {
        self.request(Method::PATCH, path, None).await
    }

    async fn patch_with(&self, path: &str, headers: HeaderMap) -> ApiResult<ApiResponse> {
        self.request(Method::PATCH, path, Some(headers)).await
    }
}

#[async_trait]
impl<C: ApiClient + ?Sized> ApiClient for Arc<C> {
    fn base_url(&self) -> &Url {
        (**self).base_url()
    }

    async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<C: ApiClient + ?Sized> ApiClient for &C {
    fn base_url(&self) -> &Url {
        (**self).base_url()
    }

    async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        (**self).send(request).await
    }
}

/// Resolve `path` against `base`.
///
/// Absolute URLs are used as is. Relative paths are appended to the base
/// path, so `http://host/api` + `/items` is `http://host/api/items`.
pub fn resolve_url(base: &Url, path: &str) -> ApiResult<Url> {
    if let Ok(absolute) = Url::parse(path) {
        if absolute.has_host() {
            return Ok(absolute);
        }
    }

    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );

    Url::parse(&joined).map_err(|e| ApiError::InvalidUrl {
        url: joined,
        reason: e.to_string(),
    })
}

/// reqwest-backed [`ApiClient`] bound to a base URL
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http_client: Client,
    base_url: Url,
    timeouts: Option<HttpTimeouts>,
}

impl HttpClient {
    /// Create a client with the default timeouts
    pub fn new(base_url: Url) -> ApiResult<Self> {
        Self::with_timeouts(base_url, HttpTimeouts::default())
    }

    /// Create a client with explicit timeouts
    pub fn with_timeouts(base_url: Url, timeouts: HttpTimeouts) -> ApiResult<Self> {
        let http_client = Client::builder()
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.read)
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            timeouts: Some(timeouts),
        })
    }

    /// Create a client with custom HTTP client (for testing)
    pub fn with_client(base_url: Url, http_client: Client) -> Self {
        Self {
            http_client,
            base_url,
            timeouts: None,
        }
    }

    /// Timeouts this client was built with; `None` for a custom HTTP client
    pub fn timeouts(&self) -> Option<HttpTimeouts> {
        self.timeouts
    }

    /// The underlying reqwest client, for anything not covered here
    pub fn inner(&self) -> &Client {
        &self.http_client
    }
}

#[async_trait]
impl ApiClient for HttpClient {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let url = resolve_url(&self.base_url, &request.path)?;
        debug!(method = %request.method, %url, "Sending request");

        let mut builder = self.http_client.request(request.method.clone(), url);
        if let Some(headers) = request.headers {
            builder = builder.headers(headers);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        ApiResponse::read(request.method, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn test_resolve_relative_path() {
        let url = resolve_url(&base("http://testserver"), "/status/234").unwrap();
        assert_eq!(url.as_str(), "http://testserver/status/234");
    }

    #[test]
    fn test_resolve_keeps_base_path() {
        let url = resolve_url(&base("https://example.com/api/"), "items?page=2").unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/items?page=2");
    }

    #[test]
    fn test_resolve_absolute_url() {
        let url = resolve_url(&base("http://testserver"), "https://other.example/x").unwrap();
        assert_eq!(url.as_str(), "https://other.example/x");
    }

    #[test]
    fn test_request_builder_headers() {
        let request = ApiRequest::get("/")
            .header(
                HeaderName::from_static("x-header-1"),
                HeaderValue::from_static("Loren"),
            )
            .header(
                HeaderName::from_static("x-header-2"),
                HeaderValue::from_static("Ipsun"),
            );

        let headers = request.header_map().unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["x-header-1"], "Loren");
    }

    #[test]
    fn test_head_and_options_requests() {
        assert_eq!(ApiRequest::head("/").method(), Method::HEAD);
        assert_eq!(ApiRequest::options("/").method(), Method::OPTIONS);
    }

    #[test]
    fn test_client_keeps_its_timeouts() {
        let timeouts = HttpTimeouts::new(
            std::time::Duration::from_secs(2),
            std::time::Duration::from_secs(20),
        );
        let client = HttpClient::with_timeouts(base("http://testserver"), timeouts).unwrap();
        assert_eq!(client.timeouts(), Some(timeouts));

        let custom = HttpClient::with_client(base("http://testserver"), Client::new());
        assert_eq!(custom.timeouts(), None);
    }

    #[test]
    fn test_request_without_headers() {
        assert!(ApiRequest::delete("/items/1").header_map().is_none());
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let request = ApiRequest::post("/items")
            .json(&serde_json::json!({"name": "x"}))
            .unwrap();
        assert_eq!(
            request.header_map().unwrap()[CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.path(), "/items");
    }
}
