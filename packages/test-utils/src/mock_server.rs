//! Local mock API server for testing without a deployed host
//!
//! Provides a [`MockApiServer`] that plays the part of the in-process test
//! server: it listens on a random local port, answers with whatever mocks
//! are mounted on it, and is itself an [`ApiClient`] pointed at that port.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::Serialize;
use serde_json::{Map, Value};
use wiremock::matchers;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use crate::auth::API_KEY_HEADER;
use crate::client::{ApiClient, ApiRequest, HttpClient};
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;

/// Responds with a JSON object of the request headers whose (lowercase) name
/// starts with a prefix
#[derive(Debug, Clone)]
pub struct EchoHeaders {
    prefix: String,
}

impl EchoHeaders {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().to_ascii_lowercase(),
        }
    }
}

impl Respond for EchoHeaders {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let echoed: Map<String, Value> = request
            .headers
            .iter()
            .filter(|(name, _)| name.as_str().starts_with(&self.prefix))
            .map(|(name, value)| {
                let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
                (name.as_str().to_string(), Value::String(value))
            })
            .collect();

        ResponseTemplate::new(200).set_body_json(Value::Object(echoed))
    }
}

/// Rejects requests with `403 Forbidden` unless they carry the valid API key
#[derive(Debug, Clone)]
pub struct ApiKeyGuard {
    valid_key: String,
}

impl ApiKeyGuard {
    pub fn new(valid_key: impl Into<String>) -> Self {
        Self {
            valid_key: valid_key.into(),
        }
    }
}

impl Respond for ApiKeyGuard {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let authorized = request
            .headers
            .get(API_KEY_HEADER)
            .is_some_and(|key| key.as_bytes() == self.valid_key.as_bytes());

        if authorized {
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "authorized": true }))
        } else {
            ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "detail": "Could not validate credentials"
            }))
        }
    }
}

/// Mock API server for testing API clients and fixtures
///
/// This struct wraps a [`wiremock::MockServer`] together with an
/// [`HttpClient`] bound to it. The server shuts down when dropped.
///
/// # Example
///
/// ```rust,ignore
/// use miia_test_utils::{assert_response_ok, ApiClient, MockApiServer};
///
/// #[tokio::test]
/// async fn test_with_mock_api() {
///     let api = MockApiServer::start().await.unwrap();
///     api.mock_json(Method::GET, "/", 200, json!({"msg": "Loren ipsum"})).await;
///
///     let resp = assert_response_ok(api.get("/").await.unwrap());
/// }
/// ```
pub struct MockApiServer {
    server: MockServer,
    client: HttpClient,
}

impl MockApiServer {
    /// Start a new mock API server on a random local port
    pub async fn start() -> ApiResult<Self> {
        let server = MockServer::start().await;
        let uri = server.uri();
        let base_url = Url::parse(&uri).map_err(|e| ApiError::InvalidUrl {
            url: uri,
            reason: e.to_string(),
        })?;
        let client = HttpClient::new(base_url)?;

        Ok(Self { server, client })
    }

    /// Get the server URL
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// The underlying wiremock server, for custom mocks and request checks
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// The client bound to this server
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Mount a mock answering `method path` with a JSON body
    pub async fn mock_json<T: Serialize>(&self, method: Method, path: &str, status: u16, body: T) {
        Mock::given(matchers::method(method.as_str()))
            .and(matchers::path(path))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock answering `method path` with an empty body
    pub async fn mock_status(&self, method: Method, path: &str, status: u16) {
        Mock::given(matchers::method(method.as_str()))
            .and(matchers::path(path))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock echoing request headers that start with `prefix`
    pub async fn mock_echo_headers(&self, path: &str, prefix: &str) {
        Mock::given(matchers::method("GET"))
            .and(matchers::path(path))
            .respond_with(EchoHeaders::new(prefix))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock that requires `valid_key` in the `X-API-Key` header
    pub async fn mock_api_key_guard(&self, method: Method, path: &str, valid_key: &str) {
        Mock::given(matchers::method(method.as_str()))
            .and(matchers::path(path))
            .respond_with(ApiKeyGuard::new(valid_key))
            .mount(&self.server)
            .await;
    }

    /// Number of requests the server has received so far.
    ///
    /// # Panics
    ///
    /// Panics if the server was started with request recording disabled.
    pub async fn received_request_count(&self) -> usize {
        match self.server.received_requests().await {
            Some(requests) => requests.len(),
            None => panic!(
                "Request recording is disabled on the mock server at {}",
                self.server.uri()
            ),
        }
    }
}

impl fmt::Debug for MockApiServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockApiServer")
            .field("url", &self.server.uri())
            .finish()
    }
}

#[async_trait]
impl ApiClient for MockApiServer {
    fn base_url(&self) -> &Url {
        self.client.base_url()
    }

    async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        self.client.send(request).await
    }
}
