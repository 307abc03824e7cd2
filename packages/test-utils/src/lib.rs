//! HTTP API test utilities for MIIA services
//!
//! This crate provides the pieces API test suites keep rewriting: fixtures
//! that switch between a local test server and a deployed host, a client
//! proxy that injects headers without touching a shared client, and
//! assertions for statuses and JSON payloads.
//!
//! # Overview
//!
//! - [`ApiClient`] - minimal client capability; every request method goes
//!   through [`ApiClient::send`]
//! - [`HttpClient`] - reqwest-backed client bound to a base URL
//! - [`ClientProxy`] - injects a fixed header set into a shared client's requests
//! - [`ApiFixture`] - local build callback, redirected by `MIIA_HOST`
//! - [`assert_response_status`], [`assert_field`], [`filter_fields`] - assertions
//! - [`api_key_auth_error_test!`] - 403 checks for API key protected endpoints
//! - [`MockApiServer`] - local wiremock server that is also an [`ApiClient`]
//!
//! # Example
//!
//! ```rust,ignore
//! use miia_test_utils::{api_fixture, assert_field, assert_response_ok, ApiClient, JsonType};
//!
//! async fn start_testserver() -> ApiResult<MockApiServer> {
//!     let server = MockApiServer::start().await?;
//!     server.mock_json(Method::GET, "/", 200, json!({"msg": "Loren ipsum"})).await;
//!     Ok(server)
//! }
//!
//! api_fixture!(api: MockApiServer = start_testserver);
//!
//! #[tokio::test]
//! async fn test_root() {
//!     let api = api().await.unwrap();
//!     let resp = assert_response_ok(api.get("/").await.unwrap());
//!     let body: serde_json::Value = resp.json().unwrap();
//!     assert_field(&body, "msg", JsonType::String);
//! }
//! ```

mod assertions;
mod auth;
mod client;
mod error;
mod fixture;
mod json;
mod logging;
mod mock_server;
mod proxy;
mod response;

pub use assertions::{assert_response_ok, assert_response_status};
pub use auth::{assert_api_key_auth_error, ApiKeyAuthCase, API_KEY_HEADER, INVALID_API_KEY};
pub use client::{resolve_url, ApiClient, ApiRequest, HttpClient};
pub use error::{ApiError, ApiResult};
pub use fixture::{ApiFixture, FixtureClient, FixtureOptions, FixtureScope};
pub use json::{
    assert_field, assert_field_or, filter_fields, filter_fields_like, ExpectedTypes, JsonType,
};
pub use logging::init_test_tracing;
pub use mock_server::{ApiKeyGuard, EchoHeaders, MockApiServer};
pub use proxy::{merge_headers, ClientProxy};
pub use response::ApiResponse;

pub use miia_shared_config::{HttpTimeouts, DEFAULT_HOST_ENV_VAR};

// Request and header types in the public API, also used by the exported macros
pub use reqwest;
