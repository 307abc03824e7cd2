//! API key authentication error checks
//!
//! Every endpoint behind API key authentication should refuse requests that
//! carry no key or a bogus one. [`api_key_auth_error_test!`] generates both
//! test cases for an endpoint in one line.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};

use crate::assertions::assert_response_status;
use crate::client::ApiClient;
use crate::response::ApiResponse;

/// Header carrying the API key (`X-API-Key`)
pub const API_KEY_HEADER: &str = "x-api-key";

/// Key sent by the invalid-key case
pub const INVALID_API_KEY: &str = "not-a-valid-api-key-0000";

/// The ways a request can fail API key authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyAuthCase {
    /// No `X-API-Key` header at all
    MissingKey,
    /// An `X-API-Key` header with a nonsense value
    InvalidKey,
}

impl ApiKeyAuthCase {
    pub const ALL: [ApiKeyAuthCase; 2] = [ApiKeyAuthCase::MissingKey, ApiKeyAuthCase::InvalidKey];

    pub fn name(self) -> &'static str {
        match self {
            Self::MissingKey => "missing_key",
            Self::InvalidKey => "invalid_key",
        }
    }

    /// Headers to send for this case
    pub fn headers(self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if self == Self::InvalidKey {
            headers.insert(API_KEY_HEADER, HeaderValue::from_static(INVALID_API_KEY));
        }
        headers
    }
}

/// Issue `method path` for `case` and assert the API answers `403 Forbidden`.
///
/// Request errors fail the test as well.
pub async fn assert_api_key_auth_error<C: ApiClient + ?Sized>(
    api: &C,
    method: Method,
    path: &str,
    case: ApiKeyAuthCase,
) -> ApiResponse {
    let response = match api.request(method.clone(), path, Some(case.headers())).await {
        Ok(response) => response,
        Err(e) => panic!("{} {} ({}) request failed: {}", method, path, case.name(), e),
    };

    assert_response_status(response, StatusCode::FORBIDDEN)
}

/// Generate the API key authentication error tests for an endpoint.
///
/// Expands to a module named `$name` with one async test per
/// [`ApiKeyAuthCase`]. `$api` is evaluated in each test and must be a future
/// resolving to `ApiResult<client>`, such as a function declared with
/// [`api_fixture!`](crate::api_fixture) or a fixture build callback. A
/// fixture error fails the test. The calling crate needs `tokio` with the
/// `macros` feature.
///
/// ```rust,ignore
/// api_fixture!(api: MockApiServer = start_testserver);
/// api_key_auth_error_test!(list_items_auth, api(), Method::GET, "/items");
/// ```
#[macro_export]
macro_rules! api_key_auth_error_test {
    ($name:ident, $api:expr, $method:expr, $path:expr) => {
        mod $name {
            #[allow(unused_imports)]
            use super::*;

            #[::tokio::test]
            async fn missing_key() {
                let api = match $api.await {
                    Ok(api) => api,
                    Err(e) => panic!("API fixture failed: {}", e),
                };
                $crate::assert_api_key_auth_error(
                    &api,
                    $method,
                    $path,
                    $crate::ApiKeyAuthCase::MissingKey,
                )
                .await;
            }

            #[::tokio::test]
            async fn invalid_key() {
                let api = match $api.await {
                    Ok(api) => api,
                    Err(e) => panic!("API fixture failed: {}", e),
                };
                $crate::assert_api_key_auth_error(
                    &api,
                    $method,
                    $path,
                    $crate::ApiKeyAuthCase::InvalidKey,
                )
                .await;
            }
        }
    };
}
