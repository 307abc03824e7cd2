//! Response assertions

use reqwest::StatusCode;

use crate::response::ApiResponse;

/// Assert that `response` has the `expected` status, returning it unchanged.
///
/// On mismatch the panic message carries the request method and URL and the
/// response body, which is usually where the API explains what went wrong.
#[track_caller]
pub fn assert_response_status(response: ApiResponse, expected: StatusCode) -> ApiResponse {
    if response.status() != expected {
        panic!(
            "Unexpected {} {} response status code {} (expected {}, response body: {})",
            response.method(),
            response.url(),
            response.status().as_u16(),
            expected.as_u16(),
            response.text()
        );
    }
    response
}

/// [`assert_response_status`] expecting `200 OK`
#[track_caller]
pub fn assert_response_ok(response: ApiResponse) -> ApiResponse {
    assert_response_status(response, StatusCode::OK)
}

/// Assert a response status, defaulting to `200 OK`.
///
/// Accepts an `ApiResult<ApiResponse>` directly and fails the test on
/// request errors as well:
///
/// ```rust,ignore
/// let resp = assert_response_status!(api.get("/items").await);
/// let resp = assert_response_status!(api.delete("/items/1").await, StatusCode::NO_CONTENT);
/// ```
#[macro_export]
macro_rules! assert_response_status {
    ($result:expr) => {
        $crate::assert_response_status!($result, $crate::reqwest::StatusCode::OK)
    };
    ($result:expr, $expected:expr) => {
        match $result {
            Ok(response) => $crate::assert_response_status(response, $expected),
            Err(e) => panic!("Request failed before a response was received: {}", e),
        }
    };
}
