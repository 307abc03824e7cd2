//! Buffered HTTP responses

use std::borrow::Cow;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::ApiResult;

/// A fully-read HTTP response together with the request that produced it
///
/// Bodies are buffered up front so assertions can quote them in failure
/// messages and still hand the response back to the caller.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    method: Method,
    url: Url,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ApiResponse {
    /// Assemble a response from its parts
    pub fn new(
        method: Method,
        url: Url,
        status: StatusCode,
        headers: HeaderMap,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            method,
            url,
            status,
            headers,
            body: body.into(),
        }
    }

    /// Read a reqwest response to the end
    pub(crate) async fn read(method: Method, response: reqwest::Response) -> ApiResult<Self> {
        let url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Self::new(method, url, status, headers, body))
    }

    /// Method of the originating request
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Final URL of the originating request
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Response status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw response body
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Response body as text, replacing invalid UTF-8
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Deserialize the response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}
