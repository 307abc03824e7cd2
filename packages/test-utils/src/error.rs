//! Error types for the test utilities

use miia_shared_config::ConfigError;
use thiserror::Error;

/// Errors surfaced by clients and fixtures
///
/// Assertion failures are not represented here: they panic, which is how a
/// Rust test reports failure.
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to serialize/deserialize JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Environment configuration could not be used
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A request path could not be resolved against the base URL
    #[error("invalid request URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The local build callback of a fixture failed
    #[error("fixture '{fixture}' failed to build its client: {source}")]
    FixtureBuild {
        fixture: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApiError {
    /// Wrap a build failure with the fixture it came from
    pub fn fixture_build(
        fixture: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ApiError::FixtureBuild {
            fixture: fixture.into(),
            source: source.into(),
        }
    }

    /// Check if this error came from the network layer
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Http(e) if e.is_connect() || e.is_timeout())
    }
}

/// Result type for client and fixture operations
pub type ApiResult<T> = Result<T, ApiError>;
