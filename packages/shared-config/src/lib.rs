//! Shared configuration for MIIA API test suites
//!
//! This crate owns everything the test utilities read from the process
//! environment, so the rest of the workspace can take already-resolved
//! values and stay independently testable.

mod error;
mod host;
mod timeouts;

pub use error::{ConfigError, ConfigResult};
pub use host::{remote_host_from_env, resolve_remote_host, DEFAULT_HOST_ENV_VAR};
pub use timeouts::{HttpTimeouts, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS};

use std::env;
use std::sync::Once;

static DOTENV: Once = Once::new();

/// Load a `.env` file from the current directory or its parents, if any.
///
/// Runs once per process; later calls do nothing. Variables already set in
/// the environment win over the file. A missing file is not an error.
pub fn load_dotenv() {
    DOTENV.call_once(|| {
        dotenvy::dotenv().ok();
    });
}

/// Get an environment variable, treating unset and blank values alike
pub fn get_non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Helper function to parse an environment variable into a specific type
pub fn parse_env<T>(name: &str, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}
