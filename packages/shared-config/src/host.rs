//! Remote test host resolution
//!
//! A test run targets either a local, in-process server or a remotely
//! deployed host. The remote host is named by an environment variable
//! (`MIIA_HOST` unless overridden); an unset or blank variable means
//! "run locally".

use url::Url;

use crate::{get_non_empty_env, load_dotenv, ConfigError, ConfigResult};

/// Environment variable naming the remote host when no other is configured
pub const DEFAULT_HOST_ENV_VAR: &str = "MIIA_HOST";

/// Resolve a remote host from an already-read value.
///
/// `source` names where the value came from and only shows up in errors.
/// Returns `Ok(None)` when the value is missing or blank, which selects the
/// local target.
pub fn resolve_remote_host(source: &str, value: Option<&str>) -> ConfigResult<Option<Url>> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(source.to_string(), format!("{raw}: {e}")))?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(
            source.to_string(),
            format!("{raw}: not usable as a base URL"),
        ));
    }

    Ok(Some(url))
}

/// Read `env_var` and resolve it as a remote host.
///
/// A `.env` file is consulted first, so a host can be configured there.
pub fn remote_host_from_env(env_var: &str) -> ConfigResult<Option<Url>> {
    load_dotenv();
    resolve_remote_host(env_var, get_non_empty_env(env_var).as_deref())
}
