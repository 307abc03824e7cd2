//! HTTP timeout configuration for remote test clients

use std::time::Duration;

use crate::{load_dotenv, parse_env, ConfigResult};

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default read timeout in seconds
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 10;

/// Timeouts applied to clients that talk to a remote host
///
/// There is no separate write timeout: reqwest only exposes connect and
/// read timeouts per client. A stalled upload is bounded by neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// Connection establishment timeout
    pub connect: Duration,

    /// Maximum time to wait on a single read
    pub read: Duration,
}

impl HttpTimeouts {
    /// Create timeouts from explicit durations
    pub fn new(connect: Duration, read: Duration) -> Self {
        Self { connect, read }
    }

    /// Load timeouts from `MIIA_CONNECT_TIMEOUT_SECS` / `MIIA_READ_TIMEOUT_SECS`,
    /// falling back to the defaults for unset variables
    pub fn from_env() -> ConfigResult<Self> {
        load_dotenv();
        Ok(Self {
            connect: Duration::from_secs(parse_env(
                "MIIA_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?),
            read: Duration::from_secs(parse_env(
                "MIIA_READ_TIMEOUT_SECS",
                DEFAULT_READ_TIMEOUT_SECS,
            )?),
        })
    }
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = HttpTimeouts::default();
        assert_eq!(timeouts.connect, Duration::from_secs(5));
        assert_eq!(timeouts.read, Duration::from_secs(10));
    }

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars_unset(
            ["MIIA_CONNECT_TIMEOUT_SECS", "MIIA_READ_TIMEOUT_SECS"],
            || {
                assert_eq!(HttpTimeouts::from_env().unwrap(), HttpTimeouts::default());
            },
        );
    }

    #[test]
    fn test_from_env_overrides() {
        temp_env::with_vars(
            [
                ("MIIA_CONNECT_TIMEOUT_SECS", Some("2")),
                ("MIIA_READ_TIMEOUT_SECS", Some("30")),
            ],
            || {
                let timeouts = HttpTimeouts::from_env().unwrap();
                assert_eq!(timeouts.connect, Duration::from_secs(2));
                assert_eq!(timeouts.read, Duration::from_secs(30));
            },
        );
    }

    #[test]
    fn test_from_env_invalid() {
        temp_env::with_var("MIIA_READ_TIMEOUT_SECS", Some("soon"), || {
            let err = HttpTimeouts::from_env().unwrap_err();
            assert!(err.to_string().contains("MIIA_READ_TIMEOUT_SECS"));
        });
    }
}
