//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::collections::HashMap;

/// Temporarily set environment variables for the duration of a test
///
/// Returns a guard that will restore the original values when dropped.
pub struct EnvGuard {
    original: HashMap<String, Option<String>>,
}

impl EnvGuard {
    /// Set `key` to `value` until the guard is dropped
    pub fn set(key: &str, value: &str) -> Self {
        Self::new(&[(key, Some(value))])
    }

    /// Remove `key` until the guard is dropped
    pub fn unset(key: &str) -> Self {
        Self::new(&[(key, None)])
    }

    /// Apply several changes at once; `None` removes the variable
    pub fn new(vars: &[(&str, Option<&str>)]) -> Self {
        let mut original = HashMap::new();

        for (key, value) in vars {
            original.insert(key.to_string(), std::env::var(key).ok());
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }

        Self { original }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.original {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}
