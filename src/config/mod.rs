use crate::error::{RestErrorHandleError, Result};
use dashmap::DashMap;
use std::env;
use std::sync::Arc;

/// Key/value configuration store, seeded from the process environment.
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    pub fn new() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    /// Build a store from explicit pairs, ignoring the environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let service = Self::default();
        for (key, value) in pairs {
            service.set(key.as_ref(), value.as_ref());
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }
}

/// Settings consulted by the [`ErrorResponder`](crate::exception::ErrorResponder).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponderConfig {
    /// Attach the raw error detail to every response under `exception`.
    pub debug: bool,
}

impl ResponderConfig {
    pub const DEBUG_KEY: &'static str = "APP_DEBUG";
    pub const ENV_KEY: &'static str = "APP_ENV";

    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    /// Read the settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_config(&ConfigService::new())
    }

    /// Like [`try_from_config`](Self::try_from_config), but falls back to
    /// production settings when `APP_DEBUG` holds garbage.
    pub fn from_config(config: &ConfigService) -> Self {
        Self::try_from_config(config).unwrap_or_else(|e| {
            tracing::warn!("{}; debug output disabled", e);
            Self::default()
        })
    }

    /// `APP_DEBUG` decides when set. Otherwise a development `APP_ENV`
    /// (`dev`, `development`, `local`) turns debug output on.
    ///
    /// # Errors
    /// Returns [`RestErrorHandleError::InvalidConfig`] when `APP_DEBUG` is not a
    /// recognised boolean.
    pub fn try_from_config(config: &ConfigService) -> Result<Self> {
        if let Some(value) = config.get(Self::DEBUG_KEY) {
            return parse_flag(&value)
                .map(Self::new)
                .ok_or(RestErrorHandleError::InvalidConfig {
                    key: Self::DEBUG_KEY.to_string(),
                    value,
                });
        }

        let debug = config.get(Self::ENV_KEY).is_some_and(|env| {
            matches!(
                env.trim().to_ascii_lowercase().as_str(),
                "dev" | "development" | "local"
            )
        });
        Ok(Self::new(debug))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
