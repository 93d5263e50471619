//! Configuration for the account service

use std::env;

use common::error::{Error, Result};

/// Configuration for the account service
#[derive(Debug, Clone)]
pub struct AccountServiceConfig {
    /// Send transfer notifications through the logging notifier
    pub notifications_enabled: bool,
    /// Log completed transfers at info level
    pub transfer_logging: bool,
}

impl Default for AccountServiceConfig {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            transfer_logging: false,
        }
    }
}

impl AccountServiceConfig {
    /// Create a new configuration using environment variables.
    ///
    /// Unset variables fall back to the defaults; a value that is not a
    /// recognizable boolean is a configuration error.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            notifications_enabled: bool_var("NOTIFICATIONS_ENABLED", defaults.notifications_enabled)?,
            transfer_logging: bool_var("TRANSFER_LOGGING", defaults.transfer_logging)?,
        })
    }

    /// Create a new configuration with custom values
    pub fn new(notifications_enabled: bool, transfer_logging: bool) -> Self {
        Self {
            notifications_enabled,
            transfer_logging,
        }
    }
}

fn bool_var(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(value) => parse_bool(&value).ok_or_else(|| {
            Error::ConfigurationError(format!("{} must be a boolean, got '{}'", name, value))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
