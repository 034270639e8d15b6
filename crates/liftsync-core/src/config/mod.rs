//! Runtime sync settings for client processes.
//!
//! Read from `LIFTSYNC_*` environment variables. Without a remote URL the
//! client runs local-only and never syncs.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

use thiserror::Error;

use crate::remote::HttpRemoteStoreConfig;
use crate::util::{is_http_url, normalize_text_option};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub remote_url: Option<String>,
    pub api_token: Option<String>,
    pub http_timeout: Duration,
    pub page_size: u32,
    pub sync_interval: Duration,
}

impl fmt::Debug for SyncSettings {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SyncSettings")
            .field("remote_url", &self.remote_url)
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("http_timeout", &self.http_timeout)
            .field("page_size", &self.page_size)
            .field("sync_interval", &self.sync_interval)
            .finish()
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            remote_url: None,
            api_token: None,
            http_timeout: Duration::from_secs(15),
            page_size: 200,
            sync_interval: Duration::from_secs(300),
        }
    }
}

impl SyncSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let remote_url = normalize_text_option(lookup("LIFTSYNC_REMOTE_URL"))
            .map(|url| url.trim_end_matches('/').to_string());
        if let Some(url) = remote_url.as_deref() {
            if !is_http_url(url) {
                return Err(ConfigError::Invalid(
                    "LIFTSYNC_REMOTE_URL must start with http:// or https://".to_string(),
                ));
            }
        }

        let api_token = normalize_text_option(lookup("LIFTSYNC_API_TOKEN"));
        let http_timeout_secs = bounded(&lookup, "LIFTSYNC_HTTP_TIMEOUT_SECS", 15, 1..=120)?;
        let page_size = bounded(&lookup, "LIFTSYNC_PAGE_SIZE", 200, 1..=1_000)?;
        let sync_interval_secs =
            bounded(&lookup, "LIFTSYNC_SYNC_INTERVAL_SECS", 300, 15..=86_400)?;

        Ok(Self {
            remote_url,
            api_token,
            http_timeout: Duration::from_secs(http_timeout_secs),
            page_size: u32::try_from(page_size)
                .map_err(|_| ConfigError::Invalid("LIFTSYNC_PAGE_SIZE is too large".to_string()))?,
            sync_interval: Duration::from_secs(sync_interval_secs),
        })
    }

    pub const fn sync_enabled(&self) -> bool {
        self.remote_url.is_some()
    }

    /// HTTP adapter settings, or `None` when no remote is configured.
    pub fn remote_config(&self) -> Option<HttpRemoteStoreConfig> {
        let base_url = self.remote_url.clone()?;
        Some(HttpRemoteStoreConfig {
            base_url,
            api_token: self.api_token.clone(),
            timeout: self.http_timeout,
            page_size: self.page_size,
        })
    }
}

fn bounded(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
    range: RangeInclusive<u64>,
) -> Result<u64, ConfigError> {
    let Some(raw) = normalize_text_option(lookup(name)) else {
        return Ok(default);
    };

    let value = raw.parse::<u64>().map_err(|_| {
        ConfigError::Invalid(format!(
            "{name} must be an integer in [{}, {}]",
            range.start(),
            range.end()
        ))
    })?;
    if !range.contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{name} must be in [{}, {}]",
            range.start(),
            range.end()
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings(pairs: &[(&str, &str)]) -> Result<SyncSettings, ConfigError> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        SyncSettings::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn defaults_to_local_only() {
        let config = settings(&[]).unwrap();
        assert_eq!(config, SyncSettings::default());
        assert!(!config.sync_enabled());
        assert!(config.remote_config().is_none());
    }

    #[test]
    fn remote_url_enables_sync() {
        let config = settings(&[
            ("LIFTSYNC_REMOTE_URL", " https://sync.example.com/ "),
            ("LIFTSYNC_API_TOKEN", "shared-token"),
            ("LIFTSYNC_PAGE_SIZE", "50"),
        ])
        .unwrap();

        let remote = config.remote_config().unwrap();
        assert_eq!(remote.base_url, "https://sync.example.com");
        assert_eq!(remote.api_token.as_deref(), Some("shared-token"));
        assert_eq!(remote.page_size, 50);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = settings(&[("LIFTSYNC_SYNC_INTERVAL_SECS", "5")]).unwrap_err();
        assert!(err.to_string().contains("LIFTSYNC_SYNC_INTERVAL_SECS"));

        let err = settings(&[("LIFTSYNC_HTTP_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("LIFTSYNC_HTTP_TIMEOUT_SECS"));

        assert!(settings(&[("LIFTSYNC_REMOTE_URL", "sync.example.com")]).is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let config = settings(&[
            ("LIFTSYNC_REMOTE_URL", "https://sync.example.com"),
            ("LIFTSYNC_API_TOKEN", "sensitive-token"),
        ])
        .unwrap();
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("sensitive-token"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
