use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_MAX_PAGE_SIZE: u32 = 500;
const MAX_PAGE_SIZE_LIMIT: u32 = 1_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub db_path: PathBuf,
    /// Shared bearer token guarding `/v1`; open access when unset
    pub api_token: Option<String>,
    pub max_page_size: u32,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("db_path", &self.db_path)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("max_page_size", &self.max_page_size)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "LIFTSYNC_API_BIND_ADDR", "127.0.0.1:8080");
        let db_path = PathBuf::from(value_or_default(
            &lookup,
            "LIFTSYNC_API_DB_PATH",
            "liftsync-remote.db",
        ));
        let api_token = optional_trimmed(&lookup, "LIFTSYNC_API_TOKEN");

        let max_page_size = value_or_default(
            &lookup,
            "LIFTSYNC_API_MAX_PAGE_SIZE",
            &DEFAULT_MAX_PAGE_SIZE.to_string(),
        )
        .parse::<u32>()
        .map_err(|_| {
            ConfigError::Invalid("LIFTSYNC_API_MAX_PAGE_SIZE must be an integer".to_string())
        })?;
        if !(1..=MAX_PAGE_SIZE_LIMIT).contains(&max_page_size) {
            return Err(ConfigError::Invalid(format!(
                "LIFTSYNC_API_MAX_PAGE_SIZE must be between 1 and {MAX_PAGE_SIZE_LIMIT}"
            )));
        }

        Ok(Self {
            bind_addr,
            db_path,
            api_token,
            max_page_size,
        })
    }

    /// Clamp a requested page size into `1..=max_page_size`.
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.max_page_size)
            .clamp(1, self.max_page_size)
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(map: &HashMap<&str, &str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn config_defaults_to_local_open_service() {
        let config = config_from(&HashMap::new()).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.db_path, PathBuf::from("liftsync-remote.db"));
        assert_eq!(config.api_token, None);
        assert_eq!(config.max_page_size, 500);
    }

    #[test]
    fn config_rejects_out_of_range_page_size() {
        let mut map = HashMap::new();
        map.insert("LIFTSYNC_API_MAX_PAGE_SIZE", "0");
        assert!(config_from(&map).is_err());

        map.insert("LIFTSYNC_API_MAX_PAGE_SIZE", "5000");
        let err = config_from(&map).unwrap_err();
        assert!(err.to_string().contains("LIFTSYNC_API_MAX_PAGE_SIZE"));

        map.insert("LIFTSYNC_API_MAX_PAGE_SIZE", "many");
        assert!(config_from(&map).is_err());
    }

    #[test]
    fn config_redacts_token_in_debug() {
        let mut map = HashMap::new();
        map.insert("LIFTSYNC_API_TOKEN", " sensitive-api-token ");

        let config = config_from(&map).unwrap();
        assert_eq!(config.api_token.as_deref(), Some("sensitive-api-token"));

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("sensitive-api-token"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn page_size_is_clamped() {
        let mut map = HashMap::new();
        map.insert("LIFTSYNC_API_MAX_PAGE_SIZE", "50");
        let config = config_from(&map).unwrap();

        assert_eq!(config.page_size(None), 50);
        assert_eq!(config.page_size(Some(0)), 1);
        assert_eq!(config.page_size(Some(20)), 20);
        assert_eq!(config.page_size(Some(10_000)), 50);
    }
}
