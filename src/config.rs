//! Configuration management.
//!
//! Settings come from a TOML file (`--config`, else `./daraz.toml` when it
//! exists) with built-in defaults for anything left out.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scrapers::{BrowserEngineConfig, DelayRange, SelectorConfig};

/// Default Daraz storefront.
pub const DEFAULT_BASE_URL: &str = "https://www.daraz.com.np";

/// Default API bind address.
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "daraz.toml";

/// HTTP and pacing settings for the scraper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperSettings {
    pub base_url: String,
    /// Custom user agent, or "impersonate" for a random real browser one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Pause before each plain HTTP request.
    pub request_delay: DelayRange,
    /// Pause between consecutive listing pages.
    pub page_delay: DelayRange,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: None,
            request_timeout: 15,
            request_delay: DelayRange::new(2.0, 4.0),
            page_delay: DelayRange::new(3.0, 6.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperSettings,
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub server: ServerSettings,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist and parse. Without one, `./daraz.toml` is
    /// used when present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.is_file() {
                    Self::load_from_path(local)
                } else {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific TOML file.
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.source_path = Some(path.to_path_buf());
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.scraper.base_url, "https://www.daraz.com.np");
        assert_eq!(config.scraper.request_timeout, 15);
        assert_eq!(config.scraper.request_delay, DelayRange::new(2.0, 4.0));
        assert_eq!(config.scraper.page_delay, DelayRange::new(3.0, 6.0));
        assert_eq!(config.server.bind, "0.0.0.0:8000");
        assert!(config.browser.enabled);
        assert_eq!(config.selectors, SelectorConfig::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [scraper]
            request_timeout = 30
            page_delay = { min = 0.0, max = 0.0 }

            [browser]
            enabled = false

            [selectors]
            title = [".product-title a"]
            "#,
        )
        .unwrap();

        assert_eq!(config.scraper.request_timeout, 30);
        assert_eq!(config.scraper.page_delay, DelayRange::none());
        assert_eq!(config.scraper.base_url, DEFAULT_BASE_URL);
        assert!(!config.browser.enabled);
        assert_eq!(config.selectors.title, vec![".product-title a".to_string()]);
        assert_eq!(config.selectors.price, SelectorConfig::default().price);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind = \"127.0.0.1:9000\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.source_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Config::from_toml("[scraper\nbase_url = 1").is_err());
    }
}
