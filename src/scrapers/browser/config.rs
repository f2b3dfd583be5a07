//! Browser engine configuration types.

use serde::{Deserialize, Serialize};

/// Browser engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserEngineConfig {
    /// Render listings in Chrome. When false every page is fetched over plain HTTP.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Run in headless mode (default: true).
    /// Set to false for debugging or if headless detection is an issue.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Seconds to wait for product cards to appear before reading the page anyway.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Pause after scrolling to the bottom, for lazy-loaded cards and images.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default)]
    pub proxy: Option<String>,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            headless: default_headless(),
            timeout: default_timeout(),
            settle_ms: default_settle_ms(),
            proxy: None,
            chrome_args: Vec::new(),
            remote_url: None,
        }
    }
}

pub fn default_enabled() -> bool {
    true
}

pub fn default_headless() -> bool {
    true
}

pub fn default_timeout() -> u64 {
    20
}

pub fn default_settle_ms() -> u64 {
    3000
}
