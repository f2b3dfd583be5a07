//! Headless Chrome renderer for listing pages.
//!
//! Daraz builds its product grid client-side, so the plain HTML response is
//! often an empty shell. This module drives chromiumoxide (CDP) to load the
//! page, wait for product cards, scroll to trigger lazy loading and read the
//! resulting DOM back.

mod config;
#[cfg(feature = "browser")]
mod stealth;
mod types;

pub use config::BrowserEngineConfig;
pub use types::RenderedPage;

#[cfg(feature = "browser")]
use std::sync::Arc;
#[cfg(feature = "browser")]
use std::time::Duration;

#[cfg(feature = "browser")]
use anyhow::Context;
use anyhow::Result;
#[cfg(feature = "browser")]
use tokio::sync::Mutex;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, NavigateParams,
};
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;

#[cfg(feature = "browser")]
use stealth::{STEALTH_ARGS, STEALTH_SCRIPTS};

/// How often the ready check is repeated while waiting for cards.
#[cfg(feature = "browser")]
const READY_POLL: Duration = Duration::from_millis(500);

#[cfg(feature = "browser")]
const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// JavaScript expression that is true once any of `selectors` matches.
pub fn ready_check_script(selectors: &[String]) -> String {
    let list = serde_json::to_string(selectors).unwrap_or_else(|_| "[]".to_string());
    format!(
        "{}.some((s) => {{ try {{ return document.querySelector(s) !== null; }} catch (e) {{ return false; }} }})",
        list
    )
}

/// Browser-based fetcher with stealth capabilities.
#[cfg(feature = "browser")]
pub struct BrowserFetcher {
    pub(crate) config: BrowserEngineConfig,
    user_agent: String,
    pub(crate) browser: Option<Arc<Mutex<Browser>>>,
}

#[cfg(feature = "browser")]
impl BrowserFetcher {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    /// Create a new browser fetcher. Nothing is launched until first use.
    pub fn new(config: BrowserEngineConfig, user_agent: String) -> Self {
        Self {
            config,
            user_agent,
            browser: None,
        }
    }

    /// Find Chrome executable.
    fn find_chrome() -> Result<std::path::PathBuf> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(std::path::PathBuf::from(path));
                    }
                }
            }
        }

        Err(anyhow::anyhow!(
            "Chrome/Chromium not found. Install it or set [browser] remote_url:\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium\n\
             - Or download from: https://www.google.com/chrome/"
        ))
    }

    /// Launch or connect to browser if not already running.
    pub async fn ensure_browser(&mut self) -> Result<()> {
        if self.browser.is_some() {
            return Ok(());
        }

        if let Some(remote_url) = self.config.remote_url.clone() {
            return self.connect_remote(&remote_url).await;
        }

        info!("Launching browser (headless={})", self.config.headless);

        let chrome_path = Self::find_chrome()?;
        let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        for arg in STEALTH_ARGS {
            builder = builder.arg(*arg);
        }
        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        self.browser = Some(Arc::new(Mutex::new(browser)));

        Ok(())
    }

    /// Connect to a remote Chrome instance.
    async fn connect_remote(&mut self, url: &str) -> Result<()> {
        info!(
            "Connecting to remote browser at {} (timeout: {}s)",
            url, self.config.timeout
        );

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .timeout(Duration::from_secs(self.config.timeout))
            .send()
            .await
            .context("Failed to connect to remote browser")?
            .json()
            .await
            .context("Failed to parse browser version info")?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("No webSocketDebuggerUrl in response"))?;

        debug!("Connecting to WebSocket: {}", ws_url);

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: Duration::from_secs(self.config.timeout),
            ..Default::default()
        };

        let (browser, mut handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .context("Failed to connect to remote browser")?;

        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        self.browser = Some(Arc::new(Mutex::new(browser)));

        Ok(())
    }

    /// Load `url`, wait for any of `ready` to match, scroll and read the DOM.
    ///
    /// Errors before navigation completes are returned as `Err`. Once the
    /// page is loaded, later failures degrade to whatever markup can still be
    /// read.
    pub async fn render(&mut self, url: &str, ready: &[String]) -> Result<RenderedPage> {
        self.ensure_browser().await?;

        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Browser not running"))?
            .lock()
            .await;
        let page = browser.new_page("about:blank").await?;

        let result = self.load_and_read(&page, url, ready).await;

        // Close the page to prevent tab accumulation
        let _ = page.close().await;
        result
    }

    async fn load_and_read(&self, page: &Page, url: &str, ready: &[String]) -> Result<RenderedPage> {
        page.execute(SetUserAgentOverrideParams::new(self.user_agent.clone()))
            .await?;
        for script in STEALTH_SCRIPTS {
            if let Err(e) = page
                .execute(AddScriptToEvaluateOnNewDocumentParams::new(script.to_string()))
                .await
            {
                debug!("Stealth script injection skipped: {}", e);
            }
        }

        info!("Navigating to {}", url);
        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| anyhow::anyhow!("Invalid URL: {}", e))?;
        page.execute(nav_params).await?;

        match self.settle(page, ready).await {
            Ok(ready_timed_out) => {
                let html = page.content().await?;
                Ok(RenderedPage {
                    html,
                    ready_timed_out,
                    render_error: None,
                })
            }
            Err(e) => {
                warn!("Render of {} failed after navigation: {}", url, e);
                let html = page
                    .content()
                    .await
                    .context("Could not read page after render failure")?;
                Ok(RenderedPage {
                    html,
                    ready_timed_out: false,
                    render_error: Some(e.to_string()),
                })
            }
        }
    }

    /// Wait for cards, scroll, let lazy content land. Returns true when the
    /// ready wait timed out.
    async fn settle(&self, page: &Page, ready: &[String]) -> Result<bool> {
        let timed_out = if ready.is_empty() {
            false
        } else {
            let check = ready_check_script(ready);
            let wait = async {
                loop {
                    let found: bool = page
                        .evaluate(check.clone())
                        .await?
                        .into_value()
                        .unwrap_or(false);
                    if found {
                        return Ok::<_, anyhow::Error>(());
                    }
                    tokio::time::sleep(READY_POLL).await;
                }
            };
            match tokio::time::timeout(Duration::from_secs(self.config.timeout), wait).await {
                Ok(result) => {
                    result?;
                    debug!("Product cards present");
                    false
                }
                Err(_) => {
                    warn!(
                        "Timed out after {}s waiting for product cards, reading page anyway",
                        self.config.timeout
                    );
                    true
                }
            }
        };

        page.evaluate(SCROLL_TO_BOTTOM.to_string()).await?;
        tokio::time::sleep(Duration::from_millis(self.config.settle_ms)).await;

        Ok(timed_out)
    }

    /// Close the browser.
    pub async fn close(&mut self) {
        if let Some(browser) = self.browser.take() {
            let mut browser = browser.lock().await;
            if let Err(e) = browser.close().await {
                debug!("Browser close failed: {}", e);
            }
            info!("Browser closed");
        }
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct BrowserFetcher {
    config: BrowserEngineConfig,
}

#[cfg(not(feature = "browser"))]
impl BrowserFetcher {
    pub fn new(config: BrowserEngineConfig, _user_agent: String) -> Self {
        Self { config }
    }

    pub async fn ensure_browser(&mut self) -> Result<()> {
        Err(anyhow::anyhow!(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
        ))
    }

    pub async fn render(&mut self, _url: &str, _ready: &[String]) -> Result<RenderedPage> {
        self.ensure_browser().await?;
        Ok(RenderedPage::default())
    }

    pub async fn close(&mut self) {}
}
