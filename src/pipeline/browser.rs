//! Browser-automation capability consumed by the deck extractor.
//!
//! DocSend serves slide content only to something that looks like a real
//! desktop browser, and the `page_data` endpoint only answers same-origin
//! requests from a loaded deck page. The extractor therefore needs a live
//! page it can navigate, probe and run scripts in; these traits describe
//! exactly that surface and nothing more.
//!
//! [`crate::pipeline::chromium::ChromiumLauncher`] implements them over the
//! Chrome DevTools Protocol. Any other driver can be plugged in through
//! [`crate::pipeline::extract::extract_deck_with`].

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Chrome 131 on Linux.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Hides `navigator.webdriver`, the first thing bot detection checks.
pub const HIDE_WEBDRIVER_SCRIPT: &str =
    r#"Object.defineProperty(navigator, "webdriver", { get: () => undefined });"#;

/// Errors surfaced by a browser driver.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The browser process could not be started.
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// A navigation or wait exceeded its budget.
    #[error("timed out after {}ms: {what}", .after.as_millis())]
    Timeout { what: String, after: Duration },

    /// Navigation failed for a reason other than a timeout.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// A script threw or returned something that could not be serialised.
    #[error("script evaluation failed: {0}")]
    Script(String),

    /// The driver connection broke.
    #[error("browser protocol error: {0}")]
    Protocol(String),
}

/// When a navigation counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// No network activity for a short while. Thorough but may never settle
    /// on pages with long-polling.
    NetworkIdle,
    /// The initial HTML has been parsed.
    DomContentLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// How to start a browser and shape its single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub headless: bool,
    /// Extra command-line flags for the browser process.
    pub args: Vec<String>,
    pub user_agent: String,
    pub viewport: Viewport,
    /// Upper bound the driver puts on any single protocol command. Must
    /// exceed every navigation budget so the caller's own timeout fires first.
    pub command_timeout: Duration,
}

impl LaunchOptions {
    /// A standard 1080p desktop Chrome with automation signals suppressed.
    pub fn desktop(headless: bool) -> Self {
        Self {
            headless,
            args: vec![
                "--disable-blink-features=AutomationControlled".to_string(),
                "--no-sandbox".to_string(),
            ],
            user_agent: DESKTOP_USER_AGENT.to_string(),
            viewport: Viewport {
                width: 1920,
                height: 1080,
            },
            command_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

/// Starts browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Launch a browser with one page configured per `options`.
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// One browser process with one page.
///
/// The session is owned by a single extraction call. Callers must call
/// [`BrowserSession::close`] on every exit path.
#[async_trait]
pub trait BrowserSession: Send {
    /// Run `script` in every document before the page's own scripts.
    async fn add_init_script(&mut self, script: &str) -> Result<(), BrowserError>;

    /// Navigate to `url`. Exceeding `timeout` yields [`BrowserError::Timeout`].
    async fn navigate(
        &mut self,
        url: &str,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), BrowserError>;

    /// Wait until `selector` matches an element. `Ok(false)` on timeout.
    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, BrowserError>;

    /// Whether `selector` currently matches anything.
    async fn query_selector(&mut self, selector: &str) -> Result<bool, BrowserError>;

    /// The page's current URL (after redirects).
    async fn current_url(&mut self) -> Result<String, BrowserError>;

    /// Call the JavaScript function expression `script` with `args` and
    /// return its (awaited) result as JSON.
    async fn evaluate(&mut self, script: &str, args: Value) -> Result<Value, BrowserError>;

    /// Shut the browser down.
    async fn close(&mut self) -> Result<(), BrowserError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_profile() {
        let opts = LaunchOptions::desktop(true);
        assert!(opts.headless);
        assert_eq!(opts.viewport, Viewport { width: 1920, height: 1080 });
        assert!(opts.user_agent.contains("Chrome/131"));
        assert_eq!(opts.command_timeout, Duration::from_secs(30));
        assert!(opts
            .args
            .iter()
            .any(|a| a == "--disable-blink-features=AutomationControlled"));
    }

    #[test]
    fn timeout_display() {
        let e = BrowserError::Timeout {
            what: "navigation".into(),
            after: Duration::from_secs(30),
        };
        assert_eq!(e.to_string(), "timed out after 30000ms: navigation");
    }
}
