//! Chrome DevTools Protocol driver for [`BrowserSession`].
//!
//! Launches a local Chromium through `chromiumoxide`, drives a single page
//! and shuts the process down on [`BrowserSession::close`]. Waiting is done
//! by polling `document` state from inside the page, which behaves the same
//! whether the browser runs headless or not.

use crate::pipeline::browser::{
    BrowserError, BrowserLauncher, BrowserSession, LaunchOptions, WaitUntil,
};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, NavigateParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Quiet period after `load` before a page counts as network-idle.
const IDLE_GRACE: Duration = Duration::from_millis(500);

/// Launches a locally installed Chromium.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    executable: Option<PathBuf>,
}

impl ChromiumLauncher {
    /// Use a specific browser binary instead of auto-detection.
    pub fn with_executable(path: impl Into<PathBuf>) -> Self {
        Self {
            executable: Some(path.into()),
        }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(
        &self,
        options: &LaunchOptions,
    ) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .window_size(options.viewport.width, options.viewport.height)
            .viewport(None)
            .request_timeout(options.command_timeout);
        if !options.headless {
            builder = builder.with_head();
        }
        for arg in &options.args {
            builder = builder.arg(arg.clone());
        }
        if let Some(ref exe) = self.executable {
            builder = builder.chrome_executable(exe);
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler stopped: {}", e);
                    break;
                }
            }
        });

        let page = abort_on_error(&handler_task, open_page(&browser, options).await)?;

        debug!(headless = options.headless, "Chromium session started");
        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler_task,
            closed: false,
        }))
    }
}

async fn open_page(browser: &Browser, options: &LaunchOptions) -> Result<Page, BrowserError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| BrowserError::Launch(e.to_string()))?;
    page.set_user_agent(SetUserAgentOverrideParams::new(options.user_agent.clone()))
        .await
        .map_err(protocol)?;
    Ok(page)
}

/// Stop the CDP handler when session setup fails past `Browser::launch`.
fn abort_on_error<T>(
    handler_task: &JoinHandle<()>,
    result: Result<T, BrowserError>,
) -> Result<T, BrowserError> {
    if result.is_err() {
        handler_task.abort();
    }
    result
}

/// A live Chromium process with one page.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    closed: bool,
}

impl ChromiumSession {
    async fn eval_value(&self, expression: String) -> Result<Value, BrowserError> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(BrowserError::Script)?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        Ok(result.into_value::<Value>().unwrap_or(Value::Null))
    }

    async fn eval_bool(&self, expression: String) -> Result<bool, BrowserError> {
        Ok(self.eval_value(expression).await?.as_bool().unwrap_or(false))
    }

    /// Poll `expression` until it is truthy or `budget` runs out.
    async fn poll_until(&self, expression: &str, budget: Duration) -> Result<bool, BrowserError> {
        let deadline = Instant::now() + budget;
        loop {
            // Evaluation fails while a navigation swaps the context; keep polling.
            if let Ok(true) = self.eval_bool(expression.to_string()).await {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn add_init_script(&mut self, script: &str) -> Result<(), BrowserError> {
        self.page
            .evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(script))
            .await
            .map_err(protocol)?;
        Ok(())
    }

    async fn navigate(
        &mut self,
        url: &str,
        wait_until: WaitUntil,
        budget: Duration,
    ) -> Result<(), BrowserError> {
        let started = Instant::now();
        let what = format!("navigating to {url} ({wait_until:?})");
        let timed_out = || BrowserError::Timeout {
            what: what.clone(),
            after: budget,
        };

        match wait_until {
            WaitUntil::NetworkIdle => {
                timeout(budget, self.page.goto(url))
                    .await
                    .map_err(|_| timed_out())?
                    .map_err(|e| navigation_error(e, &what, budget))?;
                let remaining = budget.saturating_sub(started.elapsed());
                if !self
                    .poll_until("document.readyState === 'complete'", remaining)
                    .await?
                {
                    return Err(timed_out());
                }
                sleep(IDLE_GRACE.min(budget.saturating_sub(started.elapsed()))).await;
            }
            WaitUntil::DomContentLoaded => {
                timeout(budget, self.page.execute(NavigateParams::new(url)))
                    .await
                    .map_err(|_| timed_out())?
                    .map_err(|e| navigation_error(e, &what, budget))?;
                let remaining = budget.saturating_sub(started.elapsed());
                if !self
                    .poll_until("document.readyState !== 'loading'", remaining)
                    .await?
                {
                    return Err(timed_out());
                }
            }
        }
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        budget: Duration,
    ) -> Result<bool, BrowserError> {
        self.poll_until(&selector_probe(selector), budget).await
    }

    async fn query_selector(&mut self, selector: &str) -> Result<bool, BrowserError> {
        self.eval_bool(selector_probe(selector)).await
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        self.page
            .url()
            .await
            .map_err(protocol)?
            .ok_or_else(|| BrowserError::Protocol("page has no URL".to_string()))
    }

    async fn evaluate(&mut self, script: &str, args: Value) -> Result<Value, BrowserError> {
        self.eval_value(format!("({script})({args})")).await
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self.browser.close().await.map(|_| ()).map_err(protocol);
        if let Err(e) = self.browser.wait().await {
            warn!("Browser process did not exit cleanly: {}", e);
        }
        self.handler_task.abort();
        result
    }
}

/// `document.querySelector(selector) !== null` with `selector` safely quoted.
fn selector_probe(selector: &str) -> String {
    format!("document.querySelector({}) !== null", Value::from(selector))
}

/// The driver's own command timeout counts as a navigation timeout.
fn navigation_error(e: CdpError, what: &str, budget: Duration) -> BrowserError {
    match e {
        CdpError::Timeout => BrowserError::Timeout {
            what: what.to_string(),
            after: budget,
        },
        other => BrowserError::Navigation(other.to_string()),
    }
}

fn protocol(e: impl std::fmt::Display) -> BrowserError {
    BrowserError::Protocol(e.to_string())
}
