//! Scripted in-memory browser used by the pipeline tests.
//!
//! `MockLauncher` hands out sessions that answer exactly the calls the
//! extractor makes, driven by a [`MockDeck`] description, and records
//! everything in a shared [`CallLog`].

#![allow(dead_code)]

use async_trait::async_trait;
use docsend_dl::pipeline::browser::{
    BrowserError, BrowserLauncher, BrowserSession, LaunchOptions, WaitUntil,
};
use docsend_dl::scripts::{
    CAROUSEL_ITEM_SELECTOR, DECK_INFO_SCRIPT, EMAIL_GATE_SELECTOR, PAGE_DATA_BATCH_SCRIPT,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type SlideFn = Arc<dyn Fn(usize) -> Result<Option<String>, String> + Send + Sync>;

/// What the fake page looks like.
#[derive(Clone)]
pub struct MockDeck {
    pub slide_count: usize,
    pub og_title: Option<String>,
    pub document_title: String,
    /// Whether the carousel ever appears.
    pub carousel: bool,
    pub email_gate: bool,
    /// Network-idle navigation times out (DOM-loaded still works).
    pub network_idle_times_out: bool,
    /// URL reported after navigation; defaults to the requested URL.
    pub redirect_to: Option<String>,
    /// Batches (by first 0-based index) whose evaluation throws.
    pub failing_batches: Vec<usize>,
    /// Per-slide `page_data` outcome by 0-based index.
    pub slide_url: SlideFn,
}

impl MockDeck {
    /// A healthy deck whose slide `i` lives at `https://cdn.test/{i + 1}.png`.
    pub fn healthy(slide_count: usize) -> Self {
        Self::serving(slide_count, |i| Ok(Some(format!("https://cdn.test/{}.png", i + 1))))
    }

    pub fn serving(
        slide_count: usize,
        f: impl Fn(usize) -> Result<Option<String>, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            slide_count,
            og_title: Some("Acme Seed Deck".to_string()),
            document_title: "Acme Seed Deck - DocSend".to_string(),
            carousel: true,
            email_gate: false,
            network_idle_times_out: false,
            redirect_to: None,
            failing_batches: Vec::new(),
            slide_url: Arc::new(f),
        }
    }
}

/// Everything the extractor asked the browser to do.
#[derive(Debug, Default)]
pub struct CallLog {
    pub launches: usize,
    pub closes: usize,
    pub options: Option<LaunchOptions>,
    pub init_scripts: Vec<String>,
    pub navigations: Vec<(String, WaitUntil)>,
    /// `(index, path)` pairs of each discovery batch, in call order.
    pub batches: Vec<Vec<(usize, String)>>,
}

pub struct MockLauncher {
    deck: MockDeck,
    fail_launch: bool,
    pub log: Arc<Mutex<CallLog>>,
}

impl MockLauncher {
    pub fn new(deck: MockDeck) -> Self {
        Self {
            deck,
            fail_launch: false,
            log: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::new(MockDeck::healthy(1))
        }
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, CallLog> {
        self.log.lock().unwrap()
    }
}

#[async_trait]
impl BrowserLauncher for MockLauncher {
    async fn launch(
        &self,
        options: &LaunchOptions,
    ) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let mut log = self.log.lock().unwrap();
        log.launches += 1;
        log.options = Some(options.clone());
        if self.fail_launch {
            return Err(BrowserError::Launch("no browser installed".to_string()));
        }
        Ok(Box::new(MockSession {
            deck: self.deck.clone(),
            log: Arc::clone(&self.log),
            url: "about:blank".to_string(),
        }))
    }
}

struct MockSession {
    deck: MockDeck,
    log: Arc<Mutex<CallLog>>,
    url: String,
}

impl MockSession {
    fn run_batch(&self, args: &Value) -> Result<Value, BrowserError> {
        let requests: Vec<(usize, String)> = args["requests"]
            .as_array()
            .ok_or_else(|| BrowserError::Script("missing requests".to_string()))?
            .iter()
            .map(|r| {
                (
                    r["index"].as_u64().unwrap_or(u64::MAX) as usize,
                    r["path"].as_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        let first = requests.first().map(|(i, _)| *i);
        self.log.lock().unwrap().batches.push(requests.clone());

        if first.is_some_and(|i| self.deck.failing_batches.contains(&i)) {
            return Err(BrowserError::Script(
                "Execution context was destroyed".to_string(),
            ));
        }

        let entries: Vec<Value> = requests
            .iter()
            .map(|(index, _)| match (self.deck.slide_url)(*index) {
                Ok(url) => json!({ "index": index, "url": url, "error": null }),
                Err(e) => json!({ "index": index, "url": null, "error": e }),
            })
            .collect();
        Ok(Value::Array(entries))
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn add_init_script(&mut self, script: &str) -> Result<(), BrowserError> {
        self.log.lock().unwrap().init_scripts.push(script.to_string());
        Ok(())
    }

    async fn navigate(
        &mut self,
        url: &str,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        self.log
            .lock()
            .unwrap()
            .navigations
            .push((url.to_string(), wait_until));
        if wait_until == WaitUntil::NetworkIdle && self.deck.network_idle_times_out {
            return Err(BrowserError::Timeout {
                what: "network idle".to_string(),
                after: timeout,
            });
        }
        self.url = self.deck.redirect_to.clone().unwrap_or_else(|| url.to_string());
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<bool, BrowserError> {
        Ok(selector == CAROUSEL_ITEM_SELECTOR && self.deck.carousel)
    }

    async fn query_selector(&mut self, selector: &str) -> Result<bool, BrowserError> {
        Ok(match selector {
            s if s == EMAIL_GATE_SELECTOR => self.deck.email_gate,
            s if s == CAROUSEL_ITEM_SELECTOR => self.deck.carousel,
            _ => false,
        })
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        Ok(self.url.clone())
    }

    async fn evaluate(&mut self, script: &str, args: Value) -> Result<Value, BrowserError> {
        if script == DECK_INFO_SCRIPT {
            Ok(json!({
                "slideCount": self.deck.slide_count,
                "ogTitle": self.deck.og_title,
                "documentTitle": self.deck.document_title,
            }))
        } else if script == PAGE_DATA_BATCH_SCRIPT {
            self.run_batch(&args)
        } else {
            Err(BrowserError::Script(format!("unexpected script: {script}")))
        }
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }
}

/// A small solid-colour PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([30, 60, 90]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}
