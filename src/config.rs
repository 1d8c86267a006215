//! Configuration types for deck extraction and download.
//!
//! All behaviour is controlled through [`DeckConfig`], built via its
//! [`DeckConfigBuilder`]. One struct is shared by the extractor, the
//! downloader and the orchestrator so a run can be described (and logged) in
//! one place.

use crate::error::DocSendError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Configuration for extracting and downloading a deck.
///
/// Built via [`DeckConfig::builder()`] or using [`DeckConfig::default()`].
///
/// # Example
/// ```rust
/// use docsend_dl::DeckConfig;
/// use std::time::Duration;
///
/// let config = DeckConfig::builder()
///     .concurrency(4)
///     .max_retries(5)
///     .request_timeout(Duration::from_secs(10))
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 4);
/// ```
#[derive(Clone)]
pub struct DeckConfig {
    /// Maximum number of slide images downloading at once. Default: 10.
    ///
    /// This is a flat pool: a new transfer starts as soon as any in-flight
    /// transfer finishes.
    pub concurrency: usize,

    /// Total download attempts per slide, including the first. Default: 3.
    pub max_retries: u32,

    /// Per-attempt HTTP timeout. Default: 30 s.
    pub request_timeout: Duration,

    /// Backoff unit between attempts. Default: 1 s.
    ///
    /// The delay before attempt `n + 1` is `n × retry_backoff`, so the
    /// default sequence is 1 s → 2 s.
    pub retry_backoff: Duration,

    /// Run the browser without a visible window. Default: true.
    pub headless: bool,

    /// Save individual PNG files instead of assembling a PDF. Default: false.
    pub images_only: bool,

    /// Which deck URL shapes are accepted. Default: [`UrlGrammar::Strict`].
    pub url_grammar: UrlGrammar,

    /// Budget for each page navigation attempt. Default: 30 s.
    pub navigation_timeout: Duration,

    /// How long to wait for the slide carousel to appear. Default: 15 s.
    pub selector_timeout: Duration,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            max_retries: 3,
            request_timeout: Duration::from_secs(30),
            retry_backoff: Duration::from_secs(1),
            headless: true,
            images_only: false,
            url_grammar: UrlGrammar::default(),
            navigation_timeout: Duration::from_secs(30),
            selector_timeout: Duration::from_secs(15),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for DeckConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeckConfig")
            .field("concurrency", &self.concurrency)
            .field("max_retries", &self.max_retries)
            .field("request_timeout", &self.request_timeout)
            .field("retry_backoff", &self.retry_backoff)
            .field("headless", &self.headless)
            .field("images_only", &self.images_only)
            .field("url_grammar", &self.url_grammar)
            .field("navigation_timeout", &self.navigation_timeout)
            .field("selector_timeout", &self.selector_timeout)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn DeckProgressCallback>"),
            )
            .finish()
    }
}

impl DeckConfig {
    /// Create a new builder for `DeckConfig`.
    pub fn builder() -> DeckConfigBuilder {
        DeckConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`DeckConfig`].
#[derive(Debug)]
pub struct DeckConfigBuilder {
    config: DeckConfig,
}

impl DeckConfigBuilder {
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn retry_backoff(mut self, unit: Duration) -> Self {
        self.config.retry_backoff = unit;
        self
    }

    pub fn headless(mut self, v: bool) -> Self {
        self.config.headless = v;
        self
    }

    pub fn images_only(mut self, v: bool) -> Self {
        self.config.images_only = v;
        self
    }

    pub fn url_grammar(mut self, grammar: UrlGrammar) -> Self {
        self.config.url_grammar = grammar;
        self
    }

    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.config.navigation_timeout = timeout;
        self
    }

    pub fn selector_timeout(mut self, timeout: Duration) -> Self {
        self.config.selector_timeout = timeout;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DeckConfig, DocSendError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(DocSendError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.max_retries == 0 {
            return Err(DocSendError::InvalidConfig(
                "max_retries counts total attempts and must be ≥ 1".into(),
            ));
        }
        if c.request_timeout.is_zero() {
            return Err(DocSendError::InvalidConfig(
                "Request timeout must be greater than zero".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Deck URL shapes the validator accepts.
///
/// | Grammar | `/view/{slug}` | `/v/{space}/{name}` |
/// |---------|----------------|---------------------|
/// | `Strict` | slug | `InvalidUrl` |
/// | `AllowSpaceLinks` | slug | accepted; slug read from the page after navigation |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UrlGrammar {
    /// Only `/view/{slug}` links. (default)
    #[default]
    Strict,
    /// Also accept `/v/{space}/{name}` space links.
    AllowSpaceLinks,
}
