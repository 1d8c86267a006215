//! # docsend-dl
//!
//! Download the slides of public DocSend decks as PNG images or a single PDF.
//!
//! ## Why a browser?
//!
//! DocSend never links slide images from the page markup. Each slide's
//! signed image URL comes from a JSON endpoint (`/view/{slug}/page_data/{n}`)
//! that only answers same-origin requests from a loaded deck page carrying
//! the viewer's session. This crate therefore loads the deck in a real
//! (headless) Chromium, asks the page for every slide's URL, and then
//! downloads the images directly over HTTP.
//!
//! ## Pipeline Overview
//!
//! ```text
//! deck URL
//!  │
//!  ├─ 1. Validate  /view/{slug} (and optionally /v/{space}/{name}) → slug
//!  ├─ 2. Extract   browser: slide count, title, signed URLs in batches of 10
//!  ├─ 3. Download  concurrent HTTP with retry → slide_01.png, slide_02.png, …
//!  └─ 4. Assemble  ordered PNGs → one PDF (skipped in images mode)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docsend_dl::{download_deck, DeckConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DeckConfig::default();
//!     let result = download_deck("https://docsend.com/view/abc123", None, &config).await?;
//!     eprintln!("{}: {}/{} slides -> {}",
//!         result.deck_title,
//!         result.successes,
//!         result.slide_count,
//!         result.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature    | Default | Description |
//! |------------|---------|-------------|
//! | `cli`      | on      | Enables the `docsend-dl` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `chromium` | on      | Bundled Chrome DevTools driver ([`pipeline::chromium::ChromiumLauncher`]) |
//!
//! Without `chromium`, drive extraction through your own
//! [`pipeline::browser::BrowserLauncher`] and [`download_deck_with`]:
//! ```toml
//! docsend-dl = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod deck;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod scripts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DeckConfig, DeckConfigBuilder, UrlGrammar};
pub use deck::{download_deck_with, resolve_pdf_path};
pub use error::{DocSendError, SlideError};
pub use output::{slide_filename, DeckDownloadResult, DeckInfo, DownloadResult, OutputMode};
pub use pipeline::assemble::assemble_pdf;
pub use pipeline::download::download_slides;
pub use pipeline::extract::extract_deck_with;
pub use pipeline::url::parse_deck_url;
pub use progress::{DeckProgressCallback, NoopProgressCallback, ProgressCallback};

#[cfg(feature = "chromium")]
pub use deck::download_deck;
#[cfg(feature = "chromium")]
pub use pipeline::extract::extract_deck;
