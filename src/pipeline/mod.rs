//! Pipeline stages for downloading a DocSend deck.
//!
//! Each submodule implements exactly one step. The browser is reached only
//! through the traits in [`browser`], so extraction is testable without a
//! real Chromium.
//!
//! ## Data Flow
//!
//! ```text
//! url ──▶ extract ──▶ download ──▶ assemble
//! (slug)  (browser)   (HTTP)       (lopdf)
//! ```
//!
//! 1. [`url`]      : validate the deck link and pull out its slug
//! 2. [`extract`]  : load the deck, read count and [`title`], fetch signed
//!    URLs in batches from inside the page
//! 3. [`download`] : bounded-concurrency HTTP with retry and atomic writes
//! 4. [`assemble`] : one PDF page per image; runs in `spawn_blocking`
//!
//! [`chromium`] is the bundled [`browser`] implementation.

pub mod assemble;
pub mod browser;
#[cfg(feature = "chromium")]
pub mod chromium;
pub mod download;
pub mod extract;
pub mod title;
pub mod url;
