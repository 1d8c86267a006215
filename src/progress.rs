//! Progress-callback trait for extraction and download events.
//!
//! Inject an [`Arc<dyn DeckProgressCallback>`] via
//! [`crate::config::DeckConfigBuilder::progress_callback`] to receive events
//! as the pipeline loads the deck, discovers slide URLs batch by batch, and
//! downloads each slide.
//!
//! # Example
//!
//! ```rust
//! use docsend_dl::{DeckConfig, DeckProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     saved: AtomicUsize,
//! }
//!
//! impl DeckProgressCallback for CountingCallback {
//!     fn on_slide_complete(&self, filename: &str, bytes: u64) {
//!         self.saved.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{filename}: {bytes} bytes");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { saved: AtomicUsize::new(0) });
//!
//! let config = DeckConfig::builder()
//!     .progress_callback(counter as Arc<dyn DeckProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it extracts and downloads a deck.
///
/// Slide downloads run concurrently, so `on_slide_complete` and
/// `on_slide_error` may be called from different tasks at the same time.
/// Implementations must protect shared mutable state accordingly.
pub trait DeckProgressCallback: Send + Sync {
    /// A human-readable status line ("Launching browser...", "Waiting for slides...").
    fn on_status(&self, message: &str) {
        let _ = message;
    }

    /// Called after each discovery batch settles.
    ///
    /// # Arguments
    /// * `discovered`: slides covered so far (successful or not)
    /// * `total`: slides in the deck
    fn on_discovery_batch(&self, discovered: usize, total: usize) {
        let _ = (discovered, total);
    }

    /// Called once before any slide download starts.
    ///
    /// # Arguments
    /// * `total`: number of slides with a URL (skipped slides excluded)
    fn on_download_start(&self, total: usize) {
        let _ = total;
    }

    /// Called when a slide has been written to disk.
    fn on_slide_complete(&self, filename: &str, bytes: u64) {
        let _ = (filename, bytes);
    }

    /// Called when a slide fails after all attempts are exhausted.
    fn on_slide_error(&self, filename: &str, error: &str) {
        let _ = (filename, error);
    }

    /// Called once after all downloads have been attempted.
    fn on_download_complete(&self, successes: usize, failures: usize) {
        let _ = (successes, failures);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl DeckProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::DeckConfig`].
pub type ProgressCallback = Arc<dyn DeckProgressCallback>;
