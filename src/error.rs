//! Error types for the docsend-dl library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DocSendError`] is **fatal**: the call cannot proceed at all (bad URL,
//!   email-gated deck, no slides on the page, output directory not writable).
//!   Returned as `Err(DocSendError)` from the top-level entry points.
//!
//! * [`SlideError`] is **non-fatal**: a single slide failed to download after
//!   all retries. It is logged and reported to the progress callback, and the
//!   slide's filename lands in [`crate::output::DownloadResult::failed_slides`].
//!
//! Per-slide discovery failures are plain strings in
//! [`crate::output::DeckInfo::warnings`] since they come back from the page.

use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::browser::BrowserError;

/// All fatal errors returned by the docsend-dl library.
#[derive(Debug, Error)]
pub enum DocSendError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input string is not a DocSend deck URL.
    #[error(
        "Invalid DocSend URL: '{url}'\n\
Expected format: https://docsend.com/view/XXXXXX or https://dbx.docsend.com/view/XXXXXX"
    )]
    InvalidUrl { url: String },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The deck asks visitors for their email before showing slides.
    #[error(
        "This deck requires email verification to view.\n\
Only public (no-email) decks are supported."
    )]
    EmailGateRequired,

    /// The page loaded but slides or their URLs could not be recovered.
    #[error("Extraction failed: {reason}")]
    ExtractionFailed { reason: String },

    /// The browser could not be launched or stopped responding.
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the directory slides are written to.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the assembled PDF.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Assembly errors ───────────────────────────────────────────────────
    /// PDF assembly was asked to build a document with no pages.
    #[error("image_paths must not be empty")]
    EmptyImageList,

    /// An input image for PDF assembly does not exist.
    #[error("Image not found: '{path}'")]
    ImageNotFound { path: PathBuf },

    /// An input image exists but could not be decoded.
    #[error("Could not decode image '{path}': {detail}")]
    ImageDecode { path: PathBuf, detail: String },

    /// The PDF writer rejected the document.
    #[error("PDF assembly failed: {0}")]
    PdfAssembly(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocSendError {
    pub(crate) fn extraction(reason: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            reason: reason.into(),
        }
    }
}

/// A non-fatal error for a single slide download.
///
/// `slide` is the 1-based slide number.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum SlideError {
    /// The server answered with a non-2xx status.
    #[error("Slide {slide}: HTTP {status}")]
    Http { slide: usize, status: u16 },

    /// Connection, timeout or body-read failure.
    #[error("Slide {slide}: {detail}")]
    Transport { slide: usize, detail: String },

    /// The body arrived but could not be written to disk.
    #[error("Slide {slide}: write failed: {detail}")]
    Write { slide: usize, detail: String },

    /// Every attempt failed; `last` is the final attempt's error.
    #[error("Slide {slide}: failed after {attempts} attempts: {last}")]
    Exhausted {
        slide: usize,
        attempts: u32,
        last: String,
    },
}

impl SlideError {
    /// 1-based slide number this error belongs to.
    pub fn slide(&self) -> usize {
        match self {
            Self::Http { slide, .. }
            | Self::Transport { slide, .. }
            | Self::Write { slide, .. }
            | Self::Exhausted { slide, .. } => *slide,
        }
    }

    /// The message without the `Slide {n}:` prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::Http { status, .. } => format!("HTTP {status}"),
            Self::Transport { detail, .. } => detail.clone(),
            Self::Write { detail, .. } => format!("write failed: {detail}"),
            Self::Exhausted { last, .. } => last.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_display_mentions_expected_format() {
        let e = DocSendError::InvalidUrl {
            url: "https://example.com/view/abc".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("example.com"), "got: {msg}");
        assert!(msg.contains("docsend.com/view/"), "got: {msg}");
    }

    #[test]
    fn email_gate_display() {
        let msg = DocSendError::EmailGateRequired.to_string();
        assert!(msg.contains("email verification"), "got: {msg}");
    }

    #[test]
    fn extraction_helper_builds_variant() {
        let e = DocSendError::extraction("No slides found in this deck.");
        assert!(matches!(e, DocSendError::ExtractionFailed { .. }));
        assert!(e.to_string().contains("No slides found"));
    }

    #[test]
    fn empty_image_list_display() {
        assert!(DocSendError::EmptyImageList
            .to_string()
            .contains("must not be empty"));
    }

    #[test]
    fn slide_error_display() {
        let e = SlideError::Http {
            slide: 4,
            status: 500,
        };
        assert_eq!(e.to_string(), "Slide 4: HTTP 500");

        let e = SlideError::Exhausted {
            slide: 2,
            attempts: 3,
            last: "HTTP 503".into(),
        };
        assert!(e.to_string().contains("3 attempts"));
        assert_eq!(e.slide(), 2);
        assert_eq!(e.detail(), "HTTP 503");
    }
}
