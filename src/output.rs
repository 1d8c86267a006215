//! Result types returned by the extractor, the downloader and the orchestrator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output filename for the 0-based slide `index`: `slide_01.png`, `slide_02.png`, …
///
/// The mapping depends on nothing but the index, so it joins
/// [`DeckInfo::image_urls`] with [`DownloadResult::failed_slides`].
pub fn slide_filename(index: usize) -> String {
    format!("slide_{:02}.png", index + 1)
}

/// Everything the extractor learned about a deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckInfo {
    /// Display name; never empty.
    pub title: String,
    /// Number of slides on the page; always ≥ 1.
    pub slide_count: usize,
    /// One entry per slide, in slide order. `None` when discovery failed.
    pub image_urls: Vec<Option<String>>,
    /// Non-fatal discovery failures, `"Slide {n}: {error}"`.
    pub warnings: Vec<String>,
}

impl DeckInfo {
    /// Number of slides with a signed URL.
    pub fn valid_url_count(&self) -> usize {
        self.image_urls.iter().filter(|u| u.is_some()).count()
    }
}

/// Aggregate outcome of a download run.
///
/// `successes + failures` equals the number of present URLs; absent URLs are
/// counted in `skipped` only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub successes: usize,
    pub failures: usize,
    pub skipped: usize,
    /// Sum of the sizes of all files written.
    pub total_bytes: u64,
    /// Filenames of slides that failed every attempt, in slide order.
    pub failed_slides: Vec<String>,
}

impl DownloadResult {
    /// `true` when no slide failed.
    pub fn is_complete(&self) -> bool {
        self.failures == 0
    }
}

/// What [`crate::deck::download_deck`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMode {
    /// One PDF file.
    Pdf,
    /// A directory of `slide_NN.png` files.
    Images,
}

/// Combined result of extracting and downloading a deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckDownloadResult {
    pub deck_title: String,
    pub slide_count: usize,
    pub successes: usize,
    pub failures: usize,
    /// PDF size in PDF mode; sum of image sizes in images mode.
    pub total_bytes: u64,
    pub failed_slides: Vec<String>,
    /// Discovery warnings carried over from [`DeckInfo`].
    pub warnings: Vec<String>,
    /// PDF file (PDF mode) or slide directory (images mode).
    pub output_path: PathBuf,
    pub mode: OutputMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slide_filename_is_one_based_and_padded() {
        assert_eq!(slide_filename(0), "slide_01.png");
        assert_eq!(slide_filename(8), "slide_09.png");
        assert_eq!(slide_filename(9), "slide_10.png");
        assert_eq!(slide_filename(99), "slide_100.png");
    }

    #[test]
    fn valid_url_count_ignores_gaps() {
        let info = DeckInfo {
            title: "Deck".into(),
            slide_count: 3,
            image_urls: vec![Some("a".into()), None, Some("c".into())],
            warnings: vec!["Slide 2: HTTP 500".into()],
        };
        assert_eq!(info.valid_url_count(), 2);
    }

    #[test]
    fn download_result_completeness() {
        let mut result = DownloadResult::default();
        assert!(result.is_complete());
        result.failures = 1;
        assert!(!result.is_complete());
    }
}
