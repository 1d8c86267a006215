//! One-call deck download: extract, download, and optionally assemble.
//!
//! ```text
//! extract_deck ──▶ download_slides ──▶ (PDF mode) assemble_pdf
//!                      │
//!                      ├─ images mode: into the output directory
//!                      └─ PDF mode:    into a scratch dir, removed on return
//! ```

use crate::config::DeckConfig;
use crate::error::DocSendError;
use crate::output::{DeckDownloadResult, DeckInfo, DownloadResult, OutputMode};
use crate::pipeline::assemble::assemble_pdf;
use crate::pipeline::browser::BrowserLauncher;
use crate::pipeline::download::{build_http_client, download_slides};
use crate::pipeline::extract::extract_deck_with;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Download a deck with the bundled Chromium driver.
///
/// `output` is a directory in images mode, and either a `.pdf` file or a
/// directory in PDF mode (see [`resolve_pdf_path`]). `None` means the
/// current directory.
///
/// # Example
/// ```rust,no_run
/// use docsend_dl::{download_deck, DeckConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = DeckConfig::default();
/// let result = download_deck("https://docsend.com/view/abc123", None, &config).await?;
/// println!("{} -> {}", result.deck_title, result.output_path.display());
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "chromium")]
pub async fn download_deck(
    url: &str,
    output: Option<&Path>,
    config: &DeckConfig,
) -> Result<DeckDownloadResult, DocSendError> {
    let launcher = crate::pipeline::chromium::ChromiumLauncher::default();
    download_deck_with(&launcher, url, output, config).await
}

/// [`download_deck`] with a caller-supplied browser driver.
///
/// Extraction errors are returned before anything touches the output
/// location, so an email-gated deck leaves no empty directory behind.
pub async fn download_deck_with(
    launcher: &dyn BrowserLauncher,
    url: &str,
    output: Option<&Path>,
    config: &DeckConfig,
) -> Result<DeckDownloadResult, DocSendError> {
    let info = extract_deck_with(launcher, url, config).await?;
    let client = build_http_client(config)?;

    if config.images_only {
        let dir = resolve_image_dir(output, &info.title)?;
        let downloaded = download_slides(&client, &info.image_urls, &dir, config).await?;
        let total_bytes = downloaded.total_bytes;
        return Ok(combine(info, downloaded, total_bytes, dir, OutputMode::Images));
    }

    let pdf_path = resolve_pdf_path(output, &info.title)?;
    let scratch = tempfile::Builder::new()
        .prefix("docsend_")
        .tempdir()
        .map_err(|e| DocSendError::OutputDirFailed {
            path: std::env::temp_dir(),
            source: e,
        })?;

    let downloaded = download_slides(&client, &info.image_urls, scratch.path(), config).await?;
    let images = collect_slide_images(scratch.path()).await?;

    let total_bytes = if images.is_empty() {
        warn!("No slides downloaded; not writing {}", pdf_path.display());
        0
    } else {
        if let Some(ref cb) = config.progress_callback {
            cb.on_status("Assembling PDF...");
        }
        assemble_pdf(&images, &pdf_path).await?
    };

    info!(
        "Deck \"{}\": {}/{} slides, {} bytes",
        info.title, downloaded.successes, info.slide_count, total_bytes
    );
    Ok(combine(info, downloaded, total_bytes, pdf_path, OutputMode::Pdf))
}

fn combine(
    info: DeckInfo,
    downloaded: DownloadResult,
    total_bytes: u64,
    output_path: PathBuf,
    mode: OutputMode,
) -> DeckDownloadResult {
    DeckDownloadResult {
        deck_title: info.title,
        slide_count: info.slide_count,
        successes: downloaded.successes,
        failures: downloaded.failures,
        total_bytes,
        failed_slides: downloaded.failed_slides,
        warnings: info.warnings,
        output_path,
        mode,
    }
}

/// Where the PDF for a deck titled `title` goes.
///
/// | `output`            | result                 |
/// |---------------------|------------------------|
/// | `None`              | `{cwd}/{title}.pdf`    |
/// | `…/name.pdf` (any case) | that path          |
/// | anything else       | `{output}/{title}.pdf` |
///
/// Relative results are joined onto the current directory.
pub fn resolve_pdf_path(output: Option<&Path>, title: &str) -> Result<PathBuf, DocSendError> {
    Ok(pdf_path_in(&current_dir()?, output, title))
}

/// Directory for images mode: `output`, or `{cwd}/{title}`.
pub fn resolve_image_dir(output: Option<&Path>, title: &str) -> Result<PathBuf, DocSendError> {
    let cwd = current_dir()?;
    Ok(match output {
        Some(dir) => cwd.join(dir),
        None => cwd.join(sanitize_file_stem(title)),
    })
}

fn pdf_path_in(cwd: &Path, output: Option<&Path>, title: &str) -> PathBuf {
    let file_name = format!("{}.pdf", sanitize_file_stem(title));
    match output {
        None => cwd.join(file_name),
        Some(p) if has_pdf_extension(p) => cwd.join(p),
        Some(dir) => cwd.join(dir).join(file_name),
    }
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Make `title` safe as a single path component.
///
/// Path separators and control characters become `_`; a title made only of
/// dots would name the current or parent directory and is replaced too.
pub fn sanitize_file_stem(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    if cleaned.chars().all(|c| c == '.') {
        "_".repeat(cleaned.len().max(1))
    } else {
        cleaned
    }
}

fn current_dir() -> Result<PathBuf, DocSendError> {
    std::env::current_dir()
        .map_err(|e| DocSendError::Internal(format!("Cannot determine current directory: {}", e)))
}

/// `slide_*.png` files in `dir`, in slide-number order.
async fn collect_slide_images(dir: &Path) -> Result<Vec<PathBuf>, DocSendError> {
    let read_err = |e: std::io::Error| DocSendError::Internal(format!(
        "Cannot list downloaded slides in '{}': {}",
        dir.display(),
        e
    ));

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_err)?;
    let mut slides: Vec<(u32, PathBuf)> = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let name = entry.file_name();
        if let Some(n) = name.to_str().and_then(slide_number) {
            slides.push((n, entry.path()));
        }
    }
    slides.sort_by_key(|(n, _)| *n);
    Ok(slides.into_iter().map(|(_, p)| p).collect())
}

/// `slide_07.png` → `Some(7)`; anything else → `None`.
fn slide_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix("slide_")?
        .strip_suffix(".png")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_path_resolution() {
        let cwd = Path::new("/work");
        assert_eq!(
            pdf_path_in(cwd, None, "Seed Deck"),
            PathBuf::from("/work/Seed Deck.pdf")
        );
        assert_eq!(
            pdf_path_in(cwd, Some(Path::new("out/custom.pdf")), "Seed Deck"),
            PathBuf::from("/work/out/custom.pdf")
        );
        assert_eq!(
            pdf_path_in(cwd, Some(Path::new("/abs/Report.PDF")), "Seed Deck"),
            PathBuf::from("/abs/Report.PDF")
        );
        assert_eq!(
            pdf_path_in(cwd, Some(Path::new("decks")), "Seed Deck"),
            PathBuf::from("/work/decks/Seed Deck.pdf")
        );
        assert_eq!(
            pdf_path_in(cwd, Some(Path::new("/tmp/decks")), "Q1/Q2 Update"),
            PathBuf::from("/tmp/decks/Q1_Q2 Update.pdf")
        );
    }

    #[test]
    fn resolved_paths_are_absolute() {
        assert!(resolve_pdf_path(None, "deck").unwrap().is_absolute());
        assert!(resolve_image_dir(None, "deck").unwrap().is_absolute());
        assert!(resolve_image_dir(Some(Path::new("rel")), "deck")
            .unwrap()
            .is_absolute());
    }

    #[test]
    fn sanitize_file_stem_cases() {
        assert_eq!(sanitize_file_stem("Acme Seed Deck"), "Acme Seed Deck");
        assert_eq!(sanitize_file_stem("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_file_stem("tab\there"), "tab_here");
        assert_eq!(sanitize_file_stem(".."), "__");
        assert_eq!(sanitize_file_stem("v1.2"), "v1.2");
    }

    #[test]
    fn slide_number_parsing() {
        assert_eq!(slide_number("slide_01.png"), Some(1));
        assert_eq!(slide_number("slide_100.png"), Some(100));
        assert_eq!(slide_number("slide_01.png.part"), None);
        assert_eq!(slide_number("cover.png"), None);
    }

    #[tokio::test]
    async fn collect_orders_numerically_and_skips_partials() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "slide_100.png",
            "slide_10.png",
            "slide_02.png",
            "slide_11.png",
            "slide_03.png.part",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let found = collect_slide_images(dir.path()).await.unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["slide_02.png", "slide_10.png", "slide_11.png", "slide_100.png"]
        );
    }
}
