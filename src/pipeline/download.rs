//! Concurrent slide downloader.
//!
//! Every present URL becomes one job in a flat pool of at most
//! `config.concurrency` in-flight transfers. A job tries up to
//! `config.max_retries` times with a linear backoff and either leaves
//! `slide_NN.png` in the output directory or leaves nothing at all: bodies
//! are written to `slide_NN.png.part` and renamed into place.
//!
//! Slides whose URL is `None` are skipped; their filenames are still
//! reserved, so `slide_03.png` always means slide 3, and any file left there
//! by an earlier run is removed.

use crate::config::DeckConfig;
use crate::error::{DocSendError, SlideError};
use crate::output::{slide_filename, DownloadResult};
use crate::pipeline::browser::DESKTOP_USER_AGENT;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// HTTP client used for slide downloads.
///
/// Signed image URLs are plain CDN links, so no cookies are carried over from
/// the browser; the per-request timeout comes from `config`.
pub fn build_http_client(config: &DeckConfig) -> Result<reqwest::Client, DocSendError> {
    reqwest::Client::builder()
        .user_agent(DESKTOP_USER_AGENT)
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| DocSendError::Http(format!("Failed to create HTTP client: {}", e)))
}

/// Download every present URL in `image_urls` into `output_dir`.
///
/// `output_dir` is created if needed. Individual slide failures never abort
/// the run; they are counted in [`DownloadResult::failures`] and named in
/// [`DownloadResult::failed_slides`].
///
/// # Errors
/// [`DocSendError::OutputDirFailed`] when `output_dir` cannot be created.
pub async fn download_slides(
    client: &reqwest::Client,
    image_urls: &[Option<String>],
    output_dir: &Path,
    config: &DeckConfig,
) -> Result<DownloadResult, DocSendError> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| DocSendError::OutputDirFailed {
            path: output_dir.to_path_buf(),
            source: e,
        })?;

    let jobs: Vec<(usize, &str)> = image_urls
        .iter()
        .enumerate()
        .filter_map(|(idx, url)| url.as_deref().map(|u| (idx, u)))
        .collect();
    let skipped = image_urls.len() - jobs.len();
    let total = jobs.len();

    for idx in (0..image_urls.len()).filter(|&i| image_urls[i].is_none()) {
        remove_slide_files(output_dir, idx).await;
    }

    info!(
        "Downloading {} slides to {} ({} skipped)",
        total,
        output_dir.display(),
        skipped
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_download_start(total);
    }

    let outcomes: Vec<(usize, Result<u64, SlideError>)> =
        stream::iter(jobs.into_iter().map(|(idx, url)| async move {
            let outcome = download_one(client, url, idx, output_dir, config).await;
            if let Some(ref cb) = config.progress_callback {
                let filename = slide_filename(idx);
                match &outcome {
                    Ok(bytes) => cb.on_slide_complete(&filename, *bytes),
                    Err(e) => cb.on_slide_error(&filename, &e.to_string()),
                }
            }
            (idx, outcome)
        }))
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    let mut result = DownloadResult {
        skipped,
        ..Default::default()
    };
    let mut failed: Vec<usize> = Vec::new();
    for (idx, outcome) in outcomes {
        match outcome {
            Ok(bytes) => {
                result.successes += 1;
                result.total_bytes += bytes;
            }
            Err(_) => {
                result.failures += 1;
                failed.push(idx);
            }
        }
    }
    failed.sort_unstable();
    result.failed_slides = failed.into_iter().map(slide_filename).collect();

    info!(
        "Download complete: {}/{} slides, {} bytes",
        result.successes, total, result.total_bytes
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_download_complete(result.successes, result.failures);
    }

    Ok(result)
}

/// Download one slide with retries. Returns the number of bytes written.
async fn download_one(
    client: &reqwest::Client,
    url: &str,
    index: usize,
    output_dir: &Path,
    config: &DeckConfig,
) -> Result<u64, SlideError> {
    let slide = index + 1;
    let filename = slide_filename(index);
    let target = output_dir.join(&filename);
    let part = output_dir.join(format!("{filename}.part"));
    let attempts = config.max_retries.max(1);

    let mut last_err: Option<SlideError> = None;

    for attempt in 1..=attempts {
        if attempt > 1 {
            let backoff = config.retry_backoff * (attempt - 1);
            warn!(
                "Slide {}: retry {}/{} after {}ms",
                slide,
                attempt,
                attempts,
                backoff.as_millis()
            );
            sleep(backoff).await;
        }

        match fetch_to_file(client, url, slide, &part, &target, config.request_timeout).await {
            Ok(bytes) => {
                debug!("Slide {}: saved {} ({} bytes)", slide, filename, bytes);
                return Ok(bytes);
            }
            Err(e) => {
                warn!("Slide {}: attempt {} failed: {}", slide, attempt, e.detail());
                last_err = Some(e);
            }
        }
    }

    remove_slide_files(output_dir, index).await;

    Err(SlideError::Exhausted {
        slide,
        attempts,
        last: last_err
            .map(|e| e.detail())
            .unwrap_or_else(|| "Unknown error".to_string()),
    })
}

/// Remove `slide_NN.png` and its `.part` file, if present.
///
/// Used for slides that end a run without a file of their own, so nothing
/// from an earlier run into the same directory survives under their name.
async fn remove_slide_files(output_dir: &Path, index: usize) {
    let filename = slide_filename(index);
    for path in [
        output_dir.join(format!("{filename}.part")),
        output_dir.join(&filename),
    ] {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!("Removed stale {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove stale {}: {}", path.display(), e),
        }
    }
}

/// One attempt: GET, check status, write `.part`, rename into place.
async fn fetch_to_file(
    client: &reqwest::Client,
    url: &str,
    slide: usize,
    part: &Path,
    target: &Path,
    timeout: Duration,
) -> Result<u64, SlideError> {
    let transport = |e: reqwest::Error| SlideError::Transport {
        slide,
        detail: if e.is_timeout() {
            format!("timed out after {}s", timeout.as_secs())
        } else {
            e.to_string()
        },
    };
    let write = |e: std::io::Error| SlideError::Write {
        slide,
        detail: e.to_string(),
    };

    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(SlideError::Http {
            slide,
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await.map_err(transport)?;

    tokio::fs::write(part, &body).await.map_err(write)?;
    tokio::fs::rename(part, target).await.map_err(write)?;

    Ok(body.len() as u64)
}
