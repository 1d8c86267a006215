//! Deck extraction: load the deck in a browser and discover signed slide URLs.
//!
//! ## Protocol
//!
//! ```text
//! validate URL ─▶ launch ─▶ navigate ─▶ wait for carousel ─▶ count + title
//!                   │          (networkidle,      │ timeout
//!                   │           then DOM loaded)  └─▶ email gate? / unknown page
//!                   │
//!                   └─ batches of 10 page_data fetches, run inside the page ─▶ close
//! ```
//!
//! Exactly one browser session exists per call and it is closed on every
//! exit path. A failed slide never aborts discovery: it becomes a warning and
//! an empty slot in [`DeckInfo::image_urls`].

use crate::config::DeckConfig;
use crate::error::DocSendError;
use crate::output::DeckInfo;
use crate::pipeline::browser::{
    BrowserError, BrowserLauncher, BrowserSession, LaunchOptions, WaitUntil,
    HIDE_WEBDRIVER_SCRIPT,
};
use crate::pipeline::title::{derive_title, PageMeta};
use crate::pipeline::url::{extract_view_slug, parse_deck_url_with, DeckRef};
use crate::scripts::{
    CAROUSEL_ITEM_SELECTOR, DECK_INFO_SCRIPT, EMAIL_GATE_SELECTOR, PAGE_DATA_BATCH_SCRIPT,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::ops::Range;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Slides whose `page_data` is fetched concurrently before the next batch starts.
pub const DISCOVERY_BATCH_SIZE: usize = 10;

/// Sent with every `page_data` request, as the DocSend viewer does.
const TIMEZONE_OFFSET: i32 = -21600;

/// Headroom between a navigation budget and the driver's command timeout.
pub const COMMAND_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Extract slide URLs from a deck using the bundled Chromium driver.
///
/// # Errors
/// - [`DocSendError::InvalidUrl`] before any browser is launched
/// - [`DocSendError::EmailGateRequired`] for email-verified decks
/// - [`DocSendError::ExtractionFailed`] when no slides or no URLs are found
/// - [`DocSendError::Browser`] when the browser cannot be driven
#[cfg(feature = "chromium")]
pub async fn extract_deck(url: &str, config: &DeckConfig) -> Result<DeckInfo, DocSendError> {
    let launcher = crate::pipeline::chromium::ChromiumLauncher::default();
    extract_deck_with(&launcher, url, config).await
}

/// Extract slide URLs from a deck with a caller-supplied browser driver.
pub async fn extract_deck_with(
    launcher: &dyn BrowserLauncher,
    url: &str,
    config: &DeckConfig,
) -> Result<DeckInfo, DocSendError> {
    let deck_ref = parse_deck_url_with(url, config.url_grammar)?;

    report(config, "Launching browser...");
    let options = LaunchOptions::desktop(config.headless)
        .with_command_timeout(config.navigation_timeout + COMMAND_TIMEOUT_MARGIN);
    let mut session = launcher.launch(&options).await?;

    let outcome = drive_session(session.as_mut(), url, &deck_ref, config).await;

    if let Err(e) = session.close().await {
        warn!("Failed to close browser session: {}", e);
    }

    let info = outcome?;
    if info.valid_url_count() == 0 {
        return Err(DocSendError::extraction(
            "Could not retrieve any image URLs from page_data endpoints.",
        ));
    }

    info!(
        "Extracted {}/{} slide URLs from \"{}\"",
        info.valid_url_count(),
        info.slide_count,
        info.title
    );
    Ok(info)
}

/// Everything between launch and close.
async fn drive_session(
    session: &mut dyn BrowserSession,
    url: &str,
    deck_ref: &DeckRef,
    config: &DeckConfig,
) -> Result<DeckInfo, DocSendError> {
    session.add_init_script(HIDE_WEBDRIVER_SCRIPT).await?;

    report(config, "Loading page (this may take a while)...");
    load_page(session, url, config.navigation_timeout).await?;

    report(config, "Waiting for slides...");
    let found = session
        .wait_for_selector(CAROUSEL_ITEM_SELECTOR, config.selector_timeout)
        .await?;
    if !found {
        return Err(diagnose_missing_slides(session).await?);
    }

    let slug = match deck_ref.slug() {
        Some(slug) => slug.to_string(),
        None => {
            let current = session.current_url().await?;
            debug!("Space link resolved to {}", current);
            extract_view_slug(&current).ok_or_else(|| {
                DocSendError::extraction(format!(
                    "Link did not lead to a deck view page (ended at '{current}')."
                ))
            })?
        }
    };

    let raw = session.evaluate(DECK_INFO_SCRIPT, Value::Null).await?;
    let meta: PageMeta = serde_json::from_value(raw)
        .map_err(|e| DocSendError::extraction(format!("Unexpected deck info from page: {e}")))?;

    if meta.slide_count == 0 {
        return Err(DocSendError::extraction("No slides found in this deck."));
    }

    let title = derive_title(&meta, &slug);
    info!("Found deck \"{}\" ({} slides)", title, meta.slide_count);

    let (image_urls, warnings) =
        discover_slide_urls(session, &slug, meta.slide_count, config).await;

    Ok(DeckInfo {
        title,
        slide_count: meta.slide_count,
        image_urls,
        warnings,
    })
}

/// Navigate, falling back from network-idle to DOM-loaded on timeout.
async fn load_page(
    session: &mut dyn BrowserSession,
    url: &str,
    timeout: Duration,
) -> Result<(), DocSendError> {
    match session.navigate(url, WaitUntil::NetworkIdle, timeout).await {
        Ok(()) => Ok(()),
        Err(BrowserError::Timeout { .. }) => {
            debug!("Network never went idle; retrying with DOM content loaded");
            session
                .navigate(url, WaitUntil::DomContentLoaded, timeout)
                .await
                .map_err(DocSendError::from)
        }
        Err(e) => Err(e.into()),
    }
}

/// Decide why the carousel never appeared.
async fn diagnose_missing_slides(
    session: &mut dyn BrowserSession,
) -> Result<DocSendError, DocSendError> {
    if session.query_selector(EMAIL_GATE_SELECTOR).await? {
        return Ok(DocSendError::EmailGateRequired);
    }
    Ok(DocSendError::extraction(
        "Could not find slide content on the page. \
         The page may have changed structure or failed to load.",
    ))
}

/// One settled request from [`PAGE_DATA_BATCH_SCRIPT`].
#[derive(Debug, Deserialize)]
struct BatchEntry {
    index: usize,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Run the batched `page_data` protocol for every slide.
///
/// Returns one slot per slide and the warnings collected along the way.
async fn discover_slide_urls(
    session: &mut dyn BrowserSession,
    slug: &str,
    slide_count: usize,
    config: &DeckConfig,
) -> (Vec<Option<String>>, Vec<String>) {
    let view_load_time = unix_now();
    let mut urls: Vec<Option<String>> = vec![None; slide_count];
    let mut warnings = Vec::new();

    for batch_start in (0..slide_count).step_by(DISCOVERY_BATCH_SIZE) {
        let batch = batch_start..(batch_start + DISCOVERY_BATCH_SIZE).min(slide_count);

        report(
            config,
            &format!("Extracting URLs ({}/{})...", batch.end, slide_count),
        );

        let requests: Vec<Value> = batch
            .clone()
            .map(|i| json!({ "index": i, "path": page_data_path(slug, i + 1, view_load_time) }))
            .collect();

        let outcome = session
            .evaluate(PAGE_DATA_BATCH_SCRIPT, json!({ "requests": requests }))
            .await
            .map_err(|e| e.to_string());

        record_batch(batch.clone(), outcome, &mut urls, &mut warnings);
        debug!("Discovery batch {:?} settled", batch);

        if let Some(ref cb) = config.progress_callback {
            cb.on_discovery_batch(batch.end, slide_count);
        }
    }

    (urls, warnings)
}

/// Merge one batch's outcome into the per-slide slots.
///
/// A batch-level failure turns into one warning per slide in the batch;
/// slides the page did not report on are warned about individually.
fn record_batch(
    batch: Range<usize>,
    outcome: Result<Value, String>,
    urls: &mut [Option<String>],
    warnings: &mut Vec<String>,
) {
    let entries = outcome.and_then(|v| {
        serde_json::from_value::<Vec<BatchEntry>>(v)
            .map_err(|e| format!("malformed page_data batch result: {e}"))
    });

    let entries = match entries {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Discovery batch {:?} failed: {}", batch, e);
            warnings.extend(batch.map(|i| format!("Slide {}: {}", i + 1, e)));
            return;
        }
    };

    let mut reported = vec![false; batch.len()];
    for entry in entries {
        if !batch.contains(&entry.index) {
            warn!("Ignoring page_data result for out-of-batch index {}", entry.index);
            continue;
        }
        reported[entry.index - batch.start] = true;
        urls[entry.index] = entry.url.filter(|u| !u.is_empty());
        if let Some(err) = entry.error {
            warnings.push(format!("Slide {}: {}", entry.index + 1, err));
        }
    }

    for (offset, seen) in reported.into_iter().enumerate() {
        if !seen {
            warnings.push(format!("Slide {}: no response", batch.start + offset + 1));
        }
    }
}

/// Same-origin path of the `page_data` endpoint for 1-based `slide`.
pub fn page_data_path(slug: &str, slide: usize, view_load_time: u64) -> String {
    format!(
        "/view/{slug}/page_data/{slide}?timezoneOffset={TIMEZONE_OFFSET}&viewLoadTime={view_load_time}"
    )
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn report(config: &DeckConfig, message: &str) {
    debug!("{}", message);
    if let Some(ref cb) = config.progress_callback {
        cb.on_status(message);
    }
}
