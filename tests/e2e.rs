//! End-to-end tests against live DocSend decks.
//!
//! These launch a real Chromium and download real slides. They are gated
//! behind the `E2E_ENABLED` environment variable so they do not run in CI
//! unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e extract_n43v89r -- --nocapture

#![cfg(feature = "chromium")]

use docsend_dl::pipeline::download::build_http_client;
use docsend_dl::{
    download_deck, download_slides, extract_deck, slide_filename, DeckConfig, OutputMode,
};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

const DECK_A: &str = "https://dbx.docsend.com/view/n43v89r";
const DECK_B: &str = "https://docsend.com/view/p8jxsqr";

fn output_dir() -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases/output");
    std::fs::create_dir_all(&d).ok();
    d
}

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_enabled {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

// ── Extraction ───────────────────────────────────────────────────────────────

async fn assert_extracts_fully(url: &str) {
    let info = extract_deck(url, &DeckConfig::default())
        .await
        .expect("extract_deck() should succeed");

    println!(
        "[{url}] \"{}\": {} slides, {} warnings",
        info.title,
        info.slide_count,
        info.warnings.len()
    );
    assert!(info.slide_count > 0);
    assert_eq!(info.image_urls.len(), info.slide_count);
    assert!(
        info.image_urls.iter().all(Option::is_some),
        "every slide should have a URL, warnings: {:?}",
        info.warnings
    );
    assert!(!info.title.is_empty());
}

#[tokio::test]
async fn extract_n43v89r() {
    e2e_skip_unless_enabled!();
    assert_extracts_fully(DECK_A).await;
}

#[tokio::test]
async fn extract_p8jxsqr() {
    e2e_skip_unless_enabled!();
    assert_extracts_fully(DECK_B).await;
}

// ── Download ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn download_p8jxsqr_images() {
    e2e_skip_unless_enabled!();

    let config = DeckConfig::default();
    let info = extract_deck(DECK_B, &config).await.expect("extract");
    let dir = tempfile::Builder::new()
        .prefix("docsend_test_")
        .tempdir()
        .unwrap();
    let client = build_http_client(&config).unwrap();

    let result = download_slides(&client, &info.image_urls, dir.path(), &config)
        .await
        .expect("download_slides");

    assert_eq!(result.failures, 0);
    assert_eq!(result.successes, info.slide_count);
    for i in 0..info.slide_count {
        let p = dir.path().join(slide_filename(i));
        assert!(p.exists(), "{} missing", p.display());
        // Every slide is a decodable image.
        image::open(&p).unwrap_or_else(|e| panic!("{}: {e}", p.display()));
    }
}

#[tokio::test]
async fn download_deck_n43v89r_pdf() {
    e2e_skip_unless_enabled!();

    let out = output_dir().join("n43v89r.pdf");
    let result = download_deck(DECK_A, Some(&out), &DeckConfig::default())
        .await
        .expect("download_deck");

    println!(
        "[n43v89r] {} → {} ({} bytes)",
        result.deck_title,
        result.output_path.display(),
        result.total_bytes
    );
    assert_eq!(result.mode, OutputMode::Pdf);
    assert_eq!(result.failures, 0);
    assert_eq!(result.successes, result.slide_count);
    assert!(result.total_bytes > 0);

    let doc = lopdf::Document::load(&out).expect("valid PDF");
    assert_eq!(doc.get_pages().len(), result.slide_count);
}
