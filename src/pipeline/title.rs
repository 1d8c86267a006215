//! Deck title derivation.
//!
//! DocSend pages carry the deck name in several places of varying
//! reliability, and some of them are just the service's own brand. The
//! rules below run in order; the first one producing a non-empty title that
//! does not mention DocSend wins. The last rule always succeeds.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// Prefix of the synthesized fallback title.
pub const SERVICE_PREFIX: &str = "docsend";

static BRAND_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*[-\u{2013}|]\s*DocSend.*").expect("valid regex"));

/// Title sources read from the page by [`crate::scripts::DECK_INFO_SCRIPT`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub slide_count: usize,
    #[serde(default)]
    pub og_title: Option<String>,
    #[serde(default)]
    pub document_title: String,
}

type TitleRule = fn(&PageMeta, &str) -> Option<String>;

/// Ordered title rules: `og:title`, `<title>` minus suffix, synthesized.
const TITLE_RULES: &[(&str, TitleRule)] = &[
    ("og:title", og_title),
    ("document title", document_title),
    ("slug", synthesized),
];

/// Pick the deck title for `meta`, falling back to `docsend-{slug}`.
pub fn derive_title(meta: &PageMeta, slug: &str) -> String {
    for (name, rule) in TITLE_RULES {
        if let Some(title) = rule(meta, slug) {
            tracing::debug!("Deck title from {}: {:?}", name, title);
            return title;
        }
    }
    format!("{SERVICE_PREFIX}-{slug}")
}

fn og_title(meta: &PageMeta, _slug: &str) -> Option<String> {
    meta.og_title.as_deref().and_then(accept)
}

fn document_title(meta: &PageMeta, _slug: &str) -> Option<String> {
    let stripped = BRAND_SUFFIX.replace(&meta.document_title, "");
    accept(&stripped)
}

fn synthesized(_meta: &PageMeta, slug: &str) -> Option<String> {
    (!slug.is_empty()).then(|| format!("{SERVICE_PREFIX}-{slug}"))
}

/// Trimmed `candidate` if it is non-empty and brand-free.
fn accept(candidate: &str) -> Option<String> {
    let t = candidate.trim();
    if t.is_empty() || t.to_lowercase().contains(SERVICE_PREFIX) {
        None
    } else {
        Some(t.to_string())
    }
}
