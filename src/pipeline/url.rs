//! Deck URL validation: turn a user-supplied DocSend link into a slug.
//!
//! The slug addresses the deck's internal endpoints
//! (`/view/{slug}/page_data/{n}`), so nothing downstream runs without one.
//! Validation is pure and fails fast: an invalid URL never launches a
//! browser.

use crate::config::UrlGrammar;
use crate::error::DocSendError;
use once_cell::sync::Lazy;
use regex::Regex;

static VIEW_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:dbx\.)?docsend\.com/view/([A-Za-z0-9]+)").expect("valid regex")
});

static SPACE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:dbx\.)?docsend\.com/v/([A-Za-z0-9]+)/([A-Za-z0-9_-]+)")
        .expect("valid regex")
});

static VIEW_SLUG_ANYWHERE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"docsend\.com/view/([A-Za-z0-9]+)").expect("valid regex"));

/// A validated deck reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckRef {
    /// `/view/{slug}`: the slug is known up front.
    View(String),
    /// `/v/{space}/{name}`: valid, but the slug is only known once the
    /// browser has followed the link.
    SpaceLink { space: String, name: String },
}

impl DeckRef {
    /// The slug, when the URL carries one.
    pub fn slug(&self) -> Option<&str> {
        match self {
            DeckRef::View(slug) => Some(slug),
            DeckRef::SpaceLink { .. } => None,
        }
    }
}

/// Validate a DocSend `/view/` URL and return the deck slug.
///
/// Accepts `http` and `https` on `docsend.com` and `dbx.docsend.com`.
///
/// # Errors
/// [`DocSendError::InvalidUrl`] for any other input, including empty
/// strings and `/v/` space links.
pub fn parse_deck_url(url: &str) -> Result<String, DocSendError> {
    VIEW_URL
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| DocSendError::InvalidUrl {
            url: url.to_string(),
        })
}

/// Validate a deck URL under the given grammar.
///
/// With [`UrlGrammar::AllowSpaceLinks`] a `/v/{space}/{name}` link yields
/// [`DeckRef::SpaceLink`] instead of an error. `/v/{space}` without a name
/// is rejected under both grammars.
pub fn parse_deck_url_with(url: &str, grammar: UrlGrammar) -> Result<DeckRef, DocSendError> {
    if let Ok(slug) = parse_deck_url(url) {
        return Ok(DeckRef::View(slug));
    }

    if grammar == UrlGrammar::AllowSpaceLinks {
        if let Some(caps) = SPACE_URL.captures(url) {
            return Ok(DeckRef::SpaceLink {
                space: caps[1].to_string(),
                name: caps[2].to_string(),
            });
        }
    }

    Err(DocSendError::InvalidUrl {
        url: url.to_string(),
    })
}

/// Find a `/view/{slug}` anywhere in `url`, e.g. the page URL a space link
/// redirected to. Returns `None` when there is none.
pub fn extract_view_slug(url: &str) -> Option<String> {
    VIEW_SLUG_ANYWHERE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
