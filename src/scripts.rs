//! Selectors and in-page scripts used against a loaded deck page.
//!
//! Every piece of page-structure knowledge lives here, so a DocSend markup
//! change means editing one file. Scripts are JavaScript function
//! expressions; [`crate::pipeline::browser::BrowserSession::evaluate`] calls
//! them with a single JSON argument.

/// One element per slide in the deck carousel.
pub const CAROUSEL_ITEM_SELECTOR: &str = ".carousel-inner .item";

/// Present on decks that ask for the visitor's email first.
pub const EMAIL_GATE_SELECTOR: &str = r#"input[type="email"], form[action*="email"], .visitor-email"#;

/// Reads the raw material for slide count and title.
///
/// Returns `{ slideCount: number, ogTitle: string | null, documentTitle: string }`.
/// Title selection itself happens in [`crate::pipeline::title`].
pub const DECK_INFO_SCRIPT: &str = r#"() => {
    const items = document.querySelectorAll('.carousel-inner .item');
    const og = document.querySelector('meta[property="og:title"]');
    return {
        slideCount: items.length,
        ogTitle: og ? (og.getAttribute('content') || '') : null,
        documentTitle: document.title || ''
    };
}"#;

/// Fetches one batch of `page_data` endpoints from inside the page.
///
/// Argument: `{ requests: [{ index, path }] }` with same-origin `path`s.
/// All requests are issued at once and the promise settles only after every
/// one of them has. Returns `[{ index, url, error }]`, one entry per request,
/// where `url` is the `directImageUrl` field (or null) and `error` is null
/// on success.
pub const PAGE_DATA_BATCH_SCRIPT: &str = r#"async (args) => {
    return await Promise.all(args.requests.map(({ index, path }) =>
        fetch(path, { credentials: 'same-origin' })
            .then(r => {
                if (!r.ok) throw new Error('HTTP ' + r.status);
                return r.json();
            })
            .then(data => ({ index, url: data.directImageUrl || null, error: null }))
            .catch(e => ({ index, url: null, error: e.message || String(e) }))
    ));
}"#;
