//! Shared normalization helpers for both content endpoint shapes: locale
//! selection, reading-time estimation and proxy rewriting of relative
//! `/api/` image paths.

use crate::models::LocaleBlock;

/// Words-per-minute assumption behind the reading-time label.
const WORDS_PER_MINUTE: usize = 200;

/// Select the text block matching `locale` (case-insensitive), or the first
/// available block when there is no exact match.
pub fn pick_locale<'a>(locales: &'a [LocaleBlock], locale: &str) -> Option<&'a LocaleBlock> {
    locales
        .iter()
        .find(|block| block.locale.eq_ignore_ascii_case(locale))
        .or_else(|| locales.first())
}

/// `ceil(words / 200)` minutes, never below one.
pub fn reading_time_label(body: &str) -> String {
    let words = body.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    format!("{minutes} min")
}

/// Rewrite a relative `/api/` image URL to its `/api-proxy/` equivalent.
/// Absolute `http(s)://` URLs and anything else pass through untouched.
pub fn rewrite_image_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_owned();
    }
    match url.strip_prefix("/api/") {
        Some(rest) => format!("/api-proxy/api/{rest}"),
        None => url.to_owned(),
    }
}

/// Rewrite every `/api/`-prefixed `src` attribute inside an HTML body, in
/// both quoting styles.
pub fn rewrite_content_images(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    html.replace("src=\"/api/", "src=\"/api-proxy/api/")
        .replace("src='/api/", "src='/api-proxy/api/")
}
