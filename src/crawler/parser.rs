//! HTML parser for extracting links
//!
//! Every `<a href="...">` on a page is sanitised against the page URL. A
//! malformed anchor is recorded and skipped; the rest of the page still
//! yields its links.

use crate::url::sanitise;
use crate::{ErrorList, UrlError};
use scraper::{Html, Selector};
use std::collections::HashSet;

/// Links extracted from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Absolute URLs found on the page, without query or fragment
    pub links: HashSet<String>,

    /// One error per malformed anchor
    pub errors: Vec<UrlError>,
}

impl ParsedPage {
    /// The aggregated anchor errors, if there were any
    pub fn error(&self) -> Option<ErrorList> {
        ErrorList(self.errors.clone()).error_or_none()
    }
}

/// Extracts the links of the page at `origin`
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anything resolving to an HTTP(S) URL with a path
///
/// **Exclude (silently):**
/// - `<a>` without an `href`
/// - Links with an empty or `/` path (`#top`, `?page=2`, `https://a.com/`)
/// - `javascript:`, `mailto:`, `tel:` and other non-HTTP(S) links
///
/// # Arguments
///
/// * `origin` - The URL of the page, used to resolve relative links
/// * `html` - The HTML content to parse
///
/// # Example
///
/// ```
/// use hostcrawl::crawler::extract_links;
///
/// let html = r#"<html><body><a href="/page?x=1">Link</a></body></html>"#;
/// let parsed = extract_links("https://example.com/", html);
/// assert!(parsed.links.contains("https://example.com/page"));
/// assert!(parsed.error().is_none());
/// ```
pub fn extract_links(origin: &str, html: &str) -> ParsedPage {
    let document = Html::parse_document(html);
    let mut parsed = ParsedPage::default();

    let a_selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return parsed,
    };

    for element in document.select(&a_selector) {
        let href = match element.value().attr("href") {
            Some(href) => href.trim(),
            None => continue,
        };

        match sanitise(origin, href) {
            Ok(Some(link)) => {
                parsed.links.insert(link);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!("Skipping malformed link {:?} on {}: {}", href, origin, e);
                parsed.errors.push(e);
            }
        }
    }

    parsed
}
