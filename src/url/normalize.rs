use crate::UrlError;
use url::{ParseError, Url};

/// Normalizes an absolute URL into the form the crawler tracks
///
/// # Normalization Steps
///
/// 1. Reject references with control characters or broken percent-escapes
/// 2. Parse the URL; reject if malformed or relative
/// 3. Require an HTTP or HTTPS scheme
/// 4. Require a host
/// 5. Remove the query string
/// 6. Remove the fragment
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use hostcrawl::url::normalize_url;
///
/// let url = normalize_url("https://example.com/page?q=1#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    check_reference(url_str)?;

    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(format!("{}: {}", url_str, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    strip_query(&mut url);
    Ok(url)
}

/// Sanitises a link found on the page at `origin`
///
/// The link is resolved against `origin` when relative, and its query string
/// and fragment are stripped. Links whose own path is empty or `/` carry no
/// new page and are discarded, as are links that resolve to a non-HTTP(S)
/// scheme (`mailto:`, `javascript:`, ...).
///
/// # Returns
///
/// * `Ok(Some(String))` - The absolute, stripped URL
/// * `Ok(None)` - The link was discarded
/// * `Err(UrlError)` - The link or the origin is malformed
///
/// # Examples
///
/// ```
/// use hostcrawl::url::sanitise;
///
/// let link = sanitise("https://a.com/page", "/x?q=1#frag").unwrap();
/// assert_eq!(link.as_deref(), Some("https://a.com/x"));
/// ```
pub fn sanitise(origin: &str, link: &str) -> Result<Option<String>, UrlError> {
    check_reference(link)?;

    match reference_path(link)? {
        Some(path) if !path.is_empty() && path != "/" => {}
        _ => return Ok(None),
    }

    check_reference(origin)?;
    let base = Url::parse(origin).map_err(|e| UrlError::Parse(format!("{}: {}", origin, e)))?;

    let mut resolved = base
        .join(link)
        .map_err(|e| UrlError::Parse(format!("{}: {}", link, e)))?;

    // Only accept HTTP and HTTPS URLs
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return Ok(None);
    }

    strip_query(&mut resolved);
    Ok(Some(resolved.to_string()))
}

/// Removes the query string and the fragment from a URL
fn strip_query(url: &mut Url) {
    url.set_query(None);
    url.set_fragment(None);
}

/// Returns the path component of a URL reference, as written
///
/// Opaque references such as `mailto:user@host` have no hierarchical path
/// and yield `None`.
fn reference_path(link: &str) -> Result<Option<String>, UrlError> {
    match Url::parse(link) {
        Ok(absolute) if absolute.cannot_be_a_base() => Ok(None),
        Ok(absolute) => Ok(Some(absolute.path().to_string())),
        Err(ParseError::RelativeUrlWithoutBase) => Ok(Some(relative_path(link).to_string())),
        Err(e) => Err(UrlError::Parse(format!("{}: {}", link, e))),
    }
}

/// Extracts the path of a relative reference (`/a?b`, `a/b#c`, `//host/a`)
fn relative_path(link: &str) -> &str {
    let end = link.find(|c: char| c == '?' || c == '#').unwrap_or(link.len());
    let without_query = &link[..end];

    match without_query.strip_prefix("//") {
        // Scheme-relative: the path starts after the authority
        Some(rest) => rest.find('/').map_or("", |i| &rest[i..]),
        None => without_query,
    }
}

/// Rejects references that a strict URL parser refuses
///
/// The `url` crate follows the WHATWG parser and silently repairs control
/// characters and stray `%` signs; such hrefs are treated as malformed here.
fn check_reference(reference: &str) -> Result<(), UrlError> {
    if reference.chars().any(|c| c.is_ascii_control()) {
        return Err(UrlError::ControlCharacter(reference.to_string()));
    }

    let bytes = reference.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .map_or(false, |hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(UrlError::InvalidEscape(reference.to_string()));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    Ok(())
}
