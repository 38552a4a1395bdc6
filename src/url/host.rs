use url::Url;

/// Returns the host key of a URL: the host, plus `:port` when one is explicit
///
/// Default ports are not part of the key, so `https://a.com:443/` and
/// `https://a.com/` share the key `a.com`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use hostcrawl::url::host_key;
///
/// let url = Url::parse("https://example.com/path").unwrap();
/// assert_eq!(host_key(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(host_key(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host.to_string()),
    }
}

/// Keeps only the links whose host key is exactly `target_host`
///
/// Hosts compare case-insensitively: URL parsing lowercases the host of each
/// link, and `target_host` is lowercased the same way before comparing.
/// There is no subdomain matching. Links that fail to parse are dropped.
/// The order of the surviving links follows the input order.
///
/// # Arguments
///
/// * `links` - Candidate absolute URLs
/// * `target_host` - Host key of the crawl target (see [`host_key`])
pub fn filter_host<I>(links: I, target_host: &str) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let target_host = target_host.to_ascii_lowercase();
    links
        .into_iter()
        .filter(|link| {
            Url::parse(link)
                .ok()
                .and_then(|url| host_key(&url))
                .map_or(false, |host| host == target_host)
        })
        .collect()
}
