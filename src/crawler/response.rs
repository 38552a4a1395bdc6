use crate::CrawlError;

/// The outcome of crawling one page
#[derive(Debug)]
pub struct Response {
    /// The page that was fetched
    pub url: String,

    /// Same-host links found on the page; empty when the fetch failed
    pub links: Vec<String>,

    /// `None` on a clean success
    pub error: Option<CrawlError>,
}

impl Response {
    /// A response for a page that could not be fetched
    pub fn failure(url: impl Into<String>, error: CrawlError) -> Self {
        Self {
            url: url.into(),
            links: Vec::new(),
            error: Some(error),
        }
    }

    /// Returns true if the page itself could not be retrieved
    pub fn is_fetch_failure(&self) -> bool {
        self.error.as_ref().map_or(false, CrawlError::is_fetch_failure)
    }
}
