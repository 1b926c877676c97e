use tracing::{debug, info};

use crate::core::{extract_hrefs, join_href};
use crate::data::LinkPattern;
use crate::effects::http::HttpClient;
use crate::error::{FetchError, Result};

/// Finds the one download link on an index page.
pub struct LinkResolver<C: HttpClient> {
    client: C,
}

impl<C: HttpClient> LinkResolver<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Fetch the pattern's page and return the single matching href verbatim.
    ///
    /// Zero matches fail with [`FetchError::NoMatchingLink`], more than one
    /// with [`FetchError::AmbiguousLink`]. Both mean the page format changed
    /// and are not worth retrying.
    pub async fn resolve(&self, pattern: &LinkPattern) -> Result<String> {
        let page = pattern.page_url();
        info!(page, "looking for link");

        let html = self
            .client
            .get_text(page)
            .await
            .map_err(|e| FetchError::fetch(page, e))?;

        let mut hrefs = extract_hrefs(&html, pattern);
        debug!(page, matches = hrefs.len(), "scanned index page");

        match hrefs.len() {
            0 => Err(FetchError::NoMatchingLink {
                pattern: pattern.pattern().to_string(),
                page: page.to_string(),
            }),
            1 => Ok(hrefs.swap_remove(0)),
            count => Err(FetchError::AmbiguousLink {
                pattern: pattern.pattern().to_string(),
                page: page.to_string(),
                count,
            }),
        }
    }

    /// Resolve the link and join it against `base` into an absolute URL.
    pub async fn resolve_url(&self, pattern: &LinkPattern, base: &str) -> Result<String> {
        let href = self.resolve(pattern).await?;
        join_href(base, &href)
    }
}
