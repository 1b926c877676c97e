use url::Url;

use crate::error::{FetchError, Result};

/// Resolve `href` against `base`, the way a browser follows a link.
///
/// Absolute hrefs are returned unchanged. A base without a path (for example
/// `https://host`) behaves like `https://host/`.
///
/// # Examples
///
/// ```
/// use relayzip_fetch::join_href;
///
/// let url = join_href("https://download.example.org", "data-2024-01-01.zip").unwrap();
/// assert_eq!(url, "https://download.example.org/data-2024-01-01.zip");
/// ```
pub fn join_href(base: &str, href: &str) -> Result<String> {
    let base = Url::parse(base).map_err(|e| FetchError::InvalidUrl {
        url: base.to_string(),
        message: e.to_string(),
    })?;
    base.join(href)
        .map(String::from)
        .map_err(|e| FetchError::InvalidUrl {
            url: href.to_string(),
            message: e.to_string(),
        })
}
