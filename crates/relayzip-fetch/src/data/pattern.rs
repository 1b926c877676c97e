use std::fmt;

use regex::Regex;

use crate::error::{FetchError, Result};

/// A page to scan and the pattern its single download link must match.
///
/// The pattern is compiled once and anchored on both ends, so it is applied
/// with full-string semantics: `foo\.zip` does not match `old-foo.zip.bak`.
#[derive(Clone)]
pub struct LinkPattern {
    page_url: String,
    pattern: String,
    regex: Regex,
}

impl LinkPattern {
    pub fn new(page_url: impl Into<String>, pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            FetchError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            }
        })?;
        Ok(Self {
            page_url: page_url.into(),
            pattern,
            regex,
        })
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, href: &str) -> bool {
        self.regex.is_match(href)
    }
}

impl fmt::Debug for LinkPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkPattern")
            .field("page_url", &self.page_url)
            .field("pattern", &self.pattern)
            .finish()
    }
}
