use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Destination key of the form `scheme://bucket/key`.
///
/// The key may contain `/` separators but no empty, `.` or `..` segments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SinkPath {
    scheme: String,
    bucket: String,
    key: String,
}

impl SinkPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidPath {
            path: raw.to_string(),
            reason,
        };

        let (scheme, rest) = raw.split_once("://").ok_or_else(|| invalid("missing scheme"))?;
        if scheme.is_empty()
            || !scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return Err(invalid("bad scheme"));
        }

        let (bucket, key) = rest.split_once('/').ok_or_else(|| invalid("missing object key"))?;
        if bucket.is_empty() {
            return Err(invalid("empty bucket"));
        }
        if key.is_empty() {
            return Err(invalid("missing object key"));
        }
        if key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(invalid("empty or relative key segment"));
        }

        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Key segments, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.key.split('/')
    }
}

impl fmt::Display for SinkPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.bucket, self.key)
    }
}

impl FromStr for SinkPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scheme_bucket_and_key() {
        let path = SinkPath::parse("mem://out/result.csv").unwrap();
        assert_eq!(path.scheme(), "mem");
        assert_eq!(path.bucket(), "out");
        assert_eq!(path.key(), "result.csv");
        assert_eq!(path.to_string(), "mem://out/result.csv");
    }

    #[test]
    fn nested_keys() {
        let path: SinkPath = "S3://my-bucket/companies_house/companies_house_basic.csv"
            .parse()
            .unwrap();
        assert_eq!(path.scheme(), "s3");
        assert_eq!(
            path.segments().collect::<Vec<_>>(),
            ["companies_house", "companies_house_basic.csv"]
        );
    }

    #[test]
    fn rejects_malformed_paths() {
        for raw in [
            "out/result.csv",
            "://out/result.csv",
            "mem://out",
            "mem://out/",
            "mem:///result.csv",
            "mem://out/a//b",
            "mem://out/../etc/passwd",
            "mem://out/./x",
            "m em://out/x",
        ] {
            assert!(
                matches!(SinkPath::parse(raw), Err(Error::InvalidPath { .. })),
                "{raw} should be rejected"
            );
        }
    }
}
