use std::sync::Arc;

/// Reference chunk bound for relayed response bodies (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Configuration for a [`StreamSource`](crate::StreamSource).
///
/// # Examples
///
/// ```
/// use relayzip_fetch::SourceOptions;
///
/// let options = SourceOptions::default()
///     .chunk_size(16 * 1024)
///     .header("Accept", "application/zip");
/// assert_eq!(options.chunk_size, 16 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Upper bound on the size of each yielded chunk.
    ///
    /// Chunks larger than this are split; chunk boundaries carry no meaning.
    ///
    /// Default: 64 KiB
    pub chunk_size: usize,

    /// Custom HTTP headers sent with the download request.
    ///
    /// Default: empty
    pub headers: Arc<[(String, String)]>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            headers: Arc::new([]),
        }
    }
}

impl SourceOptions {
    /// Set the chunk bound. Zero is clamped to one byte.
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Add a single custom HTTP header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }
}
