use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::{Stream, StreamExt, ready};
use tracing::debug;

use crate::data::SourceOptions;
use crate::effects::http::{BoxStream, HttpClient};
use crate::error::{FetchError, Result};

/// Opens download URLs as lazy, bounded-chunk byte streams.
pub struct StreamSource<C: HttpClient> {
    client: C,
    options: SourceOptions,
}

impl<C: HttpClient> StreamSource<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            options: SourceOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SourceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SourceOptions {
        &self.options
    }

    /// Open a streaming GET on `url`.
    ///
    /// Fails with [`FetchError::Fetch`] if the request cannot be started.
    /// Failures while reading the body surface from the returned stream as
    /// [`FetchError::Transport`]. Each call opens a fresh connection.
    pub async fn open(&self, url: &str) -> Result<ChunkStream> {
        debug!(url, chunk_size = self.options.chunk_size, "opening download stream");
        let body = self
            .client
            .stream(url, &self.options.headers)
            .await
            .map_err(|e| FetchError::fetch(url, e))?;

        let owned = url.to_string();
        let body = body.map(move |chunk| chunk.map_err(|e| FetchError::transport(&owned, e)));

        Ok(ChunkStream::new(url, Box::pin(body), self.options.chunk_size))
    }
}

/// A finite, non-restartable sequence of non-empty body chunks.
///
/// Chunks delivered by the transport are split so that none exceeds the
/// configured bound; empty chunks are dropped. The underlying connection is
/// released as soon as the body ends or fails, and on drop.
pub struct ChunkStream {
    url: String,
    inner: Option<BoxStream<'static, Result<Bytes>>>,
    pending: Bytes,
    chunk_size: usize,
    bytes_read: u64,
}

impl ChunkStream {
    pub fn new(
        url: impl Into<String>,
        inner: BoxStream<'static, Result<Bytes>>,
        chunk_size: usize,
    ) -> Self {
        Self {
            url: url.into(),
            inner: Some(inner),
            pending: Bytes::new(),
            chunk_size: chunk_size.max(1),
            bytes_read: 0,
        }
    }

    /// Total body bytes received from the transport so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Whether the underlying connection has been released.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Release the connection now. Already-received bytes are discarded.
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            debug!(url = %self.url, bytes_read = self.bytes_read, "download stream closed");
        }
        self.pending.clear();
    }
}

impl Stream for ChunkStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            if !this.pending.is_empty() {
                let n = this.pending.len().min(this.chunk_size);
                return Poll::Ready(Some(Ok(this.pending.split_to(n))));
            }

            let Some(inner) = this.inner.as_mut() else {
                return Poll::Ready(None);
            };

            match ready!(inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => {
                    this.bytes_read += chunk.len() as u64;
                    this.pending = chunk;
                }
                Some(Err(e)) => {
                    this.close();
                    return Poll::Ready(Some(Err(e)));
                }
                None => {
                    this.close();
                    return Poll::Ready(None);
                }
            }
        }
    }
}
