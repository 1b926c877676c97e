use std::future::Future;

use bytes::Bytes;

use crate::error::Result;
use crate::path::SinkPath;

/// A storage backend that can open keys for streaming writes.
pub trait Sink: Send + Sync {
    type Writer: SinkWriter;

    /// Create or truncate the object at `path` and return a writer for it.
    fn open_write(&self, path: &SinkPath) -> impl Future<Output = Result<Self::Writer>> + Send;

    /// Whether `open_write` could succeed for `path`, checked before any
    /// data is fetched. Backends that accept every path keep the default.
    fn accepts(&self, _path: &SinkPath) -> bool {
        true
    }
}

/// Scoped write handle on one sink object.
///
/// `close` must be called on every exit path; it consumes the writer and
/// reports the total number of bytes written.
pub trait SinkWriter: Send {
    fn write(&mut self, chunk: Bytes) -> impl Future<Output = Result<()>> + Send;

    fn close(self) -> impl Future<Output = Result<u64>> + Send;
}

impl<K: Sink> Sink for std::sync::Arc<K> {
    type Writer = K::Writer;

    fn open_write(&self, path: &SinkPath) -> impl Future<Output = Result<Self::Writer>> + Send {
        (**self).open_write(path)
    }

    fn accepts(&self, path: &SinkPath) -> bool {
        (**self).accepts(path)
    }
}
