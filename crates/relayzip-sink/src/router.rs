use bytes::Bytes;

use crate::error::{Error, Result};
use crate::fs::{FsSink, FsWriter};
use crate::memory::{MemorySink, MemoryWriter};
use crate::path::SinkPath;
use crate::sink::{Sink, SinkWriter};

/// Dispatches each path to a backend by its scheme.
///
/// A router starts with no backends. `mem://` is served only once a memory
/// store is attached, and `file://` only once a local directory store is.
#[derive(Clone, Debug, Default)]
pub struct SinkRouter {
    memory: Option<MemorySink>,
    fs: Option<FsSink>,
}

impl SinkRouter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_fs(mut self, fs: FsSink) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Attach an in-process store. Its objects vanish with the process, so
    /// only tests and embedders that read them back should enable it.
    #[must_use]
    pub fn with_memory(mut self, memory: MemorySink) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Whether some backend accepts `scheme`.
    pub fn supports(&self, scheme: &str) -> bool {
        match scheme {
            "mem" => self.memory.is_some(),
            "file" => self.fs.is_some(),
            _ => false,
        }
    }
}

impl Sink for SinkRouter {
    type Writer = RoutedWriter;

    async fn open_write(&self, path: &SinkPath) -> Result<RoutedWriter> {
        match (path.scheme(), &self.memory, &self.fs) {
            ("mem", Some(memory), _) => Ok(RoutedWriter::Memory(memory.open_write(path).await?)),
            ("file", _, Some(fs)) => Ok(RoutedWriter::Fs(fs.open_write(path).await?)),
            (scheme, _, _) => Err(Error::UnsupportedScheme {
                scheme: scheme.to_string(),
            }),
        }
    }

    fn accepts(&self, path: &SinkPath) -> bool {
        self.supports(path.scheme())
    }
}

#[derive(Debug)]
pub enum RoutedWriter {
    Memory(MemoryWriter),
    Fs(FsWriter),
}

impl SinkWriter for RoutedWriter {
    async fn write(&mut self, chunk: Bytes) -> Result<()> {
        match self {
            Self::Memory(w) => w.write(chunk).await,
            Self::Fs(w) => w.write(chunk).await,
        }
    }

    async fn close(self) -> Result<u64> {
        match self {
            Self::Memory(w) => w.close().await,
            Self::Fs(w) => w.close().await,
        }
    }
}
