use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tracing::debug;

use crate::error::Result;
use crate::path::SinkPath;
use crate::sink::{Sink, SinkWriter};

#[derive(Debug, Default)]
struct Object {
    data: Vec<u8>,
    closed: bool,
}

/// In-process object store. Clones share the same objects.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    objects: Arc<Mutex<BTreeMap<String, Object>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> MutexGuard<'_, BTreeMap<String, Object>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current contents of the object at `path`, including bytes from a
    /// writer that has not been closed yet.
    pub fn get(&self, path: &str) -> Option<Bytes> {
        self.objects()
            .get(path)
            .map(|object| Bytes::copy_from_slice(&object.data))
    }

    /// Whether the last writer opened on `path` has been closed.
    pub fn is_closed(&self, path: &str) -> bool {
        self.objects().get(path).is_some_and(|object| object.closed)
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects().keys().cloned().collect()
    }
}

impl Sink for MemorySink {
    type Writer = MemoryWriter;

    async fn open_write(&self, path: &SinkPath) -> Result<MemoryWriter> {
        let key = path.to_string();
        self.objects().insert(key.clone(), Object::default());
        debug!(path = %key, "opened memory object");
        Ok(MemoryWriter {
            sink: self.clone(),
            key,
            written: 0,
        })
    }
}

/// Writer appending to one [`MemorySink`] object.
#[derive(Debug)]
pub struct MemoryWriter {
    sink: MemorySink,
    key: String,
    written: u64,
}

impl SinkWriter for MemoryWriter {
    async fn write(&mut self, chunk: Bytes) -> Result<()> {
        self.sink
            .objects()
            .entry(self.key.clone())
            .or_default()
            .data
            .extend_from_slice(&chunk);
        self.written += chunk.len() as u64;
        Ok(())
    }

    async fn close(self) -> Result<u64> {
        if let Some(object) = self.sink.objects().get_mut(&self.key) {
            object.closed = true;
        }
        Ok(self.written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_are_visible_before_close() {
        let sink = MemorySink::new();
        let path = SinkPath::parse("mem://out/result.csv").unwrap();

        let mut writer = sink.open_write(&path).await.unwrap();
        writer.write(Bytes::from_static(b"a,b\n")).await.unwrap();
        assert_eq!(sink.get("mem://out/result.csv").unwrap(), "a,b\n");
        assert!(!sink.is_closed("mem://out/result.csv"));

        writer.write(Bytes::from_static(b"1,2\n")).await.unwrap();
        assert_eq!(writer.close().await.unwrap(), 8);
        assert_eq!(sink.get("mem://out/result.csv").unwrap(), "a,b\n1,2\n");
        assert!(sink.is_closed("mem://out/result.csv"));
    }

    #[tokio::test]
    async fn reopening_truncates() {
        let sink = MemorySink::new();
        let path = SinkPath::parse("mem://out/x").unwrap();

        let mut writer = sink.open_write(&path).await.unwrap();
        writer.write(Bytes::from_static(b"old content")).await.unwrap();
        writer.close().await.unwrap();

        let writer = sink.open_write(&path).await.unwrap();
        assert_eq!(sink.get("mem://out/x").unwrap(), "");
        writer.close().await.unwrap();
        assert_eq!(sink.keys(), ["mem://out/x"]);
    }
}
