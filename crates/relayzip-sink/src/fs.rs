use std::path::PathBuf;

use bytes::Bytes;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::error::{Error, Result};
use crate::path::SinkPath;
use crate::sink::{Sink, SinkWriter};

/// Local-directory object store: `scheme://bucket/a/b` lands at
/// `{root}/bucket/a/b`.
///
/// Objects are written in place, so a failed run leaves a partial file.
#[derive(Clone, Debug)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Local file backing `path`.
    pub fn local_path(&self, path: &SinkPath) -> PathBuf {
        let mut local = self.root.join(path.bucket());
        local.extend(path.segments());
        local
    }
}

impl Sink for FsSink {
    type Writer = FsWriter;

    async fn open_write(&self, path: &SinkPath) -> Result<FsWriter> {
        let local = self.local_path(path);
        let open_err = |source| Error::Open {
            path: path.to_string(),
            source,
        };

        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent).await.map_err(open_err)?;
        }
        let file = File::create(&local).await.map_err(open_err)?;
        debug!(path = %path, local = %local.display(), "opened file object");

        Ok(FsWriter {
            path: path.to_string(),
            file: BufWriter::new(file),
            written: 0,
        })
    }
}

/// Buffered writer for one [`FsSink`] object.
#[derive(Debug)]
pub struct FsWriter {
    path: String,
    file: BufWriter<File>,
    written: u64,
}

impl SinkWriter for FsWriter {
    async fn write(&mut self, chunk: Bytes) -> Result<()> {
        self.file
            .write_all(&chunk)
            .await
            .map_err(|source| Error::Write {
                path: self.path.clone(),
                source,
            })?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    async fn close(mut self) -> Result<u64> {
        let close_err = |source| Error::Close {
            path: self.path.clone(),
            source,
        };
        self.file.flush().await.map_err(close_err)?;
        self.file.get_mut().sync_all().await.map_err(close_err)?;
        Ok(self.written)
    }
}
