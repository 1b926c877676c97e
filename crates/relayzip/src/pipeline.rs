//! Download, unzip and store exactly one archive entry.

use relayzip_archive::{ArchiveEntry, DecodeOptions, ZipStreamDecoder};
use relayzip_fetch::{ChunkStream, HttpClient, StreamSource};
use relayzip_sink::{Sink, SinkPath, SinkWriter};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};

/// What one successful run moved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub entry_name: String,
    pub declared_size: Option<u64>,
    pub bytes_written: u64,
    pub chunks: u64,
    pub compressed_bytes: u64,
    /// Most archive bytes held in memory at once while decoding.
    pub peak_buffered_bytes: usize,
    pub sink_path: String,
}

/// Streams a download through the zip decoder into a sink, accepting only
/// archives with a single entry.
///
/// Nothing is buffered beyond one input chunk and one output chunk. The
/// entry is relayed before the archive is known to hold nothing else, so a
/// multi-entry archive fails with the first entry already written.
pub struct SingleEntryPipeline<C: HttpClient, K: Sink> {
    source: StreamSource<C>,
    sink: K,
    decode: DecodeOptions,
}

impl<C: HttpClient, K: Sink> SingleEntryPipeline<C, K> {
    pub fn new(source: StreamSource<C>, sink: K) -> Self {
        let decode = DecodeOptions::default().out_chunk_size(source.options().chunk_size);
        Self {
            source,
            sink,
            decode,
        }
    }

    pub async fn run(&self, download_url: &str, sink_path: &SinkPath) -> Result<RunReport> {
        info!(url = download_url, "downloading");
        let body = self.source.open(download_url).await?;
        let mut decoder = ZipStreamDecoder::with_options(body, self.decode.clone());

        let Some(mut entry) = decoder.next_entry().await? else {
            return Err(PipelineError::EntryCount { count: 0 });
        };
        let entry_name = entry.name().to_string();
        let declared_size = entry.declared_size();
        info!(name = %entry_name, size = ?declared_size, "unzipping");

        info!(path = %sink_path, "writing");
        let mut writer = self.sink.open_write(sink_path).await?;
        let relayed = relay(&mut entry, &mut writer).await;
        let closed = writer.close().await;

        let chunks = match (relayed, closed) {
            (Ok(chunks), Ok(_)) => chunks,
            (Ok(_), Err(e)) => return Err(e.into()),
            (Err(e), Ok(_)) => return Err(e),
            (Err(e), Err(close)) => {
                warn!(path = %sink_path, error = %close, "failed to close sink after error");
                return Err(e);
            }
        };

        if let Some(extra) = decoder.next_entry().await? {
            return Err(PipelineError::MultipleEntries {
                first: entry_name,
                second: extra.name().to_string(),
            });
        }

        let report = RunReport {
            bytes_written: chunks.bytes,
            chunks: chunks.count,
            compressed_bytes: decoder.position(),
            peak_buffered_bytes: decoder.high_water_mark(),
            entry_name,
            declared_size,
            sink_path: sink_path.to_string(),
        };
        debug!(
            bytes = report.bytes_written,
            chunks = report.chunks,
            compressed = report.compressed_bytes,
            entries = decoder.entries_seen(),
            "run complete"
        );
        Ok(report)
    }
}

struct Relayed {
    bytes: u64,
    count: u64,
}

/// Copy every chunk of `entry` into `writer`, in order.
async fn relay<W: SinkWriter>(
    entry: &mut ArchiveEntry<'_, ChunkStream>,
    writer: &mut W,
) -> Result<Relayed> {
    let mut relayed = Relayed { bytes: 0, count: 0 };
    while let Some(chunk) = entry.next_chunk().await? {
        relayed.bytes += chunk.len() as u64;
        relayed.count += 1;
        writer.write(chunk).await?;
    }
    Ok(relayed)
}
