use bytes::Bytes;
use flate2::Crc;
use futures_util::Stream;
use tracing::{debug, trace};

use crate::entry::{CompressionMethod, EntryHeader};
use crate::error::{DecodeError, Error};
use crate::format::{
    FLAG_ENCRYPTED, LOCAL_HEADER_LEN, LocalHeaderFixed, SIG_DATA_DESCRIPTOR, SIG_LOCAL_HEADER,
    is_archive_trailer, le_u32, le_u64, zip64_sizes,
};
use crate::inflate::Inflater;
use crate::input::InputBuffer;

/// Tuning for [`ZipStreamDecoder`].
#[derive(Clone, Debug)]
pub struct DecodeOptions {
    /// Upper bound on the size of each chunk handed out by an entry.
    pub out_chunk_size: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            out_chunk_size: 64 * 1024,
        }
    }
}

impl DecodeOptions {
    #[must_use]
    pub fn out_chunk_size(mut self, size: usize) -> Self {
        self.out_chunk_size = size.max(1);
        self
    }
}

enum State {
    AwaitingHeader,
    Streaming(Box<EntryState>),
    Finished,
    Failed,
}

struct EntryState {
    header: EntryHeader,
    body: Body,
    crc: Crc,
    produced: u64,
}

enum Body {
    Stored { size: u64, remaining: u64 },
    Deflate(Inflater),
}

impl Body {
    fn compressed_read(&self) -> u64 {
        match self {
            Self::Stored { size, remaining } => size - remaining,
            Self::Deflate(inflater) => inflater.total_in(),
        }
    }
}

struct Descriptor {
    crc32: u32,
    compressed_size: u64,
    uncompressed_size: u64,
}

/// Decodes a zip archive from a forward-only stream of byte chunks.
///
/// Entries are yielded one at a time, in archive order. Each entry's content
/// must be consumed (or skipped) before the next header can be read; asking
/// for the next entry early drains the current one. Every entry is checked
/// against its CRC-32 and sizes once its data ends.
///
/// Any error poisons the decoder: further calls fail with [`Error::Aborted`].
pub struct ZipStreamDecoder<S> {
    input: InputBuffer<S>,
    state: State,
    options: DecodeOptions,
    entries: usize,
}

impl<S, E> ZipStreamDecoder<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    pub fn new(source: S) -> Self {
        Self::with_options(source, DecodeOptions::default())
    }

    pub fn with_options(source: S, options: DecodeOptions) -> Self {
        Self {
            input: InputBuffer::new(source),
            state: State::AwaitingHeader,
            options,
            entries: 0,
        }
    }

    /// Advance to the next entry, or `None` once the central directory (or
    /// end-of-central-directory record) is reached.
    pub async fn next_entry(&mut self) -> Result<Option<ArchiveEntry<'_, S>>, DecodeError<E>> {
        if matches!(self.state, State::Streaming(_)) {
            self.drain().await?;
        }
        match self.state {
            State::Finished => return Ok(None),
            State::Failed => return Err(Error::Aborted.into()),
            State::AwaitingHeader | State::Streaming(_) => {}
        }

        match self.read_header().await {
            Ok(Some(header)) => {
                self.entries += 1;
                self.start_entry(header.clone());
                Ok(Some(ArchiveEntry {
                    decoder: self,
                    header,
                }))
            }
            Ok(None) => {
                debug!(entries = self.entries, "reached end of archive entries");
                self.state = State::Finished;
                Ok(None)
            }
            Err(e) => {
                self.state = State::Failed;
                Err(e)
            }
        }
    }

    /// Number of entries whose headers have been read.
    pub fn entries_seen(&self) -> usize {
        self.entries
    }

    /// Archive bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.input.position()
    }

    /// Peak number of input bytes held at once.
    pub fn high_water_mark(&self) -> usize {
        self.input.high_water_mark()
    }

    async fn read_header(&mut self) -> Result<Option<EntryHeader>, DecodeError<E>> {
        self.input.require(4).await?;
        let mut sig = le_u32(self.input.as_slice(), 0);

        // Split archives may open with a bare data-descriptor marker.
        if self.entries == 0 && self.input.position() == 0 && sig == SIG_DATA_DESCRIPTOR {
            self.input.advance(4);
            self.input.require(4).await?;
            sig = le_u32(self.input.as_slice(), 0);
        }

        if is_archive_trailer(sig) {
            return Ok(None);
        }
        if sig != SIG_LOCAL_HEADER {
            return Err(Error::BadSignature {
                offset: self.input.position(),
                found: sig,
            }
            .into());
        }

        self.input.require(LOCAL_HEADER_LEN).await?;
        let fixed = LocalHeaderFixed::parse(self.input.as_slice());
        self.input
            .require(LOCAL_HEADER_LEN + fixed.variable_len())
            .await?;

        let raw = self.input.as_slice();
        let name_end = LOCAL_HEADER_LEN + fixed.name_len;
        let name = String::from_utf8_lossy(&raw[LOCAL_HEADER_LEN..name_end]).into_owned();
        let zip64 = zip64_sizes(
            &raw[name_end..name_end + fixed.extra_len],
            fixed.compressed_size,
            fixed.uncompressed_size,
        )
        .map_err(|()| Error::BadZip64Extra { name: name.clone() })?;
        self.input.advance(LOCAL_HEADER_LEN + fixed.variable_len());

        let header = build_header(name, &fixed, zip64.as_ref())?;
        debug!(
            name = %header.name,
            method = %header.method,
            declared_size = ?header.declared_size(),
            descriptor = header.has_data_descriptor(),
            "read local header"
        );
        Ok(Some(header))
    }

    fn start_entry(&mut self, header: EntryHeader) {
        let body = match header.method {
            CompressionMethod::Stored => {
                let size = header.compressed_size.unwrap_or(0);
                Body::Stored {
                    size,
                    remaining: size,
                }
            }
            CompressionMethod::Deflate => Body::Deflate(Inflater::new(self.options.out_chunk_size)),
        };
        self.state = State::Streaming(Box::new(EntryState {
            header,
            body,
            crc: Crc::new(),
            produced: 0,
        }));
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>, DecodeError<E>> {
        match self.pull_chunk().await {
            Ok(chunk) => Ok(chunk),
            Err(e) => {
                self.state = State::Failed;
                Err(e)
            }
        }
    }

    async fn pull_chunk(&mut self) -> Result<Option<Bytes>, DecodeError<E>> {
        let entry = match &mut self.state {
            State::Streaming(entry) => entry,
            State::Failed => return Err(Error::Aborted.into()),
            State::AwaitingHeader | State::Finished => return Ok(None),
        };
        let input = &mut self.input;

        let chunk = match &mut entry.body {
            Body::Stored { remaining, .. } if *remaining == 0 => None,
            Body::Stored { remaining, .. } => {
                input.require_any().await?;
                let n = (*remaining)
                    .min(input.len() as u64)
                    .min(self.options.out_chunk_size as u64) as usize;
                *remaining -= n as u64;
                Some(input.take(n))
            }
            Body::Deflate(inflater) => inflater.next_chunk(input, &entry.header.name).await?,
        };

        match chunk {
            Some(bytes) => {
                entry.crc.update(&bytes);
                entry.produced += bytes.len() as u64;
                trace!(len = bytes.len(), "entry chunk");
                Ok(Some(bytes))
            }
            None => {
                self.finish_entry().await?;
                Ok(None)
            }
        }
    }

    /// Read the descriptor if there is one and verify the entry's checksums.
    async fn finish_entry(&mut self) -> Result<(), DecodeError<E>> {
        let State::Streaming(entry) = std::mem::replace(&mut self.state, State::AwaitingHeader)
        else {
            return Ok(());
        };
        let EntryState {
            header,
            body,
            crc,
            produced,
        } = *entry;
        let compressed = body.compressed_read();
        drop(body);

        let expected = if header.has_data_descriptor() {
            self.read_descriptor(header.zip64).await?
        } else {
            Descriptor {
                crc32: header.crc32.unwrap_or(0),
                compressed_size: header.compressed_size.unwrap_or(compressed),
                uncompressed_size: header.uncompressed_size.unwrap_or(produced),
            }
        };

        if expected.crc32 != crc.sum() {
            return Err(Error::CrcMismatch {
                name: header.name,
                expected: expected.crc32,
                actual: crc.sum(),
            }
            .into());
        }
        if expected.uncompressed_size != produced {
            return Err(Error::SizeMismatch {
                name: header.name,
                what: "uncompressed",
                expected: expected.uncompressed_size,
                actual: produced,
            }
            .into());
        }
        if expected.compressed_size != compressed {
            return Err(Error::SizeMismatch {
                name: header.name,
                what: "compressed",
                expected: expected.compressed_size,
                actual: compressed,
            }
            .into());
        }

        debug!(name = %header.name, size = produced, compressed, "entry verified");
        Ok(())
    }

    async fn read_descriptor(&mut self, zip64: bool) -> Result<Descriptor, DecodeError<E>> {
        self.input.require(4).await?;
        if le_u32(self.input.as_slice(), 0) == SIG_DATA_DESCRIPTOR {
            self.input.advance(4);
        }

        let width = if zip64 { 8 } else { 4 };
        self.input.require(4 + 2 * width).await?;
        let raw = self.input.as_slice();
        let descriptor = if zip64 {
            Descriptor {
                crc32: le_u32(raw, 0),
                compressed_size: le_u64(raw, 4),
                uncompressed_size: le_u64(raw, 12),
            }
        } else {
            Descriptor {
                crc32: le_u32(raw, 0),
                compressed_size: le_u32(raw, 4) as u64,
                uncompressed_size: le_u32(raw, 8) as u64,
            }
        };
        self.input.advance(4 + 2 * width);
        Ok(descriptor)
    }

    async fn drain(&mut self) -> Result<u64, DecodeError<E>> {
        let mut skipped = 0;
        while let Some(chunk) = self.next_chunk().await? {
            skipped += chunk.len() as u64;
        }
        Ok(skipped)
    }
}

fn build_header(
    name: String,
    fixed: &LocalHeaderFixed,
    zip64: Option<&crate::format::Zip64Sizes>,
) -> Result<EntryHeader, Error> {
    if fixed.flags & FLAG_ENCRYPTED != 0 {
        return Err(Error::Encrypted { name });
    }
    let Some(method) = CompressionMethod::from_code(fixed.method) else {
        return Err(Error::UnsupportedMethod {
            name,
            method: fixed.method,
        });
    };

    let compressed = zip64
        .and_then(|z| z.compressed)
        .unwrap_or(fixed.compressed_size as u64);
    let uncompressed = zip64
        .and_then(|z| z.uncompressed)
        .unwrap_or(fixed.uncompressed_size as u64);

    let mut header = EntryHeader {
        name,
        method,
        flags: fixed.flags,
        crc32: Some(fixed.crc32),
        compressed_size: Some(compressed),
        uncompressed_size: Some(uncompressed),
        zip64: zip64.is_some(),
    };

    if header.has_data_descriptor() {
        if method == CompressionMethod::Stored {
            return Err(Error::UnsupportedStoredDescriptor { name: header.name });
        }
        header.crc32 = None;
        header.compressed_size = None;
        header.uncompressed_size = None;
    }
    Ok(header)
}

/// One entry of an archive being decoded.
///
/// Borrows the decoder: content must be read through this handle before the
/// decoder can move on.
pub struct ArchiveEntry<'a, S> {
    decoder: &'a mut ZipStreamDecoder<S>,
    header: EntryHeader,
}

impl<'a, S, E> ArchiveEntry<'a, S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: 'a,
{
    pub fn header(&self) -> &EntryHeader {
        &self.header
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    /// Uncompressed size as announced in the local header, if any.
    pub fn declared_size(&self) -> Option<u64> {
        self.header.declared_size()
    }

    /// Next chunk of decompressed content.
    ///
    /// Returns `None` once the entry's data has ended and been verified.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, DecodeError<E>> {
        self.decoder.next_chunk().await
    }

    /// Discard the rest of this entry, still verifying it. Returns the number
    /// of bytes skipped.
    pub async fn skip(self) -> Result<u64, DecodeError<E>> {
        self.decoder.drain().await
    }

    /// Adapt the entry's content into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, DecodeError<E>>> + 'a {
        futures_util::stream::try_unfold(self, |mut entry| async move {
            let chunk = entry.next_chunk().await?;
            Ok::<_, DecodeError<E>>(chunk.map(|chunk| (chunk, entry)))
        })
    }
}

impl<S> std::fmt::Debug for ArchiveEntry<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveEntry")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use futures_util::stream;

    use super::*;
    use crate::builder::{BuilderEntry, ZipBuilder};

    fn source(data: Vec<u8>, size: usize) -> impl Stream<Item = Result<Bytes, Infallible>> + Unpin {
        let items: Vec<Result<Bytes, Infallible>> = data
            .chunks(size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        stream::iter(items)
    }

    async fn read_all<'a, S, E>(entry: &mut ArchiveEntry<'a, S>) -> Vec<u8>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: std::fmt::Debug + 'a,
    {
        let mut out = Vec::new();
        while let Some(chunk) = entry.next_chunk().await.unwrap() {
            out.extend_from_slice(&chunk);
        }
        out
    }

    #[tokio::test]
    async fn stored_entry_with_declared_size() {
        let zip = ZipBuilder::new()
            .entry(BuilderEntry::stored("a.txt", b"hello stored"))
            .finish()
            .unwrap();
        let mut decoder = ZipStreamDecoder::new(source(zip, 5));

        let mut entry = decoder.next_entry().await.unwrap().unwrap();
        assert_eq!(entry.name(), "a.txt");
        assert_eq!(entry.declared_size(), Some(12));
        assert_eq!(read_all(&mut entry).await, b"hello stored");
        assert!(decoder.next_entry().await.unwrap().is_none());
        assert!(decoder.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn next_entry_drains_unread_content() {
        let zip = ZipBuilder::new()
            .entry(BuilderEntry::deflated("one", &[1u8; 5000]))
            .entry(BuilderEntry::deflated("two", b"second").with_descriptor())
            .finish()
            .unwrap();
        let mut decoder = ZipStreamDecoder::new(source(zip, 64));

        let first = decoder.next_entry().await.unwrap().unwrap();
        assert_eq!(first.name(), "one");
        let mut second = decoder.next_entry().await.unwrap().unwrap();
        assert_eq!(second.name(), "two");
        assert_eq!(second.declared_size(), None);
        assert_eq!(read_all(&mut second).await, b"second");
        assert_eq!(decoder.entries_seen(), 2);
    }

    #[tokio::test]
    async fn leading_split_marker_is_skipped() {
        let mut zip = SIG_DATA_DESCRIPTOR.to_le_bytes().to_vec();
        zip.extend(
            ZipBuilder::new()
                .entry(BuilderEntry::deflated("x", b"payload"))
                .finish()
                .unwrap(),
        );
        let mut decoder = ZipStreamDecoder::new(source(zip, 3));
        let mut entry = decoder.next_entry().await.unwrap().unwrap();
        assert_eq!(read_all(&mut entry).await, b"payload");
    }

    #[tokio::test]
    async fn errors_poison_the_decoder() {
        let mut zip = ZipBuilder::new()
            .entry(BuilderEntry::stored("a", b"abc"))
            .finish()
            .unwrap();
        zip[0] = b'X';
        let mut decoder = ZipStreamDecoder::new(source(zip, 16));
        assert!(matches!(
            decoder.next_entry().await,
            Err(DecodeError::Archive(Error::BadSignature { offset: 0, .. }))
        ));
        assert!(matches!(
            decoder.next_entry().await,
            Err(DecodeError::Archive(Error::Aborted))
        ));
    }

    #[test]
    fn stored_with_descriptor_is_rejected() {
        let fixed = LocalHeaderFixed {
            flags: crate::format::FLAG_DATA_DESCRIPTOR,
            method: 0,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            name_len: 1,
            extra_len: 0,
        };
        assert!(matches!(
            build_header("a".into(), &fixed, None),
            Err(Error::UnsupportedStoredDescriptor { .. })
        ));
    }

    #[test]
    fn encrypted_entries_are_rejected() {
        let fixed = LocalHeaderFixed {
            flags: FLAG_ENCRYPTED,
            method: 8,
            crc32: 0,
            compressed_size: 10,
            uncompressed_size: 10,
            name_len: 1,
            extra_len: 0,
        };
        assert!(matches!(
            build_header("a".into(), &fixed, None),
            Err(Error::Encrypted { .. })
        ));
    }
}
