use std::fmt;

/// Compression methods the decoder can expand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
}

impl CompressionMethod {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Stored),
            8 => Some(Self::Deflate),
            _ => None,
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored => f.write_str("stored"),
            Self::Deflate => f.write_str("deflate"),
        }
    }
}

/// Metadata read from an entry's local file header.
///
/// Sizes and CRC are `None` when the writer deferred them to a trailing data
/// descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryHeader {
    pub name: String,
    pub method: CompressionMethod,
    pub flags: u16,
    pub crc32: Option<u32>,
    pub compressed_size: Option<u64>,
    pub uncompressed_size: Option<u64>,
    pub zip64: bool,
}

impl EntryHeader {
    /// Uncompressed size as announced before the entry's data, if any.
    pub fn declared_size(&self) -> Option<u64> {
        self.uncompressed_size
    }

    pub fn has_data_descriptor(&self) -> bool {
        self.flags & crate::format::FLAG_DATA_DESCRIPTOR != 0
    }
}
