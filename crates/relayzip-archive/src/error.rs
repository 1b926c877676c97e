#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("bad record signature {found:#010x} at offset {offset}")]
    BadSignature { offset: u64, found: u32 },

    #[error("archive ended unexpectedly at offset {offset}")]
    Truncated { offset: u64 },

    #[error("entry '{name}' is encrypted")]
    Encrypted { name: String },

    #[error("entry '{name}' uses unsupported compression method {method}")]
    UnsupportedMethod { name: String, method: u16 },

    #[error("stored entry '{name}' does not declare its size upfront")]
    UnsupportedStoredDescriptor { name: String },

    #[error("malformed zip64 extra field in entry '{name}'")]
    BadZip64Extra { name: String },

    #[error("inflate failed in entry '{name}': {message}")]
    Inflate { name: String, message: String },

    #[error("inflate made no progress in entry '{name}'")]
    Stalled { name: String },

    #[error("CRC-32 mismatch in entry '{name}': expected {expected:08x}, got {actual:08x}")]
    CrcMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    #[error("{what} size mismatch in entry '{name}': expected {expected}, got {actual}")]
    SizeMismatch {
        name: String,
        what: &'static str,
        expected: u64,
        actual: u64,
    },

    #[error("decoding was aborted by an earlier error")]
    Aborted,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure while decoding: either the archive itself is bad, or the input
/// stream feeding it failed.
///
/// Keeping the two apart lets callers report a dropped connection as a
/// transport problem rather than as a corrupt archive.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError<E> {
    #[error(transparent)]
    Archive(#[from] Error),

    #[error("archive input failed: {0}")]
    Source(#[source] E),
}
