//! Forward-only streaming zip decoding over chunked byte streams.
//!
//! # Architecture
//!
//! - `format.rs` - Record signatures and fixed-layout field parsing
//! - `entry.rs` - Entry header metadata
//! - `input.rs` - Pull buffer over the upstream chunk stream
//! - `inflate.rs` - Incremental raw-deflate output
//! - `decoder.rs` - The per-entry state machine
//! - `builder.rs` - Minimal zip writer used for fixtures and benches
//!
//! The decoder never seeks and never looks at the central directory: entries
//! are discovered from their local headers as bytes arrive, and each entry's
//! end is found either from its declared sizes or from the end of its deflate
//! stream followed by a trailing data descriptor.

pub use builder::{BuilderEntry, ZipBuilder};
pub use decoder::{ArchiveEntry, DecodeOptions, ZipStreamDecoder};
pub use entry::{CompressionMethod, EntryHeader};
pub use error::{DecodeError, Error, Result};

mod builder;
mod decoder;
mod entry;
mod error;
mod format;
mod inflate;
mod input;
