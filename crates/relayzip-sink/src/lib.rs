//! Writable byte-stream destinations keyed by a hierarchical path.
//!
//! A [`Sink`] opens a [`SinkWriter`] for a [`SinkPath`]; the writer accepts
//! repeated writes and a final close. Writes become visible to readers of the
//! same key as they happen; there is no atomic commit.
//!
//! Backends:
//! - [`MemorySink`] for `mem://` paths
//! - [`FsSink`] for `file://` paths, rooted at a local directory
//! - [`SinkRouter`] picks one of the above by scheme

pub use error::{Error, Result};
pub use fs::{FsSink, FsWriter};
pub use memory::{MemorySink, MemoryWriter};
pub use path::SinkPath;
pub use router::{RoutedWriter, SinkRouter};
pub use sink::{Sink, SinkWriter};

mod error;
mod fs;
mod memory;
mod path;
mod router;
mod sink;
