//! Data layer: immutable types for link resolution and body streaming.

mod options;
mod pattern;

pub use options::{SourceOptions, DEFAULT_CHUNK_SIZE};
pub use pattern::LinkPattern;
