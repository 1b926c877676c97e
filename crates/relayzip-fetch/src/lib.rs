//! Index-page link resolution and bounded-chunk HTTP body streaming.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and types
//! - [`core`] - Pure transformations (href extraction, URL joining, re-chunking)
//! - [`effects`] - I/O operations behind the [`HttpClient`] trait
//!
//! # Key Features
//!
//! - **Single Match**: a link pattern must select exactly one anchor on the page
//! - **Bounded Chunks**: response bodies are relayed in chunks no larger than
//!   [`SourceOptions::chunk_size`], regardless of what the transport delivers
//! - **Prompt Release**: the connection is dropped as soon as the body ends,
//!   fails, or the consumer drops the stream

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use core::{extract_hrefs, join_href};
pub use data::{LinkPattern, SourceOptions, DEFAULT_CHUNK_SIZE};
pub use effects::{BoxStream, ChunkStream, HttpClient, LinkResolver, StreamSource};

#[cfg(feature = "reqwest")]
pub use effects::{ClientSetting, ReqwestClient};

pub use error::{FetchError, Result};
