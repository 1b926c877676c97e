//! Find a dated zip on a web index, stream it, and write its single entry
//! to object storage without holding the archive or the file in memory.
//!
//! # Architecture
//!
//! - [`config`] - Layered [`Settings`] (defaults, TOML, environment)
//! - [`pipeline`] - [`SingleEntryPipeline`]: download → unzip → sink
//! - [`dispatch`] - [`Dispatcher`]: request validation and routing
//!
//! Link resolution and body streaming live in `relayzip-fetch`, zip decoding
//! in `relayzip-archive`, and storage backends in `relayzip-sink`.

pub mod config;
pub mod dispatch;
mod error;
pub mod pipeline;

pub use config::{Settings, SourceConfig};
pub use dispatch::{Dispatcher, InvocationResult, Plan, Request};
pub use error::{PipelineError, Result, SettingsError};
pub use pipeline::{RunReport, SingleEntryPipeline};
