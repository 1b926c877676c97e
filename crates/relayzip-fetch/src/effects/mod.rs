//! I/O operations for link resolution and body streaming.
//!
//! Everything that touches the network goes through [`HttpClient`], so the
//! resolver and the stream source can be exercised against canned responses.

mod http;
mod resolver;
mod source;

pub use http::{BoxStream, HttpClient};
pub use resolver::LinkResolver;
pub use source::{ChunkStream, StreamSource};

#[cfg(feature = "reqwest")]
pub use http::{ClientSetting, ReqwestClient};
