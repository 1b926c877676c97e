use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid sink path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("unsupported sink scheme '{scheme}'")]
    UnsupportedScheme { scheme: String },

    #[error("failed to open '{path}' for writing")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write to '{path}'")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to close '{path}'")]
    Close {
        path: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
