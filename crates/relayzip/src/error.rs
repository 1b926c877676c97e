use std::path::PathBuf;

use relayzip_archive::DecodeError;
use relayzip_fetch::FetchError;

/// Why an invocation failed. Every variant is fatal; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Configuration(String),

    #[error(transparent)]
    Fetch(FetchError),

    #[error(transparent)]
    Transport(FetchError),

    #[error(transparent)]
    LinkNotFound(FetchError),

    #[error(transparent)]
    AmbiguousLink(FetchError),

    #[error("malformed archive: {0}")]
    MalformedArchive(#[source] relayzip_archive::Error),

    #[error("archive holds more than one entry: '{first}' is followed by '{second}'")]
    MultipleEntries { first: String, second: String },

    #[error("archive must hold exactly one entry, found {count}")]
    EntryCount { count: usize },

    #[error(transparent)]
    Sink(#[from] relayzip_sink::Error),
}

impl PipelineError {
    /// Stable name of the error kind, as reported to the invoker.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ConfigurationError",
            Self::Fetch(_) => "FetchError",
            Self::Transport(_) => "TransportError",
            Self::LinkNotFound(_) => "NotFoundError",
            Self::AmbiguousLink(_) => "AmbiguousError",
            Self::MalformedArchive(_) => "MalformedArchiveError",
            Self::MultipleEntries { .. } => "MultipleEntriesError",
            Self::EntryCount { .. } => "EntryCountError",
            Self::Sink(_) => "SinkError",
        }
    }

    /// HTTP-style status code for the invocation result.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Configuration(_) => 400,
            Self::Fetch(_) | Self::Transport(_) | Self::LinkNotFound(_) | Self::AmbiguousLink(_) => {
                502
            }
            Self::MalformedArchive(_) | Self::MultipleEntries { .. } | Self::EntryCount { .. } => {
                422
            }
            Self::Sink(_) => 500,
        }
    }
}

impl From<FetchError> for PipelineError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::InvalidPattern { .. } => Self::Configuration(e.to_string()),
            FetchError::NoMatchingLink { .. } => Self::LinkNotFound(e),
            FetchError::AmbiguousLink { .. } => Self::AmbiguousLink(e),
            FetchError::Transport { .. } => Self::Transport(e),
            FetchError::InvalidUrl { .. } | FetchError::Fetch { .. } => Self::Fetch(e),
        }
    }
}

impl From<DecodeError<FetchError>> for PipelineError {
    fn from(e: DecodeError<FetchError>) -> Self {
        match e {
            DecodeError::Archive(e) => Self::MalformedArchive(e),
            DecodeError::Source(e) => e.into(),
        }
    }
}

/// Failure to assemble [`Settings`](crate::Settings).
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("config file '{}' does not exist", .0.display())]
    MissingFile(PathBuf),

    #[error(transparent)]
    Figment(#[from] figment::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
