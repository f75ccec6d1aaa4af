use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use crate::page_range::PageRangeError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed page expression; nothing was selected
    #[error("Invalid page input format: {0}")]
    Parse(#[from] PageRangeError),

    /// Removal requested with nothing selected
    #[error("No pages selected for removal")]
    EmptySelection,

    /// Content is not a readable PDF, or the output could not be serialized
    #[error("{context}: {source}")]
    Format {
        context: String,
        #[source]
        source: lopdf::Error,
    },

    #[error("Page {page} is out of range (1-{total})")]
    PageOutOfRange { page: u32, total: u32 },

    #[error("Failed to render page: {0}")]
    Render(String),

    #[error("Invalid session id: {0:?}")]
    InvalidSessionId(String),

    #[error("Unknown session: {0}")]
    UnknownSession(Uuid),

    #[error("Invalid session metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn format(context: impl Into<String>, source: lopdf::Error) -> Self {
        Error::Format {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
