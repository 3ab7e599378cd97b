use std::io;
use std::path::PathBuf;

use halo_compose::{InputError, RecordId, RenderError, SessionError, StoreError};

/// Everything a `halo` subcommand can fail with.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Reading or writing a user-named file failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A photo or asset was rejected.
    #[error("{}: {source}", path.display())]
    Input {
        /// The offending file.
        path: PathBuf,
        /// Why it was rejected.
        #[source]
        source: InputError,
    },

    /// Composing the avatar failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Encoding the composite failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The history directory could not be used.
    #[error("history: {0}")]
    Store(#[from] StoreError),

    /// No record with the requested id.
    #[error("no history record with id {0}")]
    NotFound(RecordId),

    /// Listing could not be serialized.
    #[error("cannot write JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
