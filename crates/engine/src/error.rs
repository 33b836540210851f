//! Errors that abort an import run.
//!
//! Per-item job failures are not errors; they are recorded on the item and
//! reported in the [`RunReport`](crate::RunReport).

use std::path::PathBuf;

use sumo_import_client::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("source path not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("malformed source document {}: {reason}", path.display())]
    MalformedSource { path: PathBuf, reason: String },

    #[error("failed to write manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}
