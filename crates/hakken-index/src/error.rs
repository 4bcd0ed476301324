use std::path::PathBuf;

use hakken_core::AnimeId;
use thiserror::Error;

/// Errors raised while loading or editing a metadata store.
///
/// Index building and lookups never fail; only getting data into a
/// [`Library`](crate::Library) can.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The library file could not be read.
    #[error("failed to read library file {path:?}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The library JSON is malformed.
    #[error("invalid library json: {0}")]
    Json(#[from] serde_json::Error),

    /// Two entries share one id.
    #[error("duplicate anime id {0} in library")]
    DuplicateId(AnimeId),

    /// Id 0 stands for "unknown" and cannot name an entry.
    #[error("anime id 0 is reserved for unknown results")]
    ReservedId,
}

/// Result type alias for Hakken index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
