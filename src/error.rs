//! Zone core error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::ZoneId;

/// Errors raised by zone, layout and folder operations.
///
/// Only user-initiated operations (create, rename, file moves) surface these to the
/// UI; persistence and root listing failures are logged and degrade to defaults.
#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("a zone already exists for {}", .0.display())]
    DuplicatePath(PathBuf),

    #[error("target already exists: {}", .0.display())]
    TargetExists(PathBuf),

    #[error("failed to rename {} to {}: {source}", .from.display(), .to.display())]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("layout file unavailable at {}: {reason}", .path.display())]
    PersistenceUnavailable { path: PathBuf, reason: String },

    #[error("root directory unavailable at {}: {source}", .path.display())]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create {}: {source}", .path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid name: {0:?}")]
    InvalidName(String),

    #[error("unknown zone: {0}")]
    UnknownZone(ZoneId),

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ZoneError>;
