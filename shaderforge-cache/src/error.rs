use shaderforge_common::{ErrorKind, Reportable, ShaderStageIdentity};
use std::path::PathBuf;
use thiserror::Error;

/// Error type for cache and filesystem operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CacheError {
    /// The path does not exist.
    #[error("the path {0:?} does not exist")]
    PathMissing(PathBuf),
    /// The path exists but could not be opened or read.
    #[error("the path {0:?} could not be opened")]
    OpenFailed(PathBuf, #[source] std::io::Error),
    /// No cache entry exists for the identity.
    #[error("no cached {what} for stage {identity}")]
    EntryMissing {
        identity: ShaderStageIdentity,
        what: &'static str,
    },
    /// A batched write failed; none of the batch was applied.
    #[error("cache batch failed at step {step} for stage {identity}: {reason}")]
    BatchFailed {
        step: usize,
        identity: ShaderStageIdentity,
        reason: &'static str,
    },
    /// The persistent store reported an error.
    #[error("persistent cache error")]
    StoreError(#[from] rusqlite::Error),
}

impl Reportable for CacheError {
    fn kind(&self) -> ErrorKind {
        match self {
            CacheError::PathMissing(_) => ErrorKind::PathMissing,
            CacheError::OpenFailed(..) => ErrorKind::OpenFailed,
            CacheError::EntryMissing { .. } => ErrorKind::CacheEntryMissing,
            CacheError::BatchFailed { .. } => ErrorKind::BatchFailed,
            CacheError::StoreError(_) => ErrorKind::PersistentStore,
        }
    }
}
