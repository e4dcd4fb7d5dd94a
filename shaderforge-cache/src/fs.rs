//! Filesystem helpers shared by the generator and the cache.
use crate::error::CacheError;
use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;

/// The modification time of the file at `path`.
pub fn modification_time(path: impl AsRef<Path>) -> Result<SystemTime, CacheError> {
    let path = path.as_ref();
    std::fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .map_err(|e| map_io_error(path, e))
}

/// Read the file at `path` to a string.
pub fn read_text(path: impl AsRef<Path>) -> Result<String, CacheError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|e| map_io_error(path, e))
}

fn map_io_error(path: &Path, error: std::io::Error) -> CacheError {
    if error.kind() == ErrorKind::NotFound {
        CacheError::PathMissing(path.to_path_buf())
    } else {
        CacheError::OpenFailed(path.to_path_buf(), error)
    }
}
