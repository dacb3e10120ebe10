/// Whole-file byte loading
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{ObjError, Result};

/// Read the entire file at `path` into memory.
///
/// Fails on an empty path, an unopenable or unreadable file (directories
/// included) and on a zero-length file. The handle is dropped before return
/// on every path.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str().is_empty() {
        return Err(ObjError::InvalidPath);
    }

    let data = fs::read(path).map_err(|source| ObjError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if data.is_empty() {
        return Err(ObjError::EmptyFile {
            path: path.to_path_buf(),
        });
    }

    debug!("Read {} bytes from {:?}", data.len(), path);
    Ok(data)
}
