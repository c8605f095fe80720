//! Text file helpers shared by the substitution and rewrite passes.
//!
//! Writes go through a temporary file in the same directory that is persisted
//! over the original, so a file either receives its complete new content or
//! keeps its old one.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::trace;

use crate::core::error::{Error, Result};

/// Read a file as UTF-8 text.
///
/// Fails with [`Error::Encoding`] when the bytes are not valid UTF-8 and with
/// [`Error::FileIo`] for any other read failure.
pub fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::file_io(path, e))?;
    String::from_utf8(bytes).map_err(|_| Error::Encoding {
        path: path.to_path_buf(),
    })
}

/// Atomically replace the content of `path`, keeping its permissions.
pub fn write_text_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let permissions = fs::metadata(path).ok().map(|m| m.permissions());

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| Error::file_io(path, e))?;
    temp.write_all(content.as_bytes())
        .map_err(|e| Error::file_io(path, e))?;
    temp.flush().map_err(|e| Error::file_io(path, e))?;

    if let Some(permissions) = permissions {
        fs::set_permissions(temp.path(), permissions).map_err(|e| Error::file_io(path, e))?;
    }

    temp.persist(path)
        .map_err(|e| Error::file_io(path, e.error))?;
    trace!(path = %path.display(), bytes = content.len(), "wrote file");
    Ok(())
}

/// Apply `transform` to the text of `path` and write it back only when the
/// result differs byte-for-byte. Returns whether the file changed.
pub fn rewrite_text<F>(path: &Path, transform: F) -> Result<bool>
where
    F: FnOnce(&str) -> String,
{
    let original = read_text(path)?;
    let updated = transform(&original);
    if updated == original {
        return Ok(false);
    }
    write_text_atomic(path, &updated)?;
    Ok(true)
}
