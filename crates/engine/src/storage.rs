//! Whole-file reads and writes.
//!
//! Every operation reads a resource in full and writes it back in full. There is
//! no temp-file-and-rename step and no detection of concurrent writers.

use crate::error::{EngineError, Result};
use std::fs;
use std::io;
use std::path::Path;

pub fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| io_error(path, source))?;
    Ok(String::from_utf8(bytes).unwrap_or_else(|err| {
        log::warn!(target: "engine.storage", "{} is not valid UTF-8, decoding lossily", path.display());
        String::from_utf8_lossy(err.as_bytes()).into_owned()
    }))
}

/// Like [`read_text`], but a missing file reads as empty text.
pub fn read_or_empty(path: &Path) -> Result<String> {
    match read_text(path) {
        Err(EngineError::ResourceMissing { path }) => {
            log::warn!(target: "engine.storage", "{} does not exist, treating as empty", path.display());
            Ok(String::new())
        }
        other => other,
    }
}

/// Writes `text` to `path`, creating missing parent directories.
pub fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| EngineError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, text).map_err(|source| io_error(path, source))?;
    log::debug!(target: "engine.storage", "wrote {} bytes to {}", text.len(), path.display());
    Ok(())
}

fn io_error(path: &Path, source: io::Error) -> EngineError {
    if source.kind() == io::ErrorKind::NotFound {
        EngineError::ResourceMissing {
            path: path.to_path_buf(),
        }
    } else {
        EngineError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_resource_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.css");
        assert!(matches!(read_text(&path), Err(EngineError::ResourceMissing { .. })));
        assert_eq!(read_or_empty(&path).unwrap(), "");
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.js");
        write_text(&path, "let x = 1;").unwrap();
        assert_eq!(read_text(&path).unwrap(), "let x = 1;");
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.html");
        fs::write(&path, b"<p>\xff</p>").unwrap();
        assert_eq!(read_text(&path).unwrap(), "<p>\u{FFFD}</p>");
    }

    #[test]
    fn writing_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/main.css");
        write_text(&path, ".a { b: c; }").unwrap();
        assert_eq!(read_text(&path).unwrap(), ".a { b: c; }");
    }

    #[test]
    fn writing_under_a_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("css");
        fs::write(&blocker, "not a directory").unwrap();
        let err = write_text(&blocker.join("main.css"), "x").unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }), "{err}");
    }
}
