//! Writing the encoded document to the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use crate::document::Document;
use crate::error::ExportError;

/// The name of the output file for a run finishing at `seconds` since the Unix epoch.
#[must_use]
pub fn file_name(seconds: i64) -> String {
    format!("{seconds}.json")
}

/// Write `document` as pretty-printed JSON to `<directory>/<unix seconds>.json`.
///
/// The document is serialized before the file is created. If writing fails the partial file is
/// removed.
///
/// # Errors
///
/// Fails with [`ExportError::OutputWrite`] if the document cannot be serialized or the file cannot
/// be written.
pub fn write_document(directory: &Path, document: &Document) -> Result<PathBuf, ExportError> {
    let path = directory.join(file_name(Utc::now().timestamp()));

    let mut bytes = Vec::new();
    document
        .write_pretty(&mut bytes)
        .map_err(|err| ExportError::OutputWrite {
            path: path.clone(),
            source: err.into(),
        })?;

    if let Err(err) = fs::write(&path, &bytes) {
        if path.exists() {
            if let Err(remove_err) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %remove_err, "unable to remove partial output");
            }
        }
        return Err(ExportError::OutputWrite {
            path,
            source: err.into(),
        });
    }

    debug!(path = %path.display(), bytes = bytes.len(), "wrote output document");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_file_after_epoch_seconds() {
        assert_eq!(file_name(1_704_067_200), "1704067200.json");
    }

    #[test]
    fn writes_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let before = Utc::now().timestamp();
        let path = write_document(dir.path(), &Document::default()).unwrap();
        let after = Utc::now().timestamp();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
        let stem: i64 = path.file_stem().unwrap().to_str().unwrap().parse().unwrap();
        assert!((before..=after).contains(&stem));
        assert_eq!(path.extension().unwrap(), "json");
    }

    #[test]
    fn missing_directory_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_document(&dir.path().join("gone"), &Document::default()).unwrap_err();
        assert!(matches!(err, ExportError::OutputWrite { .. }), "{err:?}");
    }
}
