//! Reading the SQL script to run.

use std::fs;
use std::io::{self, Read as _};
use std::path::Path;

use tracing::debug;

use crate::error::ExportError;

/// The script path that reads from stdin.
pub const STDIN: &str = "-";

/// Read the SQL script at `path`, or from stdin if the path is `-`.
///
/// # Errors
///
/// Fails with [`ExportError::ScriptRead`] if the script cannot be read, and with
/// [`ExportError::EmptyScript`] if it holds nothing but whitespace.
pub fn read(path: &Path) -> Result<String, ExportError> {
    let text = read_file_or_stdin(path).map_err(|source| ExportError::ScriptRead {
        path: path.to_owned(),
        source,
    })?;
    require_content(path, text)
}

/// Given a path, read from stdin if the path is "-". Otherwise, read the file at that path.
fn read_file_or_stdin(path: &Path) -> io::Result<String> {
    if path.as_os_str() == STDIN {
        let mut text = String::new();
        let _num_bytes = io::stdin().lock().read_to_string(&mut text)?;
        Ok(text)
    } else {
        fs::read_to_string(path)
    }
}

fn require_content(path: &Path, text: String) -> Result<String, ExportError> {
    if text.trim().is_empty() {
        return Err(ExportError::EmptyScript {
            path: path.to_owned(),
        });
    }
    debug!(path = %path.display(), bytes = text.len(), "read SQL script");
    Ok(text)
}
