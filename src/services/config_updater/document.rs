//! TOML persistence helpers: preamble retention and atomic replace.

use crate::types::errors::{TuningError, TuningResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the leading comment and blank lines of a TOML document, verbatim.
///
/// Serializing through `toml` drops comments, so the preamble is captured
/// from the existing file and prepended to the fresh output on save.
pub fn extract_preamble(raw: &str) -> String {
    let mut preamble = String::new();
    for line in raw.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            preamble.push_str(line);
        } else {
            break;
        }
    }
    preamble
}

fn temp_path_for(file_path: &Path) -> TuningResult<PathBuf> {
    let file_name = file_path
        .file_name()
        .ok_or_else(|| TuningError::Io(format!("Invalid file path: {}", file_path.display())))?
        .to_string_lossy();
    Ok(file_path.with_file_name(format!("{}.tmp", file_name)))
}

/// Writes `bytes` to `path` through a sibling temp file and a rename.
pub fn write_atomic(path: &Path, bytes: impl AsRef<[u8]>) -> TuningResult<()> {
    let temp_path = temp_path_for(path)?;
    fs::write(&temp_path, bytes.as_ref())
        .map_err(|e| TuningError::Io(format!("Failed to write temp config file: {e}")))?;

    match fs::rename(&temp_path, path) {
        Ok(_) => Ok(()),
        Err(_) => {
            if path.exists() {
                fs::remove_file(path).map_err(|e| {
                    TuningError::Io(format!("Failed to replace config target file: {e}"))
                })?;
            }
            fs::rename(&temp_path, path)
                .map_err(|e| TuningError::Io(format!("Failed to finalize config write: {e}")))
        }
    }
}

#[cfg(test)]
#[path = "tests/document_tests.rs"]
mod tests;
