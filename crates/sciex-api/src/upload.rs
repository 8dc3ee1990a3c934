//! Upload validation and temporary storage
//!
//! Every accepted upload is written to its own uniquely named file inside
//! the upload directory. The file lives as long as the returned
//! `NamedTempFile` and is removed when that value is dropped, on success
//! and failure alike. Client filenames are only used for validation.

use std::io::Write;
use std::path::{Path, PathBuf};

use sciex_core::{Result, SciexError};
use tempfile::NamedTempFile;

/// Directory holding in-flight uploads
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Use `dir` for uploads, creating it if absent
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to a fresh file that is deleted when the handle drops
    pub fn store(&self, bytes: &[u8]) -> Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".pdf")
            .tempfile_in(&self.dir)?;

        file.write_all(bytes)?;
        file.flush()?;
        Ok(file)
    }
}

/// Check a client-supplied filename: present, non-empty, `.pdf` in any case
pub fn validate_filename(filename: Option<&str>) -> Result<()> {
    let filename = match filename {
        Some(name) if !name.is_empty() => name,
        _ => {
            return Err(SciexError::BadRequest(
                "file not included or empty filename".to_string(),
            ))
        }
    };

    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(SciexError::UnsupportedType(filename.to_string()));
    }

    Ok(())
}
