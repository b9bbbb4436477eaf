//! Extracted file content on disk.
//!
//! Files of scope `s` recorded as `/etc/hosts` live at
//! `<description dir>/s/etc/hosts`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use sysdesc_core::errors::{ExError, ExErrorKind};
use sysdesc_core::file_store::FileStore;

use crate::errors::io_error_at;

#[derive(Debug, Clone)]
pub struct FsFileStore {
    dir: PathBuf,
}

impl FsFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of `path` inside the extracted tree of `scope`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `path` would leave the scope directory.
    pub fn file_path(&self, scope: &str, path: &str) -> Result<PathBuf, ExError> {
        scoped_path(&self.dir.join(scope), path)
    }
}

/// Join an element path below `base`, refusing `..` and prefixes
pub(crate) fn scoped_path(base: &Path, path: &str) -> Result<PathBuf, ExError> {
    let relative = Path::new(path.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("read_extracted_file")
            .with_entity_id(path)
            .with_message("file path escapes the extraction directory"));
    }
    Ok(base.join(relative))
}

impl FileStore for FsFileStore {
    fn read_file(&self, scope: &str, path: &str) -> Result<Option<Vec<u8>>, ExError> {
        let file = self.file_path(scope, path)?;
        match fs::read(&file) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error_at("read_extracted_file", &file, e)),
        }
    }
}
