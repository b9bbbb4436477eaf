//! Lookup contract for extracted file content.
//!
//! The store is owned by the [`SystemDescription`](crate::description::SystemDescription);
//! scopes only keep a `Weak` handle to it, so dropping or rebuilding a scope
//! never affects the store.

use crate::errors::ExError;

pub trait FileStore {
    /// Bytes of an extracted file, `None` if the file was not captured.
    ///
    /// `path` is the element name as recorded in the scope (e.g. `/etc/hosts`).
    ///
    /// # Errors
    ///
    /// Any I/O failure other than absence.
    fn read_file(&self, scope: &str, path: &str) -> Result<Option<Vec<u8>>, ExError>;
}

/// Store for descriptions that carry no extracted content
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFileStore;

impl FileStore for NoFileStore {
    fn read_file(&self, _scope: &str, _path: &str) -> Result<Option<Vec<u8>>, ExError> {
        Ok(None)
    }
}
