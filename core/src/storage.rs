//! Flat file storage for uploaded studies, keyed by original file name

use crate::error::{DicomcatError, Result};
use log::{debug, info};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Storage root used when none is configured
pub const DEFAULT_STORAGE_DIR: &str = "./testdata/server/storage/";

/// Process-wide storage location
///
/// Set once at startup and shared read-only between the ingest endpoint and
/// every reader.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a storage rooted at `root`; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a file name to its location under the root
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_file_name(name)?;
        Ok(self.root.join(name))
    }

    /// Writes an uploaded file, replacing any file of the same name
    ///
    /// # Errors
    ///
    /// - [`DicomcatError::EmptyUpload`] if `bytes` is empty; nothing is written
    /// - [`DicomcatError::InvalidFileName`] if `name` cannot be a storage key
    /// - [`DicomcatError::StorageFailure`] on directory or file I/O errors
    pub fn ingest(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        if bytes.is_empty() {
            return Err(DicomcatError::EmptyUpload);
        }
        let path = self.path_for(name)?;
        self.ensure_root()?;
        fs::write(&path, bytes)?;
        info!("Stored {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Reads a stored file
    ///
    /// # Errors
    ///
    /// Returns [`DicomcatError::FileNotFound`] if no file of that name was stored
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(name)?;
        debug!("Reading {}", path.display());
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DicomcatError::FileNotFound(name.to_string()),
            _ => DicomcatError::StorageFailure(e),
        })
    }

    fn ensure_root(&self) -> Result<()> {
        if !self.root.is_dir() {
            info!("Creating storage directory {}", self.root.display());
            fs::create_dir_all(&self.root)?;
        }
        Ok(())
    }
}

/// Checks that a client-supplied name stays inside the storage root
pub fn validate_file_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(DicomcatError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ingest_creates_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(temp_dir.path().join("nested").join("storage"));

        let path = storage.ingest("IM000001", b"DICM data").unwrap();

        assert!(path.is_file());
        assert_eq!(storage.read("IM000001").unwrap(), b"DICM data");
    }

    #[test]
    fn test_empty_upload_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("storage");
        let storage = Storage::new(&root);

        let err = storage.ingest("IM000001", b"").unwrap_err();

        assert!(matches!(err, DicomcatError::EmptyUpload));
        assert!(!root.exists());
    }

    #[test]
    fn test_second_upload_replaces_first() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(temp_dir.path());

        storage.ingest("study.dcm", b"first version").unwrap();
        storage.ingest("study.dcm", b"second").unwrap();

        assert_eq!(storage.read("study.dcm").unwrap(), b"second");
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(temp_dir.path());
        let err = storage.read("absent").unwrap_err();
        assert!(matches!(err, DicomcatError::FileNotFound(ref n) if n == "absent"));
    }

    #[test]
    fn test_rejects_names_escaping_root() {
        for name in ["", ".", "..", "../etc/passwd", "a/b", "a\\b", "nul\0"] {
            assert!(
                matches!(validate_file_name(name), Err(DicomcatError::InvalidFileName(_))),
                "{:?} should be rejected",
                name
            );
        }
        assert!(validate_file_name("IM000001").is_ok());
        assert!(validate_file_name("scan..v2.dcm").is_ok());
    }
}
