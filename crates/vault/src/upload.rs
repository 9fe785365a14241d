//! Bounded streaming writes with partial-file cleanup.
//!
//! Upload data is written straight to the confined destination in chunks. A
//! running byte counter is compared against the configured ceiling after
//! every chunk; breaching it aborts the upload and deletes the partial file.
//! Dropping an unfinished sink (a cancelled request, a failed transfer) also
//! deletes the partial file, so no failure path leaves a truncated file
//! behind.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;

use tracing::warn;

use crate::error::{Result, VaultError};

/// Outcome of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uploaded {
    /// The sanitized destination filename.
    pub name: String,
    /// Total bytes written.
    pub size: u64,
}

/// An in-progress upload to a confined destination.
///
/// Created by [`crate::Vault::start_upload`]; feed it chunks with
/// [`UploadSink::write`] and commit with [`UploadSink::finish`].
pub struct UploadSink {
    dest: PathBuf,
    name: String,
    file: Option<File>,
    written: u64,
    limit: u64,
    committed: bool,
}

impl UploadSink {
    pub(crate) fn create(dest: PathBuf, name: String, limit: u64) -> Result<Self> {
        let file = File::create(&dest).map_err(map_storage)?;
        Ok(Self {
            dest,
            name,
            file: Some(file),
            written: 0,
            limit,
            committed: false,
        })
    }

    /// Appends one chunk, enforcing the size ceiling.
    ///
    /// On a ceiling breach or a write failure the partial destination file is
    /// deleted before the error is returned; the sink is unusable afterwards.
    pub fn write(&mut self, chunk: &[u8]) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Err(VaultError::Io(io::Error::other("upload already closed")));
        };

        self.written += chunk.len() as u64;
        if self.written > self.limit {
            self.discard();
            return Err(VaultError::TooLarge { limit: self.limit });
        }

        if let Err(e) = file.write_all(chunk) {
            self.discard();
            return Err(map_storage(e));
        }
        Ok(())
    }

    /// Closes the destination file and commits the upload.
    pub fn finish(mut self) -> Result<Uploaded> {
        // Dropping the handle closes it; flush first to surface late errors.
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush() {
                drop(file);
                self.discard();
                return Err(map_storage(e));
            }
        }
        self.committed = true;
        Ok(Uploaded {
            name: self.name.clone(),
            size: self.written,
        })
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    fn discard(&mut self) {
        self.file.take();
        if let Err(e) = fs::remove_file(&self.dest) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = ?self.dest, error = %e, "failed to remove partial upload");
            }
        }
    }
}

impl Drop for UploadSink {
    fn drop(&mut self) {
        if !self.committed && self.file.is_some() {
            self.discard();
        }
    }
}

fn map_storage(err: io::Error) -> VaultError {
    if err.kind() == io::ErrorKind::StorageFull {
        VaultError::StorageExhausted
    } else {
        VaultError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Vault;
    use tempfile::TempDir;

    fn vault() -> (TempDir, Vault) {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("uploads")).unwrap();
        let vault = Vault::new(tmp.path()).unwrap();
        (tmp, vault)
    }

    #[test]
    fn test_upload_roundtrip() {
        let (tmp, v) = vault();
        let content = b"Hello, this is uploaded content!";

        let mut sink = v.start_upload("uploads", "data.txt", 1024).unwrap();
        sink.write(&content[..16]).unwrap();
        sink.write(&content[16..]).unwrap();
        let done = sink.finish().unwrap();

        assert_eq!(done.name, "data.txt");
        assert_eq!(done.size, content.len() as u64);
        assert_eq!(
            fs::read(tmp.path().join("uploads/data.txt")).unwrap(),
            content
        );
    }

    #[test]
    fn test_upload_over_ceiling_leaves_no_file() {
        let (tmp, v) = vault();

        let mut sink = v.start_upload("uploads", "big.bin", 10).unwrap();
        sink.write(b"12345678").unwrap();
        let err = sink.write(b"overflow").unwrap_err();
        assert!(matches!(err, VaultError::TooLarge { limit: 10 }));
        assert!(!tmp.path().join("uploads/big.bin").exists());
    }

    #[test]
    fn test_upload_exactly_at_ceiling_is_fine() {
        let (tmp, v) = vault();

        let mut sink = v.start_upload("uploads", "edge.bin", 8).unwrap();
        sink.write(b"12345678").unwrap();
        sink.finish().unwrap();
        assert!(tmp.path().join("uploads/edge.bin").exists());
    }

    #[test]
    fn test_dropped_sink_cleans_up() {
        let (tmp, v) = vault();

        let mut sink = v.start_upload("uploads", "partial.bin", 1024).unwrap();
        sink.write(b"partial data").unwrap();
        drop(sink);
        assert!(!tmp.path().join("uploads/partial.bin").exists());
    }

    #[test]
    fn test_finished_file_survives_drop() {
        let (tmp, v) = vault();

        let mut sink = v.start_upload("uploads", "kept.bin", 1024).unwrap();
        sink.write(b"keep me").unwrap();
        sink.finish().unwrap();
        assert!(tmp.path().join("uploads/kept.bin").exists());
    }

    #[test]
    fn test_upload_to_root() {
        let (tmp, v) = vault();
        let mut sink = v.start_upload("", "top.txt", 64).unwrap();
        sink.write(b"top level").unwrap();
        sink.finish().unwrap();
        assert!(tmp.path().join("top.txt").exists());
    }

    #[test]
    fn test_upload_to_missing_directory() {
        let (_tmp, v) = vault();
        assert!(matches!(
            v.start_upload("nonexistent", "x.txt", 64),
            Err(VaultError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_upload_to_file_destination() {
        let (tmp, v) = vault();
        fs::write(tmp.path().join("afile.txt"), "file").unwrap();
        assert!(matches!(
            v.start_upload("afile.txt", "x.txt", 64),
            Err(VaultError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_upload_strips_smuggled_directories() {
        let (tmp, v) = vault();
        let mut sink = v
            .start_upload("uploads", "../../../etc/evil.txt", 64)
            .unwrap();
        sink.write(b"contained").unwrap();
        let done = sink.finish().unwrap();
        assert_eq!(done.name, "evil.txt");
        assert!(tmp.path().join("uploads/evil.txt").exists());
    }

    #[test]
    fn test_upload_rejects_empty_filename() {
        let (_tmp, v) = vault();
        assert!(matches!(
            v.start_upload("uploads", "", 64),
            Err(VaultError::InvalidFilename { .. })
        ));
        assert!(matches!(
            v.start_upload("uploads", "..", 64),
            Err(VaultError::InvalidFilename { .. })
        ));
    }

    #[test]
    fn test_upload_rejects_traversal_directory() {
        let (_tmp, v) = vault();
        assert!(matches!(
            v.start_upload("../../tmp", "x.txt", 64),
            Err(VaultError::PathEscape { .. })
        ));
    }

    #[test]
    fn test_upload_overwrites_existing_file() {
        let (tmp, v) = vault();
        fs::write(tmp.path().join("uploads/old.txt"), "old content").unwrap();

        let mut sink = v.start_upload("uploads", "old.txt", 64).unwrap();
        sink.write(b"new").unwrap();
        sink.finish().unwrap();
        assert_eq!(
            fs::read_to_string(tmp.path().join("uploads/old.txt")).unwrap(),
            "new"
        );
    }
}
