//! Filesystem operations over a confined home tree.
//!
//! Every operation resolves its candidate path through the [`HomeBoundary`]
//! before touching the filesystem; a confinement violation short-circuits
//! with [`VaultError::PathEscape`] before any OS call is made. The vault is
//! stateless beyond the immutable root, so a single instance is shared
//! read-only across concurrent requests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::boundary::HomeBoundary;
use crate::category::Category;
use crate::entry::{format_modified, DirEntry, EntryKind, FileInfo};
use crate::error::{Result, VaultError};
use crate::upload::UploadSink;

/// The confined home tree and the operations allowed on it.
pub struct Vault {
    boundary: HomeBoundary,
}

impl Vault {
    /// Opens a vault over an existing directory.
    pub fn new<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        Ok(Self {
            boundary: HomeBoundary::new(root)?,
        })
    }

    /// The canonical home root.
    pub fn root(&self) -> &Path {
        self.boundary.root()
    }

    /// The confinement boundary itself.
    pub fn boundary(&self) -> &HomeBoundary {
        &self.boundary
    }

    /// Lists a directory: directories first, then files, each group ordered
    /// case-insensitively by name.
    pub fn list(&self, path: &str) -> Result<Vec<DirEntry>> {
        let resolved = self.boundary.resolve(path)?;
        let meta = fs::metadata(&resolved).map_err(|e| missing(e, path))?;
        if !meta.is_dir() {
            return Err(VaultError::NotADirectory {
                path: path.to_string(),
            });
        }

        let mut entries = Vec::new();
        for child in fs::read_dir(&resolved)? {
            let child = match child {
                Ok(c) => c,
                Err(_) => continue,
            };
            let name = child.file_name().to_string_lossy().to_string();
            // Stat through symlinks, like the listing a shell would show.
            let meta = match fs::metadata(child.path()) {
                Ok(m) => m,
                Err(e) => {
                    debug!(name = %name, error = %e, "skipping unstattable entry");
                    continue;
                }
            };
            let modified = format_modified(meta.modified().unwrap_or(std::time::UNIX_EPOCH));
            entries.push(DirEntry {
                name,
                kind: if meta.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
                size: meta.len(),
                modified,
            });
        }

        entries.sort_by(|a, b| {
            let a_is_file = a.kind == EntryKind::File;
            let b_is_file = b.kind == EntryKind::File;
            a_is_file
                .cmp(&b_is_file)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });

        Ok(entries)
    }

    /// Metadata for a single path. `category` is populated only for files.
    pub fn info(&self, path: &str) -> Result<FileInfo> {
        let resolved = self.boundary.resolve(path)?;
        let meta = fs::metadata(&resolved).map_err(|e| missing(e, path))?;
        let name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "/".to_string());
        let category = if meta.is_file() {
            Some(Category::of(&name))
        } else {
            None
        };

        Ok(FileInfo {
            path: self.boundary.relativize(&resolved).to_string_lossy().to_string(),
            kind: if meta.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            },
            size: meta.len(),
            modified: format_modified(meta.modified().unwrap_or(std::time::UNIX_EPOCH)),
            name,
            category,
        })
    }

    /// Resolves a path to an existing regular file, for streamed reads.
    pub fn file_path(&self, path: &str) -> Result<PathBuf> {
        let resolved = self.boundary.resolve(path)?;
        let meta = fs::metadata(&resolved).map_err(|e| missing(e, path))?;
        if !meta.is_file() {
            return Err(VaultError::IsADirectory {
                path: path.to_string(),
            });
        }
        Ok(resolved)
    }

    /// Reads a file as UTF-8 text. A decode failure propagates as the raw
    /// I/O error.
    pub fn read_to_string(&self, path: &str) -> Result<String> {
        let file = self.file_path(path)?;
        fs::read_to_string(file).map_err(VaultError::from)
    }

    /// Deletes a file or recursively deletes a directory. The home root
    /// itself is never a valid target.
    pub fn delete(&self, path: &str) -> Result<()> {
        let resolved = self.boundary.resolve(path)?;
        let meta = fs::metadata(&resolved).map_err(|e| missing(e, path))?;
        if resolved == self.boundary.root() {
            return Err(VaultError::RootDeletion);
        }
        if meta.is_dir() {
            fs::remove_dir_all(&resolved)?;
        } else {
            fs::remove_file(&resolved)?;
        }
        debug!(path = %path, "deleted");
        Ok(())
    }

    /// Creates a directory, with parents, idempotently. Returns the
    /// root-relative path of the directory.
    pub fn mkdir(&self, path: &str) -> Result<PathBuf> {
        let resolved = self.boundary.resolve(path)?;
        fs::create_dir_all(&resolved)?;
        Ok(self.boundary.relativize(&resolved))
    }

    /// Moves `old` to `new`, both confined. Returns the root-relative new
    /// path.
    pub fn rename(&self, old: &str, new: &str) -> Result<PathBuf> {
        let old_resolved = self.boundary.resolve(old)?;
        let new_resolved = self.boundary.resolve(new)?;
        if fs::metadata(&old_resolved).is_err() {
            return Err(VaultError::NotFound {
                path: old.to_string(),
            });
        }
        fs::rename(&old_resolved, &new_resolved).map_err(|e| missing(e, new))?;
        Ok(self.boundary.relativize(&new_resolved))
    }

    /// Begins a bounded upload into `dir_path`.
    ///
    /// Only the final component of `client_name` is used as the destination
    /// filename; directory prefixes smuggled by the client are discarded and
    /// the joined destination is re-validated through the boundary before the
    /// file is created.
    pub fn start_upload(
        &self,
        dir_path: &str,
        client_name: &str,
        max_size: u64,
    ) -> Result<UploadSink> {
        let dir = self.boundary.resolve(dir_path)?;
        if !dir.is_dir() {
            return Err(VaultError::NotADirectory {
                path: dir_path.to_string(),
            });
        }

        let leaf = safe_leaf(client_name)?;
        let dest = self.boundary.resolve_absolute(&dir.join(&leaf))?;
        UploadSink::create(dest, leaf, max_size).inspect_err(|e| {
            warn!(dir = %dir_path, error = %e, "failed to open upload destination");
        })
    }
}

/// Reduces a client-supplied name to a safe leaf filename.
fn safe_leaf(client_name: &str) -> Result<String> {
    match Path::new(client_name).file_name().and_then(|n| n.to_str()) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(VaultError::InvalidFilename {
            name: client_name.to_string(),
        }),
    }
}

fn missing(err: io::Error, path: &str) -> VaultError {
    if err.kind() == io::ErrorKind::NotFound {
        VaultError::NotFound {
            path: path.to_string(),
        }
    } else {
        VaultError::Io(err)
    }
}
