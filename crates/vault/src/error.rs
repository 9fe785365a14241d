//! Error types for the vault crate.

use std::io;

use thiserror::Error;

/// Vault error type covering all possible failure modes.
///
/// Every operation on the confined tree returns one of these variants; the
/// serving layer maps each to a status code through an exhaustive match, so
/// adding a variant without a mapping is a compile error there.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The resolved path would escape the home root.
    #[error("path escapes the home root: {path}")]
    PathEscape {
        /// The candidate path as supplied by the caller.
        path: String,
    },

    /// The target does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The candidate path as supplied by the caller.
        path: String,
    },

    /// The target exists but is not a directory.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The candidate path as supplied by the caller.
        path: String,
    },

    /// The target is a directory where a file was required.
    #[error("is a directory: {path}")]
    IsADirectory {
        /// The candidate path as supplied by the caller.
        path: String,
    },

    /// Attempt to delete the home root itself.
    #[error("cannot delete the home root")]
    RootDeletion,

    /// Upload filename is empty after sanitization.
    #[error("invalid filename: {name:?}")]
    InvalidFilename {
        /// The client-supplied name before sanitization.
        name: String,
    },

    /// Upload exceeded the configured size ceiling.
    #[error("upload exceeds the size ceiling of {limit} bytes")]
    TooLarge {
        /// The configured ceiling in bytes.
        limit: u64,
    },

    /// The underlying storage is out of space.
    #[error("insufficient storage")]
    StorageExhausted,

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl VaultError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            VaultError::PathEscape { .. } | VaultError::RootDeletion => "PATH_FORBIDDEN",
            VaultError::NotFound { .. } => "NOT_FOUND",
            VaultError::NotADirectory { .. } => "NOT_DIRECTORY",
            VaultError::IsADirectory { .. } => "IS_DIRECTORY",
            VaultError::InvalidFilename { .. } => "INVALID_FILENAME",
            VaultError::TooLarge { .. } => "FILE_TOO_LARGE",
            VaultError::StorageExhausted => "INSUFFICIENT_STORAGE",
            VaultError::Io(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type alias for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_escape_display() {
        let err = VaultError::PathEscape {
            path: "../../etc/passwd".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "path escapes the home root: ../../etc/passwd"
        );
        assert_eq!(err.code(), "PATH_FORBIDDEN");
    }

    #[test]
    fn test_not_found_display() {
        let err = VaultError::NotFound {
            path: "missing.txt".to_string(),
        };
        assert_eq!(err.to_string(), "not found: missing.txt");
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_root_deletion_shares_forbidden_code() {
        assert_eq!(VaultError::RootDeletion.code(), "PATH_FORBIDDEN");
    }

    #[test]
    fn test_too_large_display() {
        let err = VaultError::TooLarge { limit: 1024 };
        assert_eq!(
            err.to_string(),
            "upload exceeds the size ceiling of 1024 bytes"
        );
        assert_eq!(err.code(), "FILE_TOO_LARGE");
    }

    #[test]
    fn test_io_error_maps_to_internal() {
        let err: VaultError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VaultError>();
    }
}
