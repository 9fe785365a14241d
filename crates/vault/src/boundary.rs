//! Path confinement against a fixed home root.
//!
//! Every caller-supplied path is resolved here before any filesystem call
//! touches it. Resolution canonicalizes the candidate (following symlinks and
//! normalizing `.`/`..`) and then checks that the result stays under the home
//! root with a component-wise prefix test, so `/home/userX` never passes as a
//! descendant of `/home/user`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use soft_canonicalize::soft_canonicalize;

use crate::error::VaultError;

/// The fixed boundary all operations are confined to.
///
/// The root is canonicalized once at construction and immutable afterwards.
/// Candidates are always interpreted as relative to the root; a leading slash
/// is stripped rather than treated as an absolute path.
#[derive(Debug, Clone)]
pub struct HomeBoundary {
    root: PathBuf,
}

impl HomeBoundary {
    /// Creates a boundary around an existing directory.
    ///
    /// Fails if the directory does not exist or cannot be canonicalized.
    pub fn new<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        let root = fs::canonicalize(root)?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("home root is not a directory: {}", root.display()),
            ));
        }
        Ok(Self { root })
    }

    /// The canonical home root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves an untrusted candidate path to a canonical path inside the
    /// boundary.
    ///
    /// The empty string and `/` resolve to the root itself. The target does
    /// not have to exist: the deepest existing ancestor is fully resolved
    /// (symlinks followed) and the remaining components are appended after
    /// lexical `..` processing, so a traversal is caught whether or not the
    /// path exists yet.
    pub fn resolve(&self, candidate: &str) -> Result<PathBuf, VaultError> {
        let cleaned = candidate.trim_start_matches('/');
        let joined = self.root.join(cleaned);
        self.check(&joined).map_err(|_| VaultError::PathEscape {
            path: candidate.to_string(),
        })
    }

    /// Re-validates an already-joined absolute path, e.g. an upload
    /// destination built from a resolved directory plus a sanitized leaf.
    pub fn resolve_absolute(&self, path: &Path) -> Result<PathBuf, VaultError> {
        self.check(path).map_err(|_| VaultError::PathEscape {
            path: path.display().to_string(),
        })
    }

    /// Returns the path of a resolved target relative to the root. The root
    /// itself maps to the empty path.
    pub fn relativize(&self, resolved: &Path) -> PathBuf {
        resolved
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    fn check(&self, joined: &Path) -> io::Result<PathBuf> {
        let resolved = soft_canonicalize(joined)?;
        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "outside the home root",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    fn boundary() -> (TempDir, HomeBoundary) {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("docs")).unwrap();
        fs::write(tmp.path().join("hello.txt"), "Hello World").unwrap();
        let boundary = HomeBoundary::new(tmp.path()).unwrap();
        (tmp, boundary)
    }

    #[test]
    fn test_valid_relative_path() {
        let (_tmp, b) = boundary();
        let resolved = b.resolve("hello.txt").unwrap();
        assert_eq!(resolved, b.root().join("hello.txt"));
    }

    #[test]
    fn test_nested_path() {
        let (_tmp, b) = boundary();
        let resolved = b.resolve("docs/readme.md").unwrap();
        assert_eq!(resolved, b.root().join("docs/readme.md"));
    }

    #[test]
    fn test_empty_candidate_is_root() {
        let (_tmp, b) = boundary();
        assert_eq!(b.resolve("").unwrap(), b.root());
    }

    #[test]
    fn test_slash_candidate_is_root() {
        let (_tmp, b) = boundary();
        assert_eq!(b.resolve("/").unwrap(), b.root());
    }

    #[test]
    fn test_leading_slash_is_relative() {
        let (_tmp, b) = boundary();
        assert_eq!(b.resolve("/hello.txt").unwrap(), b.root().join("hello.txt"));
    }

    #[test]
    fn test_rejects_dotdot_traversal() {
        let (_tmp, b) = boundary();
        let err = b.resolve("../../etc/passwd").unwrap_err();
        assert!(matches!(err, VaultError::PathEscape { .. }));
    }

    #[test]
    fn test_rejects_dotdot_in_middle() {
        let (_tmp, b) = boundary();
        assert!(b.resolve("docs/../../etc/passwd").is_err());
    }

    #[test]
    fn test_rejects_deeply_nested_traversal() {
        let (_tmp, b) = boundary();
        assert!(b.resolve("a/b/c/../../../../etc/passwd").is_err());
    }

    #[test]
    fn test_dotdot_within_boundary_is_fine() {
        let (_tmp, b) = boundary();
        assert_eq!(b.resolve("docs/../hello.txt").unwrap(), b.root().join("hello.txt"));
    }

    #[test]
    fn test_percent_sequences_are_literal() {
        let (_tmp, b) = boundary();
        // Undecoded sequences are filename bytes; the real traversal at the
        // end still gets the whole candidate rejected.
        assert!(b
            .resolve("..%2F..%2Fetc%2Fpasswd/../../../etc/passwd")
            .is_err());
        // A harmless literal percent name resolves under the root.
        let resolved = b.resolve("report%20final.txt").unwrap();
        assert!(resolved.starts_with(b.root()));
    }

    #[test]
    fn test_nonexistent_target_still_resolves() {
        let (_tmp, b) = boundary();
        let resolved = b.resolve("new_dir/new_file.txt").unwrap();
        assert_eq!(resolved, b.root().join("new_dir/new_file.txt"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let (_tmp, b) = boundary();
        let first = b.resolve("docs").unwrap();
        let second = b.resolve_absolute(&first).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_symlinked_directory_outside_is_rejected() {
        let (tmp, b) = boundary();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.txt"), "secret").unwrap();
        symlink(outside.path(), tmp.path().join("evil_link")).unwrap();

        let err = b.resolve("evil_link/secret.txt").unwrap_err();
        assert!(matches!(err, VaultError::PathEscape { .. }));
    }

    #[test]
    fn test_symlinked_file_outside_is_rejected() {
        let (tmp, b) = boundary();
        let outside = TempDir::new().unwrap();
        let secret = outside.path().join("secret.txt");
        fs::write(&secret, "secret").unwrap();
        symlink(&secret, tmp.path().join("link_to_secret")).unwrap();

        assert!(b.resolve("link_to_secret").is_err());
    }

    #[test]
    fn test_symlink_within_boundary_is_allowed() {
        let (tmp, b) = boundary();
        symlink(tmp.path().join("hello.txt"), tmp.path().join("alias.txt")).unwrap();
        let resolved = b.resolve("alias.txt").unwrap();
        assert_eq!(resolved, b.root().join("hello.txt"));
    }

    #[test]
    fn test_sibling_prefix_is_not_a_descendant() {
        let tmp = TempDir::new().unwrap();
        let user = tmp.path().join("user");
        let user_x = tmp.path().join("userX");
        fs::create_dir_all(&user).unwrap();
        fs::create_dir_all(&user_x).unwrap();
        fs::write(user_x.join("secret.txt"), "secret").unwrap();
        let b = HomeBoundary::new(&user).unwrap();

        // `../userX` shares the string prefix of the root but is a sibling.
        assert!(b.resolve("../userX/secret.txt").is_err());
        assert!(b.resolve_absolute(&user_x.join("secret.txt")).is_err());
    }

    #[test]
    fn test_relativize() {
        let (_tmp, b) = boundary();
        let resolved = b.resolve("docs").unwrap();
        assert_eq!(b.relativize(&resolved), PathBuf::from("docs"));
        assert_eq!(b.relativize(b.root()), PathBuf::new());
    }

    #[test]
    fn test_new_rejects_missing_root() {
        let tmp = TempDir::new().unwrap();
        assert!(HomeBoundary::new(tmp.path().join("nope")).is_err());
    }
}
