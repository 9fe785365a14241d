//! Credential verification for the session boundary.
//!
//! The daemon authenticates against a TOML credentials file of salted,
//! iterated SHA-256 digests, managed with the `user add` / `user remove`
//! CLI commands. The [`Authenticator`] trait is the seam where a different
//! identity source (e.g. a host PAM binding) can be slotted in without
//! touching the HTTP surface.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of SHA-256 iterations applied to a salted secret.
const HASH_ITERATIONS: u32 = 100_000;

/// The identity boundary contract: does this username/secret pair check out?
pub trait Authenticator: Send + Sync {
    /// Returns true only for a valid username/secret pair.
    fn authenticate(&self, username: &str, secret: &str) -> bool;
}

/// One stored credential: hex salt plus hex digest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct StoredUser {
    salt: String,
    hash: String,
}

/// Wrapper for serializing the credentials file.
#[derive(Debug, Serialize, Deserialize)]
struct CredentialData {
    /// Version of the file format (for future migrations).
    version: u32,
    /// Users keyed by name.
    users: HashMap<String, StoredUser>,
}

impl Default for CredentialData {
    fn default() -> Self {
        Self {
            version: 1,
            users: HashMap::new(),
        }
    }
}

/// File-backed credential store.
pub struct CredentialFile {
    path: PathBuf,
    users: HashMap<String, StoredUser>,
}

impl CredentialFile {
    /// Loads the store from `path`. A missing file yields an empty store.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Ok(Self {
                path,
                users: HashMap::new(),
            });
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read credentials file: {}", path.display()))?;
        let data: CredentialData = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse credentials file: {}", path.display()))?;
        Ok(Self {
            path,
            users: data.users,
        })
    }

    /// Writes the store back to its file, creating parent directories as
    /// needed.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!(
                    "Failed to create credentials directory: {}",
                    parent.display()
                )
            })?;
        }
        let data = CredentialData {
            version: 1,
            users: self.users.clone(),
        };
        let contents =
            toml::to_string_pretty(&data).context("Failed to serialize credentials")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write credentials file: {}", self.path.display()))
    }

    /// Adds a user or replaces an existing user's secret.
    pub fn set_password(&mut self, username: &str, secret: &str) {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        let digest = derive(&salt, secret);
        self.users.insert(
            username.to_string(),
            StoredUser {
                salt: hex::encode(salt),
                hash: hex::encode(digest),
            },
        );
    }

    /// Removes a user. Returns whether the user existed.
    pub fn remove_user(&mut self, username: &str) -> bool {
        self.users.remove(username).is_some()
    }

    /// True if the store holds no users.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.len()
    }
}

impl Authenticator for CredentialFile {
    fn authenticate(&self, username: &str, secret: &str) -> bool {
        let Some(user) = self.users.get(username) else {
            return false;
        };
        let (Ok(salt), Ok(expected)) = (hex::decode(&user.salt), hex::decode(&user.hash)) else {
            return false;
        };
        let derived = derive(&salt, secret);
        constant_time_eq(&derived, &expected)
    }
}

/// In-memory credential map, for tests and embedding.
#[derive(Default)]
pub struct StaticCredentials {
    users: HashMap<String, String>,
}

impl StaticCredentials {
    /// Builds a store from username/secret pairs.
    pub fn new<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            users: pairs
                .into_iter()
                .map(|(u, p)| (u.into(), p.into()))
                .collect(),
        }
    }
}

impl Authenticator for StaticCredentials {
    fn authenticate(&self, username: &str, secret: &str) -> bool {
        self.users.get(username).is_some_and(|stored| {
            constant_time_eq(stored.as_bytes(), secret.as_bytes())
        })
    }
}

fn derive(salt: &[u8], secret: &str) -> [u8; 32] {
    let mut digest = Sha256::new()
        .chain_update(salt)
        .chain_update(secret.as_bytes())
        .finalize();
    for _ in 1..HASH_ITERATIONS {
        digest = Sha256::digest(digest);
    }
    digest.into()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
