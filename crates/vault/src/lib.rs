//! # Vault
//!
//! Core library for Homeport: a single user's home directory tree, confined
//! behind a path boundary and exposed through a small set of typed
//! filesystem operations.
//!
//! ## Overview
//!
//! - **Path confinement**: every caller-supplied path is canonicalized
//!   (symlinks followed, `.`/`..` normalized) and checked against a fixed
//!   home root before any filesystem call.
//! - **Operations**: list, info, read, delete, mkdir, rename, and bounded
//!   streaming uploads, each returning a closed error type.
//! - **Classification**: a pure extension-to-category table for client
//!   display.
//!
//! The vault holds no mutable state beyond the immutable root, so one
//! instance is shared read-only across concurrent requests; racing callers
//! get whatever the underlying syscalls give them.
//!
//! ## Modules
//!
//! - [`boundary`]: path confinement against the home root
//! - [`ops`]: filesystem operations over confined paths
//! - [`upload`]: bounded streaming writes with partial-file cleanup
//! - [`category`]: file category classifier
//! - [`entry`]: directory entry and file info projections
//! - [`error`]: the typed error set

pub mod boundary;
pub mod category;
pub mod entry;
pub mod error;
pub mod ops;
pub mod upload;

pub use boundary::HomeBoundary;
pub use category::Category;
pub use entry::{DirEntry, EntryKind, FileInfo};
pub use error::{Result, VaultError};
pub use ops::Vault;
pub use upload::{UploadSink, Uploaded};
