//! Projections of filesystem entries returned to callers.

use std::time::SystemTime;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Whether an entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A directory.
    Directory,
    /// A regular file (or anything that is not a directory).
    File,
}

/// One child of a listed directory.
///
/// Produced fresh on every listing; nothing is cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not a path).
    pub name: String,
    /// File or directory.
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Size in bytes as reported by the OS.
    pub size: u64,
    /// Last-modified time, local naive ISO-8601.
    pub modified: String,
}

/// Metadata for a single path, with a category for files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Entry name.
    pub name: String,
    /// Path relative to the home root.
    pub path: String,
    /// File or directory.
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Size in bytes.
    pub size: u64,
    /// Last-modified time, local naive ISO-8601.
    pub modified: String,
    /// Content category, present only for files.
    pub category: Option<Category>,
}

/// Renders an mtime the way the OS reports it: local time, no offset.
pub(crate) fn format_modified(mtime: SystemTime) -> String {
    let local: DateTime<Local> = mtime.into();
    local.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}
