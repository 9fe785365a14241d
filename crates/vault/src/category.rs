//! Coarse file-type classification from extensions.

use serde::{Deserialize, Serialize};

/// Display category for a file, derived purely from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Plain-text data and configuration formats.
    Text,
    /// Source code.
    Code,
    /// Markdown documents.
    Markdown,
    /// Raster and vector images.
    Image,
    /// Audio files.
    Audio,
    /// Video files.
    Video,
    /// PDF documents.
    Pdf,
    /// Everything else.
    Other,
}

impl Category {
    /// Classifies a filename by its extension, case-insensitively.
    ///
    /// The extension is the substring after the last dot of the final name;
    /// names without a dot (and dotfiles like `.bashrc`) have no extension
    /// and classify as [`Category::Other`].
    pub fn of(filename: &str) -> Self {
        let ext = match filename.rfind('.') {
            Some(idx) if idx > 0 => filename[idx + 1..].to_ascii_lowercase(),
            _ => String::new(),
        };
        match ext.as_str() {
            "txt" | "log" | "csv" | "json" | "xml" | "yaml" | "yml" | "toml" | "env" | "conf" => {
                Category::Text
            }
            "py" | "js" | "ts" | "go" | "rs" | "c" | "cpp" | "java" | "sh" | "sql" | "html"
            | "css" => Category::Code,
            "md" => Category::Markdown,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "bmp" => Category::Image,
            "mp3" | "wav" | "ogg" | "flac" | "aac" | "m4a" => Category::Audio,
            "mp4" | "webm" | "mkv" | "mov" | "avi" => Category::Video,
            "pdf" => Category::Pdf,
            _ => Category::Other,
        }
    }
}
