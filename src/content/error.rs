//! Errors raised while loading content

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for content operations
pub type Result<T> = std::result::Result<T, ContentError>;

/// Content loading errors
#[derive(Debug, Error)]
pub enum ContentError {
    /// The front-matter block could not be read as key/value pairs
    #[error("malformed front matter in {path}: {reason}")]
    MalformedFrontMatter { path: PathBuf, reason: String },

    /// The source file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedFrontMatter {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Path of the file the error refers to
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::MalformedFrontMatter { path, .. } | Self::Io { path, .. } => path,
        }
    }
}
