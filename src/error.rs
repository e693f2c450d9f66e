// src/error.rs
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GaugeError {
    #[error("I/O error: {source} (path: {path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Unreadable or over-size file. Skipped and counted during a run.
    #[error("Cannot read {path}: {reason}")]
    FileAccess { path: PathBuf, reason: String },

    #[error("Invalid parser '{language}': {reason}")]
    InvalidParser { language: String, reason: String },

    #[error("No parser registered for extension '{extension}' ({path})")]
    UnsupportedExtension { extension: String, path: PathBuf },

    #[error("Job queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("Worker pool is not running")]
    PoolStopped,

    #[error("Analysis cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Traversal failure for one entry (permission denied, dangling symlink).
    #[error("Walk error at {path}: {message}")]
    Walk { path: PathBuf, message: String },

    /// Catastrophic parser failure (the file could not be parsed at all).
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Generic error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, GaugeError>;

impl GaugeError {
    /// Soft errors are counted against a run; everything else aborts it.
    #[must_use]
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Self::FileAccess { .. } | Self::Parse { .. } | Self::Io { .. } | Self::Walk { .. }
        )
    }

    /// The file or directory the error is about, when known.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. }
            | Self::FileAccess { path, .. }
            | Self::UnsupportedExtension { path, .. }
            | Self::Parse { path, .. }
            | Self::Toml { path, .. }
            | Self::Walk { path, .. } => Some(path),
            _ => None,
        }
    }
}

// Allow `?` on std::io::Error by converting to GaugeError::Io with unknown path.
impl From<std::io::Error> for GaugeError {
    fn from(source: std::io::Error) -> Self {
        GaugeError::Io {
            source,
            path: PathBuf::from("<unknown>"),
        }
    }
}

impl From<walkdir::Error> for GaugeError {
    fn from(e: walkdir::Error) -> Self {
        let path = e.path().map_or_else(|| PathBuf::from("<unknown>"), Path::to_path_buf);
        let message = match e.io_error() {
            Some(io) => io.to_string(),
            None => e.to_string(),
        };
        GaugeError::Walk { path, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_classification() {
        let soft = GaugeError::FileAccess {
            path: PathBuf::from("a.py"),
            reason: "too large".into(),
        };
        assert!(soft.is_soft());
        assert!(!GaugeError::QueueFull { capacity: 4 }.is_soft());
        assert_eq!(soft.path(), Some(Path::new("a.py")));
        assert_eq!(GaugeError::Cancelled.path(), None);
        assert!(!GaugeError::InvalidParser {
            language: "x".into(),
            reason: "no extensions".into()
        }
        .is_soft());
    }
}
