use std::path::{Path, PathBuf};

use remora_wcs::WcsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PhotError>;

#[derive(Debug, Error)]
pub enum PhotError {
    #[error("Malformed column description on line {line}: '{content}'")]
    Parse { line: usize, content: String },

    #[error("Format error: {0}")]
    Format(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Compression failed for {}: {source}", .path.display())]
    Compression {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("WCS error: {0}")]
    Wcs(#[from] WcsError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PhotError {
    pub fn parse(line: usize, content: impl Into<String>) -> Self {
        Self::Parse {
            line,
            content: content.into(),
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn compression(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Compression {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
