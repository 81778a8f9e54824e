use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a run.
///
/// Per-image problems (missing annotation, undecodable image, rejected box)
/// never reach this type; they are counted and logged where they happen.
#[derive(Debug, Error)]
pub enum PrepError {
    /// Setup problem detected before any output is written.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error on {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The detection model or OCR engine failed.
    #[error("collaborator '{name}' failed: {message}")]
    Collaborator { name: String, message: String },
}

impl PrepError {
    pub fn config(msg: impl Into<String>) -> Self {
        PrepError::Config(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PrepError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn collaborator(name: impl Into<String>, message: impl Into<String>) -> Self {
        PrepError::Collaborator {
            name: name.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;
