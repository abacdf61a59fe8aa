//! Error types

use std::path::PathBuf;
use thiserror::Error;

/// The reply-producing operation could not complete
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("reply generation failed: {0}")]
    GenerationFailed(String),

    #[error("reply task panicked")]
    Panicked,
}

impl ReplyError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::GenerationFailed(message.into())
    }
}

/// Failure loading configuration or an offers file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
