//! Error types for pgport.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for pgport operations.
///
/// Recoverable conversion conditions (unterminated literals, ambiguous
/// inserts) are not errors; they are recorded on the
/// [`ConversionResult`](crate::result::ConversionResult) instead.
#[derive(Debug, Error)]
pub enum PortError {
    /// A source file could not be read or written.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration is missing or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file is not valid TOML for the expected shape.
    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Run report could not be serialized.
    #[error("Report error: {0}")]
    Report(#[from] serde_json::Error),
}

impl PortError {
    /// Create an IO error tied to the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result type alias for pgport operations.
pub type PortResult<T> = Result<T, PortError>;
