//! Error types for ingestion, bundling and configuration
//!
//! - Parse operations (external text → state)
//! - Ingest operations (text → chain)
//! - Bundle operations (chain → input files + sidecar)

use lineage_history::{HistoryError, RecordError};
use std::path::PathBuf;

/// Errors raised by a source parser
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// No parser registered for the format
    #[error("no parser registered for format: '{0}'")]
    UnsupportedFormat(String),

    /// Syntax error in the raw text
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// Parsed content failed validation
    #[error("content validation failed: {0}")]
    Validation(String),
}

impl ParseError {
    /// Create syntax error for a line
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}

/// Errors while building a chain from external text
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Parser rejected the text
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Source validation or transformation failure
    #[error("history error: {0}")]
    History(#[from] HistoryError),
}

impl IngestError {
    /// Check if the source was rejected before any state was built
    #[inline]
    #[must_use]
    pub fn is_invalid_source(&self) -> bool {
        matches!(self, Self::History(HistoryError::InvalidSource(_)))
    }
}

/// Errors while producing or writing a job-input bundle
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// Input generator failed
    #[error("input generation failed: {0}")]
    Generator(String),

    /// File name is not a plain name inside the output directory
    #[error("invalid input file name: '{0}'")]
    InvalidFileName(String),

    /// Generator produced a file that collides with the sidecar
    #[error("input file collides with sidecar: '{0}'")]
    DuplicateFile(String),

    /// Output directory absent and creation disabled
    #[error("output directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    /// IO error during write
    #[error("io error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Sidecar record could not be encoded
    #[error("record error: {0}")]
    Record(#[from] RecordError),
}

impl BundleError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or schema error
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}
