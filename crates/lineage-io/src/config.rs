//! I/O configuration
//!
//! Loaded from TOML; every field has a default so partial files work:
//!
//! ```toml
//! sidecar_file_name = "transformations.json"
//! create_directory = true
//! pretty_json = false
//! max_source_bytes = 10485760
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default name of the sidecar record written next to job inputs
pub const DEFAULT_SIDECAR_FILE_NAME: &str = "transformations.json";

/// Settings for ingestion and bundling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// File name of the sidecar record
    pub sidecar_file_name: String,
    /// Create the output directory when it is missing
    pub create_directory: bool,
    /// Pretty-print JSON output
    pub pretty_json: bool,
    /// Largest raw source text accepted (bytes)
    pub max_source_bytes: usize,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            sidecar_file_name: DEFAULT_SIDECAR_FILE_NAME.to_string(),
            create_directory: true,
            pretty_json: false,
            max_source_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl IoConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With sidecar file name
    #[inline]
    #[must_use]
    pub fn with_sidecar_file_name(mut self, name: impl Into<String>) -> Self {
        self.sidecar_file_name = name.into();
        self
    }

    /// With directory creation
    #[inline]
    #[must_use]
    pub fn with_create_directory(mut self, create: bool) -> Self {
        self.create_directory = create;
        self
    }

    /// With pretty JSON
    #[inline]
    #[must_use]
    pub fn with_pretty_json(mut self, pretty: bool) -> Self {
        self.pretty_json = pretty;
        self
    }

    /// With source size limit
    #[inline]
    #[must_use]
    pub fn with_max_source_bytes(mut self, max: usize) -> Self {
        self.max_source_bytes = max;
        self
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns error on TOML syntax or type errors
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
