//! Lineage I/O
//!
//! Getting chains in from external text and out to external jobs.
//!
//! # Core Concepts
//!
//! - [`SourceParser`]: parses one external text format into an initial state
//! - [`ParserRegistry`]: selects a parser by format name or file extension
//! - [`SourceIngestor`]: builds a chain with a provenance record
//! - [`InputSetGenerator`]: renders job input files for a state
//! - [`write_inputs`]: writes those files plus the sidecar record
//! - [`IoConfig`]: TOML-loadable settings
//!
//! # Example
//!
//! ```rust,ignore
//! use lineage_io::{IoConfig, SourceIngestor, write_inputs};
//!
//! let config = IoConfig::load("lineage.toml")?;
//! let chain = SourceIngestor::new(config.clone())
//!     .ingest(&CifParser, &raw, transformations, &CifOptions::default())?;
//! write_inputs(&chain, &generator, "run/001", &config)?;
//! ```

#![warn(unreachable_pub)]

mod bundle;
mod config;
mod error;
mod provenance;
mod registry;

pub use bundle::{bundle_inputs, write_inputs, InputFiles, InputSetGenerator};
pub use config::{IoConfig, DEFAULT_SIDECAR_FILE_NAME};
pub use error::{BundleError, ConfigError, IngestError, ParseError};
pub use provenance::{
    from_external_text, normalize_quotes, source_checksum, source_record, verify_checksum,
    ParsedSource, SourceIngestor, SourceParser, CHECKSUM_KEY,
};
pub use registry::{DynSourceParser, ParserRegistry};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
