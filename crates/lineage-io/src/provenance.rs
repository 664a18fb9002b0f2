//! Provenance construction from external text
//!
//! Turns raw text in some external format into a chain whose source record
//! captures where the first state came from:
//!
//! - `source`: embedded database identifier, else `uploaded <format>`
//! - `datetime`: UTC capture time (RFC 3339)
//! - `original_file`: the raw text with `'` replaced by `"`
//! - `checksum`: Blake3 hex digest of `original_file`
//! - any format-specific metadata the parser reports

use crate::config::IoConfig;
use crate::error::{IngestError, ParseError};
use crate::registry::ParserRegistry;
use chrono::{DateTime, SecondsFormat, Utc};
use lineage_history::{
    BoxedTransformation, HistoryError, Record, SourceRecord, StructureState,
    TransformedStructure, DATETIME_KEY, ORIGINAL_FILE_KEY, SOURCE_KEY,
};
use serde_json::Value;
use tracing::{info, warn};

/// Source record key holding the digest of `original_file`
pub const CHECKSUM_KEY: &str = "checksum";

/// Result of parsing external text
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSource<S> {
    /// Initial state
    pub state: S,
    /// Embedded database identifier (e.g. `12345-ICSD`), if the format has one
    pub origin: Option<String>,
    /// Whether every site carries an unambiguous species label
    pub species_labeled: bool,
    /// Format-specific fields copied into the source record
    pub metadata: Record,
}

impl<S> ParsedSource<S> {
    /// Labeled state with no origin or metadata
    #[inline]
    #[must_use]
    pub fn new(state: S) -> Self {
        Self {
            state,
            origin: None,
            species_labeled: true,
            metadata: Record::new(),
        }
    }
}

/// Parser for one external text format
///
/// Implement this to ingest a new format.
pub trait SourceParser<S: StructureState>: Send + Sync + 'static {
    /// Format-specific options
    type Options: Default;

    /// Format name, used in the generic `uploaded <format>` origin tag
    fn format(&self) -> &str;

    /// Supported file extensions (without dot)
    fn extensions(&self) -> &[&str] {
        &[]
    }

    /// Parse raw text
    ///
    /// # Errors
    /// Returns error if the text is not valid in this format
    fn parse(&self, raw: &str, options: &Self::Options) -> Result<ParsedSource<S>, ParseError>;
}

/// Replace every single quote with a double quote
#[inline]
#[must_use]
pub fn normalize_quotes(raw: &str) -> String {
    raw.replace('\'', "\"")
}

/// Blake3 hex digest of stored source text
#[inline]
#[must_use]
pub fn source_checksum(text: &str) -> String {
    hex::encode(blake3::hash(text.as_bytes()).as_bytes())
}

/// Check a source record's `checksum` against its `original_file`
///
/// False if either field is missing.
#[must_use]
pub fn verify_checksum(source: &SourceRecord) -> bool {
    match (
        source.original_file(),
        source.get(CHECKSUM_KEY).and_then(Value::as_str),
    ) {
        (Some(text), Some(checksum)) => source_checksum(text) == checksum,
        _ => false,
    }
}

/// Builds chains from external text
#[derive(Debug, Clone, Default)]
pub struct SourceIngestor {
    config: IoConfig,
}

impl SourceIngestor {
    /// Create ingestor with configuration
    #[inline]
    #[must_use]
    pub fn new(config: IoConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &IoConfig {
        &self.config
    }

    /// Parse `raw` and build a chain, applying `transformations`
    ///
    /// # Errors
    /// - [`HistoryError::InvalidSource`] if the text is too large or lacks
    ///   species labels; no chain is built
    /// - [`IngestError::Parse`] if the parser rejects the text
    /// - [`HistoryError::Transformation`] if a transformation fails
    pub fn ingest<S, P, I>(
        &self,
        parser: &P,
        raw: &str,
        transformations: I,
        options: &P::Options,
    ) -> Result<TransformedStructure<S>, IngestError>
    where
        S: StructureState,
        P: SourceParser<S>,
        I: IntoIterator<Item = BoxedTransformation<S>>,
    {
        self.ingest_at(parser, raw, transformations, options, Utc::now())
    }

    /// [`ingest`](Self::ingest) with an explicit capture time
    ///
    /// # Errors
    /// See [`ingest`](Self::ingest)
    pub fn ingest_at<S, P, I>(
        &self,
        parser: &P,
        raw: &str,
        transformations: I,
        options: &P::Options,
        captured_at: DateTime<Utc>,
    ) -> Result<TransformedStructure<S>, IngestError>
    where
        S: StructureState,
        P: SourceParser<S>,
        I: IntoIterator<Item = BoxedTransformation<S>>,
    {
        self.check_size(raw)?;
        let parsed = parser.parse(raw, options)?;
        self.build(parser.format(), parsed, raw, transformations, captured_at)
    }

    /// Ingest through a registry, selecting the parser by format name
    ///
    /// The parser runs with its default options.
    ///
    /// # Errors
    /// Returns [`ParseError::UnsupportedFormat`] for an unknown format, or see
    /// [`ingest`](Self::ingest)
    pub fn ingest_format<S, I>(
        &self,
        registry: &ParserRegistry<S>,
        format: &str,
        raw: &str,
        transformations: I,
    ) -> Result<TransformedStructure<S>, IngestError>
    where
        S: StructureState,
        I: IntoIterator<Item = BoxedTransformation<S>>,
    {
        let parser = registry
            .find(format)
            .ok_or_else(|| ParseError::UnsupportedFormat(format.to_string()))?;
        self.check_size(raw)?;
        let parsed = parser.parse_default(raw)?;
        self.build(parser.format(), parsed, raw, transformations, Utc::now())
    }

    fn check_size(&self, raw: &str) -> Result<(), IngestError> {
        if raw.len() > self.config.max_source_bytes {
            warn!(
                bytes = raw.len(),
                max = self.config.max_source_bytes,
                "source rejected"
            );
            return Err(HistoryError::InvalidSource(format!(
                "source too large: {} bytes (max: {})",
                raw.len(),
                self.config.max_source_bytes
            ))
            .into());
        }
        Ok(())
    }

    fn build<S, I>(
        &self,
        format_name: &str,
        parsed: ParsedSource<S>,
        raw: &str,
        transformations: I,
        captured_at: DateTime<Utc>,
    ) -> Result<TransformedStructure<S>, IngestError>
    where
        S: StructureState,
        I: IntoIterator<Item = BoxedTransformation<S>>,
    {
        if !parsed.species_labeled {
            warn!(format = format_name, "source rejected: unlabeled species");
            return Err(HistoryError::InvalidSource(format!(
                "{format_name} input lacks proper species labels"
            ))
            .into());
        }

        let origin = parsed
            .origin
            .unwrap_or_else(|| format!("uploaded {format_name}"));
        let source = source_record(&origin, captured_at, raw, parsed.metadata);
        info!(source = origin.as_str(), format = format_name, "ingested source");

        Ok(TransformedStructure::with_transformations(
            parsed.state,
            transformations,
            source,
        )?)
    }
}

/// Build the source record for text captured at `captured_at`
///
/// Metadata keys that collide with the standard fields are dropped.
#[must_use]
pub fn source_record(
    origin: &str,
    captured_at: DateTime<Utc>,
    raw: &str,
    metadata: Record,
) -> SourceRecord {
    let original_file = normalize_quotes(raw);
    let checksum = source_checksum(&original_file);
    let mut source = SourceRecord::new(
        origin,
        captured_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        original_file,
    )
    .with_field(CHECKSUM_KEY, checksum);

    for (key, value) in metadata {
        if [SOURCE_KEY, DATETIME_KEY, ORIGINAL_FILE_KEY, CHECKSUM_KEY].contains(&key.as_str()) {
            warn!(key = key.as_str(), "metadata field shadows a source field, dropped");
            continue;
        }
        source = source.with_field(key, value);
    }
    source
}

/// Build a chain from external text with default configuration
///
/// # Errors
/// See [`SourceIngestor::ingest`]
pub fn from_external_text<S, P, I>(
    parser: &P,
    raw: &str,
    transformations: I,
    options: &P::Options,
) -> Result<TransformedStructure<S>, IngestError>
where
    S: StructureState,
    P: SourceParser<S>,
    I: IntoIterator<Item = BoxedTransformation<S>>,
{
    SourceIngestor::default().ingest(parser, raw, transformations, options)
}
