//! Parser registration for dynamic format selection

use crate::error::ParseError;
use crate::provenance::{ParsedSource, SourceParser};
use lineage_history::StructureState;
use std::fmt;
use std::path::Path;

/// Type-erased parser for storage in a registry
///
/// Runs the underlying parser with its default options.
pub trait DynSourceParser<S: StructureState>: Send + Sync {
    /// Format name
    fn format(&self) -> &str;
    /// Supported file extensions (without dot)
    fn extensions(&self) -> &[&str];
    /// Parse with default options
    ///
    /// # Errors
    /// Returns error if the text is not valid in this format
    fn parse_default(&self, raw: &str) -> Result<ParsedSource<S>, ParseError>;
}

impl<S, P> DynSourceParser<S> for P
where
    S: StructureState,
    P: SourceParser<S>,
{
    fn format(&self) -> &str {
        SourceParser::format(self)
    }

    fn extensions(&self) -> &[&str] {
        SourceParser::extensions(self)
    }

    fn parse_default(&self, raw: &str) -> Result<ParsedSource<S>, ParseError> {
        self.parse(raw, &P::Options::default())
    }
}

/// Format-keyed collection of parsers
pub struct ParserRegistry<S: StructureState> {
    parsers: Vec<Box<dyn DynSourceParser<S>>>,
}

impl<S: StructureState> Default for ParserRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StructureState> fmt::Debug for ParserRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}

impl<S: StructureState> ParserRegistry<S> {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Register a parser, replacing any parser for the same format
    pub fn register<P: SourceParser<S>>(&mut self, parser: P) {
        let format = SourceParser::format(&parser).to_string();
        self.parsers.retain(|p| p.format() != format);
        self.parsers.push(Box::new(parser));
    }

    /// Find parser by format name
    #[must_use]
    pub fn find(&self, format: &str) -> Option<&dyn DynSourceParser<S>> {
        self.parsers
            .iter()
            .find(|p| p.format() == format)
            .map(|p| &**p)
    }

    /// Find parser by file extension
    #[must_use]
    pub fn find_for_path(&self, path: &Path) -> Option<&dyn DynSourceParser<S>> {
        let extension = path.extension().and_then(|e| e.to_str())?;
        self.parsers
            .iter()
            .find(|p| p.extensions().contains(&extension))
            .map(|p| &**p)
    }

    /// Registered format names, in registration order
    #[must_use]
    pub fn formats(&self) -> Vec<&str> {
        self.parsers.iter().map(|p| p.format()).collect()
    }

    /// Number of registered parsers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}
