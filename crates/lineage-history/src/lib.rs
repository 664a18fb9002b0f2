//! Lineage History
//!
//! Provenance-preserving transformation history for structures.
//!
//! # Core Concepts
//!
//! - [`StructureState`]: immutable snapshot that can move in and out of a [`Record`]
//! - [`Transformation`]: pure operator yielding an [`Outcome`] (one state, or a
//!   primary plus alternates)
//! - [`TransformedStructure`]: the history container with undo/redo
//! - [`Alternatives`]: forks seeded by alternate outcomes
//! - [`TransformationRegistry`]: rebuilds transformations when replaying a record
//!
//! # Example
//!
//! ```rust,ignore
//! use lineage_history::{AppendOptions, SourceRecord, TransformedStructure};
//!
//! let mut chain = TransformedStructure::new(structure, SourceRecord::new("uploaded", now, raw));
//! chain.append_transformation(substitution)?;
//!
//! // Keep the primary outcome, fork the rest
//! let forks = chain.append_boxed(Box::new(ordering), AppendOptions::new().with_alternatives())?;
//!
//! // Persist and restore
//! let record = chain.to_record();
//! let restored = TransformedStructure::from_record(&record, &registry)?;
//! ```

#![warn(unreachable_pub)]

mod branch;
mod chain;
mod error;
mod record;
mod serialize;
mod state;
mod summary;
mod transformation;

#[cfg(test)]
mod test_support;

pub use branch::Alternatives;
pub use chain::{AppendOptions, TransformedStructure};
pub use error::{HistoryError, HistoryResult, RecordError, TransformError};
pub use record::{
    HistoryEntry, Record, SourceRecord, DATETIME_KEY, INPUT_STRUCTURE_KEY, NAME_KEY,
    ORIGINAL_FILE_KEY, PARAMETERS_KEY, SOURCE_KEY,
};
pub use serialize::{HISTORY_KEY, OTHER_PARAMETERS_KEY, RECORD_VERSION, VERSION_KEY};
pub use state::StructureState;
pub use summary::RecordSummary;
pub use transformation::{
    decode_parameters, BoxedTransformation, Outcome, Registry, SharedTransformation,
    Transformation, TransformationRegistry,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and replaying chains
    pub use crate::{
        AppendOptions, BoxedTransformation, HistoryError, Outcome, Record, SharedTransformation,
        SourceRecord, StructureState, Transformation, TransformationRegistry, TransformedStructure,
    };
}
