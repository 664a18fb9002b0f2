//! Structure state capability

use crate::error::RecordError;
use crate::record::Record;
use std::fmt::Debug;

/// Immutable snapshot of a structure at one point in its history
///
/// The history container never looks inside a state. It clones states when
/// seeding forks, compares them for [`was_modified`], and moves them in and
/// out of records.
///
/// # Contract
/// - `from_record(&s.to_record())` must equal `s`
/// - The record must not use the keys `history`, `version` or
///   `other_parameters`; those are reserved for the chain envelope
///
/// [`was_modified`]: crate::TransformedStructure::was_modified
pub trait StructureState: Clone + PartialEq + Debug + Send + Sync + 'static {
    /// Serialize to a record
    fn to_record(&self) -> Record;

    /// Deserialize from a record
    ///
    /// # Errors
    /// Returns error if the record does not describe a state
    fn from_record(record: &Record) -> Result<Self, RecordError>;
}
