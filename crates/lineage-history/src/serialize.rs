//! History serialization
//!
//! Maps a chain to and from a portable record:
//!
//! ```text
//! { ...final state fields,
//!   "history": [ source, {name, parameters, input_structure}, ... ],
//!   "version": RECORD_VERSION,
//!   "other_parameters": {...} }
//! ```
//!
//! Round trip: `from_record(&chain.to_record())` has the same final state,
//! transformation sequence, source record and other parameters.

use crate::chain::TransformedStructure;
use crate::error::{HistoryResult, RecordError};
use crate::record::{HistoryEntry, Record, SourceRecord};
use crate::state::StructureState;
use crate::summary::RecordSummary;
use crate::transformation::{SharedTransformation, TransformationRegistry};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Format version written into every record
pub const RECORD_VERSION: &str = "1.0";

/// Key holding the history array
pub const HISTORY_KEY: &str = "history";
/// Key holding the format version
pub const VERSION_KEY: &str = "version";
/// Key holding the free-form parameter map
pub const OTHER_PARAMETERS_KEY: &str = "other_parameters";

impl<S: StructureState> TransformedStructure<S> {
    /// Every step leading to the final state, oldest first
    #[must_use]
    pub fn history_entries(&self) -> Vec<HistoryEntry> {
        self.transformations()
            .iter()
            .zip(self.states())
            .map(|(transformation, input)| HistoryEntry::new(transformation.as_ref(), input))
            .collect()
    }

    /// Serialized provenance: source record followed by every step
    ///
    /// `history()[0]` is the source record; `history()[i]` for `i >= 1` is
    /// the i-th transformation merged with the state it consumed.
    #[must_use]
    pub fn history(&self) -> Vec<Record> {
        std::iter::once(self.source().as_record().clone())
            .chain(self.history_entries().iter().map(HistoryEntry::to_record))
            .collect()
    }

    /// Serialize the whole chain
    #[must_use]
    pub fn to_record(&self) -> Record {
        let mut record = self.final_state().to_record();
        let history = self.history().into_iter().map(Value::Object).collect();
        record.insert(HISTORY_KEY.to_string(), Value::Array(history));
        record.insert(
            VERSION_KEY.to_string(),
            Value::String(RECORD_VERSION.to_string()),
        );
        record.insert(
            OTHER_PARAMETERS_KEY.to_string(),
            Value::Object(self.other_parameters().clone()),
        );
        record
    }

    /// Serialize the whole chain as JSON text
    ///
    /// # Errors
    /// Returns error if JSON encoding fails
    pub fn to_json(&self, pretty: bool) -> Result<String, RecordError> {
        let value = Value::Object(self.to_record());
        let json = if pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(json)
    }

    /// Rebuild a chain from a record produced by [`to_record`]
    ///
    /// States are decoded from `input_structure` fields and transformations
    /// are rebuilt through `registry`; nothing is re-applied. The redo
    /// buffer of the rebuilt chain is empty.
    ///
    /// # Errors
    /// Returns error if the layout is malformed, a state cannot be decoded,
    /// or the registry cannot rebuild a transformation
    ///
    /// [`to_record`]: TransformedStructure::to_record
    pub fn from_record<R>(record: &Record, registry: &R) -> HistoryResult<Self>
    where
        R: TransformationRegistry<S> + ?Sized,
    {
        let summary = RecordSummary::inspect(record)?;
        if summary.version.as_deref() != Some(RECORD_VERSION) {
            warn!(
                found = summary.version.as_deref().unwrap_or("<none>"),
                expected = RECORD_VERSION,
                "record version mismatch"
            );
        }

        let history = record
            .get(HISTORY_KEY)
            .and_then(Value::as_array)
            .ok_or_else(|| RecordError::missing(HISTORY_KEY))?;
        let (first, steps) = history.split_first().ok_or(RecordError::EmptyHistory)?;
        let source = first
            .as_object()
            .cloned()
            .map(SourceRecord::from_record)
            .ok_or_else(|| RecordError::wrong_type("history[0]", "object"))?;

        let mut structures = Vec::with_capacity(history.len());
        let mut transformations: Vec<SharedTransformation<S>> = Vec::with_capacity(steps.len());
        for (offset, value) in steps.iter().enumerate() {
            let entry = HistoryEntry::from_value(offset + 1, value)?;
            structures.push(S::from_record(entry.input_structure())?);
            transformations.push(Arc::from(registry.from_entry(&entry)?));
        }

        let mut state_record = record.clone();
        for key in [HISTORY_KEY, VERSION_KEY, OTHER_PARAMETERS_KEY] {
            state_record.remove(key);
        }
        structures.push(S::from_record(&state_record)?);

        let other_parameters = record
            .get(OTHER_PARAMETERS_KEY)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        debug!(steps = transformations.len(), "rebuilt chain from record");
        Ok(Self::from_parts(
            source,
            structures,
            transformations,
            other_parameters,
        ))
    }

    /// Rebuild a chain from JSON text
    ///
    /// # Errors
    /// Returns error if the text is not a JSON object, or see
    /// [`from_record`](Self::from_record)
    pub fn from_json<R>(json: &str, registry: &R) -> HistoryResult<Self>
    where
        R: TransformationRegistry<S> + ?Sized,
    {
        let value: Value = serde_json::from_str(json).map_err(RecordError::from)?;
        let record = value
            .as_object()
            .ok_or_else(|| RecordError::wrong_type("<root>", "object"))?;
        Self::from_record(record, registry)
    }
}
