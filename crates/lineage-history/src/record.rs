//! Portable record types
//!
//! Records are JSON objects. A chain persists as its final state's fields
//! plus a `history` array whose first element is the [`SourceRecord`] and
//! whose remaining elements are [`HistoryEntry`] values.

use crate::error::RecordError;
use crate::state::StructureState;
use crate::transformation::Transformation;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form nested record
pub type Record = serde_json::Map<String, Value>;

/// Origin tag of a source record
pub const SOURCE_KEY: &str = "source";
/// Capture timestamp of a source record
pub const DATETIME_KEY: &str = "datetime";
/// Raw text the first state was parsed from
pub const ORIGINAL_FILE_KEY: &str = "original_file";
/// Transformation discriminator in a history entry
pub const NAME_KEY: &str = "name";
/// Transformation parameters in a history entry
pub const PARAMETERS_KEY: &str = "parameters";
/// Serialized state a history entry consumed
pub const INPUT_STRUCTURE_KEY: &str = "input_structure";

/// Provenance of the first state in a chain
///
/// Minimally carries `source`, `datetime` and `original_file`; any
/// format-specific fields ride along untouched. Immutable once a chain
/// has been built from it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRecord(Record);

impl SourceRecord {
    /// Create source record with the three standard fields
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        datetime: impl Into<String>,
        original_file: impl Into<String>,
    ) -> Self {
        let mut record = Record::new();
        record.insert(SOURCE_KEY.to_string(), Value::String(source.into()));
        record.insert(DATETIME_KEY.to_string(), Value::String(datetime.into()));
        record.insert(
            ORIGINAL_FILE_KEY.to_string(),
            Value::String(original_file.into()),
        );
        Self(record)
    }

    /// Wrap an arbitrary record (e.g. `history[0]` of a persisted chain)
    #[inline]
    #[must_use]
    pub fn from_record(record: Record) -> Self {
        Self(record)
    }

    /// Add or replace a field
    #[inline]
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Origin tag
    #[inline]
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.0.get(SOURCE_KEY).and_then(Value::as_str)
    }

    /// Capture timestamp
    #[inline]
    #[must_use]
    pub fn datetime(&self) -> Option<&str> {
        self.0.get(DATETIME_KEY).and_then(Value::as_str)
    }

    /// Stored original text
    #[inline]
    #[must_use]
    pub fn original_file(&self) -> Option<&str> {
        self.0.get(ORIGINAL_FILE_KEY).and_then(Value::as_str)
    }

    /// Look up any field
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Borrow as a plain record
    #[inline]
    #[must_use]
    pub fn as_record(&self) -> &Record {
        &self.0
    }

    /// Convert into a plain record
    #[inline]
    #[must_use]
    pub fn into_record(self) -> Record {
        self.0
    }
}

/// One applied transformation and the state it consumed
///
/// Holds every field of [`Transformation::to_record`] so a history entry
/// equals the transformation's record merged with `input_structure`.
/// `name` + `parameters` rebuild the transformation; any other fields are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    name: String,
    #[serde(default)]
    parameters: Record,
    input_structure: Record,
    #[serde(flatten)]
    extra: Record,
}

impl HistoryEntry {
    /// Describe `transformation` applied to `input`
    #[must_use]
    pub fn new<S: StructureState>(transformation: &dyn Transformation<S>, input: &S) -> Self {
        let mut extra = transformation.to_record();
        extra.remove(INPUT_STRUCTURE_KEY);
        let name = match extra.remove(NAME_KEY) {
            Some(Value::String(name)) => name,
            _ => transformation.name().to_string(),
        };
        let parameters = match extra.remove(PARAMETERS_KEY) {
            Some(Value::Object(parameters)) => parameters,
            _ => transformation.parameters(),
        };
        Self {
            name,
            parameters,
            input_structure: input.to_record(),
            extra,
        }
    }

    /// Decode the entry at `index` of a history array
    ///
    /// # Errors
    /// Returns [`RecordError::InvalidEntry`] if the value is not an entry
    pub fn from_value(index: usize, value: &Value) -> Result<Self, RecordError> {
        serde_json::from_value(value.clone()).map_err(|e| RecordError::InvalidEntry {
            index,
            message: e.to_string(),
        })
    }

    /// Transformation discriminator
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transformation parameters
    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &Record {
        &self.parameters
    }

    /// Serialized input state
    #[inline]
    #[must_use]
    pub fn input_structure(&self) -> &Record {
        &self.input_structure
    }

    /// Transformation fields besides `name` and `parameters`
    #[inline]
    #[must_use]
    pub fn extra(&self) -> &Record {
        &self.extra
    }

    /// Transformation fields only (no `input_structure`)
    #[must_use]
    pub fn transformation_record(&self) -> Record {
        let mut record = self.extra.clone();
        record.insert(NAME_KEY.to_string(), Value::String(self.name.clone()));
        record.insert(
            PARAMETERS_KEY.to_string(),
            Value::Object(self.parameters.clone()),
        );
        record
    }

    /// Transformation fields merged with `input_structure`
    #[must_use]
    pub fn to_record(&self) -> Record {
        let mut record = self.transformation_record();
        record.insert(
            INPUT_STRUCTURE_KEY.to_string(),
            Value::Object(self.input_structure.clone()),
        );
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_record_standard_fields() {
        let source = SourceRecord::new("uploaded cif", "2024-01-01T00:00:00Z", "data_x");
        assert_eq!(source.source(), Some("uploaded cif"));
        assert_eq!(source.datetime(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(source.original_file(), Some("data_x"));
    }

    #[test]
    fn source_record_extra_fields() {
        let source = SourceRecord::new("a", "b", "c").with_field("cif_data", json!({"k": 1}));
        assert_eq!(source.get("cif_data"), Some(&json!({"k": 1})));
        assert_eq!(source.as_record().len(), 4);
    }

    #[test]
    fn source_record_serializes_as_plain_map() {
        let source = SourceRecord::new("a", "b", "c");
        let value = serde_json::to_value(&source).unwrap();
        assert_eq!(
            value,
            json!({"source": "a", "datetime": "b", "original_file": "c"})
        );
    }

    #[test]
    fn free_form_source_has_no_standard_fields() {
        let mut record = Record::new();
        record.insert("anything".to_string(), json!(true));
        let source = SourceRecord::from_record(record);
        assert_eq!(source.source(), None);
        assert_eq!(source.original_file(), None);
    }

    #[test]
    fn history_entry_from_value() {
        let value = json!({
            "name": "Substitute",
            "parameters": {"from": "Fe"},
            "input_structure": {"species": ["Fe"]}
        });
        let entry = HistoryEntry::from_value(1, &value).unwrap();
        assert_eq!(entry.name(), "Substitute");
        assert!(entry.extra().is_empty());
        assert_eq!(Value::Object(entry.to_record()), value);
    }

    #[test]
    fn history_entry_parameters_default_to_empty() {
        let value = json!({"name": "Noop", "input_structure": {}});
        let entry = HistoryEntry::from_value(3, &value).unwrap();
        assert!(entry.parameters().is_empty());
    }

    #[test]
    fn history_entry_missing_input_structure() {
        let value = json!({"name": "Noop"});
        let result = HistoryEntry::from_value(2, &value);
        assert!(matches!(result, Err(RecordError::InvalidEntry { index: 2, .. })));
    }

    #[test]
    fn transformation_record_omits_input() {
        let value = json!({"name": "Noop", "parameters": {}, "input_structure": {"a": 1}});
        let entry = HistoryEntry::from_value(1, &value).unwrap();
        let record = entry.transformation_record();
        assert!(!record.contains_key(INPUT_STRUCTURE_KEY));
        assert_eq!(record.get(NAME_KEY), Some(&json!("Noop")));
    }

    #[test]
    fn history_entry_keeps_extra_fields() {
        let value = json!({
            "name": "Substitute",
            "parameters": {"from": "Fe"},
            "@module": "lineage.toy",
            "input_structure": {"species": ["Fe"]}
        });
        let entry = HistoryEntry::from_value(1, &value).unwrap();
        assert_eq!(entry.extra().get("@module"), Some(&json!("lineage.toy")));
        assert_eq!(Value::Object(entry.to_record()), value);
        assert!(!entry.transformation_record().contains_key(INPUT_STRUCTURE_KEY));
    }

    #[test]
    fn history_entry_rejects_non_object_parameters() {
        let value = json!({"name": "Noop", "parameters": 3, "input_structure": {}});
        assert!(matches!(
            HistoryEntry::from_value(4, &value),
            Err(RecordError::InvalidEntry { index: 4, .. })
        ));
    }
}
