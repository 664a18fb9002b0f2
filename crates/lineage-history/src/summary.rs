//! Record layout inspection
//!
//! Checks the envelope of a persisted chain without decoding any state or
//! transformation, so it works without a registry.

use crate::error::RecordError;
use crate::record::{Record, INPUT_STRUCTURE_KEY, NAME_KEY, SOURCE_KEY};
use crate::serialize::{HISTORY_KEY, OTHER_PARAMETERS_KEY, VERSION_KEY};
use serde::Serialize;
use serde_json::Value;
use std::fmt::{self, Display, Formatter};

/// Shape of a persisted chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSummary {
    /// Format version, if present
    pub version: Option<String>,
    /// Origin tag of the source record, if present
    pub source: Option<String>,
    /// Transformation names, oldest first
    pub steps: Vec<String>,
    /// Number of free-form parameters
    pub other_parameter_count: usize,
}

impl RecordSummary {
    /// Validate the layout of `record` and summarize it
    ///
    /// # Errors
    /// - [`RecordError::MissingField`] if `history` is absent
    /// - [`RecordError::WrongType`] if a field has the wrong JSON type
    /// - [`RecordError::EmptyHistory`] if `history` has no source entry
    /// - [`RecordError::InvalidEntry`] if a step lacks `name` or `input_structure`
    pub fn inspect(record: &Record) -> Result<Self, RecordError> {
        let history = record
            .get(HISTORY_KEY)
            .ok_or_else(|| RecordError::missing(HISTORY_KEY))?
            .as_array()
            .ok_or_else(|| RecordError::wrong_type(HISTORY_KEY, "array"))?;

        let (first, steps) = history.split_first().ok_or(RecordError::EmptyHistory)?;
        let source = first
            .as_object()
            .ok_or_else(|| RecordError::wrong_type("history[0]", "object"))?
            .get(SOURCE_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);

        let steps = steps
            .iter()
            .enumerate()
            .map(|(offset, value)| step_name(offset + 1, value))
            .collect::<Result<Vec<_>, _>>()?;

        let version = match record.get(VERSION_KEY) {
            None => None,
            Some(Value::String(version)) => Some(version.clone()),
            Some(_) => return Err(RecordError::wrong_type(VERSION_KEY, "string")),
        };

        let other_parameter_count = match record.get(OTHER_PARAMETERS_KEY) {
            None => 0,
            Some(Value::Object(map)) => map.len(),
            Some(_) => return Err(RecordError::wrong_type(OTHER_PARAMETERS_KEY, "object")),
        };

        Ok(Self {
            version,
            source,
            steps,
            other_parameter_count,
        })
    }

    /// Number of recorded transformations
    #[inline]
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

fn step_name(index: usize, value: &Value) -> Result<String, RecordError> {
    let invalid = |message: &str| RecordError::InvalidEntry {
        index,
        message: message.to_string(),
    };
    let entry = value.as_object().ok_or_else(|| invalid("not an object"))?;
    if !entry.get(INPUT_STRUCTURE_KEY).is_some_and(Value::is_object) {
        return Err(invalid("missing input_structure object"));
    }
    entry
        .get(NAME_KEY)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| invalid("missing transformation name"))
}

impl Display for RecordSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "version: {}", self.version.as_deref().unwrap_or("<none>"))?;
        writeln!(f, "source: {}", self.source.as_deref().unwrap_or("<none>"))?;
        writeln!(f, "other parameters: {}", self.other_parameter_count)?;
        write!(f, "steps: {}", self.steps.len())?;
        for (i, step) in self.steps.iter().enumerate() {
            write!(f, "\n  {}. {step}", i + 1)?;
        }
        Ok(())
    }
}
