//! Error types for history operations
//!
//! - [`TransformError`]: raised by a transformation itself, propagated as-is
//! - [`RecordError`]: malformed or mistyped persisted records
//! - [`HistoryError`]: everything the container can report

/// Errors raised by a transformation
///
/// The container never inspects these; it only guarantees the chain is
/// left untouched when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Generic failure
    #[error("{0}")]
    Failed(String),

    /// The input state cannot be handled by this transformation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No constructor registered for the discriminator
    #[error("unknown transformation: {0}")]
    UnknownTransformation(String),

    /// Parameters could not be decoded into the transformation
    #[error("invalid parameters for {name}: {message}")]
    InvalidParameters { name: String, message: String },
}

impl TransformError {
    /// Create invalid parameters error
    pub fn invalid_parameters(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Errors in the layout of a persisted record
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// Required field absent
    #[error("missing field: {0}")]
    MissingField(String),

    /// Field present but of the wrong JSON type
    #[error("field '{field}' has wrong type: expected {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    /// History array has no source entry
    #[error("history is empty")]
    EmptyHistory,

    /// A history step could not be decoded
    #[error("history entry {index}: {message}")]
    InvalidEntry { index: usize, message: String },

    /// State record could not be decoded
    #[error("invalid state record: {0}")]
    InvalidState(String),

    /// JSON encoding or decoding failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RecordError {
    /// Create missing field error
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Create wrong type error
    pub fn wrong_type(field: impl Into<String>, expected: &'static str) -> Self {
        Self::WrongType {
            field: field.into(),
            expected,
        }
    }
}

/// Errors reported by a [`TransformedStructure`](crate::TransformedStructure)
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// Undo requested with no applied transformations
    #[error("can't undo: already at oldest change")]
    EmptyUndo,

    /// Redo requested with an empty redo buffer
    #[error("can't redo: already at latest change")]
    EmptyRedo,

    /// External source failed validation before a state was built
    #[error("invalid source: {0}")]
    InvalidSource(String),

    /// Failure raised by an applied transformation
    #[error(transparent)]
    Transformation(#[from] TransformError),

    /// Persisted record could not be decoded
    #[error("record error: {0}")]
    Record(#[from] RecordError),

    /// Query needs at least two recorded states
    #[error("no transformation applied: at least two states are required")]
    NoTransformationApplied,
}

/// Result type alias for history operations
pub type HistoryResult<T> = Result<T, HistoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_undo_display() {
        assert_eq!(
            HistoryError::EmptyUndo.to_string(),
            "can't undo: already at oldest change"
        );
    }

    #[test]
    fn transformation_error_is_transparent() {
        let err: HistoryError = TransformError::Failed("boom".to_string()).into();
        assert_eq!(err.to_string(), "boom");
        assert!(matches!(err, HistoryError::Transformation(TransformError::Failed(_))));
    }

    #[test]
    fn record_error_conversion() {
        let err: HistoryError = RecordError::missing("history").into();
        assert!(matches!(err, HistoryError::Record(RecordError::MissingField(_))));
        assert!(err.to_string().contains("missing field: history"));
    }

    #[test]
    fn wrong_type_display() {
        let err = RecordError::wrong_type("version", "string");
        assert_eq!(err.to_string(), "field 'version' has wrong type: expected string");
    }
}
