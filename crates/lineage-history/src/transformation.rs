//! Transformation capability and reconstruction registry
//!
//! A [`Transformation`] maps a state to an [`Outcome`]: either one next
//! state, or a primary next state plus ordered alternates. Rebuilding a
//! transformation from a history entry is the job of a
//! [`TransformationRegistry`], which dispatches on the entry's `name`.

use crate::error::TransformError;
use crate::record::{HistoryEntry, Record, NAME_KEY, PARAMETERS_KEY};
use crate::state::StructureState;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Result of applying a transformation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<S> {
    /// Exactly one next state
    Single(S),

    /// A primary next state plus ordered alternates
    ///
    /// The primary continues the chain; alternates may seed forks.
    Branched {
        /// State that continues the chain
        primary: S,
        /// Other candidate outcomes, in order
        alternates: Vec<S>,
    },
}

impl<S> Outcome<S> {
    /// Single-state outcome
    #[inline]
    #[must_use]
    pub fn single(state: S) -> Self {
        Self::Single(state)
    }

    /// Branched outcome
    #[inline]
    #[must_use]
    pub fn branched(primary: S, alternates: Vec<S>) -> Self {
        Self::Branched {
            primary,
            alternates,
        }
    }

    /// State that continues the chain
    #[inline]
    #[must_use]
    pub fn primary(&self) -> &S {
        match self {
            Self::Single(state) | Self::Branched { primary: state, .. } => state,
        }
    }

    /// Whether the transformation produced alternates (possibly none)
    #[inline]
    #[must_use]
    pub fn is_branched(&self) -> bool {
        matches!(self, Self::Branched { .. })
    }

    /// Split into primary and alternates
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (S, Vec<S>) {
        match self {
            Self::Single(state) => (state, Vec::new()),
            Self::Branched {
                primary,
                alternates,
            } => (primary, alternates),
        }
    }
}

/// Operator producing candidate next states from a state
///
/// Implementations are expected to be pure: the same input and parameters
/// always give the same outcome. History replay relies on this.
pub trait Transformation<S: StructureState>: Send + Sync + Debug {
    /// Type discriminator used by registries
    ///
    /// Must be stable across versions.
    fn name(&self) -> &str;

    /// Construction parameters
    ///
    /// Together with [`name`](Self::name) these must be enough for a
    /// registry to rebuild an equivalent transformation.
    fn parameters(&self) -> Record {
        Record::new()
    }

    /// Apply to a state
    ///
    /// # Errors
    /// Returns error if the transformation cannot be applied
    fn apply(&self, state: &S) -> Result<Outcome<S>, TransformError>;

    /// Serialized transformation fields
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert(NAME_KEY.to_string(), Value::String(self.name().to_string()));
        record.insert(PARAMETERS_KEY.to_string(), Value::Object(self.parameters()));
        record
    }
}

/// Owned, type-erased transformation
pub type BoxedTransformation<S> = Box<dyn Transformation<S>>;

/// Transformation as stored in a chain
///
/// Transformations are immutable once applied, so a chain and the forks
/// seeded from it share them.
pub type SharedTransformation<S> = Arc<dyn Transformation<S>>;

/// Rebuilds transformations from their serialized fields
pub trait TransformationRegistry<S: StructureState> {
    /// Build the transformation registered under `name`
    ///
    /// # Errors
    /// Returns [`TransformError::UnknownTransformation`] for an unknown name,
    /// or any error the constructor raises
    fn build(&self, name: &str, parameters: &Record)
        -> Result<BoxedTransformation<S>, TransformError>;

    /// Build the transformation recorded in a history entry
    ///
    /// # Errors
    /// See [`build`](Self::build)
    fn from_entry(&self, entry: &HistoryEntry) -> Result<BoxedTransformation<S>, TransformError> {
        self.build(entry.name(), entry.parameters())
    }
}

type Constructor<S> =
    Box<dyn Fn(&Record) -> Result<BoxedTransformation<S>, TransformError> + Send + Sync>;

/// Name-keyed registry of transformation constructors
pub struct Registry<S: StructureState> {
    constructors: BTreeMap<String, Constructor<S>>,
}

impl<S: StructureState> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StructureState> Debug for Registry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names())
            .finish()
    }
}

impl<S: StructureState> Registry<S> {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Register a constructor, replacing any previous one under `name`
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&Record) -> Result<BoxedTransformation<S>, TransformError> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Box::new(constructor));
    }

    /// Builder-style [`register`](Self::register)
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&Record) -> Result<BoxedTransformation<S>, TransformError> + Send + Sync + 'static,
    {
        self.register(name, constructor);
        self
    }

    /// Check if a name is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Number of registered constructors
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl<S: StructureState> TransformationRegistry<S> for Registry<S> {
    fn build(
        &self,
        name: &str,
        parameters: &Record,
    ) -> Result<BoxedTransformation<S>, TransformError> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| TransformError::UnknownTransformation(name.to_string()))?;
        constructor(parameters)
    }
}

/// Decode a parameters record into a typed value
///
/// Convenience for registry constructors of serde-derived transformations.
///
/// # Errors
/// Returns [`TransformError::InvalidParameters`] if decoding fails
pub fn decode_parameters<T: DeserializeOwned>(
    name: &str,
    parameters: &Record,
) -> Result<T, TransformError> {
    serde_json::from_value(Value::Object(parameters.clone()))
        .map_err(|e| TransformError::invalid_parameters(name, e.to_string()))
}
