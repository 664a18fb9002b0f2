//! The history container
//!
//! [`TransformedStructure`] holds the ordered states `S[0..=n]`, the ordered
//! transformations `T[0..n]` with `T[i]: S[i] -> S[i+1]`, a LIFO redo buffer
//! and the chain's provenance.
//!
//! # Invariants
//! - `states().len() == transformations().len() + 1`
//! - The redo buffer only holds transformations popped by undo, most
//!   recently undone last
//! - A failed append leaves states and transformations untouched

use crate::branch::Alternatives;
use crate::error::{HistoryError, HistoryResult};
use crate::record::{Record, SourceRecord};
use crate::state::StructureState;
use crate::transformation::{BoxedTransformation, Outcome, SharedTransformation, Transformation};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use tracing::debug;

/// Redo and branching policy for a single append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOptions {
    /// Empty the redo buffer after appending
    pub clear_redo: bool,
    /// Hand alternates back as [`Alternatives`] instead of discarding them
    pub return_alternatives: bool,
}

impl Default for AppendOptions {
    fn default() -> Self {
        Self {
            clear_redo: true,
            return_alternatives: false,
        }
    }
}

impl AppendOptions {
    /// Ordinary append: clear redo, discard alternates
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the redo buffer (used when replaying a redo)
    #[inline]
    #[must_use]
    pub fn keep_redo(mut self) -> Self {
        self.clear_redo = false;
        self
    }

    /// Return alternates for branch expansion
    #[inline]
    #[must_use]
    pub fn with_alternatives(mut self) -> Self {
        self.return_alternatives = true;
        self
    }
}

/// A structure together with the transformations that produced it
///
/// # Example
///
/// ```rust,ignore
/// let mut chain = TransformedStructure::new(initial, source);
/// chain.append_transformation(Substitute::new("Fe", "Mn"))?;
/// chain.undo_last_transformation()?;
/// chain.redo_next_transformation()?;
/// let record = chain.to_record();
/// ```
#[derive(Debug)]
pub struct TransformedStructure<S: StructureState> {
    source: SourceRecord,
    structures: Vec<S>,
    transformations: Vec<SharedTransformation<S>>,
    redo_stack: Vec<SharedTransformation<S>>,
    other_parameters: Record,
}

impl<S: StructureState> TransformedStructure<S> {
    /// Start a chain at `initial`
    #[must_use]
    pub fn new(initial: S, source: SourceRecord) -> Self {
        Self::from_parts(source, vec![initial], Vec::new(), Record::new())
    }

    /// Start a chain at `initial` and apply `transformations` in order
    ///
    /// # Errors
    /// Returns the first transformation failure
    pub fn with_transformations<I>(
        initial: S,
        transformations: I,
        source: SourceRecord,
    ) -> HistoryResult<Self>
    where
        I: IntoIterator<Item = BoxedTransformation<S>>,
    {
        let mut chain = Self::new(initial, source);
        chain.extend_transformations(transformations)?;
        Ok(chain)
    }

    pub(crate) fn from_parts(
        source: SourceRecord,
        structures: Vec<S>,
        transformations: Vec<SharedTransformation<S>>,
        other_parameters: Record,
    ) -> Self {
        debug_assert_eq!(structures.len(), transformations.len() + 1);
        Self {
            source,
            structures,
            transformations,
            redo_stack: Vec::new(),
            other_parameters,
        }
    }

    /// Replace the free-form parameter map
    #[inline]
    #[must_use]
    pub fn with_other_parameters(mut self, other_parameters: Record) -> Self {
        self.other_parameters = other_parameters;
        self
    }

    // ---- Mutation ----

    /// Apply `transformation` to the final state and append the result
    ///
    /// Clears the redo buffer and discards any alternates.
    ///
    /// # Errors
    /// Returns the transformation's failure; the chain is left unchanged
    pub fn append_transformation<T>(&mut self, transformation: T) -> HistoryResult<()>
    where
        T: Transformation<S> + 'static,
    {
        self.append_boxed(Box::new(transformation), AppendOptions::default())
            .map(|_| ())
    }

    /// Apply a boxed transformation with explicit redo/branching policy
    ///
    /// Returns `Some` only when `options.return_alternatives` is set and the
    /// transformation produced a branched outcome. The forks' prefix is
    /// captured before the chain is mutated.
    ///
    /// # Errors
    /// Returns the transformation's failure; the chain is left unchanged
    pub fn append_boxed(
        &mut self,
        transformation: BoxedTransformation<S>,
        options: AppendOptions,
    ) -> HistoryResult<Option<Alternatives<S>>> {
        self.try_append(Arc::from(transformation), options)
            .map_err(|(_, err)| err)
    }

    /// Append each transformation in order, clearing redo each time
    ///
    /// Not atomic: appends before a failing transformation stay applied.
    ///
    /// # Errors
    /// Returns the first transformation failure
    pub fn extend_transformations<I>(&mut self, transformations: I) -> HistoryResult<()>
    where
        I: IntoIterator<Item = BoxedTransformation<S>>,
    {
        for transformation in transformations {
            self.append_boxed(transformation, AppendOptions::default())?;
        }
        Ok(())
    }

    /// Pop the last transformation onto the redo buffer
    ///
    /// # Errors
    /// Returns [`HistoryError::EmptyUndo`] if no transformation is applied
    pub fn undo_last_transformation(&mut self) -> HistoryResult<()> {
        let transformation = self.transformations.pop().ok_or(HistoryError::EmptyUndo)?;
        self.structures.pop();
        debug!(
            transformation = transformation.name(),
            remaining = self.transformations.len(),
            "undo"
        );
        self.redo_stack.push(transformation);
        Ok(())
    }

    /// Replay the most recently undone transformation
    ///
    /// The rest of the redo buffer is kept, so consecutive undos can be
    /// redone in sequence. If the replay fails the transformation goes back
    /// onto the redo buffer.
    ///
    /// # Errors
    /// Returns [`HistoryError::EmptyRedo`] if nothing was undone, or the
    /// transformation's failure
    pub fn redo_next_transformation(&mut self) -> HistoryResult<()> {
        let transformation = self.redo_stack.pop().ok_or(HistoryError::EmptyRedo)?;
        debug!(transformation = transformation.name(), "redo");
        match self.try_append(transformation, AppendOptions::new().keep_redo()) {
            Ok(_) => Ok(()),
            Err((transformation, err)) => {
                self.redo_stack.push(transformation);
                Err(err)
            }
        }
    }

    /// Set a free-form parameter stored alongside the chain
    pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.other_parameters.insert(key.into(), value.into());
    }

    fn try_append(
        &mut self,
        transformation: SharedTransformation<S>,
        options: AppendOptions,
    ) -> Result<Option<Alternatives<S>>, (SharedTransformation<S>, HistoryError)> {
        let outcome = match transformation.apply(self.final_state()) {
            Ok(outcome) => outcome,
            Err(err) => return Err((transformation, err.into())),
        };

        let forking = outcome.is_branched() && options.return_alternatives;
        let (primary, alternates) = outcome.into_parts();
        let alternatives = forking.then(|| {
            let mut transformations = self.transformations.clone();
            transformations.push(Arc::clone(&transformation));
            Alternatives::new(
                self.source.clone(),
                self.structures.clone(),
                transformations,
                alternates,
            )
        });

        debug!(
            transformation = transformation.name(),
            step = self.transformations.len() + 1,
            forks = alternatives.as_ref().map_or(0, Alternatives::len),
            "append"
        );
        self.transformations.push(transformation);
        self.structures.push(primary);
        if options.clear_redo {
            self.redo_stack.clear();
        }
        Ok(alternatives)
    }

    // ---- Queries ----

    /// State at `index` and exactly the transformations that produced it
    ///
    /// Returns `None` if `index >= self.len()`.
    #[must_use]
    pub fn item_at(&self, index: usize) -> Option<(&S, &[SharedTransformation<S>])> {
        self.structures
            .get(index)
            .map(|state| (state, &self.transformations[..index]))
    }

    /// Number of states (always at least one)
    #[inline]
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.structures.len()
    }

    /// Latest state
    #[inline]
    #[must_use]
    pub fn final_state(&self) -> &S {
        // structures is never empty
        &self.structures[self.structures.len() - 1]
    }

    /// Whether the last transformation changed the state
    ///
    /// False when the last transformation's output equals its input, e.g.
    /// substituting a species absent from the structure.
    ///
    /// # Errors
    /// Returns [`HistoryError::NoTransformationApplied`] with fewer than two
    /// recorded states
    pub fn was_modified(&self) -> HistoryResult<bool> {
        match self.structures.as_slice() {
            [.., previous, last] => Ok(previous != last),
            _ => Err(HistoryError::NoTransformationApplied),
        }
    }

    /// All recorded states, oldest first
    #[inline]
    #[must_use]
    pub fn states(&self) -> &[S] {
        &self.structures
    }

    /// All applied transformations, oldest first
    #[inline]
    #[must_use]
    pub fn transformations(&self) -> &[SharedTransformation<S>] {
        &self.transformations
    }

    /// Provenance of the chain's first state
    #[inline]
    #[must_use]
    pub fn source(&self) -> &SourceRecord {
        &self.source
    }

    /// Free-form parameters stored alongside the chain
    #[inline]
    #[must_use]
    pub fn other_parameters(&self) -> &Record {
        &self.other_parameters
    }

    /// Check if undo is possible
    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.transformations.is_empty()
    }

    /// Check if redo is possible
    #[inline]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of transformations waiting to be redone
    #[inline]
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }
}

impl<S: StructureState + Display> Display for TransformedStructure<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current structure")?;
        writeln!(f, "------------")?;
        writeln!(f, "{}", self.final_state())?;
        writeln!(f)?;
        writeln!(f, "Source")?;
        writeln!(f, "------------")?;
        writeln!(f, "{}", Value::Object(self.source.as_record().clone()))?;
        writeln!(f)?;
        writeln!(f, "Transformation history")?;
        write!(f, "------------")?;
        for transformation in &self.transformations {
            write!(f, "\n{}", Value::Object(transformation.to_record()))?;
        }
        Ok(())
    }
}
