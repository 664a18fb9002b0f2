//! Alternative-branch expansion
//!
//! When a transformation yields alternates and the caller asks for them,
//! each alternate seeds a new [`TransformedStructure`] carrying the parent's
//! states and transformations up to the fork, plus the diverging step
//! ending in the alternate.

use crate::chain::TransformedStructure;
use crate::record::{Record, SourceRecord};
use crate::state::StructureState;
use crate::transformation::SharedTransformation;
use tracing::info;

/// Alternate outcomes of one append, ready to be expanded into forks
///
/// Holds its own copy of the parent's states, so the parent can keep
/// changing without affecting forks built from this value. [`iter`]
/// may be called any number of times; every call builds fresh forks.
///
/// [`iter`]: Alternatives::iter
#[derive(Debug, Clone)]
pub struct Alternatives<S: StructureState> {
    source: SourceRecord,
    /// Parent states up to and including the diverging step's input
    states: Vec<S>,
    /// Parent transformations followed by the diverging step
    transformations: Vec<SharedTransformation<S>>,
    alternates: Vec<S>,
}

impl<S: StructureState> Alternatives<S> {
    pub(crate) fn new(
        source: SourceRecord,
        states: Vec<S>,
        transformations: Vec<SharedTransformation<S>>,
        alternates: Vec<S>,
    ) -> Self {
        debug_assert_eq!(states.len(), transformations.len());
        info!(
            forks = alternates.len(),
            depth = transformations.len(),
            "alternative outcomes available"
        );
        Self {
            source,
            states,
            transformations,
            alternates,
        }
    }

    /// Number of forks
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.alternates.len()
    }

    /// Check if the transformation produced no alternates
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alternates.is_empty()
    }

    /// Alternate states, in the order the transformation produced them
    #[inline]
    #[must_use]
    pub fn alternates(&self) -> &[S] {
        &self.alternates
    }

    /// States every fork shares, oldest first
    #[inline]
    #[must_use]
    pub fn shared_states(&self) -> &[S] {
        &self.states
    }

    /// Transformations every fork shares, ending with the diverging step
    #[inline]
    #[must_use]
    pub fn shared_transformations(&self) -> &[SharedTransformation<S>] {
        &self.transformations
    }

    /// Build one fork per alternate, on demand
    pub fn iter(&self) -> impl Iterator<Item = TransformedStructure<S>> + '_ {
        self.alternates
            .iter()
            .map(move |alternate| self.fork(alternate.clone()))
    }

    /// Build all forks at once
    #[must_use]
    pub fn into_structures(mut self) -> Vec<TransformedStructure<S>> {
        let alternates = std::mem::take(&mut self.alternates);
        alternates
            .into_iter()
            .map(|alternate| self.fork(alternate))
            .collect()
    }

    fn fork(&self, alternate: S) -> TransformedStructure<S> {
        let mut states = self.states.clone();
        states.push(alternate);
        TransformedStructure::from_parts(
            self.source.clone(),
            states,
            self.transformations.clone(),
            Record::new(),
        )
    }
}

impl<S: StructureState> IntoIterator for Alternatives<S> {
    type Item = TransformedStructure<S>;
    type IntoIter = std::vec::IntoIter<TransformedStructure<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_structures().into_iter()
    }
}
