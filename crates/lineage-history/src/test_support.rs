//! Minimal state and transformations for unit tests

use crate::error::{RecordError, TransformError};
use crate::record::Record;
use crate::state::StructureState;
use crate::transformation::{decode_parameters, Outcome, Registry, Transformation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Sites {
    pub(crate) species: Vec<String>,
}

impl Sites {
    pub(crate) fn of(species: &[&str]) -> Self {
        Self {
            species: species.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl Display for Sites {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.species.join(" "))
    }
}

impl StructureState for Sites {
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("species".to_string(), json!(self.species));
        record
    }

    fn from_record(record: &Record) -> Result<Self, RecordError> {
        serde_json::from_value(Value::Object(record.clone()))
            .map_err(|e| RecordError::InvalidState(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Append {
    species: String,
}

impl Append {
    pub(crate) fn new(species: &str) -> Self {
        Self {
            species: species.to_string(),
        }
    }
}

impl Transformation<Sites> for Append {
    fn name(&self) -> &str {
        "Append"
    }

    fn parameters(&self) -> Record {
        let mut record = Record::new();
        record.insert("species".to_string(), json!(self.species));
        record
    }

    fn apply(&self, state: &Sites) -> Result<Outcome<Sites>, TransformError> {
        let mut next = state.clone();
        next.species.push(self.species.clone());
        Ok(Outcome::single(next))
    }
}

/// Leaves the state untouched
#[derive(Debug, Clone)]
pub(crate) struct Noop;

impl Transformation<Sites> for Noop {
    fn name(&self) -> &str {
        "Noop"
    }

    fn apply(&self, state: &Sites) -> Result<Outcome<Sites>, TransformError> {
        Ok(Outcome::single(state.clone()))
    }
}

/// Primary appends `A`; alternates append `B`, `C`, ...
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Split {
    alternates: usize,
}

impl Split {
    pub(crate) fn new(alternates: usize) -> Self {
        Self { alternates }
    }
}

impl Transformation<Sites> for Split {
    fn name(&self) -> &str {
        "Split"
    }

    fn parameters(&self) -> Record {
        let mut record = Record::new();
        record.insert("alternates".to_string(), json!(self.alternates));
        record
    }

    fn apply(&self, state: &Sites) -> Result<Outcome<Sites>, TransformError> {
        let with = |label: char| {
            let mut next = state.clone();
            next.species.push(label.to_string());
            next
        };
        let alternates = ('B'..='Z').take(self.alternates).map(&with).collect();
        Ok(Outcome::branched(with('A'), alternates))
    }
}

/// Drops the last site; fails on an empty state
#[derive(Debug, Clone)]
pub(crate) struct Pop;

impl Transformation<Sites> for Pop {
    fn name(&self) -> &str {
        "Pop"
    }

    fn apply(&self, state: &Sites) -> Result<Outcome<Sites>, TransformError> {
        let mut next = state.clone();
        next.species
            .pop()
            .ok_or_else(|| TransformError::InvalidInput("no sites".to_string()))?;
        Ok(Outcome::single(next))
    }
}

/// Appends `species` and records an extra `@module` field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Tagged {
    species: String,
}

impl Tagged {
    pub(crate) fn new(species: &str) -> Self {
        Self {
            species: species.to_string(),
        }
    }
}

impl Transformation<Sites> for Tagged {
    fn name(&self) -> &str {
        "Tagged"
    }

    fn parameters(&self) -> Record {
        let mut record = Record::new();
        record.insert("species".to_string(), json!(self.species));
        record
    }

    fn apply(&self, state: &Sites) -> Result<Outcome<Sites>, TransformError> {
        Append::new(&self.species).apply(state)
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("name".to_string(), json!(self.name()));
        record.insert("parameters".to_string(), Value::Object(self.parameters()));
        record.insert("@module".to_string(), json!("lineage.test"));
        record
    }
}

/// Always fails
#[derive(Debug, Clone)]
pub(crate) struct Explode;

impl Transformation<Sites> for Explode {
    fn name(&self) -> &str {
        "Explode"
    }

    fn apply(&self, _state: &Sites) -> Result<Outcome<Sites>, TransformError> {
        Err(TransformError::Failed("exploded".to_string()))
    }
}

pub(crate) fn registry() -> Registry<Sites> {
    Registry::new()
        .with("Append", |params| {
            let t: Append = decode_parameters("Append", params)?;
            Ok(Box::new(t))
        })
        .with("Split", |params| {
            let t: Split = decode_parameters("Split", params)?;
            Ok(Box::new(t))
        })
        .with("Tagged", |params| {
            let t: Tagged = decode_parameters("Tagged", params)?;
            Ok(Box::new(t))
        })
        .with("Noop", |_| Ok(Box::new(Noop)))
        .with("Pop", |_| Ok(Box::new(Pop)))
}
