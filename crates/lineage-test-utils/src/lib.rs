//! Testing utilities for the lineage workspace
//!
//! Shared fixtures: a toy structure, toy transformations, a toy text format
//! and a toy input generator.

#![allow(missing_docs)]

use lineage_history::{
    decode_parameters, BoxedTransformation, Outcome, Record, RecordError, Registry,
    SourceRecord, StructureState, TransformError, Transformation, TransformedStructure,
};
use lineage_io::{BundleError, InputFiles, InputSetGenerator, ParseError, ParsedSource, SourceParser};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Ordered list of species labels standing in for a crystal structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToyStructure {
    pub species: Vec<String>,
}

impl ToyStructure {
    pub fn new(species: &[&str]) -> Self {
        Self {
            species: species.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    pub fn contains(&self, species: &str) -> bool {
        self.species.iter().any(|s| s == species)
    }
}

impl fmt::Display for ToyStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.species.join(" "))
    }
}

impl StructureState for ToyStructure {
    fn to_record(&self) -> Record {
        match serde_json::to_value(self) {
            Ok(Value::Object(record)) => record,
            _ => Record::new(),
        }
    }

    fn from_record(record: &Record) -> Result<Self, RecordError> {
        serde_json::from_value(Value::Object(record.clone()))
            .map_err(|e| RecordError::InvalidState(e.to_string()))
    }
}

fn parameters_of<T: Serialize>(value: &T) -> Record {
    match serde_json::to_value(value) {
        Ok(Value::Object(record)) => record,
        _ => Record::new(),
    }
}

/// Replaces every `from` site with `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstituteSpecies {
    pub from: String,
    pub to: String,
}

impl SubstituteSpecies {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

impl Transformation<ToyStructure> for SubstituteSpecies {
    fn name(&self) -> &str {
        "SubstituteSpecies"
    }

    fn parameters(&self) -> Record {
        parameters_of(self)
    }

    fn apply(&self, state: &ToyStructure) -> Result<Outcome<ToyStructure>, TransformError> {
        let species = state
            .species
            .iter()
            .map(|s| if *s == self.from { self.to.clone() } else { s.clone() })
            .collect();
        Ok(Outcome::single(ToyStructure { species }))
    }
}

/// Drops every site of one species
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveSpecies {
    pub species: String,
}

impl RemoveSpecies {
    pub fn new(species: &str) -> Self {
        Self {
            species: species.to_string(),
        }
    }
}

impl Transformation<ToyStructure> for RemoveSpecies {
    fn name(&self) -> &str {
        "RemoveSpecies"
    }

    fn parameters(&self) -> Record {
        parameters_of(self)
    }

    fn apply(&self, state: &ToyStructure) -> Result<Outcome<ToyStructure>, TransformError> {
        let species = state
            .species
            .iter()
            .filter(|s| **s != self.species)
            .cloned()
            .collect();
        Ok(Outcome::single(ToyStructure { species }))
    }
}

/// Branching transformation
///
/// Primary outcome sorts the sites; alternates are the first `alternates`
/// left rotations of the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerateOrderings {
    pub alternates: usize,
}

impl EnumerateOrderings {
    pub fn new(alternates: usize) -> Self {
        Self { alternates }
    }
}

impl Transformation<ToyStructure> for EnumerateOrderings {
    fn name(&self) -> &str {
        "EnumerateOrderings"
    }

    fn parameters(&self) -> Record {
        parameters_of(self)
    }

    fn apply(&self, state: &ToyStructure) -> Result<Outcome<ToyStructure>, TransformError> {
        if state.species.is_empty() {
            return Err(TransformError::InvalidInput(
                "no sites to order".to_string(),
            ));
        }

        let mut primary = state.clone();
        primary.species.sort();

        let alternates = (1..=self.alternates)
            .map(|shift| {
                let mut next = state.clone();
                next.species.rotate_left(shift % state.species.len());
                next
            })
            .collect();
        Ok(Outcome::branched(primary, alternates))
    }
}

/// Always fails with `message`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailingTransformation {
    pub message: String,
}

impl FailingTransformation {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl Transformation<ToyStructure> for FailingTransformation {
    fn name(&self) -> &str {
        "FailingTransformation"
    }

    fn parameters(&self) -> Record {
        parameters_of(self)
    }

    fn apply(&self, _state: &ToyStructure) -> Result<Outcome<ToyStructure>, TransformError> {
        Err(TransformError::Failed(self.message.clone()))
    }
}

/// Registry covering every toy transformation
pub fn toy_registry() -> Registry<ToyStructure> {
    Registry::new()
        .with("SubstituteSpecies", |params| {
            let t: SubstituteSpecies = decode_parameters("SubstituteSpecies", params)?;
            Ok(Box::new(t))
        })
        .with("RemoveSpecies", |params| {
            let t: RemoveSpecies = decode_parameters("RemoveSpecies", params)?;
            Ok(Box::new(t))
        })
        .with("EnumerateOrderings", |params| {
            let t: EnumerateOrderings = decode_parameters("EnumerateOrderings", params)?;
            Ok(Box::new(t))
        })
        .with("FailingTransformation", |params| {
            let t: FailingTransformation = decode_parameters("FailingTransformation", params)?;
            Ok(Box::new(t))
        })
}

pub fn boxed<T: Transformation<ToyStructure> + 'static>(t: T) -> BoxedTransformation<ToyStructure> {
    Box::new(t)
}

pub fn toy_source() -> SourceRecord {
    SourceRecord::new("uploaded toy", "2024-03-02T12:00:00.000000Z", "species: Fe O")
}

/// Fresh chain starting at `species`
pub fn create_toy_chain(species: &[&str]) -> TransformedStructure<ToyStructure> {
    TransformedStructure::new(ToyStructure::new(species), toy_source())
}

/// Chain `Fe Fe O` → substitute Fe→Mn → remove O
pub fn create_two_step_chain() -> TransformedStructure<ToyStructure> {
    TransformedStructure::with_transformations(
        ToyStructure::new(&["Fe", "Fe", "O"]),
        vec![
            boxed(SubstituteSpecies::new("Fe", "Mn")),
            boxed(RemoveSpecies::new("O")),
        ],
        toy_source(),
    )
    .unwrap()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ToyOptions {
    /// Sort sites after parsing
    pub sort: bool,
}

/// Line-oriented toy text format
///
/// ```text
/// # database_code_ICSD 12345
/// temperature = 300
/// species: Fe Fe O
/// ```
///
/// `key = value` lines land in the `toy_data` metadata field. Sites count
/// as labeled only when every token starts with an uppercase letter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToyParser;

impl SourceParser<ToyStructure> for ToyParser {
    type Options = ToyOptions;

    fn format(&self) -> &str {
        "toy"
    }

    fn extensions(&self) -> &[&str] {
        &["toy"]
    }

    fn parse(
        &self,
        raw: &str,
        options: &ToyOptions,
    ) -> Result<ParsedSource<ToyStructure>, ParseError> {
        let mut origin = None;
        let mut data = Record::new();
        let mut species: Option<Vec<String>> = None;

        for (index, line) in raw.lines().enumerate() {
            let line = line.trim();
            if let Some(code) = line.strip_prefix("# database_code_ICSD") {
                let code = code.trim();
                if code.is_empty() {
                    return Err(ParseError::syntax(index + 1, "missing ICSD code"));
                }
                origin = Some(format!("{code}-ICSD"));
            } else if line.is_empty() || line.starts_with('#') {
                continue;
            } else if let Some(rest) = line.strip_prefix("species:") {
                species = Some(rest.split_whitespace().map(str::to_string).collect());
            } else if let Some((key, value)) = line.split_once('=') {
                data.insert(
                    key.trim().to_string(),
                    Value::String(value.trim().to_string()),
                );
            } else {
                return Err(ParseError::syntax(index + 1, format!("unexpected line: {line}")));
            }
        }

        let mut species =
            species.ok_or_else(|| ParseError::Validation("no species line".to_string()))?;
        let species_labeled = species
            .iter()
            .all(|s| s.chars().next().is_some_and(char::is_uppercase));
        if options.sort {
            species.sort();
        }

        let mut metadata = Record::new();
        if !data.is_empty() {
            metadata.insert("toy_data".to_string(), Value::Object(data));
        }

        Ok(ParsedSource {
            state: ToyStructure { species },
            origin,
            species_labeled,
            metadata,
        })
    }
}

/// Renders `SITES` (one species per line) and `COUNT`
#[derive(Debug, Clone, Copy, Default)]
pub struct ToyInputGenerator;

impl InputSetGenerator<ToyStructure> for ToyInputGenerator {
    fn generate(&self, state: &ToyStructure) -> Result<InputFiles, BundleError> {
        if state.species.is_empty() {
            return Err(BundleError::Generator("no sites to write".to_string()));
        }
        let mut files = InputFiles::new();
        files.insert("SITES".to_string(), state.species.join("\n"));
        files.insert("COUNT".to_string(), state.species.len().to_string());
        Ok(files)
    }
}

/// Generator that writes a single file with a fixed name
#[derive(Debug, Clone)]
pub struct NamedFileGenerator {
    pub file_name: String,
}

impl InputSetGenerator<ToyStructure> for NamedFileGenerator {
    fn generate(&self, state: &ToyStructure) -> Result<InputFiles, BundleError> {
        let mut files = InputFiles::new();
        files.insert(self.file_name.clone(), state.to_string());
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toy_structure_record_round_trip() {
        let state = ToyStructure::new(&["Fe", "O"]);
        assert_eq!(ToyStructure::from_record(&state.to_record()).unwrap(), state);
    }

    #[test]
    fn orderings_rotate_alternates() {
        let outcome = EnumerateOrderings::new(2)
            .apply(&ToyStructure::new(&["O", "Fe", "Mn"]))
            .unwrap();
        let (primary, alternates) = outcome.into_parts();
        assert_eq!(primary, ToyStructure::new(&["Fe", "Mn", "O"]));
        assert_eq!(
            alternates,
            vec![
                ToyStructure::new(&["Fe", "Mn", "O"]),
                ToyStructure::new(&["Mn", "O", "Fe"]),
            ]
        );
    }

    #[test]
    fn orderings_reject_empty() {
        let result = EnumerateOrderings::new(1).apply(&ToyStructure::new(&[]));
        assert!(matches!(result, Err(TransformError::InvalidInput(_))));
    }

    #[test]
    fn parser_reads_origin_and_metadata() {
        let parsed = ToyParser
            .parse(
                "# database_code_ICSD 12345\ntemperature = 300\nspecies: O Fe\n",
                &ToyOptions { sort: true },
            )
            .unwrap();
        assert_eq!(parsed.origin.as_deref(), Some("12345-ICSD"));
        assert_eq!(parsed.state, ToyStructure::new(&["Fe", "O"]));
        assert!(parsed.species_labeled);
        assert!(parsed.metadata.contains_key("toy_data"));
    }

    #[test]
    fn parser_flags_unlabeled_species() {
        let parsed = ToyParser
            .parse("species: 1 2\n", &ToyOptions::default())
            .unwrap();
        assert!(!parsed.species_labeled);
    }

    #[test]
    fn parser_requires_species_line() {
        let result = ToyParser.parse("a = b\n", &ToyOptions::default());
        assert!(matches!(result, Err(ParseError::Validation(_))));
    }

    #[test]
    fn registry_knows_all_toys() {
        assert_eq!(
            toy_registry().names(),
            vec![
                "EnumerateOrderings",
                "FailingTransformation",
                "RemoveSpecies",
                "SubstituteSpecies"
            ]
        );
    }
}
