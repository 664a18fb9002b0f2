use lineage_history::{HistoryError, SourceRecord, TransformedStructure};
use lineage_io::{
    bundle_inputs, from_external_text, verify_checksum, write_inputs, BundleError, IngestError,
    IoConfig, ParseError, ParserRegistry, SourceIngestor, CHECKSUM_KEY,
};
use lineage_test_utils::{
    boxed, create_two_step_chain, toy_registry, NamedFileGenerator, RemoveSpecies,
    SubstituteSpecies, ToyInputGenerator, ToyOptions, ToyParser, ToyStructure,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;

const ICSD_TOY: &str = "# database_code_ICSD 98765\nlabel = 'rock salt'\nspecies: Na Cl\n";

fn registry() -> ParserRegistry<ToyStructure> {
    let mut registry = ParserRegistry::new();
    registry.register(ToyParser);
    registry
}

#[test]
fn test_database_origin_tag() {
    let chain = from_external_text(&ToyParser, ICSD_TOY, Vec::new(), &ToyOptions::default())
        .unwrap();
    assert_eq!(chain.source().source(), Some("98765-ICSD"));
    assert_eq!(
        chain.source().get("toy_data"),
        Some(&json!({"label": "'rock salt'"}))
    );
}

#[test]
fn test_generic_origin_tag() {
    let chain = from_external_text(
        &ToyParser,
        "species: Fe O\n",
        Vec::new(),
        &ToyOptions::default(),
    )
    .unwrap();
    assert_eq!(chain.source().source(), Some("uploaded toy"));
    assert!(chain.source().datetime().is_some());
}

#[test]
fn test_single_quotes_survive_round_trip() {
    let chain = from_external_text(&ToyParser, ICSD_TOY, Vec::new(), &ToyOptions::default())
        .unwrap();
    let expected = ICSD_TOY.replace('\'', "\"");
    assert_eq!(chain.source().original_file(), Some(expected.as_str()));

    let json = chain.to_json(false).unwrap();
    let restored = TransformedStructure::from_json(&json, &toy_registry()).unwrap();
    assert_eq!(restored.source().original_file(), Some(expected.as_str()));
    assert!(verify_checksum(restored.source()));
}

#[test]
fn test_transformations_applied_on_ingest() {
    let chain = from_external_text(
        &ToyParser,
        "species: O Fe\n",
        vec![
            boxed(SubstituteSpecies::new("Fe", "Mn")),
            boxed(RemoveSpecies::new("O")),
        ],
        &ToyOptions { sort: true },
    )
    .unwrap();
    assert_eq!(chain.states()[0], ToyStructure::new(&["Fe", "O"]));
    assert_eq!(chain.final_state(), &ToyStructure::new(&["Mn"]));
}

#[test]
fn test_unlabeled_species_rejected() {
    let err = from_external_text(&ToyParser, "species: 1 2\n", Vec::new(), &ToyOptions::default())
        .unwrap_err();
    assert!(err.is_invalid_source());
}

#[test]
fn test_parse_error_propagates() {
    let err = from_external_text(&ToyParser, "garbage\n", Vec::new(), &ToyOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Parse(ParseError::Syntax { line: 1, .. })
    ));
}

#[test]
fn test_oversized_source_rejected() {
    let ingestor = SourceIngestor::new(IoConfig::new().with_max_source_bytes(8));
    let err = ingestor
        .ingest(&ToyParser, "species: Fe O\n", Vec::new(), &ToyOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::History(HistoryError::InvalidSource(_))
    ));
}

#[test]
fn test_ingest_through_registry() {
    let chain = SourceIngestor::default()
        .ingest_format(&registry(), "toy", "species: Li O\n", Vec::new())
        .unwrap();
    assert_eq!(chain.final_state(), &ToyStructure::new(&["Li", "O"]));
    assert!(chain.source().get(CHECKSUM_KEY).is_some());
}

#[test]
fn test_registry_unknown_format() {
    let err = SourceIngestor::default()
        .ingest_format(&registry(), "cif", "data_x\n", Vec::new())
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Parse(ParseError::UnsupportedFormat(ref format)) if format == "cif"
    ));
}

#[test]
fn test_registry_lookup() {
    let mut registry = registry();
    registry.register(ToyParser);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.formats(), vec!["toy"]);
    assert!(registry.find("toy").is_some());
    assert!(registry
        .find_for_path(Path::new("inputs/structure.toy"))
        .is_some());
    assert!(registry.find_for_path(Path::new("structure.cif")).is_none());
    assert!(registry.find_for_path(Path::new("no_extension")).is_none());
}

#[test]
fn test_bundle_contains_sidecar() {
    let chain = create_two_step_chain();
    let files = bundle_inputs(&chain, &ToyInputGenerator, &IoConfig::default()).unwrap();

    assert_eq!(
        files.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["COUNT", "SITES", "transformations.json"]
    );
    assert_eq!(files["SITES"], "Mn\nMn");
    assert_eq!(files["transformations.json"], chain.to_json(false).unwrap());
}

#[test]
fn test_bundle_rejects_sidecar_collision() {
    let chain = create_two_step_chain();
    let generator = NamedFileGenerator {
        file_name: "transformations.json".to_string(),
    };
    let err = bundle_inputs(&chain, &generator, &IoConfig::default()).unwrap_err();
    assert!(matches!(err, BundleError::DuplicateFile(_)));
}

#[test]
fn test_bundle_rejects_path_names() {
    let chain = create_two_step_chain();
    let generator = NamedFileGenerator {
        file_name: "../escape".to_string(),
    };
    let err = bundle_inputs(&chain, &generator, &IoConfig::default()).unwrap_err();
    assert!(matches!(err, BundleError::InvalidFileName(_)));
}

#[test]
fn test_generator_failure_propagates() {
    let chain = TransformedStructure::new(
        ToyStructure::new(&[]),
        SourceRecord::new("uploaded toy", "now", ""),
    );
    let err = bundle_inputs(&chain, &ToyInputGenerator, &IoConfig::default()).unwrap_err();
    assert!(matches!(err, BundleError::Generator(_)));
}

#[test]
fn test_write_inputs_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("run").join("001");
    let chain = create_two_step_chain();
    let config = IoConfig::new()
        .with_sidecar_file_name("history.json")
        .with_pretty_json(true);

    let written = write_inputs(&chain, &ToyInputGenerator, &target, &config).unwrap();
    assert_eq!(written.len(), 3);
    assert!(target.join("SITES").is_file());

    let sidecar = std::fs::read_to_string(target.join("history.json")).unwrap();
    let restored = TransformedStructure::from_json(&sidecar, &toy_registry()).unwrap();
    assert_eq!(restored.final_state(), chain.final_state());
    assert_eq!(restored.history(), chain.history());
}

#[test]
fn test_write_inputs_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("absent");
    let config = IoConfig::new().with_create_directory(false);

    let err = write_inputs(&create_two_step_chain(), &ToyInputGenerator, &target, &config)
        .unwrap_err();
    assert!(matches!(err, BundleError::MissingDirectory(_)));
    assert!(!target.exists());
}

#[test]
fn test_write_inputs_existing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let config = IoConfig::new().with_create_directory(false);

    let written =
        write_inputs(&create_two_step_chain(), &ToyInputGenerator, dir.path(), &config).unwrap();
    assert_eq!(
        std::fs::read_to_string(&written[0]).unwrap(),
        "2",
        "COUNT sorts first"
    );
}

#[test]
fn test_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lineage.toml");
    std::fs::write(&path, "sidecar_file_name = \"provenance.json\"\n").unwrap();

    let config = IoConfig::load(&path).unwrap();
    assert_eq!(config.sidecar_file_name, "provenance.json");
    assert!(config.create_directory);
}
