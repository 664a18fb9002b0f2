//! `lineage` command-line tool
//!
//! Inspects and validates persisted history records.

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use lineage_history::{Record, RecordSummary, SourceRecord, HISTORY_KEY};
use lineage_io::{verify_checksum, IoConfig, CHECKSUM_KEY};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("lineage")
        .version(lineage_history::VERSION)
        .about("Inspect persisted transformation histories")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand(
            Command::new("inspect")
                .about("Summarize a record")
                .arg(
                    Arg::new("record")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Path to a JSON record"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check record layout and source checksum")
                .arg(
                    Arg::new("record")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Path to a JSON record"),
                ),
        )
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => IoConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => IoConfig::default(),
    };
    debug!(?config, "configuration");
    run(&matches, &config)
}

fn run(matches: &ArgMatches, config: &IoConfig) -> Result<()> {
    match matches.subcommand() {
        Some(("inspect", args)) => {
            let summary = RecordSummary::inspect(&load_record(record_path(args)?)?)?;
            if args.get_flag("json") {
                let json = if config.pretty_json {
                    serde_json::to_string_pretty(&summary)?
                } else {
                    serde_json::to_string(&summary)?
                };
                println!("{json}");
            } else {
                println!("{summary}");
            }
        }
        Some(("validate", args)) => {
            let path = record_path(args)?;
            let summary = validate(&load_record(path)?)?;
            info!(steps = summary.step_count(), "record is valid");
            println!("{}: ok ({} steps)", path.display(), summary.step_count());
        }
        Some((other, _)) => bail!("unknown subcommand: {other}"),
        None => bail!("no subcommand given"),
    }
    Ok(())
}

fn record_path(args: &ArgMatches) -> Result<&PathBuf> {
    args.get_one::<PathBuf>("record")
        .context("missing record path")
}

fn load_record(path: &Path) -> Result<Record> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    match value {
        Value::Object(record) => Ok(record),
        _ => bail!("{}: record must be a JSON object", path.display()),
    }
}

/// Layout check plus checksum verification when the source carries one
fn validate(record: &Record) -> Result<RecordSummary> {
    let summary = RecordSummary::inspect(record)?;
    let source = record
        .get(HISTORY_KEY)
        .and_then(Value::as_array)
        .and_then(|history| history.first())
        .and_then(Value::as_object)
        .cloned()
        .map(SourceRecord::from_record)
        .context("record has no source entry")?;

    if source.get(CHECKSUM_KEY).is_some() && !verify_checksum(&source) {
        bail!("source checksum does not match original_file");
    }
    Ok(summary)
}
