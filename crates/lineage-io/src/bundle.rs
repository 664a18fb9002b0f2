//! Job-input bundling
//!
//! A bundle is the set of input files an external job needs for the chain's
//! final state, plus a sidecar copy of the chain's record so the job output
//! can be traced back to its provenance.

use crate::config::IoConfig;
use crate::error::BundleError;
use lineage_history::{StructureState, TransformedStructure};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Input files keyed by file name
pub type InputFiles = BTreeMap<String, String>;

/// Produces job input files for a state
pub trait InputSetGenerator<S: StructureState> {
    /// Generate named files for `state`
    ///
    /// # Errors
    /// Returns [`BundleError::Generator`] if the state cannot be rendered
    fn generate(&self, state: &S) -> Result<InputFiles, BundleError>;
}

/// Generator files for the final state plus the sidecar record
///
/// # Errors
/// - [`BundleError::Generator`] if generation fails
/// - [`BundleError::DuplicateFile`] if a generated file uses the sidecar name
/// - [`BundleError::InvalidFileName`] if any name is not a plain file name
pub fn bundle_inputs<S, G>(
    chain: &TransformedStructure<S>,
    generator: &G,
    config: &IoConfig,
) -> Result<InputFiles, BundleError>
where
    S: StructureState,
    G: InputSetGenerator<S> + ?Sized,
{
    let mut files = generator.generate(chain.final_state())?;
    if files.contains_key(&config.sidecar_file_name) {
        return Err(BundleError::DuplicateFile(config.sidecar_file_name.clone()));
    }
    files.insert(
        config.sidecar_file_name.clone(),
        chain.to_json(config.pretty_json)?,
    );

    for name in files.keys() {
        validate_file_name(name)?;
    }
    debug!(files = files.len(), "bundled inputs");
    Ok(files)
}

/// Write the bundle for `chain` into `dir`
///
/// Returns the written paths in file-name order.
///
/// # Errors
/// - [`BundleError::MissingDirectory`] if `dir` is absent and
///   `config.create_directory` is off
/// - [`BundleError::Io`] on filesystem failure
/// - any error from [`bundle_inputs`]
pub fn write_inputs<S, G>(
    chain: &TransformedStructure<S>,
    generator: &G,
    dir: impl AsRef<Path>,
    config: &IoConfig,
) -> Result<Vec<PathBuf>, BundleError>
where
    S: StructureState,
    G: InputSetGenerator<S> + ?Sized,
{
    let dir = dir.as_ref();
    let files = bundle_inputs(chain, generator, config)?;

    if !dir.is_dir() {
        if !config.create_directory {
            return Err(BundleError::MissingDirectory(dir.to_path_buf()));
        }
        std::fs::create_dir_all(dir).map_err(|e| BundleError::io_error(dir, e))?;
    }

    let mut written = Vec::with_capacity(files.len());
    for (name, contents) in &files {
        let path = dir.join(name);
        std::fs::write(&path, contents).map_err(|e| BundleError::io_error(&path, e))?;
        written.push(path);
    }

    info!(
        dir = %dir.display(),
        files = written.len(),
        "wrote job inputs"
    );
    Ok(written)
}

fn validate_file_name(name: &str) -> Result<(), BundleError> {
    if name.is_empty() || name == "." || name.contains("..") || name.contains(['/', '\\']) {
        return Err(BundleError::InvalidFileName(name.to_string()));
    }
    Ok(())
}
