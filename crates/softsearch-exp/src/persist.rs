use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Deserialize;
use softsearch_core::errors::{ErrorInfo, SwsError};
use softsearch_core::{ExperimentDescriptor, ExperimentSet};
use tracing::debug;

/// Experiments file contents: a list, or a bare descriptor object.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExperimentsFile {
    Many(ExperimentSet),
    One(ExperimentDescriptor),
}

/// Reads an experiment set from a JSON file. A single descriptor object is
/// accepted and wrapped into a one-element set. Role keys keep file order.
pub fn read_experiment_set(path: &Path) -> Result<ExperimentSet, SwsError> {
    let text = fs::read_to_string(path).map_err(|err| {
        SwsError::Config(
            ErrorInfo::new("experiments-read", err.to_string()).with_path(path),
        )
    })?;
    let parsed: ExperimentsFile = serde_json::from_str(&text).map_err(|err| {
        SwsError::Config(
            ErrorInfo::new("experiments-parse", err.to_string()).with_path(path),
        )
    })?;
    Ok(match parsed {
        ExperimentsFile::Many(set) => set,
        ExperimentsFile::One(single) => {
            debug!(path = %path.display(), "wrapping single experiment as list");
            vec![single].into()
        }
    })
}

/// Writes an experiment set as JSON followed by a newline. Role keys are
/// written in role order so module loading order survives a round trip.
pub fn write_experiment_set<W: Write>(writer: &mut W, set: &ExperimentSet) -> Result<(), SwsError> {
    serde_json::to_writer(&mut *writer, set)
        .map_err(|err| SwsError::Serde(ErrorInfo::new("experiments-encode", err.to_string())))?;
    writer
        .write_all(b"\n")
        .map_err(|err| SwsError::Serde(ErrorInfo::new("experiments-write", err.to_string())))
}
