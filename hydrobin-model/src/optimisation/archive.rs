use crate::errors::ModelError;
use crate::parameters::ParameterKind;
use crate::recorders::RecorderRecord;

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// The values one bin's parameter took in a candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BinParameterRecord {
    pub kind: ParameterKind,
    pub name: String,
    pub values: Vec<f64>,
}

/// The assignment of one model variable in a candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VariableRecord {
    /// Bin index of every scenario.
    BinnedScenario { values: Vec<usize> },
    /// One record per bin.
    Binned { parameters: Vec<BinParameterRecord> },
}

/// Everything archived about an evaluated candidate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub objectives: Vec<RecorderRecord>,
    pub variables: BTreeMap<String, VariableRecord>,
}

/// The result of evaluating one candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Aggregated objective values, lower is better.
    pub objectives: Vec<f64>,
    pub meta: CandidateRecord,
}

/// Writes `records` to `path` as a JSON array indented by four spaces.
///
/// The archive is first written next to `path` and then renamed
/// over it, so readers never see a partially written snapshot.
pub fn write_archive<'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a CandidateRecord>,
) -> Result<(), ModelError> {
    let records: Vec<&CandidateRecord> = records.into_iter().collect();
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut serializer)?;

    let temporary = temporary_path(path);
    fs::write(&temporary, &buffer).map_err(|source| ModelError::Archive {
        path: temporary.clone(),
        source,
    })?;
    fs::rename(&temporary, path).map_err(|source| ModelError::Archive {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads back an archive written by [`write_archive`].
pub fn read_archive(path: &Path) -> Result<Vec<CandidateRecord>, ModelError> {
    let contents = fs::read(path).map_err(|source| ModelError::Archive {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&contents)?)
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
