use hydrobin::CandidateError;

use thiserror::Error;

use std::error::Error as StdError;
use std::path::PathBuf;

/// Error type returned by a [`Simulator`] run.
///
/// [`Simulator`]: crate::optimisation::Simulator
pub type SimulationError = Box<dyn StdError + Send + Sync>;

/// An error type for optimisation model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No binned scenario parameter is among the variables.
    #[error("no binned scenario parameter defined as a variable")]
    NoBinnedScenarioParameter,
    /// More than one binned scenario parameter is among the variables.
    #[error("only a single binned scenario parameter can be defined, found {first} and {second}")]
    MultipleBinnedScenarioParameters { first: String, second: String },
    /// A binned parameter has no per-bin parameters.
    #[error("binned parameter {0} has no bins")]
    EmptyBinnedParameter(String),
    /// A binned parameter's bins differ in size.
    #[error("bins of binned parameter {0} differ in size")]
    InconsistentBinSizes(String),
    /// A binned parameter does not match the scenario bin count.
    #[error("{variable} has {found} bins, expected {expected}")]
    BinCountMismatch {
        variable: String,
        expected: usize,
        found: usize,
    },
    /// A parameter's bounds are not usable.
    #[error("invalid bounds for parameter {parameter}: {reason}")]
    InvalidBounds {
        parameter: String,
        reason: &'static str,
    },
    /// A parameter was updated with the wrong number of values.
    #[error("parameter {parameter} expects {expected} values, got {found}")]
    ValueCountMismatch {
        parameter: String,
        expected: usize,
        found: usize,
    },
    /// Scenario bin indices do not fit the parameter.
    #[error("invalid bin indices for {parameter}: {reason}")]
    InvalidBinIndices {
        parameter: String,
        reason: &'static str,
    },
    /// A candidate's shape does not match the model.
    #[error(
        "candidate has {found_bins} bins of {found_variables} variables, \
         model expects {expected_bins} bins of {expected_variables}"
    )]
    CandidateShape {
        expected_bins: usize,
        expected_variables: usize,
        found_bins: usize,
        found_variables: usize,
    },
    #[error(transparent)]
    Candidate(#[from] CandidateError),
    /// The simulator failed to run.
    #[error("simulation failed")]
    Simulation(#[source] SimulationError),
    #[error("failed to write archive {}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// An error type for model document editing.
#[derive(Debug, Error)]
pub enum ModelJsonError {
    #[error("node {0} not found")]
    NodeNotFound(String),
    #[error("parameter {0} not found")]
    ParameterNotFound(String),
    #[error("edge from ({from}) to ({to}) already exists")]
    DuplicateEdge { from: String, to: String },
    /// A section of the document does not have the expected type.
    #[error("model section {section} is not {expected}")]
    MalformedSection {
        section: &'static str,
        expected: &'static str,
    },
    /// A node definition is not a JSON object.
    #[error("node definitions must be JSON objects")]
    MalformedNode,
    #[error("failed to read model file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
