use crate::CandidateError;

use thiserror::Error;

/// An error type indicating a failed variation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VariationError {
    /// The Gaussian perturbation parameters are not usable.
    #[error("invalid gaussian parameters (mean {mean}, stdev {stdev})")]
    InvalidGaussian { mean: f64, stdev: f64 },
    /// The parents do not share bin count, dimensionality or universe.
    #[error("incompatible parents: {0}")]
    IncompatibleParents(&'static str),
    /// A child does not hold as many members as its parents.
    #[error("child holds {found} members, parents hold {expected}")]
    MemberCountMismatch { expected: usize, found: usize },
    /// A child broke the membership invariant.
    #[error(transparent)]
    Candidate(#[from] CandidateError),
}
