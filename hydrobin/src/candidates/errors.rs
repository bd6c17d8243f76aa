use crate::Member;

use thiserror::Error;

/// An error type indicating an invalid candidate
/// configuration, or a broken membership invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateError {
    /// Neither a variable count nor per-bin variables were given.
    #[error("either number_of_variables or bin_variables must be given")]
    MissingVariables,
    /// Neither per-bin members nor a member universe were given.
    #[error("either bin_members or all_valid_members must be given")]
    MissingMembership,
    /// A candidate was read without any bin.
    #[error("a candidate needs at least one bin")]
    NoBins,
    /// A per-bin list has the wrong number of entries.
    #[error("expected {expected} bins in {field}, found {found}")]
    BinCountMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    /// A bin's variable vector has the wrong dimensionality.
    #[error("bin {bin} has {found} variables, expected {expected}")]
    VariableCountMismatch {
        bin: usize,
        expected: usize,
        found: usize,
    },
    /// A member is listed more than once in the universe or across bins.
    #[error("member {0} is assigned more than once")]
    DuplicateMember(Member),
    /// A member index does not fit the `0..n` universe.
    #[error("member {member} is outside the universe of {universe_size} members")]
    MemberOutOfRange { member: Member, universe_size: usize },
    /// A bin holds a member that is not in the universe.
    #[error("bin {bin} holds member {member}, which is not a valid member")]
    ForeignMember { bin: usize, member: Member },
    /// A universe member is not assigned to any bin.
    #[error("member {0} is not assigned to any bin")]
    UnassignedMember(Member),
    /// A bin index does not exist.
    #[error("bin index {index} out of range for {number_of_bins} bins")]
    BinOutOfRange { index: usize, number_of_bins: usize },
}
