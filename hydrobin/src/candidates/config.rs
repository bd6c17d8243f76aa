use crate::Member;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for candidate construction.
///
/// Exactly one of [`number_of_variables`] and [`bin_variables`]
/// is needed; if both are given the explicit variables win.
/// Likewise for [`bin_members`] and [`all_valid_members`]: explicit
/// membership defines the universe as the union of all bins.
///
/// [`number_of_variables`]: CandidateConfig::number_of_variables
/// [`bin_variables`]: CandidateConfig::bin_variables
/// [`bin_members`]: CandidateConfig::bin_members
/// [`all_valid_members`]: CandidateConfig::all_valid_members
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateConfig {
    /// Number of bins in the candidate.
    pub number_of_bins: NonZeroUsize,
    /// Number of variables per bin. Bin variables are
    /// drawn uniformly from `[0, 1)` when this is used.
    pub number_of_variables: Option<usize>,
    /// Initial variables of each bin.
    pub bin_variables: Option<Vec<Vec<f64>>>,
    /// Initial members of each bin.
    pub bin_members: Option<Vec<Vec<Member>>>,
    /// Every scenario member the candidate must cover.
    /// Members not in any bin are left unassigned until
    /// [`assign_missing_members`] is called.
    ///
    /// [`assign_missing_members`]: crate::MultiBinCandidate::assign_missing_members
    pub all_valid_members: Option<Vec<Member>>,
}

impl CandidateConfig {
    /// Returns a configuration with only the bin count set.
    /// It is meant to be completed with struct update syntax.
    ///
    /// # Examples
    /// ```
    /// use hydrobin::CandidateConfig;
    /// use std::num::NonZeroUsize;
    ///
    /// let cfg = CandidateConfig {
    ///     number_of_variables: Some(4),
    ///     all_valid_members: Some((0..10).collect()),
    ///     ..CandidateConfig::empty(NonZeroUsize::new(3).unwrap())
    /// };
    /// ```
    pub const fn empty(number_of_bins: NonZeroUsize) -> CandidateConfig {
        CandidateConfig {
            number_of_bins,
            number_of_variables: None,
            bin_variables: None,
            bin_members: None,
            all_valid_members: None,
        }
    }
}
