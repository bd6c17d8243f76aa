//! A candidate is a fixed number of bins partitioning
//! a universe of scenario members. Every member shares
//! the parameter vector of the bin it is assigned to.
mod bin;
mod config;
mod errors;

pub use bin::BinnedScenarioCandidate;
pub use config::CandidateConfig;
pub use errors::CandidateError;

use crate::Member;

use ahash::AHashSet;
use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use std::collections::BTreeSet;
use std::fmt;

/// An optimisation candidate made of [`BinnedScenarioCandidate`]s.
///
/// The member universe is always the index range `0..n`,
/// so that per-member arrays can be indexed by member.
///
/// Deserialisation performs the same structural checks as
/// [`MultiBinCandidate::new`]: at least one bin, a `0..n`
/// universe, and one variable vector length for all bins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCandidate")]
pub struct MultiBinCandidate {
    bins: Vec<BinnedScenarioCandidate>,
    all_valid_members: Vec<Member>,
    number_of_variables: usize,
}

/// Unchecked serialised form of a [`MultiBinCandidate`].
#[derive(Deserialize)]
struct RawCandidate {
    bins: Vec<BinnedScenarioCandidate>,
    all_valid_members: Vec<Member>,
    number_of_variables: usize,
}

impl TryFrom<RawCandidate> for MultiBinCandidate {
    type Error = CandidateError;

    fn try_from(raw: RawCandidate) -> Result<MultiBinCandidate, CandidateError> {
        if raw.bins.is_empty() {
            return Err(CandidateError::NoBins);
        }
        check_universe(&raw.all_valid_members)?;
        let candidate = MultiBinCandidate {
            bins: raw.bins,
            all_valid_members: raw.all_valid_members,
            number_of_variables: raw.number_of_variables,
        };
        candidate.check_dimensions()?;
        Ok(candidate)
    }
}

impl MultiBinCandidate {
    /// Creates a new candidate from the passed configuration.
    /// `rng` is only used when bin variables have to be generated.
    ///
    /// # Errors
    /// Returns [`CandidateError::MissingVariables`] if neither a
    /// variable count nor bin variables are configured, and
    /// [`CandidateError::MissingMembership`] if neither bin members
    /// nor a member universe are. Per-bin lists must have one entry
    /// per bin, variable vectors must all be the same length, and
    /// the members must be exactly the indices `0..n` with no
    /// member listed twice.
    ///
    /// # Examples
    /// ```
    /// use hydrobin::{CandidateConfig, MultiBinCandidate};
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use std::num::NonZeroUsize;
    ///
    /// let mut rng = StdRng::seed_from_u64(0);
    /// let candidate = MultiBinCandidate::new(
    ///     CandidateConfig {
    ///         bin_variables: Some(vec![vec![1.0], vec![2.0]]),
    ///         bin_members: Some(vec![vec![0, 2], vec![1]]),
    ///         ..CandidateConfig::empty(NonZeroUsize::new(2).unwrap())
    ///     },
    ///     &mut rng,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(candidate.number_of_members(), 3);
    /// assert_eq!(candidate.get_bin_indices_array().unwrap().to_vec(), vec![0, 1, 0]);
    /// ```
    pub fn new<R: Rng + ?Sized>(
        config: CandidateConfig,
        rng: &mut R,
    ) -> Result<MultiBinCandidate, CandidateError> {
        let number_of_bins = config.number_of_bins.get();

        let bin_variables = match (config.bin_variables, config.number_of_variables) {
            (Some(bin_variables), _) => {
                check_bin_count("bin_variables", number_of_bins, bin_variables.len())?;
                bin_variables
            }
            (None, Some(n)) => (0..number_of_bins)
                .map(|_| (0..n).map(|_| rng.gen::<f64>()).collect())
                .collect(),
            (None, None) => return Err(CandidateError::MissingVariables),
        };
        let number_of_variables = config
            .number_of_variables
            .unwrap_or_else(|| bin_variables[0].len());
        for (bin, variables) in bin_variables.iter().enumerate() {
            if variables.len() != number_of_variables {
                return Err(CandidateError::VariableCountMismatch {
                    bin,
                    expected: number_of_variables,
                    found: variables.len(),
                });
            }
        }

        let (bin_members, all_valid_members) = match (config.bin_members, config.all_valid_members)
        {
            (Some(bin_members), _) => {
                check_bin_count("bin_members", number_of_bins, bin_members.len())?;
                let all_valid_members = bin_members.iter().flatten().copied().collect();
                (bin_members, all_valid_members)
            }
            (None, Some(all_valid_members)) => (vec![vec![]; number_of_bins], all_valid_members),
            (None, None) => return Err(CandidateError::MissingMembership),
        };
        check_universe(&all_valid_members)?;

        Ok(MultiBinCandidate {
            bins: bin_variables
                .into_iter()
                .zip(bin_members)
                .map(|(variables, members)| BinnedScenarioCandidate::new(variables, members))
                .collect(),
            all_valid_members,
            number_of_variables,
        })
    }

    pub fn number_of_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn number_of_variables(&self) -> usize {
        self.number_of_variables
    }

    /// Returns the number of members currently assigned
    /// across all bins. This equals the universe size
    /// only while the membership invariant holds.
    pub fn number_of_members(&self) -> usize {
        self.bins.iter().map(|b| b.number_of_members()).sum()
    }

    /// Returns the member universe the candidate must cover.
    pub fn all_valid_members(&self) -> &[Member] {
        &self.all_valid_members
    }

    pub fn bins(&self) -> &[BinnedScenarioCandidate] {
        &self.bins
    }

    pub fn bin(&self, index: usize) -> Option<&BinnedScenarioCandidate> {
        self.bins.get(index)
    }

    /// Returns a bin mutably, allowing its variables to be changed.
    /// Membership changes go through [`update_bin_members`].
    ///
    /// [`update_bin_members`]: MultiBinCandidate::update_bin_members
    pub fn bin_mut(&mut self, index: usize) -> Option<&mut BinnedScenarioCandidate> {
        self.bins.get_mut(index)
    }

    pub(crate) fn bins_mut(&mut self) -> &mut [BinnedScenarioCandidate] {
        &mut self.bins
    }

    /// Checks that every bin holds [`number_of_variables`] variables
    /// and that every member of the universe is assigned to exactly
    /// one bin.
    ///
    /// [`number_of_variables`]: MultiBinCandidate::number_of_variables
    ///
    /// # Errors
    /// Returns the first violation found: a bin with the wrong number
    /// of variables, a bin holding a member outside the universe, a
    /// member held by two bins, or a member held by none.
    pub fn validate(&self) -> Result<(), CandidateError> {
        self.check_dimensions()?;
        self.owning_bins().map(|_| ())
    }

    /// Builds the `members ⨯ variables` array in which row `m`
    /// holds the variables of the bin owning member `m`.
    ///
    /// # Errors
    /// Fails if [`validate`] does, as some rows would
    /// otherwise be left undefined or partly filled.
    ///
    /// [`validate`]: MultiBinCandidate::validate
    ///
    /// # Examples
    /// ```
    /// use hydrobin::{CandidateConfig, MultiBinCandidate};
    /// use ndarray::array;
    /// use std::num::NonZeroUsize;
    ///
    /// let candidate = MultiBinCandidate::new(
    ///     CandidateConfig {
    ///         bin_variables: Some(vec![vec![1.0, 2.0], vec![3.0, 4.0]]),
    ///         bin_members: Some(vec![vec![1], vec![0]]),
    ///         ..CandidateConfig::empty(NonZeroUsize::new(2).unwrap())
    ///     },
    ///     &mut rand::thread_rng(),
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(candidate.get_variable_array().unwrap(), array![[3.0, 4.0], [1.0, 2.0]]);
    /// ```
    pub fn get_variable_array(&self) -> Result<Array2<f64>, CandidateError> {
        self.validate()?;
        let mut a = Array2::zeros((self.all_valid_members.len(), self.number_of_variables));
        for b in &self.bins {
            b.populate_variable_array(&mut a);
        }
        Ok(a)
    }

    /// Builds the array mapping each member to the index of its bin.
    ///
    /// # Errors
    /// Fails if the membership invariant does not hold.
    pub fn get_bin_indices_array(&self) -> Result<Array1<usize>, CandidateError> {
        self.owning_bins().map(Array1::from)
    }

    /// Assigns `new_members` to bin `target_bin` exclusively,
    /// removing them from every other bin.
    ///
    /// This is a partial reassignment: members previously in
    /// `target_bin` that are not in `new_members` become unassigned.
    /// Call [`assign_missing_members`] afterwards to restore the
    /// membership invariant.
    ///
    /// [`assign_missing_members`]: MultiBinCandidate::assign_missing_members
    ///
    /// # Errors
    /// Fails without modifying the candidate if `target_bin`
    /// does not exist or any new member is outside the universe.
    ///
    /// # Examples
    /// ```
    /// use hydrobin::{CandidateConfig, MultiBinCandidate};
    /// use std::num::NonZeroUsize;
    ///
    /// let mut candidate = MultiBinCandidate::new(
    ///     CandidateConfig {
    ///         bin_variables: Some(vec![vec![0.0], vec![1.0]]),
    ///         bin_members: Some(vec![vec![0, 1], vec![2, 3]]),
    ///         ..CandidateConfig::empty(NonZeroUsize::new(2).unwrap())
    ///     },
    ///     &mut rand::thread_rng(),
    /// )
    /// .unwrap();
    ///
    /// candidate.update_bin_members(1, [1, 2]).unwrap();
    ///
    /// // Member 3 was dropped from bin 1 and is now unassigned.
    /// assert_eq!(candidate.bin(0).unwrap().members().collect::<Vec<_>>(), vec![0]);
    /// assert_eq!(candidate.bin(1).unwrap().members().collect::<Vec<_>>(), vec![1, 2]);
    /// assert!(candidate.validate().is_err());
    /// ```
    pub fn update_bin_members(
        &mut self,
        target_bin: usize,
        new_members: impl IntoIterator<Item = Member>,
    ) -> Result<(), CandidateError> {
        if target_bin >= self.bins.len() {
            return Err(CandidateError::BinOutOfRange {
                index: target_bin,
                number_of_bins: self.bins.len(),
            });
        }
        let universe_size = self.all_valid_members.len();
        let new_members: BTreeSet<Member> = new_members.into_iter().collect();
        if let Some(&member) = new_members.iter().find(|&&m| m >= universe_size) {
            return Err(CandidateError::MemberOutOfRange {
                member,
                universe_size,
            });
        }

        for (i, b) in self.bins.iter_mut().enumerate() {
            if i != target_bin {
                for &m in &new_members {
                    b.remove(m);
                }
            }
        }
        self.bins[target_bin].replace_members(new_members);
        Ok(())
    }

    /// Assigns every unassigned universe member to a uniformly
    /// chosen bin, and returns how many members were assigned.
    ///
    /// Does nothing (and draws no random numbers) if all
    /// members are already assigned.
    ///
    /// # Examples
    /// ```
    /// use hydrobin::{CandidateConfig, MultiBinCandidate};
    /// use std::num::NonZeroUsize;
    ///
    /// let mut rng = rand::thread_rng();
    /// let mut candidate = MultiBinCandidate::new(
    ///     CandidateConfig {
    ///         number_of_variables: Some(2),
    ///         all_valid_members: Some((0..8).collect()),
    ///         ..CandidateConfig::empty(NonZeroUsize::new(3).unwrap())
    ///     },
    ///     &mut rng,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(candidate.assign_missing_members(&mut rng), 8);
    /// assert_eq!(candidate.assign_missing_members(&mut rng), 0);
    /// assert!(candidate.validate().is_ok());
    /// ```
    pub fn assign_missing_members<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let assigned: AHashSet<Member> = self.bins.iter().flat_map(|b| b.members()).collect();
        let number_of_bins = self.bins.len();
        let mut count = 0;
        for &m in &self.all_valid_members {
            if assigned.contains(&m) {
                continue;
            }
            let ibin = rng.gen_range(0..number_of_bins);
            self.bins[ibin].insert(m);
            count += 1;
        }
        if count > 0 {
            debug!(count, "assigned missing members to random bins");
        }
        count
    }

    fn check_dimensions(&self) -> Result<(), CandidateError> {
        match self
            .bins
            .iter()
            .position(|b| b.number_of_variables() != self.number_of_variables)
        {
            Some(bin) => Err(CandidateError::VariableCountMismatch {
                bin,
                expected: self.number_of_variables,
                found: self.bins[bin].number_of_variables(),
            }),
            None => Ok(()),
        }
    }

    /// Returns, for each member, the index of the bin that owns it.
    fn owning_bins(&self) -> Result<Vec<usize>, CandidateError> {
        let universe_size = self.all_valid_members.len();
        let mut owners: Vec<Option<usize>> = vec![None; universe_size];
        for (bin, b) in self.bins.iter().enumerate() {
            for member in b.members() {
                match owners.get_mut(member) {
                    None => return Err(CandidateError::ForeignMember { bin, member }),
                    Some(owner) => {
                        if owner.replace(bin).is_some() {
                            return Err(CandidateError::DuplicateMember(member));
                        }
                    }
                }
            }
        }
        owners
            .into_iter()
            .enumerate()
            .map(|(member, owner)| owner.ok_or(CandidateError::UnassignedMember(member)))
            .collect()
    }
}

impl fmt::Display for MultiBinCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MultiBinCandidate {{")?;
        for (i, b) in self.bins.iter().enumerate() {
            writeln!(f, "\t{}: {}", i, b)?;
        }
        write!(f, "}}")
    }
}

fn check_bin_count(field: &'static str, expected: usize, found: usize) -> Result<(), CandidateError> {
    if expected == found {
        Ok(())
    } else {
        Err(CandidateError::BinCountMismatch {
            field,
            expected,
            found,
        })
    }
}

/// Checks that `members` are exactly the indices `0..members.len()`.
fn check_universe(members: &[Member]) -> Result<(), CandidateError> {
    let universe_size = members.len();
    let mut seen = vec![false; universe_size];
    for &member in members {
        match seen.get_mut(member) {
            None => {
                return Err(CandidateError::MemberOutOfRange {
                    member,
                    universe_size,
                })
            }
            Some(true) => return Err(CandidateError::DuplicateMember(member)),
            Some(flag) => *flag = true,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::num::NonZeroUsize;

    fn three_bins() -> MultiBinCandidate {
        MultiBinCandidate::new(
            CandidateConfig {
                bin_variables: Some(vec![vec![0.0, 0.5], vec![1.0, 1.5], vec![2.0, 2.5]]),
                bin_members: Some(vec![vec![0, 1], vec![2, 3], vec![4, 5]]),
                ..CandidateConfig::empty(NonZeroUsize::new(3).unwrap())
            },
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap()
    }

    #[test]
    fn bin_indices_of_contiguous_bins() {
        let candidate = three_bins();
        assert_eq!(
            candidate.get_bin_indices_array().unwrap().to_vec(),
            vec![0, 0, 1, 1, 2, 2]
        );
    }

    #[test]
    fn variable_array_agrees_with_bin_indices() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut candidate = MultiBinCandidate::new(
            CandidateConfig {
                number_of_variables: Some(3),
                all_valid_members: Some((0..20).collect()),
                ..CandidateConfig::empty(NonZeroUsize::new(4).unwrap())
            },
            &mut rng,
        )
        .unwrap();
        candidate.assign_missing_members(&mut rng);

        let variables = candidate.get_variable_array().unwrap();
        let indices = candidate.get_bin_indices_array().unwrap();
        assert_eq!(variables.dim(), (20, 3));
        for (m, &ibin) in indices.iter().enumerate() {
            assert_eq!(
                variables.row(m).to_vec(),
                candidate.bin(ibin).unwrap().variables()
            );
        }
    }

    #[test]
    fn generated_variables_are_unit_uniform() {
        let candidate = MultiBinCandidate::new(
            CandidateConfig {
                number_of_variables: Some(5),
                all_valid_members: Some(vec![0]),
                ..CandidateConfig::empty(NonZeroUsize::new(2).unwrap())
            },
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap();
        assert_eq!(candidate.number_of_variables(), 5);
        assert!(candidate
            .bins()
            .iter()
            .flat_map(|b| b.variables())
            .all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn missing_variables() {
        let result = MultiBinCandidate::new(
            CandidateConfig {
                all_valid_members: Some(vec![0, 1]),
                ..CandidateConfig::empty(NonZeroUsize::new(2).unwrap())
            },
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(result, Err(CandidateError::MissingVariables));
    }

    #[test]
    fn missing_membership() {
        let result = MultiBinCandidate::new(
            CandidateConfig {
                number_of_variables: Some(1),
                ..CandidateConfig::empty(NonZeroUsize::new(2).unwrap())
            },
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(result, Err(CandidateError::MissingMembership));
    }

    #[test]
    fn ragged_bin_variables() {
        let result = MultiBinCandidate::new(
            CandidateConfig {
                bin_variables: Some(vec![vec![0.0, 1.0], vec![0.0]]),
                all_valid_members: Some(vec![0]),
                ..CandidateConfig::empty(NonZeroUsize::new(2).unwrap())
            },
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(
            result,
            Err(CandidateError::VariableCountMismatch {
                bin: 1,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn invalid_universes() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = CandidateConfig {
            number_of_variables: Some(1),
            ..CandidateConfig::empty(NonZeroUsize::new(2).unwrap())
        };
        assert_eq!(
            MultiBinCandidate::new(
                CandidateConfig {
                    all_valid_members: Some(vec![0, 1, 1]),
                    ..config.clone()
                },
                &mut rng
            ),
            Err(CandidateError::DuplicateMember(1))
        );
        assert_eq!(
            MultiBinCandidate::new(
                CandidateConfig {
                    bin_members: Some(vec![vec![0], vec![5]]),
                    ..config.clone()
                },
                &mut rng
            ),
            Err(CandidateError::MemberOutOfRange {
                member: 5,
                universe_size: 2
            })
        );
        assert_eq!(
            MultiBinCandidate::new(
                CandidateConfig {
                    bin_members: Some(vec![vec![0, 1]]),
                    ..config
                },
                &mut rng
            ),
            Err(CandidateError::BinCountMismatch {
                field: "bin_members",
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn arrays_require_complete_membership() {
        let mut candidate = three_bins();
        candidate.update_bin_members(0, [0]).unwrap();
        assert_eq!(
            candidate.get_variable_array(),
            Err(CandidateError::UnassignedMember(1))
        );
        assert_eq!(
            candidate.get_bin_indices_array(),
            Err(CandidateError::UnassignedMember(1))
        );
    }

    #[test]
    fn update_bin_members_moves_members_exclusively() {
        let mut candidate = three_bins();
        candidate.update_bin_members(2, [0, 2, 4, 5]).unwrap();
        let members: Vec<Vec<Member>> = candidate
            .bins()
            .iter()
            .map(|b| b.members().collect())
            .collect();
        assert_eq!(members, vec![vec![1], vec![3], vec![0, 2, 4, 5]]);
        assert!(candidate.validate().is_ok());
    }

    #[test]
    fn update_bin_members_rejects_bad_input() {
        let mut candidate = three_bins();
        let before = candidate.clone();
        assert_eq!(
            candidate.update_bin_members(3, [0]),
            Err(CandidateError::BinOutOfRange {
                index: 3,
                number_of_bins: 3
            })
        );
        assert_eq!(
            candidate.update_bin_members(0, [0, 6]),
            Err(CandidateError::MemberOutOfRange {
                member: 6,
                universe_size: 6
            })
        );
        assert_eq!(candidate, before);
    }

    #[test]
    fn assign_missing_members_restores_invariant() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut candidate = three_bins();
        candidate.update_bin_members(1, []).unwrap();
        assert_eq!(candidate.number_of_members(), 4);

        assert_eq!(candidate.assign_missing_members(&mut rng), 2);
        assert_eq!(candidate.number_of_members(), 6);
        candidate.validate().unwrap();

        let repaired = candidate.clone();
        assert_eq!(candidate.assign_missing_members(&mut rng), 0);
        assert_eq!(candidate, repaired);
    }

    #[test]
    fn validate_rejects_wrong_variable_count() {
        let mut candidate = three_bins();
        candidate.bin_mut(1).unwrap().set_variables(vec![9.0]);
        let error = CandidateError::VariableCountMismatch {
            bin: 1,
            expected: 2,
            found: 1,
        };
        assert_eq!(candidate.validate(), Err(error.clone()));
        assert_eq!(candidate.get_variable_array(), Err(error));

        candidate.bin_mut(1).unwrap().set_variables(vec![9.0, 9.5, 10.0]);
        assert!(matches!(
            candidate.validate(),
            Err(CandidateError::VariableCountMismatch { found: 3, .. })
        ));
    }

    #[test]
    fn deserialize_rejects_malformed_candidates() {
        let read = |json: &str| serde_json::from_str::<MultiBinCandidate>(json);
        assert!(read(r#"{"bins":[],"all_valid_members":[0,1],"number_of_variables":1}"#).is_err());
        assert!(read(
            r#"{"bins":[{"variables":[0.0],"members":[0]}],"all_valid_members":[0,5],"number_of_variables":1}"#
        )
        .is_err());
        assert!(read(
            r#"{"bins":[{"variables":[0.0],"members":[0]},{"variables":[1.0,2.0],"members":[1]}],"all_valid_members":[0,1],"number_of_variables":1}"#
        )
        .is_err());

        let partial = read(
            r#"{"bins":[{"variables":[0.0],"members":[0]},{"variables":[1.0],"members":[]}],"all_valid_members":[0,1],"number_of_variables":1}"#,
        )
        .unwrap();
        assert_eq!(partial.number_of_bins(), 2);
        assert_eq!(partial.validate(), Err(CandidateError::UnassignedMember(1)));
    }

    #[test]
    fn serde_preserves_candidate() {
        let candidate = three_bins();
        let json = serde_json::to_string(&candidate).unwrap();
        let back: MultiBinCandidate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, candidate);
    }
}
