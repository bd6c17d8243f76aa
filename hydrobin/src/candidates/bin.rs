use crate::Member;

use ndarray::{Array2, ArrayViewMut1};
use serde::{Deserialize, Serialize};

use std::collections::BTreeSet;
use std::fmt;

/// A single bin of a [`MultiBinCandidate`]: one parameter
/// vector shared by every scenario member assigned to it.
///
/// Members are kept ordered so that random choices
/// made over them are reproducible under a seeded RNG.
///
/// [`MultiBinCandidate`]: crate::MultiBinCandidate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BinnedScenarioCandidate {
    variables: Vec<f64>,
    members: BTreeSet<Member>,
}

impl BinnedScenarioCandidate {
    /// Returns a new bin with the given initial variables and members.
    /// Duplicate members are collapsed.
    ///
    /// # Examples
    /// ```
    /// use hydrobin::BinnedScenarioCandidate;
    ///
    /// let bin = BinnedScenarioCandidate::new(vec![0.5, 1.5], [3, 1, 3]);
    ///
    /// assert_eq!(bin.number_of_variables(), 2);
    /// assert_eq!(bin.number_of_members(), 2);
    /// ```
    pub fn new(
        initial_variables: Vec<f64>,
        members: impl IntoIterator<Item = Member>,
    ) -> BinnedScenarioCandidate {
        BinnedScenarioCandidate {
            variables: initial_variables,
            members: members.into_iter().collect(),
        }
    }

    /// Returns the bin's parameter vector.
    pub fn variables(&self) -> &[f64] {
        &self.variables
    }

    /// Returns the bin's parameter vector mutably.
    /// Its length cannot be changed through this reference.
    pub fn variables_mut(&mut self) -> &mut [f64] {
        &mut self.variables
    }

    /// Replaces the bin's parameter vector. A vector of another length
    /// than the candidate's variable count makes
    /// [`MultiBinCandidate::validate`] fail.
    ///
    /// [`MultiBinCandidate::validate`]: crate::MultiBinCandidate::validate
    pub fn set_variables(&mut self, variables: Vec<f64>) {
        self.variables = variables;
    }

    /// Returns an iterator over the bin's members, in increasing order.
    pub fn members(&self) -> impl Iterator<Item = Member> + '_ {
        self.members.iter().copied()
    }

    /// Returns whether `member` is assigned to this bin.
    pub fn contains(&self, member: Member) -> bool {
        self.members.contains(&member)
    }

    pub fn number_of_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn number_of_members(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Writes the bin's variables into row `m` of `a`
    /// for every member `m` of the bin, and returns `a`.
    ///
    /// # Panics
    /// Panics if a member is not a valid row of `a`, or if
    /// the row length differs from the number of variables.
    /// [`MultiBinCandidate::get_variable_array`] validates
    /// both before calling this.
    ///
    /// [`MultiBinCandidate::get_variable_array`]: crate::MultiBinCandidate::get_variable_array
    ///
    /// # Examples
    /// ```
    /// use hydrobin::BinnedScenarioCandidate;
    /// use ndarray::{array, Array2};
    ///
    /// let bin = BinnedScenarioCandidate::new(vec![7.0, 8.0], [0, 2]);
    /// let mut a = Array2::zeros((3, 2));
    ///
    /// bin.populate_variable_array(&mut a);
    ///
    /// assert_eq!(a, array![[7.0, 8.0], [0.0, 0.0], [7.0, 8.0]]);
    /// ```
    pub fn populate_variable_array<'a>(&self, a: &'a mut Array2<f64>) -> &'a mut Array2<f64> {
        for &m in &self.members {
            let mut row: ArrayViewMut1<f64> = a.row_mut(m);
            row.iter_mut()
                .zip(&self.variables)
                .for_each(|(cell, v)| *cell = *v);
        }
        a
    }

    pub(crate) fn insert(&mut self, member: Member) -> bool {
        self.members.insert(member)
    }

    pub(crate) fn remove(&mut self, member: Member) -> bool {
        self.members.remove(&member)
    }

    pub(crate) fn replace_members(&mut self, members: BTreeSet<Member>) {
        self.members = members;
    }
}

impl fmt::Display for BinnedScenarioCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} <- {{{}}}",
            self.variables,
            self.members
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
