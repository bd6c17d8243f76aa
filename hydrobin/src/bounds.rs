//! Bound-clamping strategies for candidate variables.
//!
//! Variation operators take the bounder explicitly; they
//! never bound per bin, only once per produced candidate.
use crate::MultiBinCandidate;

use serde::{Deserialize, Serialize};

/// An interface for bounding a candidate's variables.
pub trait Bounder {
    /// Brings every variable of `candidate` within bounds.
    fn bound(&self, candidate: &mut MultiBinCandidate);
}

impl<B: Bounder + ?Sized> Bounder for &B {
    fn bound(&self, candidate: &mut MultiBinCandidate) {
        (**self).bound(candidate)
    }
}

/// A bounder that leaves candidates untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullBounder;

impl Bounder for NullBounder {
    fn bound(&self, _candidate: &mut MultiBinCandidate) {}
}

/// Elementwise bounds for each bin of a candidate.
///
/// Bins without an entry, and variables beyond the
/// length of their bin's bounds, are left unbounded.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BinBounds {
    /// `(lower, upper)` bounds of each bin's variables.
    pub bins: Vec<(Vec<f64>, Vec<f64>)>,
}

impl BinBounds {
    /// Returns bounds that are the same for every one of `number_of_bins` bins.
    ///
    /// # Examples
    /// ```
    /// use hydrobin::BinBounds;
    ///
    /// let bounds = BinBounds::uniform(3, vec![0.0, -1.0], vec![1.0, 1.0]);
    /// assert_eq!(bounds.bins.len(), 3);
    /// ```
    pub fn uniform(number_of_bins: usize, lower: Vec<f64>, upper: Vec<f64>) -> BinBounds {
        BinBounds {
            bins: vec![(lower, upper); number_of_bins],
        }
    }
}

impl Bounder for BinBounds {
    fn bound(&self, candidate: &mut MultiBinCandidate) {
        for (bin, (lower, upper)) in candidate.bins_mut().iter_mut().zip(&self.bins) {
            clamp_slice(bin.variables_mut(), lower, upper);
        }
    }
}

/// Clamps each value into `[lower[i], upper[i]]`.
pub fn clamp_slice(values: &mut [f64], lower: &[f64], upper: &[f64]) {
    for ((v, l), u) in values.iter_mut().zip(lower).zip(upper) {
        *v = v.max(*l).min(*u);
    }
}
