//! Decision variables of a simulation model.
//!
//! A binned optimisation model has exactly one
//! [`BinnedScenarioParameter`], deciding which bin each
//! scenario uses, and any number of [`BinnedParameter`]s,
//! each holding one [`BoundedParameter`] per bin.
use crate::errors::ModelError;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// The bound-provider contract of variable-owning entities.
pub trait Bounded {
    /// Lower bounds, one per value.
    fn lower_bounds(&self) -> &[f64];
    /// Upper bounds, one per value.
    fn upper_bounds(&self) -> &[f64];
    /// Number of values.
    fn size(&self) -> usize;
    /// Changes the number of values.
    fn set_size(&mut self, size: usize);
}

/// Kind of a model parameter, as recorded in archives.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Constant,
    MonthlyProfile,
    WeeklyProfile,
    DailyProfile,
    ControlCurve,
    Custom(String),
}

/// A variable model parameter with elementwise bounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundedParameter {
    name: String,
    kind: ParameterKind,
    lower: Vec<f64>,
    upper: Vec<f64>,
    values: Vec<f64>,
}

impl BoundedParameter {
    /// Returns a new parameter whose values start at the
    /// midpoint of their bounds.
    ///
    /// # Errors
    /// Fails if the bounds differ in length, are not finite,
    /// or if any lower bound exceeds its upper bound.
    ///
    /// # Examples
    /// ```
    /// use hydrobin_model::parameters::{Bounded, BoundedParameter, ParameterKind};
    ///
    /// let p = BoundedParameter::new("release", ParameterKind::MonthlyProfile, vec![0.0; 12], vec![10.0; 12]).unwrap();
    ///
    /// assert_eq!(p.size(), 12);
    /// assert_eq!(p.values()[0], 5.0);
    /// ```
    pub fn new(
        name: impl Into<String>,
        kind: ParameterKind,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<BoundedParameter, ModelError> {
        let name = name.into();
        let invalid = |reason| ModelError::InvalidBounds {
            parameter: name.clone(),
            reason,
        };
        if lower.len() != upper.len() {
            return Err(invalid("lower and upper bounds differ in length"));
        }
        if lower.iter().chain(&upper).any(|b| !b.is_finite()) {
            return Err(invalid("bounds must be finite"));
        }
        if lower.iter().zip(&upper).any(|(l, u)| l > u) {
            return Err(invalid("lower bound exceeds upper bound"));
        }
        let values = lower.iter().zip(&upper).map(|(l, u)| (l + u) / 2.0).collect();
        Ok(BoundedParameter {
            name,
            kind,
            lower,
            upper,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Sets the parameter's values. Values are taken as given;
    /// bounding is the caller's responsibility.
    ///
    /// # Errors
    /// Fails if `values` is not exactly [`size`] long.
    ///
    /// [`size`]: Bounded::size
    pub fn update(&mut self, values: &[f64]) -> Result<(), ModelError> {
        if values.len() != self.values.len() {
            return Err(ModelError::ValueCountMismatch {
                parameter: self.name.clone(),
                expected: self.values.len(),
                found: values.len(),
            });
        }
        self.values.copy_from_slice(values);
        Ok(())
    }
}

impl Bounded for BoundedParameter {
    fn lower_bounds(&self) -> &[f64] {
        &self.lower
    }

    fn upper_bounds(&self) -> &[f64] {
        &self.upper
    }

    fn size(&self) -> usize {
        self.values.len()
    }

    /// Truncates, or extends by repeating the last bounds and value.
    /// An empty parameter is extended with zeros.
    fn set_size(&mut self, size: usize) {
        for v in [&mut self.lower, &mut self.upper, &mut self.values] {
            let fill = v.last().copied().unwrap_or(0.0);
            v.resize(size, fill);
        }
    }
}

/// A parameter taking a separate set of values in each bin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BinnedParameter {
    name: String,
    parameters: Vec<BoundedParameter>,
}

impl BinnedParameter {
    /// Returns a binned parameter with one parameter per bin.
    ///
    /// # Errors
    /// Fails if `parameters` is empty, or if the per-bin
    /// parameters differ in size.
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<BoundedParameter>,
    ) -> Result<BinnedParameter, ModelError> {
        let name = name.into();
        let size = match parameters.first() {
            Some(p) => p.size(),
            None => return Err(ModelError::EmptyBinnedParameter(name)),
        };
        if parameters.iter().any(|p| p.size() != size) {
            return Err(ModelError::InconsistentBinSizes(name));
        }
        Ok(BinnedParameter { name, parameters })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number_of_bins(&self) -> usize {
        self.parameters.len()
    }

    /// Number of values in each bin.
    pub fn size(&self) -> usize {
        self.parameters[0].size()
    }

    pub fn parameters(&self) -> &[BoundedParameter] {
        &self.parameters
    }

    pub fn parameter(&self, bin: usize) -> Option<&BoundedParameter> {
        self.parameters.get(bin)
    }

    pub fn parameter_mut(&mut self, bin: usize) -> Option<&mut BoundedParameter> {
        self.parameters.get_mut(bin)
    }
}

/// The parameter assigning each scenario to a bin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BinnedScenarioParameter {
    name: String,
    number_of_bins: NonZeroUsize,
    scenario_size: usize,
    indices: Vec<usize>,
}

impl BinnedScenarioParameter {
    /// Returns a parameter with every scenario in bin 0.
    pub fn new(
        name: impl Into<String>,
        number_of_bins: NonZeroUsize,
        scenario_size: usize,
    ) -> BinnedScenarioParameter {
        BinnedScenarioParameter {
            name: name.into(),
            number_of_bins,
            scenario_size,
            indices: vec![0; scenario_size],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number_of_bins(&self) -> usize {
        self.number_of_bins.get()
    }

    pub(crate) fn non_zero_bins(&self) -> NonZeroUsize {
        self.number_of_bins
    }

    /// Number of scenarios distributed among the bins.
    pub fn scenario_size(&self) -> usize {
        self.scenario_size
    }

    /// Bin index of every scenario.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Returns the bin of `scenario`.
    pub fn bin_of(&self, scenario: usize) -> Option<usize> {
        self.indices.get(scenario).copied()
    }

    /// Sets the bin index of every scenario.
    ///
    /// # Errors
    /// Fails if there is not exactly one index per scenario,
    /// or if an index is not a valid bin.
    ///
    /// # Examples
    /// ```
    /// use hydrobin_model::parameters::BinnedScenarioParameter;
    /// use std::num::NonZeroUsize;
    ///
    /// let mut p = BinnedScenarioParameter::new("bins", NonZeroUsize::new(2).unwrap(), 3);
    ///
    /// assert!(p.update_indices(&[1, 0, 1]).is_ok());
    /// assert!(p.update_indices(&[1, 0, 2]).is_err());
    /// assert_eq!(p.bin_of(2), Some(1));
    /// ```
    pub fn update_indices(&mut self, indices: &[usize]) -> Result<(), ModelError> {
        let invalid = |reason| ModelError::InvalidBinIndices {
            parameter: self.name.clone(),
            reason,
        };
        if indices.len() != self.scenario_size {
            return Err(invalid("expected one index per scenario"));
        }
        if indices.iter().any(|&i| i >= self.number_of_bins.get()) {
            return Err(invalid("bin index out of range"));
        }
        self.indices.copy_from_slice(indices);
        Ok(())
    }
}

/// A model variable, as collected from the model's nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Variable {
    BinnedScenario(BinnedScenarioParameter),
    Binned(BinnedParameter),
    Plain(BoundedParameter),
}

impl Variable {
    pub fn name(&self) -> &str {
        match self {
            Variable::BinnedScenario(p) => p.name(),
            Variable::Binned(p) => p.name(),
            Variable::Plain(p) => p.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_bounds() {
        assert!(matches!(
            BoundedParameter::new("p", ParameterKind::Constant, vec![0.0], vec![]),
            Err(ModelError::InvalidBounds { .. })
        ));
        assert!(matches!(
            BoundedParameter::new("p", ParameterKind::Constant, vec![2.0], vec![1.0]),
            Err(ModelError::InvalidBounds { .. })
        ));
        assert!(matches!(
            BoundedParameter::new("p", ParameterKind::Constant, vec![f64::NEG_INFINITY], vec![1.0]),
            Err(ModelError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn update_checks_length() {
        let mut p =
            BoundedParameter::new("p", ParameterKind::Constant, vec![0.0; 2], vec![1.0; 2]).unwrap();
        p.update(&[0.25, 0.75]).unwrap();
        assert_eq!(p.values(), &[0.25, 0.75]);
        assert!(matches!(
            p.update(&[0.0]),
            Err(ModelError::ValueCountMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn set_size_repeats_last_entry() {
        let mut p =
            BoundedParameter::new("p", ParameterKind::Constant, vec![0.0, 1.0], vec![2.0, 3.0])
                .unwrap();
        p.set_size(4);
        assert_eq!(p.lower_bounds(), &[0.0, 1.0, 1.0, 1.0]);
        assert_eq!(p.upper_bounds(), &[2.0, 3.0, 3.0, 3.0]);
        assert_eq!(p.values(), &[1.0, 2.0, 2.0, 2.0]);
        p.set_size(1);
        assert_eq!(p.size(), 1);
    }

    #[test]
    fn binned_parameter_sizes_must_agree() {
        let a = BoundedParameter::new("a", ParameterKind::Constant, vec![0.0], vec![1.0]).unwrap();
        let b =
            BoundedParameter::new("b", ParameterKind::Constant, vec![0.0; 2], vec![1.0; 2]).unwrap();
        assert!(matches!(
            BinnedParameter::new("x", vec![a.clone(), b]),
            Err(ModelError::InconsistentBinSizes(_))
        ));
        assert!(matches!(
            BinnedParameter::new("x", vec![]),
            Err(ModelError::EmptyBinnedParameter(_))
        ));
        assert_eq!(BinnedParameter::new("x", vec![a.clone(), a]).unwrap().size(), 1);
    }
}
