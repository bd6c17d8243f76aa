use serde::{Deserialize, Serialize};

/// Options recognised by the variation operators.
///
/// Deserialisation accepts any mapping: missing keys take
/// their default values and unknown keys are ignored, so one
/// options map can be shared with the surrounding search loop.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0].
///
/// # Examples
/// ```
/// use hydrobin::VariationOptions;
///
/// let options: VariationOptions =
///     serde_json::from_str(r#"{"mutation_rate": 0.5, "pop_size": 100}"#).unwrap();
///
/// assert_eq!(options.mutation_rate, 0.5);
/// assert_eq!(options.crossover_rate, 1.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariationOptions {
    /// Chance that a crossover takes place.
    pub crossover_rate: f64,
    /// Number of cut points used by bin crossover.
    /// Capped at one less than the number of bins.
    pub num_crossover_points: usize,
    /// Chance of a bin membership mutation, and the per-variable
    /// chance of a Gaussian variable mutation.
    pub mutation_rate: f64,
    /// Mean of Gaussian variable perturbations.
    pub gaussian_mean: f64,
    /// Standard deviation of Gaussian variable perturbations.
    pub gaussian_stdev: f64,
    /// Extent beyond the parents' range explored by blend crossover.
    pub blx_alpha: f64,
    /// Variable positions blended by blend crossover.
    /// All positions are blended if `None`.
    pub blx_points: Option<Vec<usize>>,
}

impl Default for VariationOptions {
    fn default() -> VariationOptions {
        VariationOptions {
            crossover_rate: 1.0,
            num_crossover_points: 1,
            mutation_rate: 0.1,
            gaussian_mean: 0.0,
            gaussian_stdev: 1.0,
            blx_alpha: 0.1,
            blx_points: None,
        }
    }
}
