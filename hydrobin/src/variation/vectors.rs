//! Single-vector variation primitives.
//! None of these apply any bounding.
use super::{VariationError, VariationOptions};

use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Returns a copy of `values` in which each element has a
/// [`mutation_rate`] chance of being perturbed by a draw from
/// `Normal(gaussian_mean, gaussian_stdev)`.
///
/// [`mutation_rate`]: VariationOptions::mutation_rate
///
/// # Errors
/// Fails if the mean is not finite, or if the standard
/// deviation is negative or not finite.
///
/// # Examples
/// ```
/// use hydrobin::{gaussian_mutation, VariationOptions};
///
/// let options = VariationOptions {
///     mutation_rate: 1.0,
///     gaussian_stdev: 0.1,
///     ..VariationOptions::default()
/// };
/// let mutant = gaussian_mutation(&mut rand::thread_rng(), &[10.0, 10.0], &options).unwrap();
///
/// assert!(mutant.iter().all(|v| (v - 10.0).abs() < 2.0));
/// ```
pub fn gaussian_mutation<R: Rng + ?Sized>(
    rng: &mut R,
    values: &[f64],
    options: &VariationOptions,
) -> Result<Vec<f64>, VariationError> {
    let normal = gaussian(options)?;
    Ok(values
        .iter()
        .map(|&v| {
            if rng.gen::<f64>() < options.mutation_rate {
                v + normal.sample(rng)
            } else {
                v
            }
        })
        .collect())
}

/// Blend (BLX-α) crossover of two parent vectors.
///
/// For each blended position with parent values `lo ≤ hi`,
/// each child independently receives a uniform draw from
/// `[lo - δ, hi + δ)`, with `δ = blx_alpha ⨯ (hi - lo)`.
/// Positions not listed in [`blx_points`] (or beyond the
/// shorter parent) are copied: the first child from `dad`,
/// the second from `mom`.
///
/// No [`crossover_rate`] is applied: the parents are always
/// blended, and callers decide whether a crossover takes place.
///
/// [`blx_points`]: VariationOptions::blx_points
/// [`crossover_rate`]: VariationOptions::crossover_rate
///
/// # Examples
/// ```
/// use hydrobin::{blend_crossover, VariationOptions};
///
/// let (bro, sis) = blend_crossover(
///     &mut rand::thread_rng(),
///     &[0.0, 5.0],
///     &[1.0, 5.0],
///     &VariationOptions::default(),
/// );
///
/// assert!(bro[0] >= -0.1 && bro[0] < 1.1);
/// assert_eq!(sis[1], 5.0);
/// ```
pub fn blend_crossover<R: Rng + ?Sized>(
    rng: &mut R,
    mom: &[f64],
    dad: &[f64],
    options: &VariationOptions,
) -> (Vec<f64>, Vec<f64>) {
    let mut bro = dad.to_vec();
    let mut sis = mom.to_vec();
    let len = mom.len().min(dad.len());
    let all_points: Vec<usize>;
    let points = match &options.blx_points {
        Some(points) => points.as_slice(),
        None => {
            all_points = (0..len).collect();
            &all_points
        }
    };
    for &i in points.iter().filter(|&&i| i < len) {
        let (smallest, largest) = (mom[i].min(dad[i]), mom[i].max(dad[i]));
        let delta = options.blx_alpha * (largest - smallest);
        bro[i] = smallest - delta + rng.gen::<f64>() * (largest - smallest + 2.0 * delta);
        sis[i] = smallest - delta + rng.gen::<f64>() * (largest - smallest + 2.0 * delta);
    }
    (bro, sis)
}

fn gaussian(options: &VariationOptions) -> Result<Normal<f64>, VariationError> {
    let invalid = VariationError::InvalidGaussian {
        mean: options.gaussian_mean,
        stdev: options.gaussian_stdev,
    };
    if !options.gaussian_mean.is_finite()
        || !options.gaussian_stdev.is_finite()
        || options.gaussian_stdev < 0.0
    {
        return Err(invalid);
    }
    Normal::new(options.gaussian_mean, options.gaussian_stdev).map_err(|_| invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn gaussian_mutation_rate_zero_is_identity() {
        let mut rng = StdRng::seed_from_u64(42);
        let options = VariationOptions {
            mutation_rate: 0.0,
            ..VariationOptions::default()
        };
        let values = [1.0, 2.0, 3.0];
        assert_eq!(
            gaussian_mutation(&mut rng, &values, &options).unwrap(),
            values.to_vec()
        );
    }

    #[test]
    fn gaussian_mutation_rate_one_changes_every_value() {
        let mut rng = StdRng::seed_from_u64(42);
        let options = VariationOptions {
            mutation_rate: 1.0,
            gaussian_mean: 100.0,
            gaussian_stdev: 1.0,
            ..VariationOptions::default()
        };
        let mutant = gaussian_mutation(&mut rng, &[0.0; 4], &options).unwrap();
        assert!(mutant.iter().all(|v| *v > 90.0 && *v < 110.0));
    }

    #[test]
    fn gaussian_mutation_rejects_negative_stdev() {
        let options = VariationOptions {
            gaussian_stdev: -1.0,
            ..VariationOptions::default()
        };
        assert_eq!(
            gaussian_mutation(&mut StdRng::seed_from_u64(0), &[0.0], &options),
            Err(VariationError::InvalidGaussian {
                mean: 0.0,
                stdev: -1.0
            })
        );
    }

    #[test]
    fn gaussian_mutation_rejects_non_finite_parameters() {
        let mut rng = StdRng::seed_from_u64(0);
        for (mean, stdev) in [(0.0, f64::NAN), (0.0, f64::INFINITY), (f64::NAN, 1.0)] {
            let options = VariationOptions {
                gaussian_mean: mean,
                gaussian_stdev: stdev,
                ..VariationOptions::default()
            };
            assert!(matches!(
                gaussian_mutation(&mut rng, &[0.0], &options),
                Err(VariationError::InvalidGaussian { .. })
            ));
        }
        let zero = VariationOptions {
            mutation_rate: 1.0,
            gaussian_stdev: 0.0,
            ..VariationOptions::default()
        };
        assert_eq!(gaussian_mutation(&mut rng, &[2.0], &zero).unwrap(), vec![2.0]);
    }

    #[test]
    fn blend_crossover_ignores_crossover_rate() {
        let mut rng = StdRng::seed_from_u64(3);
        let options = VariationOptions {
            crossover_rate: 0.0,
            ..VariationOptions::default()
        };
        let (bro, sis) = blend_crossover(&mut rng, &[0.0; 8], &[1.0; 8], &options);
        assert!(bro.iter().chain(&sis).any(|v| *v != 0.0 && *v != 1.0));
    }

    #[test]
    fn blend_crossover_stays_in_extended_range() {
        let mut rng = StdRng::seed_from_u64(9);
        let options = VariationOptions {
            blx_alpha: 0.5,
            ..VariationOptions::default()
        };
        for _ in 0..100 {
            let (bro, sis) = blend_crossover(&mut rng, &[0.0, 10.0], &[2.0, 10.0], &options);
            for child in [&bro, &sis] {
                assert!(child[0] >= -1.0 && child[0] < 3.0);
                assert_eq!(child[1], 10.0);
            }
        }
    }

    #[test]
    fn blend_crossover_only_blends_selected_points() {
        let mut rng = StdRng::seed_from_u64(9);
        let options = VariationOptions {
            blx_points: Some(vec![1, 7]),
            ..VariationOptions::default()
        };
        let (bro, sis) = blend_crossover(&mut rng, &[0.0, 0.0, 0.0], &[4.0, 4.0, 4.0], &options);
        assert_eq!((bro[0], bro[2]), (4.0, 4.0));
        assert_eq!((sis[0], sis[2]), (0.0, 0.0));
        assert!(bro[1] >= -0.4 && bro[1] < 4.4);
    }
}
