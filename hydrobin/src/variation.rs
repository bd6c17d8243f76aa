//! Mutation and crossover operators over [`MultiBinCandidate`]s.
//!
//! Every operator leaves its inputs untouched and
//! returns new candidates, so they can be plugged
//! into any generational search loop.
mod errors;
mod options;
mod vectors;

pub use errors::VariationError;
pub use options::VariationOptions;
pub use vectors::{blend_crossover, gaussian_mutation};

use crate::{Bounder, MultiBinCandidate};

use rand::seq::{index, IteratorRandom};
use rand::Rng;
use tracing::debug;

use std::borrow::Cow;

/// Perturbs the variables of every bin with [`gaussian_mutation`],
/// then applies `bounder` once to the mutated copy.
///
/// # Errors
/// Fails if the Gaussian parameters in `options` are invalid.
///
/// # Examples
/// ```
/// use hydrobin::{binned_variable_gaussian_mutation, BinBounds, CandidateConfig, MultiBinCandidate, VariationOptions};
/// use std::num::NonZeroUsize;
///
/// let mut rng = rand::thread_rng();
/// let candidate = MultiBinCandidate::new(
///     CandidateConfig {
///         number_of_variables: Some(3),
///         all_valid_members: Some((0..4).collect()),
///         ..CandidateConfig::empty(NonZeroUsize::new(2).unwrap())
///     },
///     &mut rng,
/// )
/// .unwrap();
/// let options = VariationOptions { mutation_rate: 1.0, ..VariationOptions::default() };
/// let bounds = BinBounds::uniform(2, vec![0.0; 3], vec![1.0; 3]);
///
/// let mutant = binned_variable_gaussian_mutation(&mut rng, &candidate, &options, &bounds).unwrap();
///
/// assert!(mutant.bins().iter().flat_map(|b| b.variables()).all(|v| (0.0..=1.0).contains(v)));
/// ```
pub fn binned_variable_gaussian_mutation<R, B>(
    rng: &mut R,
    candidate: &MultiBinCandidate,
    options: &VariationOptions,
    bounder: &B,
) -> Result<MultiBinCandidate, VariationError>
where
    R: Rng + ?Sized,
    B: Bounder + ?Sized,
{
    let mut new = candidate.clone();
    for (bold, bnew) in candidate.bins().iter().zip(new.bins_mut()) {
        bnew.set_variables(gaussian_mutation(rng, bold.variables(), options)?);
    }
    bounder.bound(&mut new);
    Ok(new)
}

/// Blends the variables of each pair of corresponding bins with
/// [`blend_crossover`], giving one offspring vector to each child.
/// The first child keeps `mom`'s membership and the second
/// `dad`'s. Each child is bounded once. Like [`blend_crossover`],
/// this applies no [`crossover_rate`].
///
/// [`crossover_rate`]: VariationOptions::crossover_rate
///
/// # Errors
/// Fails if the parents differ in bin count or dimensionality.
pub fn binned_variable_blend_crossover<R, B>(
    rng: &mut R,
    mom: &MultiBinCandidate,
    dad: &MultiBinCandidate,
    options: &VariationOptions,
    bounder: &B,
) -> Result<Vec<MultiBinCandidate>, VariationError>
where
    R: Rng + ?Sized,
    B: Bounder + ?Sized,
{
    check_shape(mom, dad)?;
    let mut bro = mom.clone();
    let mut sis = dad.clone();
    for (i, (b_mom, b_dad)) in mom.bins().iter().zip(dad.bins()).enumerate() {
        let (a, b) = blend_crossover(rng, b_mom.variables(), b_dad.variables(), options);
        bro.bins_mut()[i].set_variables(a);
        sis.bins_mut()[i].set_variables(b);
    }
    bounder.bound(&mut bro);
    bounder.bound(&mut sis);
    Ok(vec![bro, sis])
}

/// Multi-point crossover of bin memberships and variables.
///
/// With a [`crossover_rate`] chance, up to [`num_crossover_points`]
/// distinct cut points are drawn among the bin boundaries. The bin
/// sequence is split at the cut points into runs alternating between
/// kept and swapped, starting with a kept run. The first child is a
/// copy of `dad` that takes `mom`'s members and variables for every
/// swapped bin; the second a copy of `mom` taking `dad`'s. Members
/// left without a bin are then assigned to random bins.
///
/// Returns no children if the crossover does not take place.
///
/// [`crossover_rate`]: VariationOptions::crossover_rate
/// [`num_crossover_points`]: VariationOptions::num_crossover_points
///
/// # Errors
/// Fails if either parent breaks the membership invariant, if the
/// parents differ in bin count, dimensionality or universe, or if a
/// child ends up with a different member count than its parents.
///
/// # Examples
/// ```
/// use hydrobin::{bin_crossover, CandidateConfig, MultiBinCandidate, VariationOptions};
/// use std::num::NonZeroUsize;
///
/// let mut rng = rand::thread_rng();
/// let config = CandidateConfig {
///     number_of_variables: Some(2),
///     all_valid_members: Some((0..12).collect()),
///     ..CandidateConfig::empty(NonZeroUsize::new(4).unwrap())
/// };
/// let mut mom = MultiBinCandidate::new(config.clone(), &mut rng).unwrap();
/// let mut dad = MultiBinCandidate::new(config, &mut rng).unwrap();
/// mom.assign_missing_members(&mut rng);
/// dad.assign_missing_members(&mut rng);
///
/// let children = bin_crossover(&mut rng, &mom, &dad, &VariationOptions::default()).unwrap();
///
/// assert_eq!(children.len(), 2);
/// assert!(children.iter().all(|c| c.number_of_members() == 12));
/// ```
pub fn bin_crossover<R: Rng + ?Sized>(
    rng: &mut R,
    mom: &MultiBinCandidate,
    dad: &MultiBinCandidate,
    options: &VariationOptions,
) -> Result<Vec<MultiBinCandidate>, VariationError> {
    check_shape(mom, dad)?;
    if mom.all_valid_members().len() != dad.all_valid_members().len() {
        return Err(VariationError::IncompatibleParents(
            "parents cover different member universes",
        ));
    }
    mom.validate()?;
    dad.validate()?;

    if rng.gen::<f64>() >= options.crossover_rate {
        debug!("bin crossover skipped");
        return Ok(vec![]);
    }

    let number_of_bins = mom.number_of_bins();
    let num_cuts = options.num_crossover_points.min(number_of_bins - 1);
    let mut cut_points: Vec<usize> = index::sample(rng, number_of_bins - 1, num_cuts)
        .into_iter()
        .map(|i| i + 1)
        .collect();
    cut_points.sort_unstable();
    debug!(?cut_points, "bin crossover");

    let mut bro = dad.clone();
    let mut sis = mom.clone();
    let mut swapped = false;
    for (i, (b_mom, b_dad)) in mom.bins().iter().zip(dad.bins()).enumerate() {
        if cut_points.binary_search(&i).is_ok() {
            swapped = !swapped;
        }
        if swapped {
            bro.update_bin_members(i, b_mom.members())?;
            sis.update_bin_members(i, b_dad.members())?;
            bro.bins_mut()[i].set_variables(b_mom.variables().to_vec());
            sis.bins_mut()[i].set_variables(b_dad.variables().to_vec());
        }
    }

    bro.assign_missing_members(rng);
    sis.assign_missing_members(rng);

    let expected = dad.number_of_members();
    for child in [&bro, &sis] {
        child.validate()?;
        if child.number_of_members() != expected {
            return Err(VariationError::MemberCountMismatch {
                expected,
                found: child.number_of_members(),
            });
        }
    }
    Ok(vec![bro, sis])
}

/// Swaps one random member between two random bins.
///
/// With a [`mutation_rate`] chance, two distinct bins are drawn
/// uniformly. One uniformly chosen member of each non-empty bin is
/// moved to the other. The candidate is returned borrowed, without
/// copying, if no mutation takes place: the rate is not met, the
/// candidate has a single bin, or both drawn bins are empty.
///
/// [`mutation_rate`]: VariationOptions::mutation_rate
///
/// # Examples
/// ```
/// use hydrobin::{bin_mutation, CandidateConfig, MultiBinCandidate, VariationOptions};
/// use std::borrow::Cow;
/// use std::num::NonZeroUsize;
///
/// let mut rng = rand::thread_rng();
/// let candidate = MultiBinCandidate::new(
///     CandidateConfig {
///         number_of_variables: Some(1),
///         all_valid_members: Some((0..6).collect()),
///         ..CandidateConfig::empty(NonZeroUsize::new(2).unwrap())
///     },
///     &mut rng,
/// )
/// .unwrap();
///
/// // Both bins are empty: nothing can be swapped.
/// let options = VariationOptions { mutation_rate: 1.0, ..VariationOptions::default() };
/// assert!(matches!(bin_mutation(&mut rng, &candidate, &options), Cow::Borrowed(_)));
/// ```
pub fn bin_mutation<'a, R: Rng + ?Sized>(
    rng: &mut R,
    candidate: &'a MultiBinCandidate,
    options: &VariationOptions,
) -> Cow<'a, MultiBinCandidate> {
    if rng.gen::<f64>() >= options.mutation_rate {
        return Cow::Borrowed(candidate);
    }

    let size = candidate.number_of_bins();
    if size < 2 {
        return Cow::Borrowed(candidate);
    }
    let pair = index::sample(rng, size, 2);
    let (p, q) = (pair.index(0), pair.index(1));

    let p_member = candidate.bins()[p].members().choose(rng);
    let q_member = candidate.bins()[q].members().choose(rng);
    if p_member.is_none() && q_member.is_none() {
        debug!(p, q, "bin mutation between empty bins");
        return Cow::Borrowed(candidate);
    }

    let mut new = candidate.clone();
    let bins = new.bins_mut();
    if let Some(m) = p_member {
        bins[p].remove(m);
        bins[q].insert(m);
    }
    if let Some(m) = q_member {
        bins[q].remove(m);
        bins[p].insert(m);
    }
    debug!(p, q, ?p_member, ?q_member, "bin mutation");
    Cow::Owned(new)
}

fn check_shape(mom: &MultiBinCandidate, dad: &MultiBinCandidate) -> Result<(), VariationError> {
    if mom.number_of_bins() != dad.number_of_bins() {
        return Err(VariationError::IncompatibleParents(
            "parents have different numbers of bins",
        ));
    }
    if mom.number_of_variables() != dad.number_of_variables() {
        return Err(VariationError::IncompatibleParents(
            "parents have different numbers of variables",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinBounds, CandidateConfig, Member, NullBounder};
    use rand::{rngs::StdRng, SeedableRng};
    use std::num::NonZeroUsize;

    fn random_candidate(rng: &mut StdRng, bins: usize, members: usize) -> MultiBinCandidate {
        let mut candidate = MultiBinCandidate::new(
            CandidateConfig {
                number_of_variables: Some(3),
                all_valid_members: Some((0..members).collect()),
                ..CandidateConfig::empty(NonZeroUsize::new(bins).unwrap())
            },
            rng,
        )
        .unwrap();
        candidate.assign_missing_members(rng);
        candidate
    }

    fn explicit_candidate(variables: Vec<Vec<f64>>, members: Vec<Vec<Member>>) -> MultiBinCandidate {
        MultiBinCandidate::new(
            CandidateConfig {
                bin_variables: Some(variables),
                bin_members: Some(members.clone()),
                ..CandidateConfig::empty(NonZeroUsize::new(members.len()).unwrap())
            },
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap()
    }

    #[test]
    fn gaussian_mutation_leaves_input_and_membership() {
        let mut rng = StdRng::seed_from_u64(1);
        let candidate = random_candidate(&mut rng, 3, 10);
        let before = candidate.clone();
        let options = VariationOptions {
            mutation_rate: 1.0,
            ..VariationOptions::default()
        };
        let mutant =
            binned_variable_gaussian_mutation(&mut rng, &candidate, &options, &NullBounder).unwrap();
        assert_eq!(candidate, before);
        assert_ne!(mutant, candidate);
        for (a, b) in mutant.bins().iter().zip(candidate.bins()) {
            assert_eq!(a.members().collect::<Vec<_>>(), b.members().collect::<Vec<_>>());
        }
    }

    #[test]
    fn gaussian_mutation_bounds_once() {
        let mut rng = StdRng::seed_from_u64(2);
        let candidate = random_candidate(&mut rng, 2, 4);
        let options = VariationOptions {
            mutation_rate: 1.0,
            gaussian_mean: 50.0,
            ..VariationOptions::default()
        };
        let bounds = BinBounds::uniform(2, vec![0.0; 3], vec![1.0; 3]);
        let mutant = binned_variable_gaussian_mutation(&mut rng, &candidate, &options, &bounds).unwrap();
        assert!(mutant
            .bins()
            .iter()
            .all(|b| b.variables() == [1.0, 1.0, 1.0]));
    }

    #[test]
    fn blend_crossover_children_keep_parent_membership() {
        let mom = explicit_candidate(vec![vec![0.0], vec![0.0]], vec![vec![0, 1], vec![2]]);
        let dad = explicit_candidate(vec![vec![1.0], vec![1.0]], vec![vec![0], vec![1, 2]]);
        let mut rng = StdRng::seed_from_u64(3);
        let children =
            binned_variable_blend_crossover(&mut rng, &mom, &dad, &VariationOptions::default(), &NullBounder)
                .unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].get_bin_indices_array(), mom.get_bin_indices_array());
        assert_eq!(children[1].get_bin_indices_array(), dad.get_bin_indices_array());
        for child in &children {
            for b in child.bins() {
                assert!(b.variables()[0] >= -0.1 && b.variables()[0] < 1.1);
            }
        }
    }

    #[test]
    fn blend_crossover_rejects_mismatched_parents() {
        let mom = explicit_candidate(vec![vec![0.0]], vec![vec![0]]);
        let dad = explicit_candidate(vec![vec![0.0], vec![1.0]], vec![vec![0], vec![]]);
        assert!(matches!(
            binned_variable_blend_crossover(
                &mut StdRng::seed_from_u64(0),
                &mom,
                &dad,
                &VariationOptions::default(),
                &NullBounder
            ),
            Err(VariationError::IncompatibleParents(_))
        ));
    }

    #[test]
    fn bin_crossover_preserves_member_count() {
        let mut rng = StdRng::seed_from_u64(4);
        for bins in 1..6 {
            for points in 0..7 {
                let mom = random_candidate(&mut rng, bins, 17);
                let dad = random_candidate(&mut rng, bins, 17);
                let options = VariationOptions {
                    num_crossover_points: points,
                    ..VariationOptions::default()
                };
                let children = bin_crossover(&mut rng, &mom, &dad, &options).unwrap();
                assert_eq!(children.len(), 2);
                for child in &children {
                    assert_eq!(child.number_of_members(), dad.number_of_members());
                    child.validate().unwrap();
                }
            }
        }
    }

    #[test]
    fn bin_crossover_swaps_runs_after_cut() {
        // With two bins the only possible cut is before bin 1.
        let mom = explicit_candidate(vec![vec![0.0], vec![1.0]], vec![vec![0, 1, 2], vec![3]]);
        let dad = explicit_candidate(vec![vec![2.0], vec![3.0]], vec![vec![0], vec![1, 2, 3]]);
        let mut rng = StdRng::seed_from_u64(5);
        let children = bin_crossover(&mut rng, &mom, &dad, &VariationOptions::default()).unwrap();
        let (bro, sis) = (&children[0], &children[1]);

        assert_eq!(bro.bins()[0].variables(), &[2.0]);
        assert_eq!(bro.bins()[1].variables(), &[1.0]);
        assert_eq!(sis.bins()[0].variables(), &[0.0]);
        assert_eq!(sis.bins()[1].variables(), &[3.0]);

        // Members dropped by the swap are reassigned at random,
        // so only the swapped members have a fixed bin.
        assert!(bro.bins()[1].contains(3));
        assert!(bro.bins()[0].members().all(|m| m < 3));
        assert!(sis.bins()[1].contains(1) && sis.bins()[1].contains(2) && sis.bins()[1].contains(3));
        assert!(sis.bins()[0].members().all(|m| m == 0));
        for child in &children {
            child.validate().unwrap();
        }
    }

    #[test]
    fn bin_crossover_results_hold_for_any_seed() {
        let mom = explicit_candidate(vec![vec![0.0], vec![1.0]], vec![vec![0, 1, 2], vec![3]]);
        let dad = explicit_candidate(vec![vec![2.0], vec![3.0]], vec![vec![0], vec![1, 2, 3]]);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let children = bin_crossover(&mut rng, &mom, &dad, &VariationOptions::default()).unwrap();
            assert!(children[0].bins()[1].contains(3));
            assert!(children[0].bins()[0].members().all(|m| m < 3));
            for child in &children {
                child.validate().unwrap();
                assert_eq!(child.number_of_members(), 4);
            }
        }
    }

    #[test]
    fn bin_crossover_rate_zero_yields_no_children() {
        let mut rng = StdRng::seed_from_u64(6);
        let mom = random_candidate(&mut rng, 3, 9);
        let dad = random_candidate(&mut rng, 3, 9);
        let options = VariationOptions {
            crossover_rate: 0.0,
            ..VariationOptions::default()
        };
        for _ in 0..20 {
            assert!(bin_crossover(&mut rng, &mom, &dad, &options).unwrap().is_empty());
        }
    }

    #[test]
    fn bin_crossover_rejects_incomplete_parents() {
        let mut rng = StdRng::seed_from_u64(7);
        let mom = random_candidate(&mut rng, 3, 9);
        let mut dad = random_candidate(&mut rng, 3, 9);
        dad.update_bin_members(0, []).unwrap();
        dad.update_bin_members(1, []).unwrap();
        dad.update_bin_members(2, []).unwrap();
        assert!(matches!(
            bin_crossover(&mut rng, &mom, &dad, &VariationOptions::default()),
            Err(VariationError::Candidate(_))
        ));
    }

    #[test]
    fn bin_mutation_preserves_pair_count() {
        let mut rng = StdRng::seed_from_u64(8);
        let candidate = random_candidate(&mut rng, 4, 12);
        let options = VariationOptions {
            mutation_rate: 1.0,
            ..VariationOptions::default()
        };
        for _ in 0..50 {
            let mutant = bin_mutation(&mut rng, &candidate, &options);
            assert_eq!(mutant.number_of_members(), candidate.number_of_members());
            mutant.validate().unwrap();
            for (a, b) in mutant.bins().iter().zip(candidate.bins()) {
                assert_eq!(a.number_of_members(), b.number_of_members());
            }
        }
    }

    #[test]
    fn bin_mutation_with_an_empty_bin_moves_one_member() {
        let candidate = explicit_candidate(vec![vec![0.0], vec![1.0]], vec![vec![], vec![0, 1]]);
        let options = VariationOptions {
            mutation_rate: 1.0,
            ..VariationOptions::default()
        };
        let mut rng = StdRng::seed_from_u64(9);
        loop {
            if let Cow::Owned(mutant) = bin_mutation(&mut rng, &candidate, &options) {
                assert_eq!(mutant.bins()[0].number_of_members(), 1);
                assert_eq!(mutant.bins()[1].number_of_members(), 1);
                break;
            }
        }
    }

    #[test]
    fn bin_mutation_always_draws_distinct_bins() {
        let candidate = explicit_candidate(vec![vec![0.0], vec![1.0]], vec![vec![0, 1], vec![2, 3]]);
        let options = VariationOptions {
            mutation_rate: 1.0,
            ..VariationOptions::default()
        };
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..50 {
            let mutant = bin_mutation(&mut rng, &candidate, &options);
            assert!(matches!(mutant, Cow::Owned(_)));
            assert_ne!(*mutant, candidate);
            mutant.validate().unwrap();
        }
    }

    #[test]
    fn bin_mutation_of_a_single_bin_is_unchanged() {
        let candidate = explicit_candidate(vec![vec![0.0]], vec![vec![0, 1]]);
        let options = VariationOptions {
            mutation_rate: 1.0,
            ..VariationOptions::default()
        };
        let mut rng = StdRng::seed_from_u64(13);
        assert!(matches!(
            bin_mutation(&mut rng, &candidate, &options),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn bin_mutation_of_empty_bins_is_unchanged() {
        let candidate = explicit_candidate(vec![vec![0.0], vec![1.0]], vec![vec![], vec![]]);
        let options = VariationOptions {
            mutation_rate: 1.0,
            ..VariationOptions::default()
        };
        let mut rng = StdRng::seed_from_u64(10);
        for _ in 0..20 {
            let result = bin_mutation(&mut rng, &candidate, &options);
            assert!(matches!(result, Cow::Borrowed(_)));
            assert_eq!(*result, candidate);
        }
    }

    #[test]
    fn bin_mutation_between_two_empty_bins_is_unchanged() {
        let candidate = explicit_candidate(
            vec![vec![0.0], vec![1.0], vec![2.0]],
            vec![vec![], vec![], vec![0, 1, 2]],
        );
        let options = VariationOptions {
            mutation_rate: 1.0,
            ..VariationOptions::default()
        };
        let mut rng = StdRng::seed_from_u64(10);
        for _ in 0..100 {
            let result = bin_mutation(&mut rng, &candidate, &options);
            if let Cow::Owned(mutant) = &result {
                // Any real swap must involve the non-empty bin.
                assert_ne!(mutant.bins()[2].number_of_members(), 0);
                assert_eq!(
                    mutant.bins()[0].number_of_members() + mutant.bins()[1].number_of_members(),
                    1
                );
            } else {
                assert_eq!(*result, candidate);
            }
        }
    }

    #[test]
    fn bin_mutation_rate_zero_borrows() {
        let mut rng = StdRng::seed_from_u64(11);
        let candidate = random_candidate(&mut rng, 3, 5);
        let options = VariationOptions {
            mutation_rate: 0.0,
            ..VariationOptions::default()
        };
        assert!(matches!(
            bin_mutation(&mut rng, &candidate, &options),
            Cow::Borrowed(_)
        ));
    }
}
