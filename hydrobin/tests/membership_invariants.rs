use hydrobin::{
    bin_crossover, bin_mutation, binned_variable_blend_crossover, binned_variable_gaussian_mutation,
    BinBounds, CandidateConfig, MultiBinCandidate, VariationOptions,
};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use std::collections::BTreeSet;
use std::num::NonZeroUsize;

const BINS: usize = 6;
const MEMBERS: usize = 40;
const VARIABLES: usize = 3;

fn random_population(rng: &mut StdRng, size: usize) -> Vec<MultiBinCandidate> {
    (0..size)
        .map(|_| {
            let mut candidate = MultiBinCandidate::new(
                CandidateConfig {
                    number_of_variables: Some(VARIABLES),
                    all_valid_members: Some((0..MEMBERS).collect()),
                    ..CandidateConfig::empty(NonZeroUsize::new(BINS).unwrap())
                },
                rng,
            )
            .unwrap();
            candidate.assign_missing_members(rng);
            candidate
        })
        .collect()
}

fn assert_partition(candidate: &MultiBinCandidate) {
    let mut seen = BTreeSet::new();
    for bin in candidate.bins() {
        for m in bin.members() {
            assert!(seen.insert(m), "member {} in two bins", m);
        }
    }
    assert_eq!(seen, (0..MEMBERS).collect());

    let variables = candidate.get_variable_array().unwrap();
    let indices = candidate.get_bin_indices_array().unwrap();
    for m in 0..MEMBERS {
        assert_eq!(
            variables.row(m).to_vec(),
            candidate.bins()[indices[m]].variables()
        );
    }
}

#[test]
fn variation_loop_keeps_every_member_in_exactly_one_bin() {
    let mut rng = StdRng::seed_from_u64(2024);
    let options = VariationOptions {
        num_crossover_points: 3,
        mutation_rate: 0.5,
        gaussian_stdev: 0.2,
        ..VariationOptions::default()
    };
    let bounds = BinBounds::uniform(BINS, vec![0.0; VARIABLES], vec![1.0; VARIABLES]);

    let mut population = random_population(&mut rng, 10);
    for _ in 0..25 {
        population.shuffle(&mut rng);
        let mut offspring = vec![];
        for pair in population.chunks(2) {
            let (mom, dad) = (&pair[0], &pair[1]);
            for child in bin_crossover(&mut rng, mom, dad, &options).unwrap() {
                offspring.extend(
                    binned_variable_blend_crossover(&mut rng, &child, dad, &options, &bounds).unwrap(),
                );
            }
        }
        population = offspring
            .iter()
            .map(|c| {
                let c = binned_variable_gaussian_mutation(&mut rng, c, &options, &bounds).unwrap();
                bin_mutation(&mut rng, &c, &options).into_owned()
            })
            .take(10)
            .collect();

        for candidate in &population {
            assert_partition(candidate);
            assert!(candidate
                .bins()
                .iter()
                .flat_map(|b| b.variables())
                .all(|v| (0.0..=1.0).contains(v)));
        }
    }
}
