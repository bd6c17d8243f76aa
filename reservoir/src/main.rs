mod reservoir;

use reservoir::Reservoir;

use hydrobin::logging::{EvolutionLogger, GenerationMemberRecord, ReportingLevel};
use hydrobin::{
    bin_crossover, bin_mutation, binned_variable_blend_crossover, binned_variable_gaussian_mutation,
    MultiBinCandidate, VariationError, VariationOptions,
};
use hydrobin_model::optimisation::{BinnedOptimisationModel, Evaluation};
use hydrobin_model::ModelError;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::error::Error;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::{env, fs};

type Model = BinnedOptimisationModel<Reservoir>;

/// Search settings, read from the RON file given as first argument.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
struct SearchConfig {
    population_size: usize,
    generations: usize,
    number_of_bins: NonZeroUsize,
    scenarios: usize,
    seed: u64,
    archive: PathBuf,
    variation: VariationOptions,
}

impl Default for SearchConfig {
    fn default() -> SearchConfig {
        SearchConfig {
            population_size: 40,
            generations: 30,
            number_of_bins: NonZeroUsize::new(4).unwrap_or(NonZeroUsize::MIN),
            scenarios: 200,
            seed: 42,
            archive: PathBuf::from("archive.json"),
            variation: VariationOptions {
                num_crossover_points: 2,
                mutation_rate: 0.2,
                gaussian_stdev: 0.5,
                ..VariationOptions::default()
            },
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config: SearchConfig = match env::args().nth(1) {
        Some(path) => ron::from_str(&fs::read_to_string(path)?)?,
        None => SearchConfig::default(),
    };
    if config.population_size < 2 {
        return Err("population_size must be at least 2".into());
    }
    info!(?config, "starting search");

    let mut rng = StdRng::seed_from_u64(config.seed);
    let model = Model::new(
        reservoir::variables(config.number_of_bins, config.scenarios)?,
        Reservoir::new(&mut rng, config.scenarios),
    )?;
    let mut logger = EvolutionLogger::new(ReportingLevel::Champion, ["deficit", "spill"]);

    let initial = (0..config.population_size)
        .map(|_| model.generator(&mut rng))
        .collect::<Result<Vec<_>, _>>()?;
    let mut population = evaluate(&model, initial)?;
    let mut evaluation_count = population.len();

    for generation in 0..config.generations {
        logger.log(
            generation,
            evaluation_count,
            population.iter().map(|(c, e)| (c, e.objectives.as_slice())),
        );
        model.observe(
            population.iter().map(|(_, e)| e),
            generation,
            evaluation_count,
            &config.archive,
        )?;

        let offspring = breed(&mut rng, &model, &population, &config.variation)?;
        evaluation_count += offspring.len();
        population.extend(evaluate(&model, offspring)?);
        population.sort_by(|(_, a), (_, b)| score(a).total_cmp(&score(b)));
        population.truncate(config.population_size);
    }

    if let Some(log) = logger.last() {
        println!("{}", log);
        if let GenerationMemberRecord::Champion(champion, objectives) = &log.generation_sample {
            info!(?objectives, "champion found");
            println!("{}", ron::ser::to_string_pretty(champion, PrettyConfig::new())?);
        }
    }
    Ok(())
}

/// Evaluates candidates in parallel, each on its own copy of the model.
fn evaluate(
    model: &Model,
    candidates: Vec<MultiBinCandidate>,
) -> Result<Vec<(MultiBinCandidate, Evaluation)>, ModelError> {
    candidates
        .into_par_iter()
        .map(|c| {
            let evaluation = model.clone().evaluate_one(&c)?;
            Ok((c, evaluation))
        })
        .collect()
}

fn score(evaluation: &Evaluation) -> f64 {
    evaluation.objectives.iter().sum()
}

/// Binary tournament on the objective sum.
fn tournament<'a, R: Rng>(
    rng: &mut R,
    population: &'a [(MultiBinCandidate, Evaluation)],
) -> &'a MultiBinCandidate {
    let a = &population[rng.gen_range(0..population.len())];
    let b = &population[rng.gen_range(0..population.len())];
    if score(&a.1) <= score(&b.1) {
        &a.0
    } else {
        &b.0
    }
}

fn breed<R: Rng>(
    rng: &mut R,
    model: &Model,
    population: &[(MultiBinCandidate, Evaluation)],
    options: &VariationOptions,
) -> Result<Vec<MultiBinCandidate>, VariationError> {
    let bounder = model.bounder();
    let mut offspring = Vec::with_capacity(population.len());
    while offspring.len() < population.len() {
        let mom = tournament(rng, population);
        let dad = tournament(rng, population);
        let mut children = bin_crossover(rng, mom, dad, options)?;
        if children.is_empty() {
            children = vec![mom.clone(), dad.clone()];
        }
        for child in binned_variable_blend_crossover(rng, &children[0], &children[1], options, &bounder)? {
            let child = binned_variable_gaussian_mutation(rng, &child, options, &bounder)?;
            offspring.push(bin_mutation(rng, &child, options).into_owned());
        }
    }
    offspring.truncate(population.len());
    Ok(offspring)
}
