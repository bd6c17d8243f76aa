//! Per-generation snapshots of an evolving population of candidates.
use crate::MultiBinCandidate;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllCandidates,
    /// Clones only the candidate with the lowest objective sum.
    Champion,
    /// Clones no candidates.
    NoCandidates,
}

/// A snapshot of a population.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Log {
    pub generation_number: usize,
    pub evaluation_count: usize,
    pub generation_sample: GenerationMemberRecord,
    pub population_size: usize,
    pub objective_stats: Vec<(String, Stats)>,
    pub bin_occupancy: Stats,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log {{\n\
            \tgeneration_number: {:?}\n\
            \tevaluation_count: {:?}\n\
            \tpopulation_size: {:?}\n\
            \tbin_occupancy: {:?}\n\
            {}}}",
            &self.generation_number,
            &self.evaluation_count,
            &self.population_size,
            &self.bin_occupancy,
            self.objective_stats
                .iter()
                .map(|(name, stats)| format!("\t{}: {:?}\n", name, stats))
                .collect::<Vec<_>>()
                .join("")
        )
    }
}

/// A struct for reporting basic statistical data.
///
/// All fields are `NaN` for an empty sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    ///
    /// # Examples
    /// ```
    /// use hydrobin::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f64>) -> Stats {
        let mut data: Vec<f64> = data.collect();
        if data.is_empty() {
            return Stats {
                maximum: f64::NAN,
                minimum: f64::NAN,
                mean: f64::NAN,
                median: f64::NAN,
            };
        }
        let mid = data.len() / 2;
        let (mut max, mut min, mut sum) = (f64::MIN, f64::MAX, 0.0);
        for d in &data {
            max = d.max(max);
            min = d.min(min);
            sum += d;
        }
        let mean = sum / data.len() as f64;
        let mut median = *data.select_nth_unstable_by(mid, f64::total_cmp).1;
        if data.len() % 2 == 0 {
            // Everything left of `mid` is now no greater than the upper median.
            let lower = data[..mid].iter().copied().fold(f64::MIN, f64::max);
            median = (median + lower) / 2.0;
        }
        Stats {
            maximum: max,
            minimum: min,
            mean,
            median,
        }
    }
}

/// A reporting-level dependant store
/// of candidates from a population.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GenerationMemberRecord {
    /// Every candidate with its objective values.
    Candidates(Vec<(MultiBinCandidate, Vec<f64>)>),
    /// Only the champion with its objective values.
    Champion(MultiBinCandidate, Vec<f64>),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    objective_names: Vec<String>,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// Returns a logger with the appropiate reporting level.
    /// `objective_names` label the objective values passed to
    /// [`log`], in order.
    ///
    /// [`log`]: EvolutionLogger::log
    ///
    /// # Examples
    /// ```
    /// use hydrobin::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let logger = EvolutionLogger::new(ReportingLevel::NoCandidates, ["deficit", "cost"]);
    /// ```
    pub fn new<S: Into<String>>(
        reporting_level: ReportingLevel,
        objective_names: impl IntoIterator<Item = S>,
    ) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            objective_names: objective_names.into_iter().map(Into::into).collect(),
            logs: vec![],
        }
    }

    /// Store a snapshot of an evaluated population.
    ///
    /// Objective values beyond the configured names are ignored.
    ///
    /// # Examples
    /// ```
    /// use hydrobin::logging::{EvolutionLogger, ReportingLevel};
    /// use hydrobin::{CandidateConfig, MultiBinCandidate};
    /// use std::num::NonZeroUsize;
    ///
    /// let mut rng = rand::thread_rng();
    /// let mut candidate = MultiBinCandidate::new(
    ///     CandidateConfig {
    ///         number_of_variables: Some(1),
    ///         all_valid_members: Some((0..4).collect()),
    ///         ..CandidateConfig::empty(NonZeroUsize::new(2).unwrap())
    ///     },
    ///     &mut rng,
    /// )
    /// .unwrap();
    /// candidate.assign_missing_members(&mut rng);
    /// let objectives = vec![3.0];
    ///
    /// let mut logger = EvolutionLogger::new(ReportingLevel::Champion, ["deficit"]);
    /// logger.log(0, 1, [(&candidate, objectives.as_slice())]);
    ///
    /// assert_eq!(logger.iter().next().unwrap().bin_occupancy.mean, 2.0);
    /// ```
    pub fn log<'a, I>(&mut self, generation_number: usize, evaluation_count: usize, population: I)
    where
        I: IntoIterator<Item = (&'a MultiBinCandidate, &'a [f64])>,
    {
        let population: Vec<(&MultiBinCandidate, &[f64])> = population.into_iter().collect();
        let objective_stats = self
            .objective_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                (
                    name.clone(),
                    Stats::from(population.iter().filter_map(|(_, o)| o.get(i).copied())),
                )
            })
            .collect();
        let bin_occupancy = Stats::from(
            population
                .iter()
                .flat_map(|(c, _)| c.bins().iter().map(|b| b.number_of_members() as f64)),
        );
        let generation_sample = match self.reporting_level {
            ReportingLevel::AllCandidates => GenerationMemberRecord::Candidates(
                population
                    .iter()
                    .map(|(c, o)| ((*c).clone(), o.to_vec()))
                    .collect(),
            ),
            ReportingLevel::Champion => population
                .iter()
                .min_by(|(_, a), (_, b)| {
                    a.iter().sum::<f64>().total_cmp(&b.iter().sum::<f64>())
                })
                .map(|(c, o)| GenerationMemberRecord::Champion((*c).clone(), o.to_vec()))
                .unwrap_or(GenerationMemberRecord::None),
            ReportingLevel::NoCandidates => GenerationMemberRecord::None,
        };
        self.logs.push(Log {
            generation_number,
            evaluation_count,
            generation_sample,
            population_size: population.len(),
            objective_stats,
            bin_occupancy,
        })
    }

    /// Iterate over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }

    /// Returns the most recent snapshot.
    pub fn last(&self) -> Option<&Log> {
        self.logs.last()
    }
}
