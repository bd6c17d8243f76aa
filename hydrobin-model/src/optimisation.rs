//! Evaluation of [`MultiBinCandidate`]s against a simulation model.
//!
//! A [`BinnedOptimisationModel`] maps each candidate onto the model's
//! variables: bin memberships become the scenario bin indices, and each
//! bin's variable vector is split among the binned parameters in the
//! order they were given.
mod archive;

pub use archive::*;

use crate::errors::{ModelError, SimulationError};
use crate::parameters::{
    Bounded, BinnedParameter, BinnedScenarioParameter, BoundedParameter, Variable,
};
use crate::recorders::{MetaRecorder, Recorder};

use hydrobin::{clamp_slice, Bounder, CandidateConfig, MultiBinCandidate};

use ahash::AHashSet;
use rand::Rng;
use tracing::{debug, info};

use std::collections::BTreeMap;
use std::path::Path;

/// An interface to the simulation model being optimised.
pub trait Simulator {
    /// Resets the model's state before a run.
    fn reset(&mut self);

    /// Runs the model with the given scenario bins and
    /// binned variable values.
    fn run(
        &mut self,
        scenario_bins: &BinnedScenarioParameter,
        binned_variables: &[BinnedParameter],
    ) -> Result<(), SimulationError>;

    /// Aggregated objective values of the last run, lower is better.
    fn objectives(&self) -> Vec<f64>;

    /// The model's recorders, as left by the last run.
    fn recorders(&self) -> Vec<&dyn Recorder>;
}

/// A simulation model whose variables are driven by [`MultiBinCandidate`]s.
#[derive(Clone)]
pub struct BinnedOptimisationModel<S> {
    simulator: S,
    scenario_parameter: BinnedScenarioParameter,
    binned_variables: Vec<BinnedParameter>,
    offsets: Vec<usize>,
    fixed_variables: Vec<BoundedParameter>,
    meta_recorder: MetaRecorder,
}

impl<S: Simulator> BinnedOptimisationModel<S> {
    /// Caches the model's variables. Variables sharing a name with
    /// an earlier one are ignored. Plain parameters are not optimised;
    /// they are kept as [fixed variables].
    ///
    /// [fixed variables]: BinnedOptimisationModel::fixed_variables
    ///
    /// # Errors
    /// Fails unless exactly one binned scenario parameter is present,
    /// or if a binned parameter does not have one entry per bin.
    pub fn new(
        variables: impl IntoIterator<Item = Variable>,
        simulator: S,
    ) -> Result<BinnedOptimisationModel<S>, ModelError> {
        let mut seen = AHashSet::new();
        let mut scenario_parameter: Option<BinnedScenarioParameter> = None;
        let mut binned_variables = vec![];
        let mut fixed_variables = vec![];
        for variable in variables {
            if !seen.insert(variable.name().to_string()) {
                debug!(name = variable.name(), "ignoring duplicate variable");
                continue;
            }
            match variable {
                Variable::BinnedScenario(p) => {
                    if let Some(first) = &scenario_parameter {
                        return Err(ModelError::MultipleBinnedScenarioParameters {
                            first: first.name().to_string(),
                            second: p.name().to_string(),
                        });
                    }
                    scenario_parameter = Some(p);
                }
                Variable::Binned(p) => binned_variables.push(p),
                Variable::Plain(p) => fixed_variables.push(p),
            }
        }
        let scenario_parameter = scenario_parameter.ok_or(ModelError::NoBinnedScenarioParameter)?;

        let number_of_bins = scenario_parameter.number_of_bins();
        let mut offsets = Vec::with_capacity(binned_variables.len());
        let mut offset = 0;
        for p in &binned_variables {
            if p.number_of_bins() != number_of_bins {
                return Err(ModelError::BinCountMismatch {
                    variable: p.name().to_string(),
                    expected: number_of_bins,
                    found: p.number_of_bins(),
                });
            }
            offsets.push(offset);
            offset += p.size();
        }

        Ok(BinnedOptimisationModel {
            simulator,
            scenario_parameter,
            binned_variables,
            offsets,
            fixed_variables,
            meta_recorder: MetaRecorder::new("meta"),
        })
    }

    /// Replaces the meta recorder used to build candidate records.
    pub fn with_meta_recorder(mut self, meta_recorder: MetaRecorder) -> BinnedOptimisationModel<S> {
        self.meta_recorder = meta_recorder;
        self
    }

    pub fn number_of_bins(&self) -> usize {
        self.scenario_parameter.number_of_bins()
    }

    /// Number of variables in each bin of a candidate.
    pub fn number_of_variables(&self) -> usize {
        self.binned_variables.iter().map(|p| p.size()).sum()
    }

    pub fn scenario_parameter(&self) -> &BinnedScenarioParameter {
        &self.scenario_parameter
    }

    pub fn binned_variables(&self) -> &[BinnedParameter] {
        &self.binned_variables
    }

    pub fn fixed_variables(&self) -> &[BoundedParameter] {
        &self.fixed_variables
    }

    /// Returns where the values of binned variable `name`
    /// start within each bin's variable vector.
    pub fn variable_offset(&self, name: &str) -> Option<usize> {
        self.binned_variables
            .iter()
            .position(|p| p.name() == name)
            .map(|i| self.offsets[i])
    }

    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    pub fn simulator_mut(&mut self) -> &mut S {
        &mut self.simulator
    }

    /// Generates a random candidate: each scenario is put in a
    /// uniformly chosen bin, and each bin's variables are drawn
    /// uniformly within the bounds of that bin's parameters.
    pub fn generator<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<MultiBinCandidate, ModelError> {
        let number_of_bins = self.number_of_bins();
        let mut bin_members = vec![vec![]; number_of_bins];
        for scenario in 0..self.scenario_parameter.scenario_size() {
            bin_members[rng.gen_range(0..number_of_bins)].push(scenario);
        }
        let bin_variables: Vec<Vec<f64>> = (0..number_of_bins)
            .map(|bin| {
                self.binned_variables
                    .iter()
                    .flat_map(|p| {
                        let bp = &p.parameters()[bin];
                        bp.lower_bounds().iter().zip(bp.upper_bounds())
                    })
                    .map(|(&l, &u)| rng.gen_range(l..=u))
                    .collect()
            })
            .collect();

        Ok(MultiBinCandidate::new(
            CandidateConfig {
                number_of_variables: Some(self.number_of_variables()),
                bin_variables: Some(bin_variables),
                bin_members: Some(bin_members),
                ..CandidateConfig::empty(self.scenario_parameter.non_zero_bins())
            },
            rng,
        )?)
    }

    /// Evaluates a single candidate.
    ///
    /// # Errors
    /// Fails if the candidate's shape does not match the model,
    /// if its membership does not cover every scenario exactly
    /// once, or if the simulator fails.
    pub fn evaluate_one(&mut self, candidate: &MultiBinCandidate) -> Result<Evaluation, ModelError> {
        if candidate.number_of_bins() != self.number_of_bins()
            || candidate.number_of_variables() != self.number_of_variables()
        {
            return Err(ModelError::CandidateShape {
                expected_bins: self.number_of_bins(),
                expected_variables: self.number_of_variables(),
                found_bins: candidate.number_of_bins(),
                found_variables: candidate.number_of_variables(),
            });
        }
        let indices = candidate.get_bin_indices_array()?;
        self.scenario_parameter.update_indices(&indices.to_vec())?;
        for (p, &offset) in self.binned_variables.iter_mut().zip(&self.offsets) {
            let size = p.size();
            for (bin, b) in candidate.bins().iter().enumerate() {
                if let Some(bp) = p.parameter_mut(bin) {
                    bp.update(&b.variables()[offset..offset + size])?;
                }
            }
        }

        self.simulator.reset();
        self.simulator
            .run(&self.scenario_parameter, &self.binned_variables)
            .map_err(ModelError::Simulation)?;

        Ok(Evaluation {
            objectives: self.simulator.objectives(),
            meta: CandidateRecord {
                objectives: self.meta_recorder.value(&self.simulator.recorders()),
                variables: self.variable_records(),
            },
        })
    }

    /// Evaluates each candidate in turn.
    pub fn evaluate(&mut self, candidates: &[MultiBinCandidate]) -> Result<Vec<Evaluation>, ModelError> {
        candidates.iter().map(|c| self.evaluate_one(c)).collect()
    }

    /// Returns a bounder clamping candidates to the
    /// bounds of the model's binned parameters.
    pub fn bounder(&self) -> ModelBounder<'_> {
        ModelBounder {
            binned_variables: &self.binned_variables,
            offsets: &self.offsets,
        }
    }

    /// Reports progress and writes the population's
    /// records to the archive at `archive_path`.
    pub fn observe<'a>(
        &self,
        population: impl IntoIterator<Item = &'a Evaluation>,
        num_generations: usize,
        num_evaluations: usize,
        archive_path: &Path,
    ) -> Result<(), ModelError> {
        let records: Vec<&CandidateRecord> = population.into_iter().map(|e| &e.meta).collect();
        info!(
            generation = num_generations,
            evaluations = num_evaluations,
            archived = records.len(),
            "observed generation"
        );
        write_archive(archive_path, records)
    }

    fn variable_records(&self) -> BTreeMap<String, VariableRecord> {
        let mut records = BTreeMap::new();
        records.insert(
            self.scenario_parameter.name().to_string(),
            VariableRecord::BinnedScenario {
                values: self.scenario_parameter.indices().to_vec(),
            },
        );
        for p in &self.binned_variables {
            records.insert(
                p.name().to_string(),
                VariableRecord::Binned {
                    parameters: p
                        .parameters()
                        .iter()
                        .map(|bp| BinParameterRecord {
                            kind: bp.kind().clone(),
                            name: bp.name().to_string(),
                            values: bp.values().to_vec(),
                        })
                        .collect(),
                },
            );
        }
        records
    }
}

/// Clamps each bin's slice of every binned
/// parameter to that bin's parameter bounds.
#[derive(Clone, Copy, Debug)]
pub struct ModelBounder<'a> {
    binned_variables: &'a [BinnedParameter],
    offsets: &'a [usize],
}

impl Bounder for ModelBounder<'_> {
    fn bound(&self, candidate: &mut MultiBinCandidate) {
        for (p, &offset) in self.binned_variables.iter().zip(self.offsets) {
            let size = p.size();
            for (bin, bp) in p.parameters().iter().enumerate() {
                let values = candidate
                    .bin_mut(bin)
                    .and_then(|b| b.variables_mut().get_mut(offset..offset + size));
                if let Some(values) = values {
                    clamp_slice(values, bp.lower_bounds(), bp.upper_bounds());
                }
            }
        }
    }
}
