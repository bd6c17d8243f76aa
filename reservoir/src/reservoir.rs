use hydrobin_model::optimisation::Simulator;
use hydrobin_model::parameters::{
    BinnedParameter, BinnedScenarioParameter, BoundedParameter, ParameterKind, Variable,
};
use hydrobin_model::recorders::{Aggregation, Recorder, RecorderKind, SeriesRecorder};
use hydrobin_model::{ModelError, SimulationError};

use rand::Rng;

use std::num::NonZeroUsize;

const CAPACITY: f64 = 100.0;
const INITIAL_STORAGE: f64 = 80.0;
const DEMAND: f64 = 10.0;
const MAX_RELEASE: f64 = 20.0;
const WEEKS: usize = 52;
/// Release is cut by this factor while storage is below the hedging threshold.
const HEDGING_FACTOR: f64 = 0.5;

/// The demo's decision variables: one release target and
/// one hedging threshold (as a fraction of capacity) per bin.
pub fn variables(number_of_bins: NonZeroUsize, scenarios: usize) -> Result<Vec<Variable>, ModelError> {
    let per_bin = |name: &str, kind: ParameterKind, lower: f64, upper: f64| -> Result<Variable, ModelError> {
        let parameters = (0..number_of_bins.get())
            .map(|b| BoundedParameter::new(format!("{}_{}", name, b), kind.clone(), vec![lower], vec![upper]))
            .collect::<Result<Vec<_>, _>>()?;
        BinnedParameter::new(name, parameters).map(Variable::Binned)
    };
    Ok(vec![
        Variable::BinnedScenario(BinnedScenarioParameter::new(
            "scenario_bins",
            number_of_bins,
            scenarios,
        )),
        per_bin("release", ParameterKind::Constant, 0.0, MAX_RELEASE)?,
        per_bin("hedging_threshold", ParameterKind::ControlCurve, 0.0, 1.0)?,
    ])
}

/// A single reservoir supplying a town, run over a year
/// of weekly inflows in each scenario.
#[derive(Clone, Debug)]
pub struct Reservoir {
    inflows: Vec<Vec<f64>>,
    deficit: SeriesRecorder,
    spill: SeriesRecorder,
    minimum_storage: SeriesRecorder,
}

impl Reservoir {
    /// Returns a reservoir with random seasonal inflows
    /// for each of `scenarios` scenarios.
    pub fn new<R: Rng + ?Sized>(rng: &mut R, scenarios: usize) -> Reservoir {
        let inflows = (0..scenarios)
            .map(|_| {
                let wetness = rng.gen_range(0.4..1.6);
                (0..WEEKS)
                    .map(|w| {
                        let season = 1.0 + (w as f64 / WEEKS as f64 * std::f64::consts::TAU).cos();
                        wetness * DEMAND * season * rng.gen_range(0.5..1.5)
                    })
                    .collect()
            })
            .collect();
        Reservoir::with_inflows(inflows)
    }

    pub fn with_inflows(inflows: Vec<Vec<f64>>) -> Reservoir {
        Reservoir {
            inflows,
            deficit: SeriesRecorder::new("deficit", RecorderKind::Deficit, Aggregation::Mean)
                .on_node("town"),
            spill: SeriesRecorder::new("spill", RecorderKind::Flow, Aggregation::Mean)
                .on_node("reservoir"),
            minimum_storage: SeriesRecorder::new(
                "minimum_storage",
                RecorderKind::Storage,
                Aggregation::Min,
            )
            .on_node("reservoir"),
        }
    }
}

fn variable<'a>(binned_variables: &'a [BinnedParameter], name: &str) -> Result<&'a BinnedParameter, SimulationError> {
    binned_variables
        .iter()
        .find(|p| p.name() == name)
        .ok_or_else(|| format!("missing variable {}", name).into())
}

impl Simulator for Reservoir {
    fn reset(&mut self) {
        for recorder in [&mut self.deficit, &mut self.spill, &mut self.minimum_storage] {
            recorder.values.clear();
        }
    }

    fn run(
        &mut self,
        scenario_bins: &BinnedScenarioParameter,
        binned_variables: &[BinnedParameter],
    ) -> Result<(), SimulationError> {
        let release = variable(binned_variables, "release")?;
        let hedging = variable(binned_variables, "hedging_threshold")?;
        if scenario_bins.scenario_size() != self.inflows.len() {
            return Err(format!(
                "{} scenarios configured, {} inflow series available",
                scenario_bins.scenario_size(),
                self.inflows.len()
            )
            .into());
        }

        for (inflows, &bin) in self.inflows.iter().zip(scenario_bins.indices()) {
            let (target, threshold) = match (release.parameter(bin), hedging.parameter(bin)) {
                (Some(r), Some(h)) => (r.values()[0], h.values()[0] * CAPACITY),
                _ => return Err(format!("no variables for bin {}", bin).into()),
            };
            let mut storage = INITIAL_STORAGE;
            let (mut deficit, mut spill, mut minimum) = (0.0, 0.0, storage);
            for inflow in inflows {
                storage += inflow;
                let wanted = if storage < threshold {
                    target * HEDGING_FACTOR
                } else {
                    target
                };
                let released = wanted.min(storage);
                storage -= released;
                deficit += (DEMAND - released).max(0.0);
                spill += (storage - CAPACITY).max(0.0);
                storage = storage.min(CAPACITY);
                minimum = f64::min(minimum, storage);
            }
            self.deficit.values.push(deficit);
            self.spill.values.push(spill);
            self.minimum_storage.values.push(minimum);
        }
        Ok(())
    }

    fn objectives(&self) -> Vec<f64> {
        [&self.deficit, &self.spill]
            .iter()
            .map(|r| r.aggregated_value().unwrap_or(0.0))
            .collect()
    }

    fn recorders(&self) -> Vec<&dyn Recorder> {
        vec![
            &self.deficit as &dyn Recorder,
            &self.spill,
            &self.minimum_storage,
        ]
    }
}
