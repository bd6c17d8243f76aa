//! # hydrobin-model
//! Glue between [`hydrobin`] candidates and a scenario-based simulation model.
//!
//! - [`parameters`]: the model's decision variables, including the
//!   [`BinnedScenarioParameter`] mapping scenarios onto bins.
//! - [`recorders`]: simulation results, collected into serialisable records.
//! - [`optimisation`]: the [`BinnedOptimisationModel`] evaluating candidates
//!   with a [`Simulator`], bounding them and archiving each generation.
//! - [`model_json`]: helpers assembling JSON model documents.
//!
//! [`BinnedScenarioParameter`]: crate::parameters::BinnedScenarioParameter
//! [`BinnedOptimisationModel`]: crate::optimisation::BinnedOptimisationModel
//! [`Simulator`]: crate::optimisation::Simulator
//!
//! # Example usage: one release per bin
//! ```
//! use hydrobin_model::optimisation::{BinnedOptimisationModel, Simulator};
//! use hydrobin_model::parameters::{
//!     BinnedParameter, BinnedScenarioParameter, BoundedParameter, ParameterKind, Variable,
//! };
//! use hydrobin_model::recorders::{Aggregation, Recorder, RecorderKind, SeriesRecorder};
//! use hydrobin_model::SimulationError;
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::num::NonZeroUsize;
//!
//! struct Spill(SeriesRecorder);
//!
//! impl Simulator for Spill {
//!     fn reset(&mut self) {
//!         self.0.values.clear();
//!     }
//!
//!     fn run(
//!         &mut self,
//!         scenario_bins: &BinnedScenarioParameter,
//!         binned_variables: &[BinnedParameter],
//!     ) -> Result<(), SimulationError> {
//!         for &bin in scenario_bins.indices() {
//!             let release = binned_variables[0].parameter(bin).unwrap().values()[0];
//!             self.0.values.push((5.0 - release).max(0.0));
//!         }
//!         Ok(())
//!     }
//!
//!     fn objectives(&self) -> Vec<f64> {
//!         vec![self.0.aggregated_value().unwrap_or(0.0)]
//!     }
//!
//!     fn recorders(&self) -> Vec<&dyn Recorder> {
//!         vec![&self.0 as &dyn Recorder]
//!     }
//! }
//!
//! let bins = NonZeroUsize::new(3).unwrap();
//! let release = (0..3)
//!     .map(|b| {
//!         BoundedParameter::new(format!("release_{}", b), ParameterKind::Constant, vec![0.0], vec![10.0])
//!     })
//!     .collect::<Result<Vec<_>, _>>()
//!     .unwrap();
//! let mut model = BinnedOptimisationModel::new(
//!     vec![
//!         Variable::BinnedScenario(BinnedScenarioParameter::new("scenario_bins", bins, 20)),
//!         Variable::Binned(BinnedParameter::new("release", release).unwrap()),
//!     ],
//!     Spill(SeriesRecorder::new("spill", RecorderKind::Flow, Aggregation::Mean)),
//! )
//! .unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(1);
//! let candidate = model.generator(&mut rng).unwrap();
//! let evaluation = model.evaluate_one(&candidate).unwrap();
//!
//! assert_eq!(evaluation.objectives.len(), 1);
//! assert_eq!(evaluation.meta.objectives[0].name, "spill");
//! ```

mod errors;
pub mod model_json;
pub mod optimisation;
pub mod parameters;
pub mod recorders;

pub use errors::*;
