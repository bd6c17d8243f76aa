//! Binned multi-scenario optimisation candidates.
//!
//! When a simulation model is run over many scenarios, optimising one
//! set of decision variables per scenario is usually intractable, and
//! one set for all scenarios too coarse. A [`MultiBinCandidate`] sits
//! in between: it partitions the scenarios into a fixed number of bins,
//! each holding one parameter vector shared by its member scenarios.
//!
//! The crate supplies the candidate type and the variation operators an
//! evolutionary search needs to explore both the bin parameters and the
//! bin memberships:
//! - [`binned_variable_gaussian_mutation`] and [`binned_variable_blend_crossover`]
//!   vary bin parameters, bounding each result once through a [`Bounder`].
//! - [`bin_crossover`] and [`bin_mutation`] vary bin memberships, repairing
//!   any member left without a bin.
//!
//! Selection, replacement and the simulation itself are left to the caller.
//!
//! # Example usage
//! ```
//! use hydrobin::{
//!     bin_crossover, bin_mutation, binned_variable_gaussian_mutation, BinBounds, CandidateConfig,
//!     MultiBinCandidate, VariationOptions,
//! };
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::num::NonZeroUsize;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let config = CandidateConfig {
//!     number_of_variables: Some(2),
//!     all_valid_members: Some((0..100).collect()),
//!     ..CandidateConfig::empty(NonZeroUsize::new(5).unwrap())
//! };
//!
//! let mut mom = MultiBinCandidate::new(config.clone(), &mut rng).unwrap();
//! let mut dad = MultiBinCandidate::new(config, &mut rng).unwrap();
//! mom.assign_missing_members(&mut rng);
//! dad.assign_missing_members(&mut rng);
//!
//! let options = VariationOptions::default();
//! let bounds = BinBounds::uniform(5, vec![0.0, 0.0], vec![1.0, 1.0]);
//! for child in bin_crossover(&mut rng, &mom, &dad, &options).unwrap() {
//!     let child = binned_variable_gaussian_mutation(&mut rng, &child, &options, &bounds).unwrap();
//!     let child = bin_mutation(&mut rng, &child, &options);
//!
//!     // Scenario 7 runs with the variables of its bin.
//!     let variables = child.get_variable_array().unwrap();
//!     let bins = child.get_bin_indices_array().unwrap();
//!     assert_eq!(variables.row(7).to_vec(), child.bins()[bins[7]].variables());
//! }
//! ```

mod bounds;
mod candidates;
pub mod logging;
mod variation;

pub use bounds::*;
pub use candidates::*;
pub use variation::*;

/// Index identifying one simulation scenario.
pub type Member = usize;
