//! Genetic optimization of activity priority lists.
//!
//! Evolves topologically admissible permutations of the task set; the
//! serial schedule generation scheme turns each permutation into a
//! feasible schedule whose makespan is the fitness.
//!
//! # Encoding
//!
//! An individual is a [`PriorityList`]: a permutation of `[0, n)` in
//! which every task appears after all of its predecessors. Both
//! operators preserve that property, so no repair step exists anywhere
//! in the loop.
//!
//! # Quick Start
//!
//! ```
//! use rcpsp_solver::{build_project, evolve, initial_population, GaConfig, RawProject};
//!
//! // Diamond project: 0 -> {1, 2} -> 3 on a single unit of capacity.
//! let raw = RawProject::new(
//!     vec![0, 3, 2, 0],
//!     vec![vec![0], vec![1], vec![1], vec![0]],
//!     vec![1],
//!     vec![(0, 1), (0, 2), (1, 3), (2, 3)],
//! );
//! let index = build_project(&raw).unwrap();
//!
//! let population = initial_population(&index, 20, 42);
//! let config = GaConfig::default().with_generations(25).with_seed(42);
//! let result = evolve(&index, &config, population, None);
//!
//! assert_eq!(result.best_makespan, 5);
//! ```
//!
//! # Determinism
//!
//! Every random draw — population sampling, tournament picks, crossover
//! points, mutation positions — happens on the control thread from a
//! single seeded generator. The worker pool only decodes, so a fixed
//! seed and config reproduce the run bit-for-bit at any worker count.
//!
//! # References
//!
//! - Hartmann (1998), "A competitive genetic algorithm for the RCPSP"
//! - Kolisch & Hartmann (2006), "Experimental investigation of
//!   heuristics for the RCPSP: An update"

mod chromosome;
pub mod operators;
mod runner;

pub use chromosome::{PriorityList, UNEVALUATED};
pub use runner::{evolve, initial_population, EvolutionResult, GaConfig, Population, StopReason};
