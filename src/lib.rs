//! Solver core for the resource-constrained project scheduling problem
//! (RCPSP).
//!
//! Given tasks with fixed integer durations, precedence constraints
//! forming a DAG, and renewable resources with constant capacities, the
//! solver searches for a start time per task that respects every
//! precedence and capacity constraint while minimizing the project
//! makespan. Search runs a genetic algorithm over activity priority
//! lists; a serial schedule generation scheme decodes each list into a
//! feasible schedule.
//!
//! # Modules
//!
//! - **`models`**: [`RawProject`] boundary record, validated
//!   [`ProjectIndex`], [`Schedule`], feasibility [`verify`](models::verify)
//! - **`ga`**: [`PriorityList`] chromosome, precedence-preserving
//!   operators, the [`evolve`] loop
//! - **`scheduler`**: the [`decode`] scheme and [`ScheduleKpi`] metrics
//! - **`validation`**: build-time input checks behind [`build_project`]
//!
//! # Entry points
//!
//! ```
//! use rcpsp_solver::{build_project, decode, evolve, initial_population};
//! use rcpsp_solver::{GaConfig, PriorityList, RawProject, ScheduleKpi};
//!
//! // 0 -> {1, 2} -> 3; one resource of capacity 1 serializes the pair.
//! let raw = RawProject::new(
//!     vec![0, 3, 2, 0],
//!     vec![vec![0], vec![1], vec![1], vec![0]],
//!     vec![1],
//!     vec![(0, 1), (0, 2), (1, 3), (2, 3)],
//! );
//! let index = build_project(&raw)?;
//!
//! let population = initial_population(&index, 20, 42);
//! let config = GaConfig::default().with_generations(30).with_seed(42);
//! let result = evolve(&index, &config, population, None);
//! assert_eq!(result.best_makespan, 5);
//!
//! // Rescore any specific list, e.g. the deterministic baseline.
//! let baseline = decode(&index, &PriorityList::baseline(&index));
//! assert!(result.best_makespan <= baseline.makespan());
//!
//! let kpi = ScheduleKpi::calculate(&index, &result.best_schedule);
//! assert_eq!(kpi.makespan, 5);
//! # Ok::<(), rcpsp_solver::InvalidProject>(())
//! ```
//!
//! # Concurrency
//!
//! The evolution loop runs on the calling thread; fitness evaluation of
//! each offspring batch is the only parallel region, mapped over a
//! bounded worker pool. The project index is shared immutably, each
//! worker owns its decoder scratch, and all random draws happen on the
//! control thread — results are reproducible for any worker count.
//!
//! # References
//!
//! - Kolisch & Hartmann (1999), "Heuristic Algorithms for the RCPSP"
//! - Hartmann (1998), "A competitive genetic algorithm for the RCPSP"

pub mod ga;
pub mod models;
pub mod scheduler;
pub mod validation;

pub use ga::{
    evolve, initial_population, EvolutionResult, GaConfig, Population, PriorityList, StopReason,
};
pub use models::{ProjectIndex, RawProject, Schedule, TaskId, Time};
pub use scheduler::{decode, ScheduleKpi, Ssgs};
pub use validation::InvalidProject;

/// Validates a raw project and builds the immutable precedence index.
///
/// # Errors
/// Returns [`InvalidProject`] on malformed shapes, negative values,
/// dangling precedence ids, cycles, sentinel violations, or any task
/// demanding more of a resource than its capacity.
pub fn build_project(raw: &RawProject) -> Result<ProjectIndex, InvalidProject> {
    ProjectIndex::build(raw)
}
