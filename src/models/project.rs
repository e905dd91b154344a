//! Project model and precedence index.
//!
//! A project is a set of tasks with fixed integer durations, renewable
//! resources with constant capacities, and precedence constraints forming
//! a DAG. Two sentinel tasks frame the project: the source (id 0) precedes
//! every task and the sink (id n-1) succeeds every task; both have zero
//! duration and zero requirements.
//!
//! # Time Representation
//! All times and quantities are plain `i64` values in abstract time units.
//! The consumer defines what one unit means (hours, shifts, days).
//!
//! # Reference
//! Kolisch & Hartmann (1999), "Heuristic Algorithms for the RCPSP"

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::validation::{self, InvalidProject};

/// Task identifier, dense in `[0, n)`.
pub type TaskId = usize;

/// Time instant or span.
pub type Time = i64;

/// Raw project description as consumed at the system boundary.
///
/// Plain arrays, one row per task: `durations[i]` is task `i`'s duration,
/// `requirements[i][k]` its demand on resource `k`, `capacities[k]` the
/// constant capacity of resource `k`, and `precedences` the edge list of
/// the precedence DAG. Task 0 must be the source sentinel and task n-1
/// the sink sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProject {
    /// Per-task durations (n entries, non-negative).
    pub durations: Vec<i64>,
    /// Per-task resource demands (n rows of m entries, non-negative).
    pub requirements: Vec<Vec<i64>>,
    /// Per-resource capacities (m entries, non-negative).
    pub capacities: Vec<i64>,
    /// Precedence edges `(u, v)`: `u` finishes at or before `v` starts.
    pub precedences: Vec<(TaskId, TaskId)>,
}

impl RawProject {
    /// Creates a raw project from its constituent arrays.
    pub fn new(
        durations: Vec<i64>,
        requirements: Vec<Vec<i64>>,
        capacities: Vec<i64>,
        precedences: Vec<(TaskId, TaskId)>,
    ) -> Self {
        Self {
            durations,
            requirements,
            capacities,
            precedences,
        }
    }

    /// Number of tasks, including the two sentinels.
    pub fn num_tasks(&self) -> usize {
        self.durations.len()
    }

    /// Number of resources.
    pub fn num_resources(&self) -> usize {
        self.capacities.len()
    }
}

/// Validated, immutable view of a project.
///
/// Built once from a [`RawProject`] and thereafter shared by reference:
/// the decoder, the genetic operators, and the metrics all read from it
/// and never mutate it. Construction validates the input (see
/// [`InvalidProject`]), derives forward and backward adjacency, the
/// in-degree vector, a canonical topological order, and the transitive
/// reachability relation used for swap legality and schedule checks.
#[derive(Debug, Clone)]
pub struct ProjectIndex {
    durations: Vec<Time>,
    requirements: Vec<Vec<i64>>,
    capacities: Vec<i64>,
    successors: Vec<Vec<TaskId>>,
    predecessors: Vec<Vec<TaskId>>,
    in_degree: Vec<u32>,
    topo_order: Vec<TaskId>,
    // Row-major n*n matrix: `reachable[u * n + v]` iff u transitively precedes v.
    reachable: Vec<bool>,
}

impl ProjectIndex {
    /// Validates a raw project and builds the index.
    ///
    /// # Errors
    /// Returns [`InvalidProject`] on malformed shapes, negative values,
    /// out-of-range precedence ids, cycles, sentinel violations, or any
    /// task demanding more of a resource than its capacity.
    pub fn build(raw: &RawProject) -> Result<Self, InvalidProject> {
        validation::validate(raw)?;

        let n = raw.num_tasks();
        let mut edges: Vec<(TaskId, TaskId)> = raw.precedences.clone();
        edges.sort_unstable();
        edges.dedup();

        let mut successors = vec![Vec::new(); n];
        let mut predecessors = vec![Vec::new(); n];
        let mut in_degree = vec![0u32; n];
        for &(u, v) in &edges {
            if u == v {
                return Err(InvalidProject::CycleDetected { task: u });
            }
            successors[u].push(v);
            predecessors[v].push(u);
            in_degree[v] += 1;
        }

        let topo_order = topological_order(&successors, &in_degree)?;
        let reachable = reachability(&successors, &topo_order);

        let index = Self {
            durations: raw.durations.clone(),
            requirements: raw.requirements.clone(),
            capacities: raw.capacities.clone(),
            successors,
            predecessors,
            in_degree,
            topo_order,
            reachable,
        };
        index.check_sentinel_reach()?;
        Ok(index)
    }

    /// Number of tasks, including the two sentinels.
    pub fn num_tasks(&self) -> usize {
        self.durations.len()
    }

    /// Number of resources.
    pub fn num_resources(&self) -> usize {
        self.capacities.len()
    }

    /// The source sentinel id.
    pub fn source(&self) -> TaskId {
        0
    }

    /// The sink sentinel id.
    pub fn sink(&self) -> TaskId {
        self.num_tasks() - 1
    }

    /// Duration of a task.
    #[inline]
    pub fn duration(&self, task: TaskId) -> Time {
        self.durations[task]
    }

    /// Per-resource demand row of a task.
    #[inline]
    pub fn requirements(&self, task: TaskId) -> &[i64] {
        &self.requirements[task]
    }

    /// Per-resource capacities.
    #[inline]
    pub fn capacities(&self) -> &[i64] {
        &self.capacities
    }

    /// Tasks that must finish before `task` starts.
    #[inline]
    pub fn predecessors(&self, task: TaskId) -> &[TaskId] {
        &self.predecessors[task]
    }

    /// Tasks that may start only after `task` finishes.
    #[inline]
    pub fn successors(&self, task: TaskId) -> &[TaskId] {
        &self.successors[task]
    }

    /// Number of direct predecessors of `task`.
    #[inline]
    pub fn in_degree(&self, task: TaskId) -> u32 {
        self.in_degree[task]
    }

    /// Canonical topological order (smallest ready id first).
    pub fn topological_order(&self) -> &[TaskId] {
        &self.topo_order
    }

    /// Whether `u` transitively precedes `v`.
    #[inline]
    pub fn precedes(&self, u: TaskId, v: TaskId) -> bool {
        self.reachable[u * self.num_tasks() + v]
    }

    /// Precedence edges, one `(u, v)` pair per direct constraint.
    pub fn edges(&self) -> impl Iterator<Item = (TaskId, TaskId)> + '_ {
        self.successors
            .iter()
            .enumerate()
            .flat_map(|(u, succs)| succs.iter().map(move |&v| (u, v)))
    }

    fn check_sentinel_reach(&self) -> Result<(), InvalidProject> {
        let n = self.num_tasks();
        for task in 1..n {
            if !self.precedes(self.source(), task) {
                return Err(InvalidProject::UnreachedFromSource { task });
            }
        }
        for task in 0..n - 1 {
            if !self.precedes(task, self.sink()) {
                return Err(InvalidProject::SinkUnreached { task });
            }
        }
        Ok(())
    }
}

/// Kahn's algorithm with a min-heap over ready ids, so the order is the
/// deterministic "natural ids, topologically stabilized" sequence.
fn topological_order(
    successors: &[Vec<TaskId>],
    in_degree: &[u32],
) -> Result<Vec<TaskId>, InvalidProject> {
    let n = successors.len();
    let mut remaining = in_degree.to_vec();
    let mut ready: BinaryHeap<Reverse<TaskId>> = (0..n)
        .filter(|&t| remaining[t] == 0)
        .map(Reverse)
        .collect();

    let mut order = Vec::with_capacity(n);
    while let Some(Reverse(task)) = ready.pop() {
        order.push(task);
        for &succ in &successors[task] {
            remaining[succ] -= 1;
            if remaining[succ] == 0 {
                ready.push(Reverse(succ));
            }
        }
    }

    if order.len() != n {
        // Any task still blocked lies on or behind a cycle.
        let task = (0..n).find(|&t| remaining[t] > 0).unwrap_or(0);
        return Err(InvalidProject::CycleDetected { task });
    }
    Ok(order)
}

/// Transitive closure over the DAG, filled in reverse topological order
/// so each successor's row is complete before it is merged.
fn reachability(successors: &[Vec<TaskId>], topo_order: &[TaskId]) -> Vec<bool> {
    let n = successors.len();
    let mut reachable = vec![false; n * n];
    for &u in topo_order.iter().rev() {
        for &v in &successors[u] {
            reachable[u * n + v] = true;
            for w in 0..n {
                if reachable[v * n + w] {
                    reachable[u * n + w] = true;
                }
            }
        }
    }
    reachable
}
