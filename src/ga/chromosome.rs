//! Activity-list chromosome.
//!
//! # Encoding
//!
//! An individual is a priority list: a permutation of all task ids that is
//! *topologically admissible* — every task appears after all of its
//! predecessors. The source sentinel is always first and the sink always
//! last. The decoder reads the list left to right, so relative order is
//! the genotype.
//!
//! # Reference
//! Hartmann (1998), "A competitive genetic algorithm for
//! resource-constrained project scheduling"

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::{ProjectIndex, TaskId, Time};

/// Sentinel makespan for individuals not yet decoded.
pub const UNEVALUATED: Time = Time::MAX;

/// A topologically admissible priority list with its cached makespan.
///
/// Lower makespan = fitter individual (minimization convention).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityList {
    /// Task ids in priority order.
    pub order: Vec<TaskId>,
    /// Makespan of the decoded schedule ([`UNEVALUATED`] until scored).
    pub makespan: Time,
}

impl PriorityList {
    /// Wraps an order as an unevaluated individual.
    pub fn new(order: Vec<TaskId>) -> Self {
        Self {
            order,
            makespan: UNEVALUATED,
        }
    }

    /// Draws a uniformly random admissible permutation.
    ///
    /// Kahn-style selection: repeatedly pick one task uniformly from the
    /// ready set (all predecessors already placed) and promote any
    /// successor whose last predecessor it was. O(n + e) per draw; every
    /// admissible permutation has positive probability.
    pub fn random<R: Rng>(index: &ProjectIndex, rng: &mut R) -> Self {
        let n = index.num_tasks();
        let mut remaining: Vec<u32> = (0..n).map(|t| index.in_degree(t)).collect();
        let mut ready: Vec<TaskId> = (0..n).filter(|&t| remaining[t] == 0).collect();

        let mut order = Vec::with_capacity(n);
        while !ready.is_empty() {
            let picked = ready.swap_remove(rng.random_range(0..ready.len()));
            order.push(picked);
            for &succ in index.successors(picked) {
                remaining[succ] -= 1;
                if remaining[succ] == 0 {
                    ready.push(succ);
                }
            }
        }

        Self::new(order)
    }

    /// The canonical deterministic list: ids in natural order, stabilized
    /// topologically. Serves as the non-optimized reference schedule.
    pub fn baseline(index: &ProjectIndex) -> Self {
        Self::new(index.topological_order().to_vec())
    }

    /// Whether this list is a permutation of all tasks that respects
    /// every precedence, with the sentinels at the ends.
    pub fn is_admissible(&self, index: &ProjectIndex) -> bool {
        let n = index.num_tasks();
        if self.order.len() != n {
            return false;
        }
        if self.order[0] != index.source() || self.order[n - 1] != index.sink() {
            return false;
        }

        let mut position = vec![usize::MAX; n];
        for (pos, &task) in self.order.iter().enumerate() {
            if task >= n || position[task] != usize::MAX {
                return false;
            }
            position[task] = pos;
        }

        index.edges().all(|(u, v)| position[u] < position[v])
    }

    /// Number of tasks in the list.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether the cached makespan is current.
    pub fn is_evaluated(&self) -> bool {
        self.makespan != UNEVALUATED
    }
}
