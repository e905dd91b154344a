//! Genetic operators over priority lists.
//!
//! Both operators preserve topological admissibility by construction, so
//! offspring never need repair:
//!
//! - [`pox_crossover`]: precedence-preserving order-based crossover. The
//!   child keeps one parent's prefix and fills the rest in the other
//!   parent's relative order; since each parent is admissible, every
//!   predecessor of a tail task is already placed or precedes it in the
//!   donor sequence.
//! - [`swap_mutation`]: exchanges two interior positions, accepting only
//!   swaps that invert no (transitive) precedence inside the swapped
//!   span.
//!
//! # Reference
//! Hartmann (1998), "A competitive genetic algorithm for
//! resource-constrained project scheduling"

use rand::Rng;

use crate::ga::chromosome::{PriorityList, UNEVALUATED};
use crate::models::{ProjectIndex, TaskId};

/// Order-based crossover at a single point `q` drawn from `[1, n-1]`.
///
/// Child 1 copies `parents.0[..q]`, then appends the missing tasks in the
/// order they appear in `parents.1`; child 2 swaps the roles. Both
/// children are unevaluated.
pub fn pox_crossover<R: Rng>(
    p1: &PriorityList,
    p2: &PriorityList,
    rng: &mut R,
) -> (PriorityList, PriorityList) {
    debug_assert_eq!(p1.len(), p2.len());
    let q = rng.random_range(1..p1.len());
    (pox_child(&p1.order, &p2.order, q), pox_child(&p2.order, &p1.order, q))
}

fn pox_child(template: &[TaskId], donor: &[TaskId], q: usize) -> PriorityList {
    let mut taken = vec![false; template.len()];
    let mut order = Vec::with_capacity(template.len());

    for &task in &template[..q] {
        taken[task] = true;
        order.push(task);
    }
    for &task in donor {
        if !taken[task] {
            order.push(task);
        }
    }

    PriorityList::new(order)
}

/// Precedence-safe swap mutation.
///
/// Draws two distinct interior positions (source and sink excluded) and
/// swaps them if legal; resamples up to `budget` times, otherwise leaves
/// the list unchanged. Returns whether a swap was applied; on success the
/// cached makespan is invalidated.
pub fn swap_mutation<R: Rng>(
    list: &mut PriorityList,
    index: &ProjectIndex,
    budget: u32,
    rng: &mut R,
) -> bool {
    let n = list.len();
    if n < 4 {
        // No two distinct interior positions exist.
        return false;
    }

    for _ in 0..budget {
        let a = rng.random_range(1..n - 1);
        let b = rng.random_range(1..n - 1);
        if a == b {
            continue;
        }
        let (a, b) = if a < b { (a, b) } else { (b, a) };
        if swap_is_legal(&list.order, index, a, b) {
            list.order.swap(a, b);
            list.makespan = UNEVALUATED;
            return true;
        }
    }
    false
}

/// A swap of positions `a < b` is legal iff it inverts no precedence
/// lying in the span: nothing in `(a, b]` may succeed `order[a]` and
/// nothing in `[a, b)` may precede `order[b]`.
fn swap_is_legal(order: &[TaskId], index: &ProjectIndex, a: usize, b: usize) -> bool {
    let front = order[a];
    let back = order[b];
    for &task in &order[a + 1..=b] {
        if index.precedes(front, task) {
            return false;
        }
    }
    for &task in &order[a..b] {
        if index.precedes(task, back) {
            return false;
        }
    }
    true
}
