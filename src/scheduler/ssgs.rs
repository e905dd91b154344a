//! Serial schedule generation scheme (SSGS).
//!
//! Decodes an activity priority list into a feasible schedule: tasks are
//! placed one at a time in list order, each at the earliest start that
//! respects its predecessors' finish times and leaves every resource
//! within capacity for the task's whole execution. The relative order of
//! the list is the only channel by which the optimizer influences the
//! outcome.
//!
//! # Resource profile
//!
//! Remaining capacity over time is kept as one ordered breakpoint map per
//! resource (`time -> remaining`), initialized to `{0 -> capacity}`.
//! Availability tests walk the breakpoints overlapping the candidate
//! window; reservations split the window out and subtract the demand.
//! Lookups stay logarithmic in the number of breakpoints, so long sparse
//! horizons cost no more than dense ones.
//!
//! # Reference
//! Kolisch (1996), "Serial and parallel resource-constrained project
//! scheduling methods revisited"

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included, Unbounded};

use crate::ga::PriorityList;
use crate::models::{ProjectIndex, Schedule, TaskId, Time};

/// Decodes a priority list into a schedule.
///
/// Pure: equal inputs yield equal outputs. The list must be topologically
/// admissible (decoder outputs and operator outputs always are).
///
/// # Example
/// ```
/// use rcpsp_solver::{build_project, decode, PriorityList, RawProject};
///
/// let raw = RawProject::new(
///     vec![0, 3, 5, 0],
///     vec![vec![0], vec![1], vec![1], vec![0]],
///     vec![1],
///     vec![(0, 1), (1, 2), (2, 3)],
/// );
/// let index = build_project(&raw).unwrap();
/// let schedule = decode(&index, &PriorityList::baseline(&index));
/// assert_eq!(schedule.makespan(), 8);
/// ```
pub fn decode(index: &ProjectIndex, list: &PriorityList) -> Schedule {
    Ssgs::new(index).schedule(&list.order)
}

/// Reusable SSGS decoder.
///
/// Owns the scratch resource profile so repeated decodes (the optimizer's
/// hot path) allocate nothing beyond the returned schedule. One instance
/// per worker thread; instances share nothing but the immutable index.
#[derive(Debug, Clone)]
pub struct Ssgs<'a> {
    index: &'a ProjectIndex,
    profile: ResourceProfile,
    finish: Vec<Time>,
}

impl<'a> Ssgs<'a> {
    /// Creates a decoder for the given project.
    pub fn new(index: &'a ProjectIndex) -> Self {
        Self {
            index,
            profile: ResourceProfile::new(index.capacities()),
            finish: vec![0; index.num_tasks()],
        }
    }

    /// Decodes a priority list into a feasible schedule.
    pub fn schedule(&mut self, order: &[TaskId]) -> Schedule {
        debug_assert_eq!(order.len(), self.index.num_tasks());

        self.profile.reset();
        self.finish.fill(0);
        let mut start_times = vec![0; self.index.num_tasks()];

        for &task in order {
            let earliest = self
                .index
                .predecessors(task)
                .iter()
                .map(|&p| self.finish[p])
                .max()
                .unwrap_or(0);
            let duration = self.index.duration(task);
            let demands = self.index.requirements(task);

            let start = if duration == 0 {
                // Milestones occupy an instant and consume nothing.
                earliest
            } else {
                let start = self.profile.earliest_fit(earliest, duration, demands);
                self.profile.reserve(start, start + duration, demands);
                start
            };

            start_times[task] = start;
            self.finish[task] = start + duration;
        }

        log::trace!(
            "decoded {} tasks, makespan {}",
            order.len(),
            self.finish[self.index.sink()]
        );

        Schedule {
            start_times,
            finish_times: self.finish.clone(),
        }
    }
}

/// Remaining capacity over time, one breakpoint map per resource.
#[derive(Debug, Clone)]
struct ResourceProfile {
    capacities: Vec<i64>,
    remaining: Vec<BTreeMap<Time, i64>>,
}

impl ResourceProfile {
    fn new(capacities: &[i64]) -> Self {
        let mut profile = Self {
            capacities: capacities.to_vec(),
            remaining: vec![BTreeMap::new(); capacities.len()],
        };
        profile.reset();
        profile
    }

    /// Restores every resource to full capacity from time zero.
    fn reset(&mut self) {
        for (map, &capacity) in self.remaining.iter_mut().zip(&self.capacities) {
            map.clear();
            map.insert(0, capacity);
        }
    }

    /// Smallest `t >= earliest` with `demands` available throughout
    /// `[t, t + duration)` on every resource.
    fn earliest_fit(&self, earliest: Time, duration: Time, demands: &[i64]) -> Time {
        let mut t = earliest;
        loop {
            let mut moved = false;
            for (resource, &demand) in demands.iter().enumerate() {
                if demand == 0 {
                    continue;
                }
                if let Some(retry) = self.retry_at(resource, demand, t, t + duration) {
                    t = retry;
                    moved = true;
                    break;
                }
            }
            if !moved {
                return t;
            }
        }
    }

    /// `None` when `[start, end)` holds at least `demand` units on
    /// `resource` throughout; otherwise the next time worth retrying.
    fn retry_at(&self, resource: usize, demand: i64, start: Time, end: Time) -> Option<Time> {
        let map = &self.remaining[resource];
        let capacity = self.capacities[resource];

        let at_start = map
            .range(..=start)
            .next_back()
            .map_or(capacity, |(_, &v)| v);
        let shortfall = if at_start < demand {
            Some(start)
        } else {
            map.range((Excluded(start), Excluded(end)))
                .find(|&(_, &v)| v < demand)
                .map(|(&t, _)| t)
        };
        let shortfall = shortfall?;

        // The final breakpoint always carries full capacity, and demand
        // never exceeds capacity for a validated project, so a recovery
        // point exists past any shortfall.
        map.range((Excluded(shortfall), Unbounded))
            .find(|&(_, &v)| v >= demand)
            .map(|(&t, _)| t)
    }

    /// Subtracts `demands` from every resource over `[start, end)`.
    fn reserve(&mut self, start: Time, end: Time, demands: &[i64]) {
        for (resource, &demand) in demands.iter().enumerate() {
            if demand == 0 {
                continue;
            }
            let capacity = self.capacities[resource];
            let map = &mut self.remaining[resource];

            let at_start = map
                .range(..=start)
                .next_back()
                .map_or(capacity, |(_, &v)| v);
            map.entry(start).or_insert(at_start);

            let at_end = map.range(..=end).next_back().map_or(capacity, |(_, &v)| v);
            map.entry(end).or_insert(at_end);

            for (_, v) in map.range_mut((Included(start), Excluded(end))) {
                *v -= demand;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{verify, RawProject};

    fn index(raw: &RawProject) -> ProjectIndex {
        ProjectIndex::build(raw).unwrap()
    }

    fn list(order: &[TaskId]) -> PriorityList {
        PriorityList::new(order.to_vec())
    }

    #[test]
    fn test_single_chain() {
        // 0 -> 1 -> 2 -> 3 on one unit of capacity: pure sequence.
        let index = index(&RawProject::new(
            vec![0, 3, 5, 0],
            vec![vec![0], vec![1], vec![1], vec![0]],
            vec![1],
            vec![(0, 1), (1, 2), (2, 3)],
        ));
        let schedule = decode(&index, &list(&[0, 1, 2, 3]));
        assert_eq!(schedule.start_times, vec![0, 0, 3, 8]);
        assert_eq!(schedule.makespan(), 8);
        assert!(verify(&index, &schedule).is_empty());
    }

    #[test]
    fn test_parallel_within_capacity() {
        // Two independent tasks fit side by side under capacity 2.
        let index = index(&RawProject::new(
            vec![0, 4, 4, 0],
            vec![vec![0], vec![1], vec![1], vec![0]],
            vec![2],
            vec![(0, 1), (0, 2), (1, 3), (2, 3)],
        ));
        let schedule = decode(&index, &list(&[0, 1, 2, 3]));
        assert_eq!(schedule.start(1), 0);
        assert_eq!(schedule.start(2), 0);
        assert_eq!(schedule.makespan(), 4);
        assert!(verify(&index, &schedule).is_empty());
    }

    #[test]
    fn test_capacity_one_serializes() {
        // Same diamond, capacity 1: either order decodes to 8.
        let index = index(&RawProject::new(
            vec![0, 4, 4, 0],
            vec![vec![0], vec![1], vec![1], vec![0]],
            vec![1],
            vec![(0, 1), (0, 2), (1, 3), (2, 3)],
        ));
        for order in [[0, 1, 2, 3], [0, 2, 1, 3]] {
            let schedule = decode(&index, &list(&order));
            assert_eq!(schedule.makespan(), 8);
            assert!(verify(&index, &schedule).is_empty());
        }
    }

    fn contention_project() -> RawProject {
        // 0 -> {1, 2, 3} -> 4 on capacity 2; demands 1, 2, 1.
        RawProject::new(
            vec![0, 2, 2, 2, 0],
            vec![vec![0], vec![1], vec![2], vec![1], vec![0]],
            vec![2],
            vec![(0, 1), (0, 2), (0, 3), (1, 4), (2, 4), (3, 4)],
        )
    }

    #[test]
    fn test_contention_resolved_by_list_order() {
        let index = index(&contention_project());
        // 1 and 3 pack together, then 2 takes the full capacity.
        let schedule = decode(&index, &list(&[0, 1, 3, 2, 4]));
        assert_eq!(schedule.start(1), 0);
        assert_eq!(schedule.start(3), 0);
        assert_eq!(schedule.start(2), 2);
        assert_eq!(schedule.makespan(), 4);
        assert!(verify(&index, &schedule).is_empty());
    }

    #[test]
    fn test_backfill_behind_wide_task() {
        // Task 2 blocks [0, 2) entirely; 1 and 3 both fit in [2, 4).
        let index = index(&contention_project());
        let schedule = decode(&index, &list(&[0, 2, 1, 3, 4]));
        assert_eq!(schedule.start(2), 0);
        assert_eq!(schedule.start(1), 2);
        assert_eq!(schedule.start(3), 2);
        assert_eq!(schedule.makespan(), 4);
        assert!(verify(&index, &schedule).is_empty());
    }

    #[test]
    fn test_zero_duration_task_consumes_nothing() {
        // Milestone 2 sits at its predecessor's finish despite demanding
        // nothing and blocking nobody.
        let index = index(&RawProject::new(
            vec![0, 3, 0, 2, 0],
            vec![vec![0], vec![1], vec![0], vec![1], vec![0]],
            vec![1],
            vec![(0, 1), (1, 2), (2, 3), (3, 4)],
        ));
        let schedule = decode(&index, &list(&[0, 1, 2, 3, 4]));
        assert_eq!(schedule.start(2), 3);
        assert_eq!(schedule.finish(2), 3);
        assert_eq!(schedule.start(3), 3);
        assert_eq!(schedule.makespan(), 5);
    }

    #[test]
    fn test_multiple_resources_constrain_jointly() {
        // Tasks 1 and 2 could share resource 0 but collide on resource 1.
        let index = index(&RawProject::new(
            vec![0, 3, 3, 0],
            vec![vec![0, 0], vec![1, 1], vec![1, 1], vec![0, 0]],
            vec![2, 1],
            vec![(0, 1), (0, 2), (1, 3), (2, 3)],
        ));
        let schedule = decode(&index, &list(&[0, 1, 2, 3]));
        assert_eq!(schedule.makespan(), 6);
        assert!(verify(&index, &schedule).is_empty());
    }

    #[test]
    fn test_decode_is_pure() {
        let index = index(&contention_project());
        let order = list(&[0, 3, 2, 1, 4]);
        assert_eq!(decode(&index, &order), decode(&index, &order));
    }

    #[test]
    fn test_decoder_reuse_matches_fresh_decoder() {
        let index = index(&contention_project());
        let mut ssgs = Ssgs::new(&index);
        let first = ssgs.schedule(&[0, 1, 3, 2, 4]);
        let again = ssgs.schedule(&[0, 1, 3, 2, 4]);
        assert_eq!(first, again);
        assert_eq!(first, decode(&index, &list(&[0, 1, 3, 2, 4])));
    }

    #[test]
    fn test_random_lists_always_feasible() {
        use rand::rngs::SmallRng;
        use rand::SeedableRng;

        let index = index(&contention_project());
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..50 {
            let list = PriorityList::random(&index, &mut rng);
            let schedule = decode(&index, &list);
            assert!(verify(&index, &schedule).is_empty());
        }
    }
}
