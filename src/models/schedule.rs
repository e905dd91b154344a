//! Schedule (solution) model.
//!
//! A schedule assigns every task a start time. Feasibility means every
//! precedence is respected and no resource is ever loaded past its
//! capacity; [`verify`] reports violations for schedules produced outside
//! the decoder.

use serde::{Deserialize, Serialize};

use crate::models::{ProjectIndex, TaskId, Time};

/// A complete schedule: one start time per task.
///
/// Produced by the decoder; finish times are carried alongside so that
/// metrics and verification never re-derive them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Start time per task, indexed by task id.
    pub start_times: Vec<Time>,
    /// Finish time per task (`start + duration`), indexed by task id.
    pub finish_times: Vec<Time>,
}

impl Schedule {
    /// Start time of a task.
    #[inline]
    pub fn start(&self, task: TaskId) -> Time {
        self.start_times[task]
    }

    /// Finish time of a task.
    #[inline]
    pub fn finish(&self, task: TaskId) -> Time {
        self.finish_times[task]
    }

    /// Makespan: latest finish time across all tasks.
    pub fn makespan(&self) -> Time {
        self.finish_times.iter().copied().max().unwrap_or(0)
    }

    /// Number of scheduled tasks.
    pub fn num_tasks(&self) -> usize {
        self.start_times.len()
    }
}

/// A constraint violation found in a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Human-readable description.
    pub message: String,
}

/// Classification of schedule violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// A task started before a predecessor finished.
    PrecedenceViolation,
    /// A resource was loaded beyond its capacity at some instant.
    CapacityExceeded,
}

/// Checks a schedule against the project's precedence and capacity
/// constraints.
///
/// Returns one entry per violated precedence edge and one per instant a
/// resource first exceeds its capacity. Decoder output always verifies
/// clean; this exists for schedules arriving from elsewhere and for
/// tests.
pub fn verify(index: &ProjectIndex, schedule: &Schedule) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (u, v) in index.edges() {
        if schedule.start(v) < schedule.finish(u) {
            violations.push(Violation {
                violation_type: ViolationType::PrecedenceViolation,
                message: format!(
                    "task {v} starts at {} before predecessor {u} finishes at {}",
                    schedule.start(v),
                    schedule.finish(u)
                ),
            });
        }
    }

    for resource in 0..index.num_resources() {
        let capacity = index.capacities()[resource];
        // Half-open intervals: a release at time t frees capacity before
        // any claim at the same t, so releases sort first.
        let mut events: Vec<(Time, i64)> = Vec::new();
        for task in 0..index.num_tasks() {
            let demand = index.requirements(task)[resource];
            if demand > 0 && index.duration(task) > 0 {
                events.push((schedule.start(task), demand));
                events.push((schedule.finish(task), -demand));
            }
        }
        events.sort_unstable();

        let mut load = 0;
        for (time, delta) in events {
            load += delta;
            if delta > 0 && load > capacity {
                violations.push(Violation {
                    violation_type: ViolationType::CapacityExceeded,
                    message: format!(
                        "resource {resource} loaded to {load} of {capacity} at time {time}"
                    ),
                });
            }
        }
    }

    violations
}
