//! Input validation for raw projects.
//!
//! Checks structural integrity of a [`RawProject`](crate::models::RawProject)
//! before the precedence index is built. Detects:
//! - Shape mismatches between the duration, requirement, and capacity arrays
//! - Negative durations, requirements, or capacities
//! - Precedence ids outside `[0, n)`
//! - Sentinel tasks with nonzero duration or requirements
//! - Tasks demanding more of a resource than its capacity (such projects
//!   can never be scheduled, so they are rejected up front rather than
//!   surfacing from the decoder)
//!
//! Cycle detection and sentinel connectivity live in the index build
//! itself, where the adjacency structures already exist; they report
//! through the same [`InvalidProject`] error.

use thiserror::Error;

use crate::models::{RawProject, TaskId};

/// A defect that makes a raw project unusable.
///
/// Fatal for the run: the caller must fix the input and rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidProject {
    /// Fewer than the two sentinel tasks.
    #[error("project needs at least a source and a sink task, got {tasks}")]
    TooFewTasks { tasks: usize },

    /// Requirement matrix row count differs from the task count.
    #[error("requirements matrix has {rows} rows for {tasks} tasks")]
    RequirementRows { rows: usize, tasks: usize },

    /// A requirement row length differs from the resource count.
    #[error("task {task} has {cols} requirement entries for {resources} resources")]
    RequirementShape {
        task: TaskId,
        cols: usize,
        resources: usize,
    },

    /// A task duration is negative.
    #[error("task {task} has negative duration {value}")]
    NegativeDuration { task: TaskId, value: i64 },

    /// A resource requirement is negative.
    #[error("task {task} has negative requirement {value} on resource {resource}")]
    NegativeRequirement {
        task: TaskId,
        resource: usize,
        value: i64,
    },

    /// A resource capacity is negative.
    #[error("resource {resource} has negative capacity {value}")]
    NegativeCapacity { resource: usize, value: i64 },

    /// A precedence edge references a task outside `[0, n)`.
    #[error("precedence ({from}, {to}) references a task outside [0, {tasks})")]
    PrecedenceOutOfRange {
        from: TaskId,
        to: TaskId,
        tasks: usize,
    },

    /// The source or sink sentinel has a nonzero duration.
    #[error("sentinel task {task} must have zero duration, got {value}")]
    SentinelDuration { task: TaskId, value: i64 },

    /// The source or sink sentinel demands a resource.
    #[error("sentinel task {task} must not require resources, demands resource {resource}")]
    SentinelRequirement { task: TaskId, resource: usize },

    /// A task alone exceeds a resource's capacity; no schedule can exist.
    #[error("task {task} demands {demand} of resource {resource}, capacity is {capacity}")]
    ExcessiveDemand {
        task: TaskId,
        resource: usize,
        demand: i64,
        capacity: i64,
    },

    /// The precedence relation is not acyclic.
    #[error("precedence graph has a cycle through task {task}")]
    CycleDetected { task: TaskId },

    /// The source sentinel does not (transitively) precede some task.
    #[error("source does not precede task {task}")]
    UnreachedFromSource { task: TaskId },

    /// Some task does not (transitively) precede the sink sentinel.
    #[error("task {task} does not precede the sink")]
    SinkUnreached { task: TaskId },
}

/// Validates the array shapes and value ranges of a raw project.
///
/// Graph-level checks (cycles, sentinel connectivity) are performed by
/// [`ProjectIndex::build`](crate::models::ProjectIndex::build) after this
/// passes.
pub(crate) fn validate(raw: &RawProject) -> Result<(), InvalidProject> {
    let n = raw.num_tasks();
    let m = raw.num_resources();

    if n < 2 {
        return Err(InvalidProject::TooFewTasks { tasks: n });
    }
    if raw.requirements.len() != n {
        return Err(InvalidProject::RequirementRows {
            rows: raw.requirements.len(),
            tasks: n,
        });
    }

    for (task, row) in raw.requirements.iter().enumerate() {
        if row.len() != m {
            return Err(InvalidProject::RequirementShape {
                task,
                cols: row.len(),
                resources: m,
            });
        }
    }

    for (task, &value) in raw.durations.iter().enumerate() {
        if value < 0 {
            return Err(InvalidProject::NegativeDuration { task, value });
        }
    }
    for (resource, &value) in raw.capacities.iter().enumerate() {
        if value < 0 {
            return Err(InvalidProject::NegativeCapacity { resource, value });
        }
    }
    for (task, row) in raw.requirements.iter().enumerate() {
        for (resource, &value) in row.iter().enumerate() {
            if value < 0 {
                return Err(InvalidProject::NegativeRequirement {
                    task,
                    resource,
                    value,
                });
            }
            if value > raw.capacities[resource] {
                return Err(InvalidProject::ExcessiveDemand {
                    task,
                    resource,
                    demand: value,
                    capacity: raw.capacities[resource],
                });
            }
        }
    }

    for &(from, to) in &raw.precedences {
        if from >= n || to >= n {
            return Err(InvalidProject::PrecedenceOutOfRange { from, to, tasks: n });
        }
    }

    for task in [0, n - 1] {
        if raw.durations[task] != 0 {
            return Err(InvalidProject::SentinelDuration {
                task,
                value: raw.durations[task],
            });
        }
        if let Some(resource) = raw.requirements[task].iter().position(|&r| r != 0) {
            return Err(InvalidProject::SentinelRequirement { task, resource });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectIndex;

    fn valid_raw() -> RawProject {
        RawProject::new(
            vec![0, 3, 5, 0],
            vec![vec![0], vec![1], vec![1], vec![0]],
            vec![1],
            vec![(0, 1), (1, 2), (2, 3)],
        )
    }

    #[test]
    fn test_valid_project_passes() {
        assert!(ProjectIndex::build(&valid_raw()).is_ok());
    }

    #[test]
    fn test_too_few_tasks() {
        let raw = RawProject::new(vec![0], vec![vec![]], vec![], vec![]);
        assert!(matches!(
            ProjectIndex::build(&raw),
            Err(InvalidProject::TooFewTasks { tasks: 1 })
        ));
    }

    #[test]
    fn test_requirement_shape_mismatch() {
        let mut raw = valid_raw();
        raw.requirements[2] = vec![1, 1];
        assert!(matches!(
            ProjectIndex::build(&raw),
            Err(InvalidProject::RequirementShape { task: 2, .. })
        ));
    }

    #[test]
    fn test_requirement_rows_mismatch() {
        let mut raw = valid_raw();
        raw.requirements.pop();
        assert!(matches!(
            ProjectIndex::build(&raw),
            Err(InvalidProject::RequirementRows { rows: 3, tasks: 4 })
        ));
    }

    #[test]
    fn test_negative_duration() {
        let mut raw = valid_raw();
        raw.durations[1] = -3;
        assert!(matches!(
            ProjectIndex::build(&raw),
            Err(InvalidProject::NegativeDuration { task: 1, value: -3 })
        ));
    }

    #[test]
    fn test_negative_requirement() {
        let mut raw = valid_raw();
        raw.requirements[2][0] = -1;
        assert!(matches!(
            ProjectIndex::build(&raw),
            Err(InvalidProject::NegativeRequirement { task: 2, .. })
        ));
    }

    #[test]
    fn test_negative_capacity() {
        let mut raw = valid_raw();
        raw.capacities[0] = -2;
        // The nonzero requirements now also exceed the capacity; the
        // negative capacity must win because it is checked first.
        assert!(matches!(
            ProjectIndex::build(&raw),
            Err(InvalidProject::NegativeCapacity { resource: 0, .. })
        ));
    }

    #[test]
    fn test_dangling_precedence() {
        let mut raw = valid_raw();
        raw.precedences.push((1, 9));
        assert!(matches!(
            ProjectIndex::build(&raw),
            Err(InvalidProject::PrecedenceOutOfRange { to: 9, .. })
        ));
    }

    #[test]
    fn test_sentinel_with_duration() {
        let mut raw = valid_raw();
        raw.durations[0] = 2;
        assert!(matches!(
            ProjectIndex::build(&raw),
            Err(InvalidProject::SentinelDuration { task: 0, value: 2 })
        ));
    }

    #[test]
    fn test_sentinel_with_requirement() {
        let mut raw = valid_raw();
        raw.requirements[3][0] = 1;
        assert!(matches!(
            ProjectIndex::build(&raw),
            Err(InvalidProject::SentinelRequirement { task: 3, .. })
        ));
    }

    #[test]
    fn test_demand_exceeding_capacity() {
        let mut raw = valid_raw();
        raw.requirements[1][0] = 4;
        assert!(matches!(
            ProjectIndex::build(&raw),
            Err(InvalidProject::ExcessiveDemand {
                task: 1,
                resource: 0,
                demand: 4,
                capacity: 1,
            })
        ));
    }

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = InvalidProject::ExcessiveDemand {
            task: 7,
            resource: 2,
            demand: 9,
            capacity: 4,
        };
        let text = err.to_string();
        assert!(text.contains("task 7"));
        assert!(text.contains("resource 2"));
    }
}
