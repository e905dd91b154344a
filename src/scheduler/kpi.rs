//! Schedule quality metrics.
//!
//! Computed on demand from a project index and a schedule; nothing here
//! feeds back into the optimization.
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan (C_max) | Latest finish time |
//! | Resource utilization | worked capacity / available capacity over the makespan |
//! | Average concurrency | total busy task time / makespan |
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1.2

use serde::{Deserialize, Serialize};

use crate::models::{ProjectIndex, Schedule, Time};

/// Schedule performance indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleKpi {
    /// Makespan: latest finish time.
    pub makespan: Time,
    /// Utilization per resource, `sum(d_i * r_ik) / (c_k * makespan)`;
    /// zero for resources with zero capacity.
    pub utilization_by_resource: Vec<f64>,
    /// Mean utilization over resources with positive capacity.
    pub avg_utilization: f64,
    /// Mean number of concurrently running tasks,
    /// `sum of busy task durations / makespan`.
    pub avg_concurrency: f64,
}

impl ScheduleKpi {
    /// Computes KPIs for a schedule of the given project.
    ///
    /// A degenerate schedule (makespan zero) reports zeros throughout.
    pub fn calculate(index: &ProjectIndex, schedule: &Schedule) -> Self {
        let makespan = schedule.makespan();
        let m = index.num_resources();
        if makespan <= 0 {
            return Self {
                makespan: 0,
                utilization_by_resource: vec![0.0; m],
                avg_utilization: 0.0,
                avg_concurrency: 0.0,
            };
        }

        let mut utilization_by_resource = Vec::with_capacity(m);
        for resource in 0..m {
            let capacity = index.capacities()[resource];
            if capacity <= 0 {
                utilization_by_resource.push(0.0);
                continue;
            }
            let work: i64 = (0..index.num_tasks())
                .map(|task| index.duration(task) * index.requirements(task)[resource])
                .sum();
            utilization_by_resource.push(work as f64 / (capacity * makespan) as f64);
        }

        let usable = index.capacities().iter().filter(|&&c| c > 0).count();
        let avg_utilization = if usable == 0 {
            0.0
        } else {
            utilization_by_resource.iter().sum::<f64>() / usable as f64
        };

        let busy: Time = (0..index.num_tasks()).map(|task| index.duration(task)).sum();
        let avg_concurrency = busy as f64 / makespan as f64;

        Self {
            makespan,
            utilization_by_resource,
            avg_utilization,
            avg_concurrency,
        }
    }
}
