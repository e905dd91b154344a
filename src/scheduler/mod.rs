//! Schedule generation and evaluation.
//!
//! The serial schedule generation scheme ([`Ssgs`], [`decode`]) turns a
//! priority list into a feasible schedule; [`ScheduleKpi`] scores a
//! finished schedule.
//!
//! # References
//!
//! - Kolisch (1996), "Serial and parallel resource-constrained project
//!   scheduling methods revisited"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"

mod kpi;
mod ssgs;

pub use kpi::ScheduleKpi;
pub use ssgs::{decode, Ssgs};
