use super::{Scheduler, pick_min_by};
use crate::core::state::{Task, TaskId, Ticks};

/// Earliest arrival first. Never preempts.
pub struct FcfsScheduler;

impl Scheduler for FcfsScheduler {
    fn name(&self) -> &str {
        "FCFS"
    }

    fn preemptive(&self) -> bool {
        false
    }

    fn select(&mut self, eligible: &[&Task], _now: Ticks) -> Option<TaskId> {
        pick_min_by(eligible, |a, b| a.arrival.total_cmp(&b.arrival))
    }
}
