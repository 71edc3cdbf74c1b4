use super::{Scheduler, pick_min_by};
use crate::core::state::{Task, TaskId, Ticks};

/// Lowest priority value first (highest when inverted), then earliest arrival.
pub struct PriorityScheduler {
    preemptive: bool,
    inverted: bool,
}

impl PriorityScheduler {
    pub fn new(preemptive: bool, inverted: bool) -> Self {
        Self {
            preemptive,
            inverted,
        }
    }
}

impl Scheduler for PriorityScheduler {
    fn name(&self) -> &str {
        "Priority"
    }

    fn preemptive(&self) -> bool {
        self.preemptive
    }

    fn select(&mut self, eligible: &[&Task], _now: Ticks) -> Option<TaskId> {
        let inverted = self.inverted;
        pick_min_by(eligible, |a, b| {
            let by_priority = if inverted {
                b.priority.cmp(&a.priority)
            } else {
                a.priority.cmp(&b.priority)
            };
            by_priority.then(a.arrival.total_cmp(&b.arrival))
        })
    }
}
