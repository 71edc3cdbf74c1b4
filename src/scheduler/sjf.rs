use super::{Scheduler, pick_min_by};
use crate::core::state::{Task, TaskId, Ticks};

/// Shortest remaining time first, then lowest priority value.
///
/// Non-preemptive runs only consult remaining time when a new task is
/// picked, so it equals the burst time there.
pub struct SjfScheduler {
    preemptive: bool,
}

impl SjfScheduler {
    pub fn new(preemptive: bool) -> Self {
        Self { preemptive }
    }
}

impl Scheduler for SjfScheduler {
    fn name(&self) -> &str {
        "SJF"
    }

    fn preemptive(&self) -> bool {
        self.preemptive
    }

    fn select(&mut self, eligible: &[&Task], _now: Ticks) -> Option<TaskId> {
        pick_min_by(eligible, |a, b| {
            a.remaining()
                .total_cmp(&b.remaining())
                .then(a.priority.cmp(&b.priority))
        })
    }
}
