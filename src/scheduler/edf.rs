use super::{Scheduler, pick_min_by};
use crate::core::state::{Task, TaskId, Ticks};

/// Earliest absolute deadline first, then lowest priority value.
/// Tasks without a deadline sort last.
pub struct EdfScheduler {
    preemptive: bool,
}

impl EdfScheduler {
    pub fn new(preemptive: bool) -> Self {
        Self { preemptive }
    }
}

impl Scheduler for EdfScheduler {
    fn name(&self) -> &str {
        "EDF"
    }

    fn preemptive(&self) -> bool {
        self.preemptive
    }

    fn select(&mut self, eligible: &[&Task], _now: Ticks) -> Option<TaskId> {
        pick_min_by(eligible, |a, b| {
            a.deadline
                .total_cmp(&b.deadline)
                .then(a.priority.cmp(&b.priority))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::TaskSpec;
    use crate::scheduler::tests::{refs, tasks};

    #[test]
    fn earliest_deadline_wins() {
        let all = tasks(&[
            TaskSpec::new("A", 0.0, 5.0).deadline(20.0),
            TaskSpec::new("B", 0.0, 3.0).deadline(4.0),
        ]);
        assert_eq!(EdfScheduler::new(false).select(&refs(&all), 0.0), Some(1));
    }

    #[test]
    fn no_deadline_sorts_last() {
        let all = tasks(&[
            TaskSpec::new("free", 0.0, 1.0).priority(-5),
            TaskSpec::new("bound", 0.0, 1.0).deadline(100.0).priority(9),
        ]);
        assert_eq!(EdfScheduler::new(true).select(&refs(&all), 0.0), Some(1));
    }

    #[test]
    fn priority_breaks_deadline_ties() {
        let all = tasks(&[
            TaskSpec::new("A", 0.0, 1.0).deadline(5.0).priority(2),
            TaskSpec::new("B", 0.0, 1.0).deadline(5.0).priority(0),
        ]);
        assert_eq!(EdfScheduler::new(false).select(&refs(&all), 0.0), Some(1));
    }
}
