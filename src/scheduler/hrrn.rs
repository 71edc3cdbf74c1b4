use super::Scheduler;
use crate::core::state::{Task, TaskId, Ticks};

/// Highest response ratio next.
///
/// The ratio is `(waited + executed) / executed`, where `waited` is time
/// since arrival spent off the CPU. A task that has not executed yet has an
/// infinite ratio, so fresh arrivals always go first.
pub struct HrrnScheduler {
    preemptive: bool,
}

impl HrrnScheduler {
    pub fn new(preemptive: bool) -> Self {
        Self { preemptive }
    }
}

pub fn response_ratio(task: &Task, now: Ticks) -> f64 {
    let executed = task.executed();
    if executed <= 0.0 {
        return f64::INFINITY;
    }
    let waited = (now - task.arrival - executed).max(0.0);
    (waited + executed) / executed
}

impl Scheduler for HrrnScheduler {
    fn name(&self) -> &str {
        "HRRN"
    }

    fn preemptive(&self) -> bool {
        self.preemptive
    }

    fn select(&mut self, eligible: &[&Task], now: Ticks) -> Option<TaskId> {
        let mut best: Option<(&Task, f64)> = None;
        for &task in eligible {
            let ratio = response_ratio(task, now);
            // Strictly greater keeps the earliest registered on ties
            let better = match best {
                Some((_, top)) => ratio > top,
                None => true,
            };
            if better {
                best = Some((task, ratio));
            }
        }
        best.map(|(task, _)| task.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::TaskSpec;
    use crate::scheduler::tests::{refs, tasks};

    #[test]
    fn unexecuted_task_has_infinite_ratio() {
        let all = tasks(&[TaskSpec::new("A", 0.0, 3.0)]);
        assert_eq!(response_ratio(&all[0], 10.0), f64::INFINITY);
    }

    #[test]
    fn ratio_uses_execution_time() {
        let mut all = tasks(&[TaskSpec::new("A", 0.0, 5.0)]);
        all[0].advance(0.0, 1.0, true);
        all[0].advance(1.0, 1.0, true);
        // 2 executed, 4 waited
        assert_eq!(response_ratio(&all[0], 6.0), 3.0);
    }

    #[test]
    fn fresh_arrival_beats_started_task() {
        let mut all = tasks(&[TaskSpec::new("A", 0.0, 5.0), TaskSpec::new("B", 2.0, 9.0)]);
        all[0].advance(0.0, 2.0, true);
        assert_eq!(HrrnScheduler::new(false).select(&refs(&all), 2.0), Some(1));
    }

    #[test]
    fn starved_task_overtakes() {
        let mut all = tasks(&[TaskSpec::new("A", 0.0, 9.0), TaskSpec::new("B", 0.0, 9.0)]);
        // A ran 4 of the first 5 units, B ran 1
        for t in 0..4 {
            all[0].advance(t as Ticks, 1.0, true);
        }
        all[1].advance(4.0, 1.0, true);
        // A: 5/4, B: 5/1
        assert_eq!(HrrnScheduler::new(true).select(&refs(&all), 5.0), Some(1));
    }

    #[test]
    fn ties_go_to_earliest_registered() {
        let all = tasks(&[TaskSpec::new("A", 0.0, 5.0), TaskSpec::new("B", 0.0, 2.0)]);
        assert_eq!(HrrnScheduler::new(false).select(&refs(&all), 0.0), Some(0));
    }
}
