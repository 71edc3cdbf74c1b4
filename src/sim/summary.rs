use average::{Estimate, Mean};
use serde::Serialize;

use crate::core::{SchedCore, Task, Ticks};

/// Final statistics of one run. A pure function of the finished engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub policy: String,
    pub preemptive: bool,
    pub total_time: Ticks,
    pub overload_count: u64,
    pub total_overload_time: Ticks,
    pub task_count: usize,
    pub failed_count: usize,
    pub failed_tasks: Vec<String>,
    pub avg_turnaround_time: f64,
    pub avg_wait_time: f64,
    pub avg_response_time: f64,
}

impl Summary {
    /// `total_time` is the clock before the finalizing tick, i.e. when the
    /// last task completed.
    pub fn collect(core: &SchedCore, total_time: Ticks) -> Self {
        let tasks = core.tasks();
        let failed_tasks: Vec<String> = tasks
            .iter()
            .filter(|t| t.failed())
            .map(|t| t.name.clone())
            .collect();

        Self {
            policy: core.scheduler_name().to_string(),
            preemptive: core.preemptive(),
            total_time,
            overload_count: core.overload_count(),
            total_overload_time: core.overload_count() as f64 * core.config().overload_cost,
            task_count: tasks.len(),
            failed_count: failed_tasks.len(),
            failed_tasks,
            avg_turnaround_time: avg(tasks, Task::turnaround_time),
            avg_wait_time: avg(tasks, Task::wait_time),
            avg_response_time: avg(tasks, Task::response_time),
        }
    }
}

// Tasks that never set the field are left out of the mean
fn avg(tasks: &[Task], field: impl Fn(&Task) -> Option<Ticks>) -> f64 {
    tasks
        .iter()
        .filter_map(field)
        .collect::<Mean>()
        .estimate()
}
