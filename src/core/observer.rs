use serde::Serialize;

use super::{
    driver::SchedCore,
    state::{Task, TaskId, TaskState, Ticks},
};

/// Checks engine invariants after every tick (debug builds only).
#[derive(Debug)]
pub struct Observer {
    step: u64,
    last_remaining: Vec<Ticks>,
    last_now: Ticks,
}

impl Observer {
    pub fn new(tasks: &[Task]) -> Self {
        Self {
            step: 0,
            last_remaining: tasks.iter().map(|t| t.remaining()).collect(),
            last_now: 0.0,
        }
    }

    pub fn steps(&self) -> u64 {
        self.step
    }

    pub fn observe(&mut self, tasks: &[Task], current: Option<TaskId>, now: Ticks, at_overload: bool) {
        self.step += 1;

        debug_assert!(now >= self.last_now, "clock went backwards: {} -> {now}", self.last_now);
        self.last_now = now;

        let running: Vec<&Task> = tasks
            .iter()
            .filter(|t| t.state() == TaskState::Running)
            .collect();
        debug_assert!(running.len() <= 1, "{} tasks running at once", running.len());
        if let Some(task) = running.first() {
            debug_assert_eq!(
                Some(task.id),
                current,
                "running task {} is not current",
                task.name
            );
        }
        if at_overload {
            debug_assert!(running.is_empty(), "task running during an overload tick");
        }

        for (task, last) in tasks.iter().zip(self.last_remaining.iter_mut()) {
            debug_assert!(
                task.remaining() >= 0.0 && task.remaining() <= *last,
                "remaining of {} went from {last} to {}",
                task.name,
                task.remaining()
            );
            *last = task.remaining();

            debug_assert!(
                task.executed() <= 0.0 || task.response_time().is_some(),
                "{} executed without a response time",
                task.name
            );
            if task.state() == TaskState::Done {
                debug_assert!(
                    task.turnaround_time().is_some() && task.wait_time().is_some(),
                    "done task {} without turnaround",
                    task.name
                );
            }
        }
    }
}

/// Per-task view captured for renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskView {
    pub name: String,
    pub arrival: Ticks,
    pub state: TaskState,
    pub remaining: Ticks,
    pub failed: bool,
}

/// Engine state after one tick. Enough to draw a timeline without
/// re-running any scheduling logic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub clock: Ticks,
    pub at_overload: bool,
    pub current: Option<TaskId>,
    pub tasks: Vec<TaskView>,
}

impl Snapshot {
    pub fn capture(core: &SchedCore) -> Self {
        Self {
            clock: core.now(),
            at_overload: core.at_overload(),
            current: core.current(),
            tasks: core
                .tasks()
                .iter()
                .map(|t| TaskView {
                    name: t.name.clone(),
                    arrival: t.arrival,
                    state: t.state(),
                    remaining: t.remaining(),
                    failed: t.failed(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InstantKind {
    Overload,
    Waiting,
    Executing,
    Finished,
    NotArrived,
}

impl InstantKind {
    pub fn symbol(&self) -> char {
        match self {
            InstantKind::Overload => '*',
            InstantKind::Waiting => '.',
            InstantKind::Executing => '#',
            InstantKind::Finished => '=',
            InstantKind::NotArrived => ' ',
        }
    }
}

/// Classifies every task in every snapshot, one row per snapshot.
///
/// During an overload tick the task that ran last is shown as paying the
/// switch.
pub fn timeline(history: &[Snapshot]) -> Vec<Vec<InstantKind>> {
    let mut last_running: Option<usize> = None;
    history
        .iter()
        .map(|snap| {
            snap.tasks
                .iter()
                .enumerate()
                .map(|(i, view)| {
                    if snap.at_overload && last_running == Some(i) {
                        InstantKind::Overload
                    } else if view.state == TaskState::Running {
                        last_running = Some(i);
                        InstantKind::Executing
                    } else if view.state == TaskState::Done {
                        InstantKind::Finished
                    } else if view.arrival < snap.clock {
                        InstantKind::Waiting
                    } else {
                        InstantKind::NotArrived
                    }
                })
                .collect()
        })
        .collect()
}
