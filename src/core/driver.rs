use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{
    event::SchedCoreEvent,
    observer::Observer,
    state::{Task, TaskId, TaskState, Ticks},
};
use crate::error::{Result, SimError};
use crate::scheduler::Scheduler;

pub const DEFAULT_TIME_SLICE: Ticks = 1.0;
pub const DEFAULT_OVERLOAD_COST: Ticks = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Execution charged per tick when a task runs.
    pub time_slice: Ticks,
    /// Time charged for each preemption-driven context switch.
    pub overload_cost: Ticks,
    /// When false, a task that misses its deadline is force-finished.
    pub continue_after_deadline: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            time_slice: DEFAULT_TIME_SLICE,
            overload_cost: DEFAULT_OVERLOAD_COST,
            continue_after_deadline: true,
        }
    }
}

impl CoreConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.time_slice.is_finite() || self.time_slice <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "time slice must be > 0, got {}",
                self.time_slice
            )));
        }
        if !self.overload_cost.is_finite() || self.overload_cost < 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "overload cost must be >= 0, got {}",
                self.overload_cost
            )));
        }
        Ok(())
    }
}

/// Single-CPU scheduling engine driven one tick at a time.
pub struct SchedCore {
    tasks: Vec<Task>,
    scheduler: Box<dyn Scheduler>,
    config: CoreConfig,
    now: Ticks,
    current: Option<TaskId>,
    at_overload: bool,
    overload_count: u64,
    observer: Observer,
}

impl SchedCore {
    /// Takes ownership of `tasks`; ids are reassigned in the given order.
    pub fn new(
        mut tasks: Vec<Task>,
        scheduler: Box<dyn Scheduler>,
        config: CoreConfig,
    ) -> Result<Self> {
        config.validate()?;

        let mut names = FxHashSet::default();
        for (id, task) in tasks.iter_mut().enumerate() {
            if !names.insert(task.name.clone()) {
                return Err(SimError::DuplicateTask(task.name.clone()));
            }
            task.id = id;
        }

        let observer = Observer::new(&tasks);
        Ok(Self {
            tasks,
            scheduler,
            config,
            now: 0.0,
            current: None,
            at_overload: false,
            overload_count: 0,
            observer,
        })
    }

    pub fn tick(&mut self) -> Vec<SchedCoreEvent> {
        let mut events = Vec::new();
        if self.tasks.is_empty() {
            return events;
        }
        trace!(now = self.now, current = ?self.current, "tick");

        // A task that ran out last tick is only finalized now
        if let Some(id) = self.current {
            let task = &mut self.tasks[id];
            if task.is_finished() && task.state() != TaskState::Done {
                let from = task.state();
                task.mark_done();
                debug!(task = %task.name, now = self.now, "task done");
                events.push(SchedCoreEvent::TaskStateChange {
                    task: id,
                    from,
                    to: TaskState::Done,
                });
            }
        }

        let now = self.now;
        let eligible: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|t| t.is_eligible(now))
            .map(|t| t.id)
            .collect();

        if !self.scheduler.preemptive() {
            let running = self
                .current
                .is_some_and(|id| self.tasks[id].state() == TaskState::Running);
            if !running {
                let next = self.select(&eligible);
                self.set_current(next, &mut events);
            }
        } else if self.at_overload {
            // The switch was charged last tick; the chosen task runs now
            self.at_overload = false;
        } else {
            let prev = self.current;
            let mut preempted = false;
            if let Some(id) = prev {
                if self.tasks[id].state() == TaskState::Running {
                    // Still eligible, so it competes for re-selection
                    self.tasks[id].mark_ready();
                    events.push(SchedCoreEvent::TaskStateChange {
                        task: id,
                        from: TaskState::Running,
                        to: TaskState::Ready,
                    });
                    preempted = true;
                }
            }

            let next = self.select(&eligible);
            self.set_current(next, &mut events);

            if preempted && next != prev {
                debug!(from = ?prev, to = ?next, now = self.now, "preempted");
                self.at_overload = true;
            }
        }

        if self.at_overload {
            self.overload_count += 1;
            self.now += self.config.overload_cost;
            events.push(SchedCoreEvent::Overload {
                cost: self.config.overload_cost,
            });
        } else if let Some(id) = self.current {
            let task = &mut self.tasks[id];
            if task.state() != TaskState::Running {
                events.push(SchedCoreEvent::TaskStateChange {
                    task: id,
                    from: task.state(),
                    to: TaskState::Running,
                });
                task.mark_running();
            }

            let already_failed = task.failed();
            let executed = task.advance(
                self.now,
                self.config.time_slice,
                self.config.continue_after_deadline,
            );
            events.push(SchedCoreEvent::Executed {
                task: id,
                start: self.now,
                duration: executed,
            });
            self.now += executed;

            if task.failed() && !already_failed {
                debug!(task = %task.name, deadline = task.deadline, now = self.now, "deadline missed");
                events.push(SchedCoreEvent::DeadlineMissed {
                    task: id,
                    time: self.now,
                });
            }
        } else {
            let ts = self.config.time_slice;
            let mut next = ((self.now / ts).floor() + 1.0) * ts;
            // now / ts can round down by one step, landing back on now
            if next <= self.now {
                next += ts;
            }
            events.push(SchedCoreEvent::Idle {
                from: self.now,
                to: next,
            });
            self.now = next;
        }

        self.observer
            .observe(&self.tasks, self.current, self.now, self.at_overload);
        events
    }

    fn select(&mut self, eligible: &[TaskId]) -> Option<TaskId> {
        let view: Vec<&Task> = eligible.iter().map(|&id| &self.tasks[id]).collect();
        let picked = self.scheduler.select(&view, self.now);

        debug_assert_eq!(
            picked.is_none(),
            eligible.is_empty(),
            "{} must select iff tasks are eligible",
            self.scheduler.name()
        );
        debug_assert!(
            picked.is_none_or(|id| eligible.contains(&id)),
            "{} selected ineligible task {picked:?}",
            self.scheduler.name()
        );
        picked
    }

    fn set_current(&mut self, next: Option<TaskId>, events: &mut Vec<SchedCoreEvent>) {
        if next != self.current {
            events.push(SchedCoreEvent::CurrentChange {
                from: self.current,
                to: next,
            });
        }
        self.current = next;
    }

    pub fn all_done(&self) -> bool {
        self.tasks.iter().all(|t| t.state() == TaskState::Done)
    }

    pub fn now(&self) -> Ticks {
        self.now
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id]
    }

    pub fn current(&self) -> Option<TaskId> {
        self.current
    }

    pub fn at_overload(&self) -> bool {
        self.at_overload
    }

    pub fn overload_count(&self) -> u64 {
        self.overload_count
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn scheduler_name(&self) -> &str {
        self.scheduler.name()
    }

    pub fn preemptive(&self) -> bool {
        self.scheduler.preemptive()
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }
}
