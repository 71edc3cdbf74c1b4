use tracing::{debug, info};

use super::summary::Summary;
use crate::{
    core::{CoreConfig, SchedCore, SchedCoreEvent, Snapshot, Task, Ticks},
    error::{Result, SimError},
    scheduler::Scheduler,
};

pub const DEFAULT_MAX_TICKS: u64 = 100_000;

/// Runs one engine to completion and collects its history and statistics.
pub struct Sim {
    pub core: SchedCore,
    history: Option<Vec<Snapshot>>,
    ticks: u64,
    // Clock at the start of the most recent tick
    last_tick_start: Ticks,
}

impl Sim {
    pub fn new(tasks: Vec<Task>, scheduler: Box<dyn Scheduler>, config: CoreConfig) -> Result<Self> {
        Ok(Self {
            core: SchedCore::new(tasks, scheduler, config)?,
            history: None,
            ticks: 0,
            last_tick_start: 0.0,
        })
    }

    /// Keep a `Snapshot` after every tick.
    pub fn record_history(mut self) -> Self {
        self.history = Some(Vec::new());
        self
    }

    pub fn step(&mut self) -> Vec<SchedCoreEvent> {
        self.last_tick_start = self.core.now();
        let events = self.core.tick();
        self.ticks += 1;

        if let Some(history) = self.history.as_mut() {
            history.push(Snapshot::capture(&self.core));
        }
        events
    }

    pub fn all_jobs_completed(&self) -> bool {
        self.core.all_done()
    }

    pub fn run_to_completion(&mut self, max_ticks: u64) -> Result<Summary> {
        self.run_to_completion_with(max_ticks, |_, _| {})
    }

    /// Like `run_to_completion`, calling `on_tick` after every tick.
    pub fn run_to_completion_with<F>(&mut self, max_ticks: u64, mut on_tick: F) -> Result<Summary>
    where
        F: FnMut(&SchedCore, &[SchedCoreEvent]),
    {
        debug!(policy = self.core.scheduler_name(), tasks = self.core.tasks().len(), "starting run");

        while !self.all_jobs_completed() {
            if self.ticks >= max_ticks {
                return Err(SimError::TickLimitExceeded {
                    max_ticks,
                    clock: self.core.now(),
                });
            }
            let events = self.step();
            on_tick(&self.core, &events);
        }

        let summary = self.summary();
        info!(
            policy = %summary.policy,
            preemptive = summary.preemptive,
            total_time = summary.total_time,
            overloads = summary.overload_count,
            failed = summary.failed_count,
            "run finished"
        );
        Ok(summary)
    }

    pub fn summary(&self) -> Summary {
        Summary::collect(&self.core, self.last_tick_start)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn history(&self) -> &[Snapshot] {
        self.history.as_deref().unwrap_or(&[])
    }
}
