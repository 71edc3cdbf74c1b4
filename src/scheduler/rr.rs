use std::{collections::VecDeque, num::NonZeroU32};

use rustc_hash::FxHashSet;

use super::Scheduler;
use crate::core::state::{Task, TaskId, Ticks};

/// Circular queue in first-seen order. The head is handed out for
/// `quantum` consecutive selections, then rotated to the tail.
pub struct RoundRobinScheduler {
    quantum: u32,
    // Selections left for the current head before it rotates
    allowed: u32,
    counted_head: Option<TaskId>,
    queue: VecDeque<TaskId>,
}

impl RoundRobinScheduler {
    pub fn new(quantum: NonZeroU32) -> Self {
        Self {
            quantum: quantum.get(),
            allowed: quantum.get(),
            counted_head: None,
            queue: VecDeque::new(),
        }
    }

    pub fn quantum(&self) -> u32 {
        self.quantum
    }

    /// Current rotation order, head first.
    pub fn queue(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.queue.iter().copied()
    }

    fn sync_queue(&mut self, eligible: &[&Task]) {
        let live: FxHashSet<TaskId> = eligible.iter().map(|t| t.id).collect();
        self.queue.retain(|id| live.contains(id));

        for task in eligible {
            if !self.queue.contains(&task.id) {
                self.queue.push_back(task.id);
            }
        }
    }
}

impl Scheduler for RoundRobinScheduler {
    fn name(&self) -> &str {
        "RR"
    }

    fn preemptive(&self) -> bool {
        true
    }

    fn select(&mut self, eligible: &[&Task], _now: Ticks) -> Option<TaskId> {
        self.sync_queue(eligible);

        let Some(&head) = self.queue.front() else {
            self.counted_head = None;
            self.allowed = self.quantum;
            return None;
        };

        // A new head (rotation or the old head leaving) starts a fresh quantum
        if self.counted_head != Some(head) {
            self.counted_head = Some(head);
            self.allowed = self.quantum;
        }

        self.allowed -= 1;
        if self.allowed == 0 {
            self.queue.rotate_left(1);
            self.counted_head = None;
            self.allowed = self.quantum;
        }

        Some(head)
    }
}
