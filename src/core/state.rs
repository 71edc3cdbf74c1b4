use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

// Index into the engine's task Vec (registration order)
pub type TaskId = usize;
// Virtual time. Real-valued because overload costs need not be whole slices.
pub type Ticks = f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Ready,
    Running,
    Done,
}

/// Workload entry as read from a file or built by hand.
///
/// `deadline` is relative to `arrival`; `None` means the task never misses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub arrival: Ticks,
    pub duration: Ticks,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub deadline: Option<Ticks>,
}

impl TaskSpec {
    pub fn new(name: impl Into<String>, arrival: Ticks, duration: Ticks) -> Self {
        Self {
            name: name.into(),
            arrival,
            duration,
            priority: 0,
            deadline: None,
        }
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn deadline(mut self, deadline: Ticks) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub arrival: Ticks,
    pub duration: Ticks,
    /// Lower value means more urgent, unless a policy inverts it.
    pub priority: i64,
    /// Absolute deadline, `INFINITY` when none was given.
    pub deadline: Ticks,

    state: TaskState,
    remaining: Ticks,
    failed: bool,
    response_time: Option<Ticks>,
    turnaround_time: Option<Ticks>,
    wait_time: Option<Ticks>,
}

impl Task {
    /// Validates a spec and builds a fresh READY task. `id` is assigned by the engine.
    pub fn from_spec(spec: &TaskSpec) -> Result<Self> {
        let invalid = |reason: &str| SimError::InvalidTask {
            name: spec.name.clone(),
            reason: reason.to_string(),
        };

        if spec.name.is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if !spec.arrival.is_finite() || spec.arrival < 0.0 {
            return Err(invalid("arrival must be a finite value >= 0"));
        }
        if !spec.duration.is_finite() || spec.duration <= 0.0 {
            return Err(invalid("duration must be a finite value > 0"));
        }
        let deadline = match spec.deadline {
            Some(d) if d.is_nan() || d < 0.0 => {
                return Err(invalid("deadline must be >= 0"));
            }
            Some(d) => spec.arrival + d,
            None => Ticks::INFINITY,
        };

        Ok(Self {
            id: 0,
            name: spec.name.clone(),
            arrival: spec.arrival,
            duration: spec.duration,
            priority: spec.priority,
            deadline,
            state: TaskState::Ready,
            remaining: spec.duration,
            failed: false,
            response_time: None,
            turnaround_time: None,
            wait_time: None,
        })
    }

    /// Runs the task for at most one `time_slice` starting at `now` and
    /// returns how long it actually executed.
    ///
    /// Finishing (turnaround/wait bookkeeping) happens here, but the state
    /// only flips to `Done` when the engine finalizes it on the next tick.
    pub fn advance(&mut self, now: Ticks, time_slice: Ticks, continue_after_deadline: bool) -> Ticks {
        let executed = self.remaining.min(time_slice);

        if self.response_time.is_none() {
            self.response_time = Some(now - self.arrival);
        }

        self.remaining = (self.remaining - executed).max(0.0);
        let end = now + executed;

        if end > self.deadline && self.remaining > 0.0 {
            self.failed = true;
            if !continue_after_deadline {
                self.remaining = 0.0;
            }
        }

        if self.remaining == 0.0 {
            self.finish(end);
        }

        executed
    }

    fn finish(&mut self, end: Ticks) {
        if self.turnaround_time.is_some() {
            return;
        }
        let turnaround = end - self.arrival;
        self.turnaround_time = Some(turnaround);
        self.wait_time = Some(turnaround - self.duration);
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn remaining(&self) -> Ticks {
        self.remaining
    }

    /// Execution received so far.
    pub fn executed(&self) -> Ticks {
        self.duration - self.remaining
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn response_time(&self) -> Option<Ticks> {
        self.response_time
    }

    pub fn turnaround_time(&self) -> Option<Ticks> {
        self.turnaround_time
    }

    pub fn wait_time(&self) -> Option<Ticks> {
        self.wait_time
    }

    pub fn is_finished(&self) -> bool {
        self.remaining <= 0.0
    }

    pub fn is_eligible(&self, now: Ticks) -> bool {
        self.arrival <= now && self.state != TaskState::Done
    }

    pub(crate) fn mark_running(&mut self) {
        debug_assert!(
            self.state != TaskState::Done,
            "Done task {} cannot run again",
            self.name
        );
        self.state = TaskState::Running;
    }

    pub(crate) fn mark_ready(&mut self) {
        debug_assert!(
            self.state == TaskState::Running,
            "Task {} must be running to be preempted",
            self.name
        );
        self.state = TaskState::Ready;
    }

    pub(crate) fn mark_done(&mut self) {
        debug_assert!(
            self.is_finished(),
            "Task {} marked done with {} remaining",
            self.name,
            self.remaining
        );
        self.state = TaskState::Done;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(arrival: Ticks, duration: Ticks) -> Task {
        Task::from_spec(&TaskSpec::new("T", arrival, duration)).unwrap()
    }

    #[test]
    fn rejects_bad_specs() {
        assert!(Task::from_spec(&TaskSpec::new("", 0.0, 1.0)).is_err());
        assert!(Task::from_spec(&TaskSpec::new("A", -1.0, 1.0)).is_err());
        assert!(Task::from_spec(&TaskSpec::new("A", 0.0, 0.0)).is_err());
        assert!(Task::from_spec(&TaskSpec::new("A", 0.0, -3.0)).is_err());
        assert!(Task::from_spec(&TaskSpec::new("A", 0.0, 1.0).deadline(-1.0)).is_err());
    }

    #[test]
    fn deadline_is_absolute() {
        let t = Task::from_spec(&TaskSpec::new("A", 3.0, 2.0).deadline(4.0)).unwrap();
        assert_eq!(t.deadline, 7.0);
        assert_eq!(task(0.0, 1.0).deadline, Ticks::INFINITY);
    }

    #[test]
    fn response_time_set_once() {
        let mut t = task(2.0, 3.0);
        assert_eq!(t.response_time(), None);

        assert_eq!(t.advance(5.0, 1.0, true), 1.0);
        assert_eq!(t.response_time(), Some(3.0));

        t.advance(9.0, 1.0, true);
        assert_eq!(t.response_time(), Some(3.0));
    }

    #[test]
    fn finishing_sets_turnaround_and_wait() {
        let mut t = task(1.0, 2.0);
        t.advance(1.0, 1.0, true);
        assert_eq!(t.turnaround_time(), None);

        // Last slice only needs the remaining unit
        assert_eq!(t.advance(4.0, 3.0, true), 1.0);
        assert_eq!(t.remaining(), 0.0);
        assert_eq!(t.turnaround_time(), Some(4.0));
        assert_eq!(t.wait_time(), Some(2.0));
        // State stays with the engine
        assert_eq!(t.state(), TaskState::Ready);
    }

    #[test]
    fn remaining_never_negative() {
        let mut t = task(0.0, 0.5);
        assert_eq!(t.advance(0.0, 1.0, true), 0.5);
        assert_eq!(t.remaining(), 0.0);
    }

    #[test]
    fn deadline_miss_is_sticky() {
        let mut t = Task::from_spec(&TaskSpec::new("A", 0.0, 4.0).deadline(2.0)).unwrap();
        t.advance(0.0, 1.0, true);
        t.advance(1.0, 1.0, true);
        assert!(!t.failed());

        t.advance(2.0, 1.0, true);
        assert!(t.failed());

        t.advance(3.0, 1.0, true);
        assert!(t.failed());
        assert_eq!(t.turnaround_time(), Some(4.0));
    }

    #[test]
    fn deadline_miss_can_force_completion() {
        let mut t = Task::from_spec(&TaskSpec::new("A", 0.0, 4.0).deadline(1.0)).unwrap();
        t.advance(0.0, 1.0, false);
        assert!(!t.failed());

        t.advance(1.0, 1.0, false);
        assert!(t.failed());
        assert!(t.is_finished());
        assert_eq!(t.turnaround_time(), Some(2.0));
        assert_eq!(t.wait_time(), Some(-2.0));
    }
}
