use serde::Serialize;

use crate::core::{TaskId, TaskState, Ticks};

/// What happened during one `SchedCore::tick`, in order of occurrence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SchedCoreEvent {
    TaskStateChange {
        task: TaskId,
        from: TaskState,
        to: TaskState,
    },
    CurrentChange {
        from: Option<TaskId>,
        to: Option<TaskId>,
    },
    // Tick spent on a context switch; nothing executed
    Overload {
        cost: Ticks,
    },
    Executed {
        task: TaskId,
        start: Ticks,
        duration: Ticks,
    },
    DeadlineMissed {
        task: TaskId,
        time: Ticks,
    },
    // No eligible task; clock jumped ahead
    Idle {
        from: Ticks,
        to: Ticks,
    },
}
