pub mod driver;
pub mod event;
pub mod observer;
pub mod state;

pub use driver::{CoreConfig, SchedCore};
pub use event::SchedCoreEvent;
pub use observer::{InstantKind, Observer, Snapshot, TaskView, timeline};
pub use state::{Task, TaskId, TaskSpec, TaskState, Ticks};
