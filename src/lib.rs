pub mod core;
pub mod error;
pub mod scheduler;
pub mod sim;

pub use crate::core::{CoreConfig, SchedCore, SchedCoreEvent, Task, TaskSpec, TaskState};
pub use error::{Result, SimError};
pub use scheduler::{PolicyConfig, PolicyKind, Scheduler};
pub use sim::{Sim, Summary, Workload};
