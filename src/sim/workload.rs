use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::core::{CoreConfig, Task, TaskSpec, Ticks};
use crate::error::Result;
use crate::scheduler::{PolicyConfig, PolicyKind};

/// Tasks and policies to compare, usually read from a JSON file.
///
/// ```json
/// {
///   "tasks": [{"name": "A", "arrival": 0, "duration": 5, "priority": 1, "deadline": 10}],
///   "policies": [{"kind": "rr", "preemptive": true, "quantum": 2}],
///   "time_slice": 1.0,
///   "overload_cost": 0.6
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    #[serde(default = "demo_tasks")]
    pub tasks: Vec<TaskSpec>,
    #[serde(default = "demo_policies", alias = "algorithms")]
    pub policies: Vec<PolicyConfig>,
    #[serde(default)]
    pub time_slice: Option<Ticks>,
    #[serde(default)]
    pub overload_cost: Option<Ticks>,
}

impl Default for Workload {
    fn default() -> Self {
        Self {
            tasks: demo_tasks(),
            policies: demo_policies(),
            time_slice: None,
            overload_cost: None,
        }
    }
}

impl Workload {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Fresh, independent task set; call once per run.
    pub fn tasks(&self) -> Result<Vec<Task>> {
        self.tasks.iter().map(Task::from_spec).collect()
    }

    /// File values over `base`.
    pub fn core_config(&self, base: CoreConfig) -> CoreConfig {
        CoreConfig {
            time_slice: self.time_slice.unwrap_or(base.time_slice),
            overload_cost: self.overload_cost.unwrap_or(base.overload_cost),
            ..base
        }
    }
}

pub fn demo_tasks() -> Vec<TaskSpec> {
    vec![
        TaskSpec::new("Task1", 0.0, 5.0).priority(1).deadline(10.0),
        TaskSpec::new("Task2", 1.0, 3.0).priority(2).deadline(8.0),
        TaskSpec::new("Task3", 2.0, 2.0).priority(1).deadline(5.0),
        TaskSpec::new("Task4", 3.0, 4.0).priority(3).deadline(12.0),
        TaskSpec::new("Task5", 4.0, 1.0).priority(2).deadline(6.0),
    ]
}

pub fn demo_policies() -> Vec<PolicyConfig> {
    PolicyKind::ALL.into_iter().map(PolicyConfig::new).collect()
}
