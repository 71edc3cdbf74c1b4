pub mod edf;
pub mod fcfs;
pub mod hrrn;
pub mod lottery;
pub mod priority;
pub mod rr;
pub mod sjf;

use std::{fmt, num::NonZeroU32, str::FromStr};

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::core::state::{Task, TaskId, Ticks};
use crate::error::{Result, SimError};
pub use edf::EdfScheduler;
pub use fcfs::FcfsScheduler;
pub use hrrn::HrrnScheduler;
pub use lottery::{LotteryScheduler, RngDraw, TicketDraw};
pub use priority::PriorityScheduler;
pub use rr::RoundRobinScheduler;
pub use sjf::SjfScheduler;

pub const DEFAULT_QUANTUM: u32 = 1;

/// A scheduling policy.
///
/// `select` receives the eligible tasks in registration order and must
/// return `None` iff the slice is empty, otherwise the id of one of them.
/// Policies only read tasks; any bookkeeping (queues, tickets) is their own.
pub trait Scheduler: Send {
    fn name(&self) -> &str;

    fn preemptive(&self) -> bool;

    fn select(&mut self, eligible: &[&Task], now: Ticks) -> Option<TaskId>;
}

/// First task with the smallest key; ties resolve to the earliest registered.
pub(crate) fn pick_min_by<F>(eligible: &[&Task], mut cmp: F) -> Option<TaskId>
where
    F: FnMut(&Task, &Task) -> std::cmp::Ordering,
{
    eligible.iter().min_by(|a, b| cmp(a, b)).map(|t| t.id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PolicyKind {
    Fcfs,
    Sjf,
    RoundRobin,
    Priority,
    Edf,
    Lottery,
    Hrrn,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 7] = [
        PolicyKind::Fcfs,
        PolicyKind::Sjf,
        PolicyKind::RoundRobin,
        PolicyKind::Priority,
        PolicyKind::Edf,
        PolicyKind::Lottery,
        PolicyKind::Hrrn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Fcfs => "fcfs",
            PolicyKind::Sjf => "sjf",
            PolicyKind::RoundRobin => "rr",
            PolicyKind::Priority => "priority",
            PolicyKind::Edf => "edf",
            PolicyKind::Lottery => "lottery",
            PolicyKind::Hrrn => "hrrn",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fcfs" | "fifo" => Ok(PolicyKind::Fcfs),
            "sjf" => Ok(PolicyKind::Sjf),
            "rr" | "round_robin" | "roundrobin" => Ok(PolicyKind::RoundRobin),
            "priority" => Ok(PolicyKind::Priority),
            "edf" => Ok(PolicyKind::Edf),
            "lottery" => Ok(PolicyKind::Lottery),
            "hrrn" => Ok(PolicyKind::Hrrn),
            _ => Err(SimError::UnknownPolicy(s.to_string())),
        }
    }
}

impl TryFrom<String> for PolicyKind {
    type Error = SimError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<PolicyKind> for String {
    fn from(kind: PolicyKind) -> Self {
        kind.as_str().to_string()
    }
}

fn default_quantum() -> f64 {
    DEFAULT_QUANTUM as f64
}

/// Policy name plus options, as found in a workload file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(alias = "name")]
    pub kind: PolicyKind,
    #[serde(default, alias = "preemptable")]
    pub preemptive: bool,
    // Kept as f64 so non-integral values are rejected by `build` instead of by the parser
    #[serde(default = "default_quantum")]
    pub quantum: f64,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl PolicyConfig {
    pub fn new(kind: PolicyKind) -> Self {
        Self {
            kind,
            preemptive: false,
            quantum: default_quantum(),
            inverted: false,
            seed: None,
        }
    }

    pub fn preemptive(mut self, preemptive: bool) -> Self {
        self.preemptive = preemptive;
        self
    }

    pub fn quantum(mut self, quantum: f64) -> Self {
        self.quantum = quantum;
        self
    }

    pub fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(&self) -> Result<Box<dyn Scheduler>> {
        let quantum = validate_quantum(self.quantum)?;
        let preemptive = self.preemptive;

        let scheduler: Box<dyn Scheduler> = match self.kind {
            PolicyKind::Fcfs => Box::new(FcfsScheduler),
            PolicyKind::Sjf => Box::new(SjfScheduler::new(preemptive)),
            PolicyKind::RoundRobin => Box::new(RoundRobinScheduler::new(quantum)),
            PolicyKind::Priority => Box::new(PriorityScheduler::new(preemptive, self.inverted)),
            PolicyKind::Edf => Box::new(EdfScheduler::new(preemptive)),
            PolicyKind::Lottery => {
                let rng = match self.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_os_rng(),
                };
                Box::new(LotteryScheduler::new(preemptive, RngDraw(rng)))
            }
            PolicyKind::Hrrn => Box::new(HrrnScheduler::new(preemptive)),
        };
        Ok(scheduler)
    }
}

pub fn validate_quantum(quantum: f64) -> Result<NonZeroU32> {
    if !quantum.is_finite() || quantum.fract() != 0.0 || quantum < 1.0 || quantum > u32::MAX as f64 {
        return Err(SimError::InvalidQuantum(quantum));
    }
    NonZeroU32::new(quantum as u32).ok_or(SimError::InvalidQuantum(quantum))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::state::TaskSpec;

    pub(crate) fn tasks(specs: &[TaskSpec]) -> Vec<Task> {
        specs
            .iter()
            .enumerate()
            .map(|(id, spec)| {
                let mut task = Task::from_spec(spec).unwrap();
                task.id = id;
                task
            })
            .collect()
    }

    pub(crate) fn refs(tasks: &[Task]) -> Vec<&Task> {
        tasks.iter().collect()
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("FCFS".parse::<PolicyKind>().unwrap(), PolicyKind::Fcfs);
        assert_eq!("round_robin".parse::<PolicyKind>().unwrap(), PolicyKind::RoundRobin);
        assert!(matches!(
            "cfs".parse::<PolicyKind>(),
            Err(SimError::UnknownPolicy(_))
        ));
    }

    #[test]
    fn rejects_bad_quantum() {
        for q in [0.0, -2.0, 1.5, f64::NAN, f64::INFINITY] {
            let cfg = PolicyConfig::new(PolicyKind::RoundRobin).quantum(q);
            assert!(matches!(cfg.build(), Err(SimError::InvalidQuantum(_))), "{q}");
        }
        assert_eq!(validate_quantum(3.0).unwrap().get(), 3);
    }

    #[test]
    fn config_from_json() {
        let cfg: PolicyConfig =
            serde_json::from_str(r#"{"name": "priority", "preemptable": true, "inverted": true}"#)
                .unwrap();
        assert_eq!(cfg.kind, PolicyKind::Priority);
        assert!(cfg.preemptive);
        assert!(cfg.inverted);
        assert_eq!(cfg.quantum, 1.0);

        let err = serde_json::from_str::<PolicyConfig>(r#"{"kind": "nope"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn empty_eligible_selects_nothing() {
        for kind in PolicyKind::ALL {
            for preemptive in [false, true] {
                let mut scheduler = PolicyConfig::new(kind)
                    .preemptive(preemptive)
                    .seed(7)
                    .build()
                    .unwrap();
                assert_eq!(scheduler.select(&[], 0.0), None, "{kind}");
            }
        }
    }

    #[test]
    fn selection_is_always_eligible() {
        let all = tasks(&[
            TaskSpec::new("A", 0.0, 3.0).priority(2),
            TaskSpec::new("B", 1.0, 1.0).deadline(2.0),
            TaskSpec::new("C", 2.0, 6.0).priority(1),
        ]);
        let subset: Vec<&Task> = vec![&all[0], &all[2]];

        for kind in PolicyKind::ALL {
            let mut scheduler = PolicyConfig::new(kind).seed(11).build().unwrap();
            for now in 0..5 {
                let picked = scheduler.select(&subset, now as Ticks).unwrap();
                assert!(picked == 0 || picked == 2, "{kind} picked {picked}");
            }
        }
    }
}
