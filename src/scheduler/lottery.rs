use rand::Rng;
use rustc_hash::FxHashMap;

use super::Scheduler;
use crate::core::state::{Task, TaskId, Ticks};

pub const BASE_TICKETS: f64 = 10.0;

/// Source of winning ticket numbers.
pub trait TicketDraw: Send {
    /// Returns a ticket in `0..total`. `total` is never zero.
    fn draw(&mut self, total: u64) -> u64;
}

/// Uniform draws from any `rand` generator.
pub struct RngDraw<R>(pub R);

impl<R: Rng + Send> TicketDraw for RngDraw<R> {
    fn draw(&mut self, total: u64) -> u64 {
        self.0.random_range(0..total)
    }
}

/// Weighted random pick over a ticket pool with aging.
///
/// New tasks start with `max(1, 10 - duration)` tickets. The winner gives up
/// one ticket (never below one) and every other eligible task gains one, so
/// waiting tasks grow more likely to win.
pub struct LotteryScheduler {
    preemptive: bool,
    tickets: FxHashMap<TaskId, u64>,
    source: Box<dyn TicketDraw>,
}

impl LotteryScheduler {
    pub fn new(preemptive: bool, source: impl TicketDraw + 'static) -> Self {
        Self {
            preemptive,
            tickets: FxHashMap::default(),
            source: Box::new(source),
        }
    }

    pub fn tickets(&self, task: TaskId) -> Option<u64> {
        self.tickets.get(&task).copied()
    }

    pub fn total_tickets(&self) -> u64 {
        self.tickets.values().sum()
    }

    /// Fractional durations round the ticket count down, so 9.5 gets the 1-ticket minimum.
    fn initial_tickets(task: &Task) -> u64 {
        (BASE_TICKETS - task.duration).floor().max(1.0) as u64
    }
}

impl Scheduler for LotteryScheduler {
    fn name(&self) -> &str {
        "Lottery"
    }

    fn preemptive(&self) -> bool {
        self.preemptive
    }

    fn select(&mut self, eligible: &[&Task], _now: Ticks) -> Option<TaskId> {
        self.tickets
            .retain(|id, _| eligible.iter().any(|t| t.id == *id));
        for task in eligible {
            self.tickets
                .entry(task.id)
                .or_insert_with(|| Self::initial_tickets(task));
        }

        if eligible.is_empty() {
            return None;
        }

        // Walk the pool in registration order so a given draw always maps to the same task
        let total = self.total_tickets();
        let mut ticket = self.source.draw(total).min(total - 1);
        let mut winner = eligible[eligible.len() - 1].id;
        for task in eligible {
            let held = self.tickets[&task.id];
            if ticket < held {
                winner = task.id;
                break;
            }
            ticket -= held;
        }

        for (id, held) in self.tickets.iter_mut() {
            if *id == winner {
                *held = held.saturating_sub(1).max(1);
            } else {
                *held += 1;
            }
        }

        Some(winner)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::core::state::TaskSpec;
    use crate::scheduler::tests::{refs, tasks};

    struct Scripted(VecDeque<u64>);

    impl TicketDraw for Scripted {
        fn draw(&mut self, total: u64) -> u64 {
            self.0.pop_front().unwrap_or(0) % total
        }
    }

    fn scripted(draws: &[u64]) -> LotteryScheduler {
        LotteryScheduler::new(false, Scripted(draws.iter().copied().collect()))
    }

    #[test]
    fn initial_tickets_favor_short_tasks() {
        let all = tasks(&[
            TaskSpec::new("A", 0.0, 3.0),
            TaskSpec::new("B", 0.0, 12.0),
            TaskSpec::new("C", 0.0, 9.5),
        ]);
        let mut lottery = scripted(&[0]);
        lottery.select(&refs(&all), 0.0);

        // A won the first draw: 7 - 1
        assert_eq!(lottery.tickets(0), Some(6));
        assert_eq!(lottery.tickets(1), Some(2));
        assert_eq!(lottery.tickets(2), Some(2));
    }

    #[test]
    fn draw_maps_to_ticket_owner() {
        // A holds tickets 0..7, B holds 7..9
        let all = tasks(&[TaskSpec::new("A", 0.0, 3.0), TaskSpec::new("B", 0.0, 8.0)]);
        let eligible = refs(&all);
        let mut lottery = scripted(&[7, 0, 8]);

        assert_eq!(lottery.select(&eligible, 0.0), Some(1));
        // A: 8, B: 1
        assert_eq!(lottery.select(&eligible, 1.0), Some(0));
        // A: 7, B: 2
        assert_eq!(lottery.select(&eligible, 2.0), Some(1));
        assert_eq!(lottery.tickets(0), Some(8));
        assert_eq!(lottery.tickets(1), Some(1));
    }

    #[test]
    fn two_task_pool_is_conserved() {
        // A: 8 tickets, B: 6
        let all = tasks(&[TaskSpec::new("A", 0.0, 2.0), TaskSpec::new("B", 0.0, 4.0)]);
        let eligible = refs(&all);
        let draws: Vec<u64> = (0..20).map(|i| if i % 2 == 0 { 0 } else { 13 }).collect();
        let mut lottery = scripted(&draws);

        let mut winners = Vec::new();
        for t in 0..20 {
            winners.push(lottery.select(&eligible, t as Ticks).unwrap());
            assert_eq!(lottery.total_tickets(), 14);
        }
        assert!(winners.contains(&0) && winners.contains(&1));
    }

    #[test]
    fn pool_grows_with_more_losers_and_at_the_floor() {
        let all = tasks(&[
            TaskSpec::new("A", 0.0, 9.0),
            TaskSpec::new("B", 0.0, 9.0),
            TaskSpec::new("C", 0.0, 9.0),
        ]);
        let eligible = refs(&all);
        // Always draw ticket 0, so A keeps winning
        let mut lottery = scripted(&[0, 0, 0]);

        lottery.select(&eligible, 0.0);
        // A sits at the floor: 1, B: 2, C: 2
        assert_eq!(lottery.total_tickets(), 5);

        lottery.select(&eligible, 1.0);
        // A stays at 1 while the others gain
        assert_eq!(lottery.tickets(0), Some(1));
        assert_eq!(lottery.total_tickets(), 7);
    }

    #[test]
    fn drops_departed_tasks() {
        let all = tasks(&[TaskSpec::new("A", 0.0, 2.0), TaskSpec::new("B", 0.0, 2.0)]);
        let mut lottery = scripted(&[0, 0]);

        lottery.select(&refs(&all), 0.0);
        assert_eq!(lottery.select(&[&all[1]], 1.0), Some(1));
        assert_eq!(lottery.tickets(0), None);
    }

    #[test]
    fn seeded_runs_repeat() {
        let all = tasks(&[
            TaskSpec::new("A", 0.0, 2.0),
            TaskSpec::new("B", 0.0, 5.0),
            TaskSpec::new("C", 0.0, 7.0),
        ]);
        let eligible = refs(&all);
        let run = |seed| {
            let mut lottery = LotteryScheduler::new(true, RngDraw(StdRng::seed_from_u64(seed)));
            (0..20)
                .map(|t| lottery.select(&eligible, t as Ticks).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }
}
