//! Command Scheduler Implementation

use crate::config::ScheduleConfig;
use tracing::{debug, info};

/// Which list the scheduler is currently reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Commands sent once after connecting
    Startup,
    /// Commands sent on every pass
    Cycle,
    /// Commands sent once after every full cycle pass
    Housekeeping,
}

/// Infinite, deterministic sequence of command names.
///
/// `startup` is emitted once, then a full `cycle` pass followed by a full
/// `housekeeping` pass repeats forever. `completed_cycles` increments the
/// moment the last item of a round is handed out, which is the last
/// housekeeping item, or the last cycle item when housekeeping is empty.
#[derive(Debug, Clone)]
pub struct CommandScheduler {
    schedule: ScheduleConfig,
    phase: Phase,
    /// Index of the next item in the current phase's list
    cursor: usize,
    completed_cycles: u64,
}

impl CommandScheduler {
    /// Create a scheduler positioned before the first startup command
    pub fn new(schedule: ScheduleConfig) -> Self {
        info!(
            "Command scheduler created: {} startup, {} cycle, {} housekeeping commands",
            schedule.startup.len(),
            schedule.cycle.len(),
            schedule.housekeeping.len()
        );

        Self {
            schedule,
            phase: Phase::Startup,
            cursor: 0,
            completed_cycles: 0,
        }
    }

    /// Number of full cycle + housekeeping rounds handed out so far
    pub fn completed_cycles(&self) -> u64 {
        self.completed_cycles
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }

    fn list(&self, phase: Phase) -> &[String] {
        match phase {
            Phase::Startup => &self.schedule.startup,
            Phase::Cycle => &self.schedule.cycle,
            Phase::Housekeeping => &self.schedule.housekeeping,
        }
    }

    /// Whether emitting the last item of `phase` ends a round
    fn ends_round(&self, phase: Phase) -> bool {
        match phase {
            Phase::Startup => false,
            Phase::Cycle => self.schedule.housekeeping.is_empty(),
            Phase::Housekeeping => true,
        }
    }
}

impl Iterator for CommandScheduler {
    type Item = String;

    /// Returns `None` only when both `cycle` and `housekeeping` are empty
    fn next(&mut self) -> Option<String> {
        loop {
            let list = self.list(self.phase);
            let len = list.len();
            if let Some(name) = list.get(self.cursor).cloned() {
                self.cursor += 1;
                if self.cursor == len && self.ends_round(self.phase) {
                    self.completed_cycles += 1;
                    debug!("Completed schedule cycle {}", self.completed_cycles);
                }
                return Some(name);
            }

            self.phase = match self.phase {
                Phase::Startup => Phase::Cycle,
                Phase::Cycle
                    if self.schedule.cycle.is_empty() && self.schedule.housekeeping.is_empty() =>
                {
                    return None;
                }
                Phase::Cycle => Phase::Housekeeping,
                Phase::Housekeeping => Phase::Cycle,
            };
            self.cursor = 0;
        }
    }
}
