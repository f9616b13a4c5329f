// Scheduler configuration, fixed for the lifetime of a Scheduler
//
// Built from const defaults with chained overrides:
//   Config::new().with_base_tick_ms(10).with_run_duration_ms(60_000)

use super::error::Error;
use super::wake::TickWait;

pub const DEFAULT_TASK_CAPACITY: usize = 2;
pub const DEFAULT_TIMER_CAPACITY: usize = 4;
/// Base timer tick interval (ms)
pub const DEFAULT_BASE_TICK_MS: u32 = 200;
pub const DEFAULT_RUN_DURATION_MS: u64 = 6000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub task_capacity: usize,
    pub timer_capacity: usize,
    pub base_tick_ms: u32,
    /// Total time `run` dispatches for before returning
    pub run_duration_ms: u64,
    pub wait: TickWait,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub const fn new() -> Self {
        Self {
            task_capacity: DEFAULT_TASK_CAPACITY,
            timer_capacity: DEFAULT_TIMER_CAPACITY,
            base_tick_ms: DEFAULT_BASE_TICK_MS,
            run_duration_ms: DEFAULT_RUN_DURATION_MS,
            wait: TickWait::Spin,
        }
    }

    pub const fn with_task_capacity(mut self, capacity: usize) -> Self {
        self.task_capacity = capacity;
        self
    }

    pub const fn with_timer_capacity(mut self, capacity: usize) -> Self {
        self.timer_capacity = capacity;
        self
    }

    pub const fn with_base_tick_ms(mut self, ms: u32) -> Self {
        self.base_tick_ms = ms;
        self
    }

    pub const fn with_run_duration_ms(mut self, ms: u64) -> Self {
        self.run_duration_ms = ms;
        self
    }

    pub const fn with_wait(mut self, wait: TickWait) -> Self {
        self.wait = wait;
        self
    }

    /// Number of base ticks `run` dispatches: the smallest n with
    /// n * base_tick >= run_duration.
    pub const fn run_ticks(&self) -> u64 {
        let tick = self.base_tick_ms as u64;
        if tick == 0 {
            return 0;
        }
        self.run_duration_ms.div_ceil(tick)
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.base_tick_ms == 0 {
            return Err(Error::InvalidConfig("base tick must be non-zero"));
        }
        Ok(())
    }
}
