// tick-sched: cooperative, tick-driven task scheduler with software timers
// for small run-to-completion control loops.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod kernel;

pub use kernel::{
    Clock, Config, Control, Error, Running, Scheduler, SimClock, Stats, TaskId, TickClock,
    TickWait, TimerId,
};
#[cfg(feature = "std")]
pub use kernel::StdClock;
