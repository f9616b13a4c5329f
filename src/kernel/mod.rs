// Cooperative tick scheduler and software timers
// Single thread, no preemption. Every base tick the scheduler runs the
// due periodic tasks to completion, then counts down the running
// software timers and fires callbacks for the ones that expire.
//
// Tables are bounded by the capacities in Config and addressed with
// 1-based handles. Tick functions and timer callbacks get a Control so
// they can start and stop tasks and timers (their own included) while
// the scheduler is dispatching them.

pub mod clock;
pub mod config;
pub mod control;
pub mod error;
pub mod handle;
pub mod scheduler;
pub mod tasks;
pub mod timers;
pub mod wake;

pub use clock::{Clock, SimClock, TickClock};
#[cfg(feature = "std")]
pub use clock::StdClock;
pub use config::Config;
pub use control::{Control, Running};
pub use error::Error;
pub use handle::{TaskId, TimerId};
pub use scheduler::{Scheduler, Stats};
pub use wake::TickWait;
