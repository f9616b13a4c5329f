// Control surface handed to tick functions and timer callbacks
//
// A running callback cannot borrow the Scheduler that owns it, so it
// receives this view of the two tables instead. The callback being run
// has been lifted out of its slot for the duration of the call, which
// makes stopping its own timer from inside the callback safe: the
// nested stop finds no callback to fire and returns.

use log::trace;

use super::error::Error;
use super::handle::{TaskId, TimerId};
use super::tasks::TaskTable;
use super::timers::TimerTable;

/// What the scheduler is currently executing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Running {
    Task(TaskId),
    Timer(TimerId),
}

pub struct Control<'s> {
    tasks: &'s mut TaskTable,
    timers: &'s mut TimerTable,
    running: Option<Running>,
}

impl<'s> Control<'s> {
    pub(crate) fn new(
        tasks: &'s mut TaskTable,
        timers: &'s mut TimerTable,
        running: Option<Running>,
    ) -> Self {
        Self {
            tasks,
            timers,
            running,
        }
    }

    pub fn running(&self) -> Option<Running> {
        self.running
    }

    /// Handle of the task whose tick function is executing
    pub fn current_task(&self) -> Option<TaskId> {
        match self.running {
            Some(Running::Task(id)) => Some(id),
            _ => None,
        }
    }

    /// Handle of the timer whose callback is executing
    pub fn current_timer(&self) -> Option<TimerId> {
        match self.running {
            Some(Running::Timer(id)) => Some(id),
            _ => None,
        }
    }

    pub fn stop_task(&mut self, id: TaskId) -> Result<(), Error> {
        self.tasks.stop(id)
    }

    pub fn start_task(&mut self, id: TaskId) -> Result<(), Error> {
        self.tasks.start(id)
    }

    pub fn set_task_period(&mut self, id: TaskId, period_ms: u32) -> Result<(), Error> {
        self.tasks.set_period(id, period_ms)
    }

    pub fn start_timer(&mut self, id: TimerId) -> Result<(), Error> {
        self.timers.start(id)
    }

    pub fn reload_timer(&mut self, id: TimerId, timeout_ms: u32) -> Result<(), Error> {
        self.timers.reload(id, timeout_ms)
    }

    /// Stops the timer and, if it has a callback, runs it before
    /// returning. Fires again on every call, even when the timer was
    /// already stopped.
    pub fn stop_timer(&mut self, id: TimerId) -> Result<(), Error> {
        let Some(mut callback) = self.timers.halt(id)? else {
            return Ok(());
        };

        let outer = self.running.replace(Running::Timer(id));
        trace!("{} callback", id);
        callback(self);
        self.running = outer;

        self.timers.restore_callback(id, callback);
        Ok(())
    }

    pub fn timer_remaining_ms(&self, id: TimerId) -> Result<u32, Error> {
        self.timers.remaining_ms(id)
    }

    pub fn tasks(&self) -> &TaskTable {
        &*self.tasks
    }

    pub fn timers(&self) -> &TimerTable {
        &*self.timers
    }
}
