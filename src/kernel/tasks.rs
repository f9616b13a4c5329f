// Task table: fixed-capacity registry of periodic task descriptors
//
// Append-only. Slot order is registration order, which is also the
// dispatch order. Storage is reserved once when the table is built
// and registration past capacity is refused rather than wrapping.

use alloc::boxed::Box;
use alloc::vec::Vec;

use log::{debug, warn};

use super::control::Control;
use super::error::Error;
use super::handle::{TaskId, resolve};

pub type TickFn = Box<dyn FnMut(&mut Control<'_>)>;
pub type InitFn = Box<dyn FnOnce()>;

pub(crate) struct Task {
    period_ms: u32,
    // time since the last dispatch; starts at `period_ms` so a new
    // task is due on the first tick
    elapsed_ms: u32,
    enabled: bool,
    // None only while the task is being dispatched
    tick: Option<TickFn>,
    // consumed by the first run
    init: Option<InitFn>,
    runs: u32,
}

pub struct TaskTable {
    slots: Vec<Task>,
    capacity: usize,
    base_tick_ms: u32,
}

impl TaskTable {
    // storage for every slot is reserved here and never grows
    pub(crate) fn new(capacity: usize, base_tick_ms: u32) -> Result<Self, Error> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| Error::InvalidConfig("task capacity too large"))?;
        Ok(Self {
            slots,
            capacity,
            base_tick_ms,
        })
    }

    fn check_period(&self, period_ms: u32) -> Result<(), Error> {
        if period_ms == 0 || period_ms % self.base_tick_ms != 0 {
            return Err(Error::InvalidPeriod {
                period_ms,
                base_tick_ms: self.base_tick_ms,
            });
        }
        Ok(())
    }

    fn slot(&self, id: TaskId) -> Result<&Task, Error> {
        let index = resolve(id.get(), self.slots.len(), self.capacity)?;
        Ok(&self.slots[index])
    }

    fn slot_mut(&mut self, id: TaskId) -> Result<&mut Task, Error> {
        let index = resolve(id.get(), self.slots.len(), self.capacity)?;
        Ok(&mut self.slots[index])
    }

    pub(crate) fn register(
        &mut self,
        init: Option<InitFn>,
        tick: TickFn,
        period_ms: u32,
    ) -> Result<TaskId, Error> {
        if let Err(err) = self.check_period(period_ms) {
            warn!("task rejected: {}", err);
            return Err(err);
        }
        if self.is_full() {
            warn!("task rejected: {} slots in use", self.capacity);
            return Err(Error::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        self.slots.push(Task {
            period_ms,
            elapsed_ms: period_ms,
            enabled: true,
            tick: Some(tick),
            init,
            runs: 0,
        });
        let id = TaskId::from_index(self.slots.len() - 1);
        debug!("{} registered, period {}ms", id, period_ms);
        Ok(id)
    }

    /// Keeps the task from being dispatched. Elapsed time keeps
    /// accumulating while stopped.
    pub fn stop(&mut self, id: TaskId) -> Result<(), Error> {
        self.slot_mut(id)?.enabled = false;
        debug!("{} stopped", id);
        Ok(())
    }

    /// Re-enables a stopped task without resetting its elapsed time.
    pub fn start(&mut self, id: TaskId) -> Result<(), Error> {
        self.slot_mut(id)?.enabled = true;
        debug!("{} started", id);
        Ok(())
    }

    /// Replaces the period in place; elapsed time is left alone, so the
    /// next dispatch may come immediately.
    pub fn set_period(&mut self, id: TaskId, period_ms: u32) -> Result<(), Error> {
        self.check_period(period_ms)?;
        self.slot_mut(id)?.period_ms = period_ms;
        debug!("{} period now {}ms", id, period_ms);
        Ok(())
    }

    pub fn is_enabled(&self, id: TaskId) -> Result<bool, Error> {
        Ok(self.slot(id)?.enabled)
    }

    pub fn period_ms(&self, id: TaskId) -> Result<u32, Error> {
        Ok(self.slot(id)?.period_ms)
    }

    pub fn elapsed_ms(&self, id: TaskId) -> Result<u32, Error> {
        Ok(self.slot(id)?.elapsed_ms)
    }

    /// How many times the task's tick function has completed
    pub fn run_count(&self, id: TaskId) -> Result<u32, Error> {
        Ok(self.slot(id)?.runs)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    // run every pending init hook once, in registration order
    pub(crate) fn run_init_hooks(&mut self) {
        for (index, task) in self.slots.iter_mut().enumerate() {
            if let Some(init) = task.init.take() {
                debug!("{} init", TaskId::from_index(index));
                init();
            }
        }
    }

    // hands out the tick function if the task is due; must be followed
    // by `finish_dispatch` for the same slot
    pub(crate) fn take_due(&mut self, index: usize) -> Option<TickFn> {
        let task = &mut self.slots[index];
        if task.enabled && task.elapsed_ms >= task.period_ms {
            task.tick.take()
        } else {
            None
        }
    }

    pub(crate) fn finish_dispatch(&mut self, index: usize, tick: TickFn) {
        let task = &mut self.slots[index];
        task.tick = Some(tick);
        task.elapsed_ms = 0;
        task.runs = task.runs.saturating_add(1);
    }

    pub(crate) fn advance(&mut self, index: usize) {
        let task = &mut self.slots[index];
        task.elapsed_ms = task.elapsed_ms.saturating_add(self.base_tick_ms);
    }
}
