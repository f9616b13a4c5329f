// Software timers: countdowns decremented once per base tick
//
// States: registered-but-stopped, running. Start and reload put a
// timer into running with a full count; stop (manual or on expiry)
// puts it back to stopped and fires the callback. No auto-reload: a
// callback that wants a periodic timer restarts it itself.
//
// Firing callbacks needs the whole scheduler, so the table only hands
// the callback out; `Control::stop_timer` does the invoking.

use alloc::boxed::Box;
use alloc::vec::Vec;

use log::{debug, warn};

use super::control::Control;
use super::error::Error;
use super::handle::{TimerId, resolve};

pub type TimerFn = Box<dyn FnMut(&mut Control<'_>)>;

pub(crate) struct Timer {
    timeout_ms: u32,
    // zero until the first start
    remaining_ms: u32,
    active: bool,
    // None when registered without a callback, or while it runs
    callback: Option<TimerFn>,
}

pub struct TimerTable {
    slots: Vec<Timer>,
    capacity: usize,
    base_tick_ms: u32,
}

impl TimerTable {
    // storage for every slot is reserved here and never grows
    pub(crate) fn new(capacity: usize, base_tick_ms: u32) -> Result<Self, Error> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| Error::InvalidConfig("timer capacity too large"))?;
        Ok(Self {
            slots,
            capacity,
            base_tick_ms,
        })
    }

    fn slot(&self, id: TimerId) -> Result<&Timer, Error> {
        let index = resolve(id.get(), self.slots.len(), self.capacity)?;
        Ok(&self.slots[index])
    }

    fn slot_mut(&mut self, id: TimerId) -> Result<&mut Timer, Error> {
        let index = resolve(id.get(), self.slots.len(), self.capacity)?;
        Ok(&mut self.slots[index])
    }

    pub(crate) fn register(
        &mut self,
        timeout_ms: u32,
        callback: Option<TimerFn>,
    ) -> Result<TimerId, Error> {
        if self.is_full() {
            warn!("timer rejected: {} slots in use", self.capacity);
            return Err(Error::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        if timeout_ms % self.base_tick_ms != 0 || timeout_ms <= self.base_tick_ms {
            let err = Error::InvalidTimeout {
                timeout_ms,
                base_tick_ms: self.base_tick_ms,
            };
            warn!("timer rejected: {}", err);
            return Err(err);
        }

        self.slots.push(Timer {
            timeout_ms,
            remaining_ms: 0,
            active: false,
            callback,
        });
        let id = TimerId::from_index(self.slots.len() - 1);
        debug!("{} registered, timeout {}ms", id, timeout_ms);
        Ok(id)
    }

    /// Loads the full timeout and marks the timer running. Restarts a
    /// timer that is already running.
    pub fn start(&mut self, id: TimerId) -> Result<(), Error> {
        let timer = self.slot_mut(id)?;
        timer.remaining_ms = timer.timeout_ms;
        timer.active = true;
        debug!("{} started, {}ms", id, timer.timeout_ms);
        Ok(())
    }

    /// Sets a new timeout and starts the timer with it. The value is
    /// not checked against the tick; a timeout that is not a multiple
    /// expires on the tick that would take it below zero.
    pub fn reload(&mut self, id: TimerId, timeout_ms: u32) -> Result<(), Error> {
        self.slot_mut(id)?.timeout_ms = timeout_ms;
        self.start(id)
    }

    // marks the timer stopped and lends out its callback; the caller
    // must hand it back with `restore_callback`
    pub(crate) fn halt(&mut self, id: TimerId) -> Result<Option<TimerFn>, Error> {
        let timer = self.slot_mut(id)?;
        timer.active = false;
        debug!("{} stopped", id);
        Ok(timer.callback.take())
    }

    pub(crate) fn restore_callback(&mut self, id: TimerId, callback: TimerFn) {
        if let Ok(timer) = self.slot_mut(id) {
            if timer.callback.is_none() {
                timer.callback = Some(callback);
            }
        }
    }

    // one tick of countdown; true when the timer just reached zero
    pub(crate) fn count_down(&mut self, index: usize) -> bool {
        let timer = &mut self.slots[index];
        if !timer.active {
            return false;
        }
        timer.remaining_ms = timer.remaining_ms.saturating_sub(self.base_tick_ms);
        timer.remaining_ms == 0
    }

    pub fn remaining_ms(&self, id: TimerId) -> Result<u32, Error> {
        Ok(self.slot(id)?.remaining_ms)
    }

    /// Remaining time, or 0 for a handle that does not name a timer.
    pub fn remaining_or_zero(&self, id: TimerId) -> u32 {
        self.remaining_ms(id).unwrap_or(0)
    }

    pub fn timeout_ms(&self, id: TimerId) -> Result<u32, Error> {
        Ok(self.slot(id)?.timeout_ms)
    }

    pub fn is_active(&self, id: TimerId) -> Result<bool, Error> {
        Ok(self.slot(id)?.active)
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
}
