// Monotonic millisecond clocks for the dispatch loop
//
// The scheduler only needs a non-decreasing, non-blocking millisecond
// count from an arbitrary epoch. Three sources:
//   StdClock  - host time since construction (std only)
//   TickClock - uptime counter bumped from a timer ISR
//   SimClock  - advances a fixed step on every read, for simulation

use core::cell::Cell;

pub trait Clock {
    fn now_ms(&self) -> u64;
}

impl<F> Clock for F
where
    F: Fn() -> u64,
{
    fn now_ms(&self) -> u64 {
        self()
    }
}

#[cfg(feature = "std")]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

// cs: riscv32imc has no atomic add, and u64 atomics are not universal
pub struct TickClock {
    ms: critical_section::Mutex<Cell<u64>>,
}

impl TickClock {
    pub const fn new() -> Self {
        Self {
            ms: critical_section::Mutex::new(Cell::new(0)),
        }
    }

    /// Call from the timer interrupt with the interrupt period.
    #[inline]
    pub fn advance(&self, ms: u32) {
        critical_section::with(|cs| {
            let now = self.ms.borrow(cs);
            now.set(now.get().saturating_add(ms as u64));
        });
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TickClock {
    fn now_ms(&self) -> u64 {
        critical_section::with(|cs| self.ms.borrow(cs).get())
    }
}

/// Returns `start` on the first read, then `step` more on each read after.
pub struct SimClock {
    next: Cell<u64>,
    step: u64,
}

impl SimClock {
    pub const fn new(start: u64, step: u64) -> Self {
        Self {
            next: Cell::new(start),
            step,
        }
    }

    /// Value the next read will return
    pub fn peek(&self) -> u64 {
        self.next.get()
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        let now = self.next.get();
        self.next.set(now.saturating_add(self.step));
        now
    }
}
