// What the dispatch loop does between clock samples
//
// The loop detects tick boundaries by polling the clock; this picks how
// the CPU spends the gap. Spin is the reference busy-poll and gives the
// tightest tick edges. Yield and WaitForInterrupt save power but a tick
// is only noticed once the thread is rescheduled or an interrupt lands,
// so boundaries jitter by that much.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickWait {
    /// Busy-poll with a spin-loop hint
    #[default]
    Spin,
    /// Give the rest of the time slice to the OS (spins without `std`)
    Yield,
    /// Sleep until the next interrupt; only sensible when a timer
    /// interrupt drives the clock
    WaitForInterrupt,
}

impl TickWait {
    #[inline]
    pub fn pause(self) {
        match self {
            TickWait::Spin => core::hint::spin_loop(),
            TickWait::Yield => yield_now(),
            TickWait::WaitForInterrupt => wait_for_interrupt(),
        }
    }
}

#[inline]
fn yield_now() {
    #[cfg(feature = "std")]
    std::thread::yield_now();

    #[cfg(not(feature = "std"))]
    core::hint::spin_loop();
}

// sleeps the hart until the next interrupt
#[cfg(target_arch = "riscv32")]
#[inline]
pub fn wait_for_interrupt() {
    unsafe { core::arch::asm!("wfi", options(nomem, nostack)) }
}

// no interrupt to park on off-target
#[cfg(not(target_arch = "riscv32"))]
#[inline]
pub fn wait_for_interrupt() {
    yield_now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_strategy_returns() {
        for wait in [TickWait::Spin, TickWait::Yield, TickWait::WaitForInterrupt] {
            wait.pause();
        }
        assert_eq!(TickWait::default(), TickWait::Spin);
    }
}
