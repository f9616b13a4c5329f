// Errors returned by table registration and control operations
//
// Every fallible call reports locally; nothing is retried and the
// dispatch loop itself never fails.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Table already holds `capacity` entries
    CapacityExceeded { capacity: usize },
    /// Task period is zero or not a multiple of the base tick
    InvalidPeriod { period_ms: u32, base_tick_ms: u32 },
    /// Timer timeout is not a multiple of the base tick, or does not exceed it
    InvalidTimeout { timeout_ms: u32, base_tick_ms: u32 },
    /// Handle is beyond the table capacity
    InvalidHandle(usize),
    /// Handle is within capacity but that slot was never registered
    NotRegistered(usize),
    /// Configuration rejected at construction
    InvalidConfig(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CapacityExceeded { capacity } => {
                write!(f, "table full ({} slots)", capacity)
            }
            Error::InvalidPeriod {
                period_ms,
                base_tick_ms,
            } => write!(
                f,
                "period {}ms is not a positive multiple of the {}ms tick",
                period_ms, base_tick_ms
            ),
            Error::InvalidTimeout {
                timeout_ms,
                base_tick_ms,
            } => write!(
                f,
                "timeout {}ms must be a multiple of and larger than the {}ms tick",
                timeout_ms, base_tick_ms
            ),
            Error::InvalidHandle(raw) => write!(f, "handle {} out of range", raw),
            Error::NotRegistered(raw) => write!(f, "handle {} not registered", raw),
            Error::InvalidConfig(reason) => write!(f, "invalid config: {}", reason),
        }
    }
}

impl core::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn display_names_the_offending_values() {
        let err = Error::InvalidPeriod {
            period_ms: 300,
            base_tick_ms: 200,
        };
        assert_eq!(
            err.to_string(),
            "period 300ms is not a positive multiple of the 200ms tick"
        );
        assert_eq!(Error::NotRegistered(3).to_string(), "handle 3 not registered");
    }
}
