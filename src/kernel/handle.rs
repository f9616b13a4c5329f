// 1-based task and timer handles
//
// Zero is the reserved "invalid" handle and cannot be constructed, so
// every mutating operation rejects it by type. Range checks against
// the table happen in `resolve`.

use core::fmt;
use core::num::NonZeroUsize;

use super::error::Error;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(NonZeroUsize);

        impl $name {
            /// Returns `None` for the reserved handle 0.
            pub const fn new(raw: usize) -> Option<Self> {
                match NonZeroUsize::new(raw) {
                    Some(n) => Some(Self(n)),
                    None => None,
                }
            }

            pub const fn get(self) -> usize {
                self.0.get()
            }

            pub(crate) const fn from_index(index: usize) -> Self {
                match NonZeroUsize::new(index + 1) {
                    Some(n) => Self(n),
                    None => panic!("slot index overflow"),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

handle!(
    /// Handle of a registered periodic task
    TaskId,
    "task"
);
handle!(
    /// Handle of a registered software timer
    TimerId,
    "timer"
);

// map a raw handle onto a slot index of a table with `len` entries
pub(crate) fn resolve(raw: usize, len: usize, capacity: usize) -> Result<usize, Error> {
    if raw == 0 || raw > capacity {
        Err(Error::InvalidHandle(raw))
    } else if raw > len {
        Err(Error::NotRegistered(raw))
    } else {
        Ok(raw - 1)
    }
}
