use serde::{Deserialize, Serialize};
use std::fmt;

/// The single logical clock used throughout the coordinator. Timestamps are
/// supplied externally (one per instruction line) and are never generated
/// internally except for the `T_init` seed value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The timestamp of the synthetic `T_init` seed version, strictly less
    /// than any timestamp a real instruction can carry.
    pub const INIT: Timestamp = Timestamp(-1);

    /// A real timestamp: either the seeded `(true, 0)` status-log event from
    /// §3, or a dispatcher-assigned timestamp for the Nth (1-based)
    /// instruction line. Only `Timestamp::INIT` (`-1`) is reserved.
    pub fn new(n: i64) -> Self {
        debug_assert!(n >= 0, "real timestamps must be non-negative");
        Timestamp(n)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
