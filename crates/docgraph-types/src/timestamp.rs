use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A point in time with microsecond resolution.
///
/// Stored as microseconds since the UNIX epoch. Fingerprinting only ever sees
/// [`secs_since_epoch`](Self::secs_since_epoch), so sub-second precision does
/// not affect a document's hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Timestamp {
    micros: u64,
}

impl Timestamp {
    pub const fn from_micros(micros: u64) -> Self {
        Self { micros }
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self {
            micros: secs * 1_000_000,
        }
    }

    /// The UNIX epoch.
    pub const fn zero() -> Self {
        Self { micros: 0 }
    }

    /// Wall-clock time. Use a `Clock` for monotonic stamping.
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64;
        Self { micros }
    }

    pub fn micros(&self) -> u64 {
        self.micros
    }

    pub fn secs_since_epoch(&self) -> u64 {
        self.micros / 1_000_000
    }

    /// The next representable instant.
    pub fn next(&self) -> Self {
        Self {
            micros: self.micros.saturating_add(1),
        }
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}us)", self.micros)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06}",
            self.micros / 1_000_000,
            self.micros % 1_000_000
        )
    }
}
