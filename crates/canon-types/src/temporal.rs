use std::cell::Cell;
use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// Time source injected into a store.
///
/// The store never reads the wall clock on its own; identical call sequences
/// against identical clocks therefore produce identical hashes.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc>,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests and replays.
///
/// Each reading returns the current instant and then advances it by `step`,
/// so successive readings are strictly increasing when `step` is positive.
pub struct ManualClock {
    current: Cell<DateTime<Utc>>,
    step: Duration,
}

impl ManualClock {
    /// 2024-01-01T00:00:00Z, the default starting instant.
    pub const DEFAULT_START_SECS: i64 = 1_704_067_200;

    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            current: Cell::new(start),
            step,
        }
    }

    /// A clock frozen at `instant`.
    pub fn fixed(instant: DateTime<Utc>) -> Self {
        Self::new(instant, Duration::zero())
    }

    /// Move the clock forward without producing a reading.
    pub fn advance(&self, by: Duration) {
        self.current.set(self.current.get() + by);
    }

    /// The instant the next reading will return.
    pub fn peek(&self) -> DateTime<Utc> {
        self.current.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        let start = DateTime::<Utc>::from_timestamp(Self::DEFAULT_START_SECS, 0).unwrap_or_default();
        Self::new(start, Duration::seconds(1))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let now = self.current.get();
        self.current.set(now + self.step);
        now
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock")
            .field("current", &self.current.get())
            .field("step", &self.step)
            .finish()
    }
}
