//! Time-range types shared by the gap finder, the allocator and the scheduler.
//!
//! Every timestamp is normalized to UTC before it reaches these types; see
//! [`crate::zone`] for the conversion from provider text.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A pre-existing calendar commitment. `start < end` is expected but not enforced;
/// empty or inverted intervals are ignored by [`crate::freebusy::find_free_slots`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// The window `[from, to)` in which free time may be found.
///
/// `from` is the caller's "now" and `to` the deadline. A horizon with
/// `from >= to` is empty and contains no free time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Horizon {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    pub fn is_empty(&self) -> bool {
        self.from >= self.to
    }

    /// Length of the horizon, zero when empty.
    pub fn length(&self) -> Duration {
        if self.is_empty() {
            Duration::zero()
        } else {
            self.to - self.from
        }
    }

    /// Whether `[start, end)` shares at least one instant with the horizon.
    ///
    /// Touching at an endpoint is not an overlap.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.to && end > self.from
    }
}

/// A free time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl FreeSlot {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            duration_minutes: (end - start).num_minutes(),
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// A concrete range of time allocated to a work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledBlock {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ScheduledBlock {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Two half-open ranges overlap iff `a.start < b.end && b.start < a.end`.
    /// Adjacent ranges (one ends exactly when the other starts) do not.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end
    }
}
