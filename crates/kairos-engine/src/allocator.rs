//! Greedy placement of work blocks into free slots.
//!
//! Slots are consumed strictly in the order given and never revisited. Two
//! policies exist:
//!
//! - **Splittable** work is carved into one-hour blocks from the front of each
//!   slot. A slot (or slot remainder) shorter than an hour is passed over.
//! - **Atomic** work needs a single contiguous block. The first slot long
//!   enough takes the whole requirement from its start; shorter slots are
//!   skipped entirely.
//!
//! Running out of free time is not an error here. The caller compares
//! [`allocated_duration`] with the requirement (see [`shortfall`]).

use chrono::Duration;

use crate::error::{EngineError, Result};
use crate::interval::{FreeSlot, ScheduledBlock};

/// Granularity of splittable blocks, in minutes.
pub const BLOCK_UNIT_MINUTES: i64 = 60;

/// Length of one splittable block.
pub fn block_unit() -> Duration {
    Duration::minutes(BLOCK_UNIT_MINUTES)
}

/// How much time a work item needs, and whether it may be split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkRequirement {
    total: Duration,
    splittable: bool,
}

impl WorkRequirement {
    /// # Errors
    /// Returns `EngineError::InvalidRequirement` if `total` is zero or negative.
    pub fn new(total: Duration, splittable: bool) -> Result<Self> {
        if total <= Duration::zero() {
            return Err(EngineError::InvalidRequirement(format!(
                "total duration must be positive, got {} minutes",
                total.num_minutes()
            )));
        }
        Ok(Self { total, splittable })
    }

    /// Build a requirement from a (possibly fractional) number of hours.
    ///
    /// The value is rounded to the nearest second.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidRequirement` for non-finite, zero, negative or
    /// out-of-range hours.
    pub fn from_hours(hours: f64, splittable: bool) -> Result<Self> {
        if !hours.is_finite() {
            return Err(EngineError::InvalidRequirement(format!(
                "hours must be a finite number, got {}",
                hours
            )));
        }
        // `as` saturates; chrono's own bound is checked by `try_seconds`.
        let seconds = (hours * 3600.0).round() as i64;
        let total = Duration::try_seconds(seconds).ok_or_else(|| {
            EngineError::InvalidRequirement(format!("{} hours is out of range", hours))
        })?;
        Self::new(total, splittable)
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn splittable(&self) -> bool {
        self.splittable
    }
}

/// Allocate blocks for `requirement` from `free_slots`, in slot order.
///
/// The sum of returned block durations never exceeds the requirement. With a
/// splittable requirement every block is exactly [`block_unit`] long, so a
/// fractional-hour remainder is left unallocated. With an atomic requirement the
/// result is either one block of the full duration or empty.
pub fn allocate_blocks(
    requirement: &WorkRequirement,
    free_slots: &[FreeSlot],
) -> Vec<ScheduledBlock> {
    if requirement.splittable {
        allocate_split(requirement.total, free_slots)
    } else {
        allocate_atomic(requirement.total, free_slots).into_iter().collect()
    }
}

fn allocate_split(total: Duration, free_slots: &[FreeSlot]) -> Vec<ScheduledBlock> {
    let unit = block_unit();
    let mut blocks = Vec::new();
    let mut remaining = total;

    for slot in free_slots {
        if remaining < unit {
            break;
        }

        let mut cursor = slot.start;
        while slot.end - cursor >= unit && remaining >= unit {
            let block_end = cursor + unit;
            blocks.push(ScheduledBlock::new(cursor, block_end));
            remaining = remaining - unit;
            cursor = block_end;
        }
    }

    blocks
}

fn allocate_atomic(total: Duration, free_slots: &[FreeSlot]) -> Option<ScheduledBlock> {
    free_slots
        .iter()
        .find(|slot| slot.duration() >= total)
        .map(|slot| ScheduledBlock::new(slot.start, slot.start + total))
}

/// Sum of block durations.
pub fn allocated_duration(blocks: &[ScheduledBlock]) -> Duration {
    blocks
        .iter()
        .fold(Duration::zero(), |acc, block| acc + block.duration())
}

/// How much of the requirement the blocks leave unallocated (zero when fully met).
pub fn shortfall(requirement: &WorkRequirement, blocks: &[ScheduledBlock]) -> Duration {
    (requirement.total - allocated_duration(blocks)).max(Duration::zero())
}
