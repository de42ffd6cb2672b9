//! Compute free time slots from busy intervals.
//!
//! Busy intervals are clipped to the horizon, sorted by start time, then swept
//! once. Overlapping intervals are not merged up front: the sweep cursor only
//! ever moves forward, which absorbs overlaps the same way a merge would.

use chrono::{DateTime, Duration, Utc};

use crate::interval::{BusyInterval, FreeSlot, Horizon};

/// Clip busy intervals to the horizon, discarding those entirely outside it
/// (and any empty or inverted ones), then sort by start time.
///
/// The sort is stable and keyed on `start` only, so intervals sharing a start
/// keep their input order.
fn clip_busy_intervals(
    busy: &[BusyInterval],
    horizon: &Horizon,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut intervals: Vec<(DateTime<Utc>, DateTime<Utc>)> = busy
        .iter()
        .filter(|b| b.start < b.end && horizon.overlaps(b.start, b.end))
        .map(|b| (b.start.max(horizon.from), b.end.min(horizon.to)))
        .collect();

    intervals.sort_by_key(|&(start, _)| start);
    intervals
}

/// Find free time slots within `horizon`, given a list of busy intervals.
///
/// Busy intervals may arrive in any order and may overlap. Returns free slots
/// sorted by start time; an empty horizon yields no slots.
pub fn find_free_slots(busy: &[BusyInterval], horizon: &Horizon) -> Vec<FreeSlot> {
    if horizon.is_empty() {
        return Vec::new();
    }

    let mut free_slots = Vec::new();
    let mut cursor = horizon.from;

    for (busy_start, busy_end) in clip_busy_intervals(busy, horizon) {
        if cursor < busy_start {
            free_slots.push(FreeSlot::new(cursor, busy_start));
        }
        cursor = cursor.max(busy_end);
    }

    // Trailing free slot after the last busy interval.
    if cursor < horizon.to {
        free_slots.push(FreeSlot::new(cursor, horizon.to));
    }

    free_slots
}

/// Find the first free slot of at least `min_duration` within the horizon.
pub fn find_first_free_slot(
    busy: &[BusyInterval],
    horizon: &Horizon,
    min_duration: Duration,
) -> Option<FreeSlot> {
    find_free_slots(busy, horizon)
        .into_iter()
        .find(|slot| slot.duration() >= min_duration)
}

/// Total free time across a list of slots.
pub fn total_free_time(slots: &[FreeSlot]) -> Duration {
    slots
        .iter()
        .fold(Duration::zero(), |acc, slot| acc + slot.duration())
}
