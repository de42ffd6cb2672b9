//! Tests for free-slot computation inside a scheduling horizon.

use chrono::{DateTime, Duration, TimeZone, Utc};
use kairos_engine::freebusy::{find_first_free_slot, find_free_slots, total_free_time};
use kairos_engine::{BusyInterval, Horizon};

/// Helper: a UTC timestamp on 2026-03-01.
fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, hour, min, 0).unwrap()
}

/// Helper: a busy interval between two times on 2026-03-01.
fn busy(start_hour: u32, start_min: u32, end_hour: u32, end_min: u32) -> BusyInterval {
    BusyInterval::new(at(start_hour, start_min), at(end_hour, end_min))
}

fn workday() -> Horizon {
    Horizon::new(at(9, 0), at(17, 0))
}

#[test]
fn no_busy_intervals_whole_horizon_is_free() {
    // busy = [], horizon = [09:00, 17:00) → [[09:00, 17:00)]
    let slots = find_free_slots(&[], &workday());

    assert_eq!(slots.len(), 1, "no busy time should produce one free slot");
    assert_eq!(slots[0].start, at(9, 0));
    assert_eq!(slots[0].end, at(17, 0));
    assert_eq!(slots[0].duration_minutes, 480);
}

#[test]
fn single_busy_interval_produces_two_free_slots() {
    // busy = [[10:00, 11:00)], horizon = [09:00, 17:00)
    // → [[09:00, 10:00), [11:00, 17:00)]
    let slots = find_free_slots(&[busy(10, 0, 11, 0)], &workday());

    assert_eq!(slots.len(), 2);
    assert_eq!((slots[0].start, slots[0].end), (at(9, 0), at(10, 0)));
    assert_eq!(slots[0].duration_minutes, 60);
    assert_eq!((slots[1].start, slots[1].end), (at(11, 0), at(17, 0)));
    assert_eq!(slots[1].duration_minutes, 360);
}

#[test]
fn unsorted_input_is_sorted_before_the_sweep() {
    let events = vec![busy(15, 0, 16, 0), busy(10, 0, 11, 0), busy(12, 0, 13, 0)];

    let slots = find_free_slots(&events, &workday());

    let spans: Vec<_> = slots.iter().map(|s| (s.start, s.end)).collect();
    assert_eq!(
        spans,
        vec![
            (at(9, 0), at(10, 0)),
            (at(11, 0), at(12, 0)),
            (at(13, 0), at(15, 0)),
            (at(16, 0), at(17, 0)),
        ]
    );
}

#[test]
fn overlapping_busy_intervals_do_not_create_spurious_gaps() {
    // 10:00-11:30 and 11:00-12:00 behave like one busy block 10:00-12:00.
    let events = vec![busy(10, 0, 11, 30), busy(11, 0, 12, 0)];

    let slots = find_free_slots(&events, &workday());

    assert_eq!(slots.len(), 2);
    assert_eq!((slots[0].start, slots[0].end), (at(9, 0), at(10, 0)));
    assert_eq!((slots[1].start, slots[1].end), (at(12, 0), at(17, 0)));
}

#[test]
fn busy_interval_nested_inside_another_is_absorbed() {
    // 10:00-14:00 contains 11:00-12:00; the inner one must not pull the cursor back.
    let events = vec![busy(10, 0, 14, 0), busy(11, 0, 12, 0)];

    let slots = find_free_slots(&events, &workday());

    assert_eq!(slots.len(), 2);
    assert_eq!(slots[1].start, at(14, 0));
}

#[test]
fn adjacent_busy_intervals_leave_no_zero_length_slot() {
    let events = vec![busy(10, 0, 11, 0), busy(11, 0, 12, 0)];

    let slots = find_free_slots(&events, &workday());

    assert_eq!(slots.len(), 2);
    assert!(slots.iter().all(|s| s.start < s.end));
}

#[test]
fn busy_interval_straddling_horizon_start_is_clipped() {
    // 08:00-10:00 overlaps the 09:00 start: free time begins at 10:00.
    let slots = find_free_slots(&[busy(8, 0, 10, 0)], &workday());

    assert_eq!(slots.len(), 1);
    assert_eq!((slots[0].start, slots[0].end), (at(10, 0), at(17, 0)));
}

#[test]
fn busy_interval_entirely_before_horizon_is_ignored() {
    let slots = find_free_slots(&[busy(6, 0, 7, 0)], &workday());

    assert_eq!(slots.len(), 1);
    assert_eq!((slots[0].start, slots[0].end), (at(9, 0), at(17, 0)));
}

#[test]
fn busy_interval_after_deadline_never_extends_a_slot_past_it() {
    // Without clipping, 18:00-19:00 would yield a free slot 09:00-18:00.
    let slots = find_free_slots(&[busy(18, 0, 19, 0)], &workday());

    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].end, at(17, 0), "free slot must stop at the deadline");
}

#[test]
fn busy_interval_straddling_deadline_removes_trailing_slot() {
    let slots = find_free_slots(&[busy(16, 0, 18, 0)], &workday());

    assert_eq!(slots.len(), 1);
    assert_eq!((slots[0].start, slots[0].end), (at(9, 0), at(16, 0)));
}

#[test]
fn busy_covering_whole_horizon_leaves_nothing() {
    let slots = find_free_slots(&[busy(8, 0, 18, 0)], &workday());
    assert!(slots.is_empty());
}

#[test]
fn inverted_horizon_has_no_free_time() {
    let horizon = Horizon::new(at(17, 0), at(9, 0));

    assert!(horizon.is_empty());
    assert_eq!(horizon.length(), Duration::zero());
    assert!(find_free_slots(&[], &horizon).is_empty());
}

#[test]
fn zero_length_horizon_has_no_free_time() {
    let horizon = Horizon::new(at(9, 0), at(9, 0));
    assert!(find_free_slots(&[], &horizon).is_empty());
}

#[test]
fn empty_or_inverted_busy_intervals_are_ignored() {
    let events = vec![busy(10, 0, 10, 0), busy(12, 0, 11, 0)];

    let slots = find_free_slots(&events, &workday());

    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].duration_minutes, 480);
}

#[test]
fn find_first_free_slot_with_minimum_duration() {
    // Gaps: 09:00-09:30 (30 min), 10:00-10:15 (15 min), 12:00-17:00 (5 h)
    let events = vec![busy(9, 30, 10, 0), busy(10, 15, 12, 0)];

    let slot = find_first_free_slot(&events, &workday(), Duration::hours(1))
        .expect("should find a slot of at least an hour");

    assert_eq!((slot.start, slot.end), (at(12, 0), at(17, 0)));
}

#[test]
fn find_first_free_slot_none_large_enough() {
    let events = vec![busy(9, 0, 10, 0), busy(10, 15, 17, 0)];

    let slot = find_first_free_slot(&events, &workday(), Duration::hours(1));

    assert!(slot.is_none());
}

#[test]
fn total_free_time_sums_all_slots() {
    let events = vec![busy(10, 0, 11, 0), busy(13, 0, 14, 30)];

    let slots = find_free_slots(&events, &workday());

    assert_eq!(total_free_time(&slots), Duration::minutes(330));
}
