//! Property-based tests for open slot computation
//!
//! For any opening hours and any set of existing bookings, every open slot
//! must fit inside opening hours and must not overlap a booking or busy slot.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use proptest::prelude::*;

use coachdesk_booking_core::{open_slots, SlotQuery};
use coachdesk_types::{BusinessHours, TimeWindow};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 10).unwrap()
}

// ============================================================================
// Strategies
// ============================================================================

/// Opening hours between 06:00 and 21:00, at quarter-hour precision
fn arb_hours() -> impl Strategy<Value = BusinessHours> {
    (24u32..48, 4u32..36).prop_map(|(open_q, len_q)| {
        let open = NaiveTime::from_hms_opt(0, 0, 0).unwrap() + Duration::minutes(i64::from(open_q * 15));
        let close = open + Duration::minutes(i64::from(len_q * 15));
        BusinessHours {
            weekday: day().weekday(),
            open_time: open,
            close_time: close,
            is_closed: false,
        }
    })
}

/// Windows anywhere on the day, 15 to 180 minutes long
fn arb_window() -> impl Strategy<Value = TimeWindow> {
    (0u32..(24 * 4), 1u32..12).prop_map(|(start_q, len_q)| {
        let start = day().and_time(NaiveTime::MIN) + Duration::minutes(i64::from(start_q * 15));
        TimeWindow::new(start, start + Duration::minutes(i64::from(len_q * 15)))
    })
}

fn arb_duration() -> impl Strategy<Value = u32> {
    prop_oneof![Just(30u32), Just(45), Just(60), Just(90), Just(120)]
}

fn arb_interval() -> impl Strategy<Value = u32> {
    prop_oneof![Just(15u32), Just(30), Just(60)]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn slots_never_overlap_bookings_or_busy_time(
        hours in arb_hours(),
        booked in prop::collection::vec(arb_window(), 0..6),
        busy in prop::collection::vec(arb_window(), 0..4),
        duration in arb_duration(),
        interval in arb_interval(),
    ) {
        let business_hours = [hours.clone()];
        let query = SlotQuery {
            date: day(),
            duration_minutes: duration,
            slot_interval_minutes: interval,
            business_hours: &business_hours,
            booked: &booked,
            busy: &busy,
            not_before: None,
        };

        for start in open_slots(&query) {
            let slot = TimeWindow::starting_at(day(), start, duration);
            prop_assert!(start >= hours.open_time);
            prop_assert!(slot.end <= day().and_time(hours.close_time));
            prop_assert!(!booked.iter().any(|b| b.overlaps(&slot)), "slot {start} overlaps a booking");
            prop_assert!(!busy.iter().any(|b| b.overlaps(&slot)), "slot {start} overlaps busy time");
        }
    }

    #[test]
    fn slots_are_sorted_unique_and_on_grid(
        hours in arb_hours(),
        booked in prop::collection::vec(arb_window(), 0..6),
        duration in arb_duration(),
        interval in arb_interval(),
    ) {
        let business_hours = [hours.clone()];
        let query = SlotQuery {
            date: day(),
            duration_minutes: duration,
            slot_interval_minutes: interval,
            business_hours: &business_hours,
            booked: &booked,
            busy: &[],
            not_before: None,
        };

        let slots = open_slots(&query);
        prop_assert!(slots.windows(2).all(|w| w[0] < w[1]));
        for start in slots {
            let offset = (start - hours.open_time).num_minutes();
            prop_assert_eq!(offset % i64::from(interval), 0);
        }
    }

    #[test]
    fn every_free_grid_start_is_offered(
        hours in arb_hours(),
        booked in prop::collection::vec(arb_window(), 0..6),
        duration in arb_duration(),
        interval in arb_interval(),
    ) {
        let business_hours = [hours.clone()];
        let query = SlotQuery {
            date: day(),
            duration_minutes: duration,
            slot_interval_minutes: interval,
            business_hours: &business_hours,
            booked: &booked,
            busy: &[],
            not_before: None,
        };
        let slots = open_slots(&query);

        let close = day().and_time(hours.close_time);
        let mut start = day().and_time(hours.open_time);
        let length = Duration::minutes(i64::from(duration));
        while start + length <= close {
            let candidate = TimeWindow::new(start, start + length);
            if !booked.iter().any(|b| b.overlaps(&candidate)) {
                prop_assert!(slots.contains(&start.time()), "free slot {} missing", start.time());
            }
            start += Duration::minutes(i64::from(interval));
        }
    }

    #[test]
    fn not_before_is_respected(
        hours in arb_hours(),
        cutoff_q in 0u32..(24 * 4),
        duration in arb_duration(),
    ) {
        let business_hours = [hours];
        let cutoff = day().and_time(NaiveTime::MIN) + Duration::minutes(i64::from(cutoff_q * 15));
        let query = SlotQuery {
            date: day(),
            duration_minutes: duration,
            slot_interval_minutes: 30,
            business_hours: &business_hours,
            booked: &[],
            busy: &[],
            not_before: Some(cutoff),
        };

        for start in open_slots(&query) {
            prop_assert!(day().and_time(start) >= cutoff);
        }
    }
}
