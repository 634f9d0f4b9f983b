//! Open slot computation
//!
//! Candidate start times are laid on a fixed grid from each opening time;
//! a candidate survives when the whole session fits inside opening hours and
//! does not overlap any confirmed booking or busy slot. All windows are
//! half-open, so a session may start exactly when another ends.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use coachdesk_types::{BusinessHours, TimeWindow};

/// Inputs to [`open_slots`]
#[derive(Debug, Clone)]
pub struct SlotQuery<'a> {
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub slot_interval_minutes: u32,
    pub business_hours: &'a [BusinessHours],
    /// Windows of confirmed bookings
    pub booked: &'a [TimeWindow],
    /// Windows of admin busy slots
    pub busy: &'a [TimeWindow],
    /// Earliest acceptable start (local time), e.g. "now" for today
    pub not_before: Option<NaiveDateTime>,
}

/// Ordered, de-duplicated start times open on `query.date`.
///
/// An empty result means "no availability" and is not an error.
pub fn open_slots(query: &SlotQuery<'_>) -> Vec<NaiveTime> {
    if query.duration_minutes == 0 {
        return Vec::new();
    }

    let length = Duration::minutes(i64::from(query.duration_minutes));
    let step = Duration::minutes(i64::from(query.slot_interval_minutes.max(1)));
    let weekday = query.date.weekday();

    let mut slots: Vec<NaiveTime> = query
        .business_hours
        .iter()
        .filter(|hours| hours.weekday == weekday)
        .filter_map(|hours| hours.window_on(query.date))
        .flat_map(|opening| {
            let mut starts = Vec::new();
            let mut start = opening.start;
            while let Some(end) = start
                .checked_add_signed(length)
                .filter(|end| *end <= opening.end)
            {
                starts.push(TimeWindow::new(start, end));
                match start.checked_add_signed(step) {
                    Some(next) => start = next,
                    None => break,
                }
            }
            starts
        })
        .filter(|candidate| query.not_before.map_or(true, |earliest| candidate.start >= earliest))
        .filter(|candidate| !query.booked.iter().any(|b| b.overlaps(candidate)))
        .filter(|candidate| !query.busy.iter().any(|b| b.overlaps(candidate)))
        .map(|candidate| candidate.start.time())
        .collect();

    // Split shifts may produce the same start twice
    slots.sort_unstable();
    slots.dedup();
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date() -> NaiveDate {
        // A Wednesday
        NaiveDate::from_ymd_opt(2025, 9, 10).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn hours(weekday: Weekday, open: NaiveTime, close: NaiveTime) -> BusinessHours {
        BusinessHours {
            weekday,
            open_time: open,
            close_time: close,
            is_closed: false,
        }
    }

    fn query<'a>(
        hours: &'a [BusinessHours],
        booked: &'a [TimeWindow],
        busy: &'a [TimeWindow],
    ) -> SlotQuery<'a> {
        SlotQuery {
            date: date(),
            duration_minutes: 60,
            slot_interval_minutes: 30,
            business_hours: hours,
            booked,
            busy,
            not_before: None,
        }
    }

    #[test]
    fn test_full_day_grid() {
        let h = [hours(Weekday::Wed, t(9, 0), t(17, 0))];
        let slots = open_slots(&query(&h, &[], &[]));
        assert_eq!(slots.first(), Some(&t(9, 0)));
        assert_eq!(slots.last(), Some(&t(16, 0)));
        assert_eq!(slots.len(), 15);
    }

    #[test]
    fn test_other_weekday_ignored() {
        let h = [hours(Weekday::Thu, t(9, 0), t(17, 0))];
        assert!(open_slots(&query(&h, &[], &[])).is_empty());
    }

    #[test]
    fn test_confirmed_booking_blocks_overlapping_starts() {
        let h = [hours(Weekday::Wed, t(9, 0), t(17, 0))];
        let booked = [TimeWindow::starting_at(date(), t(14, 0), 60)];
        let slots = open_slots(&query(&h, &booked, &[]));
        assert!(!slots.contains(&t(13, 30)));
        assert!(!slots.contains(&t(14, 0)));
        assert!(!slots.contains(&t(14, 30)));
        // Back-to-back sessions are fine
        assert!(slots.contains(&t(13, 0)));
        assert!(slots.contains(&t(15, 0)));
    }

    #[test]
    fn test_busy_slot_spanning_days_blocks_morning() {
        let h = [hours(Weekday::Wed, t(9, 0), t(17, 0))];
        let previous = date().pred_opt().unwrap();
        let busy = [TimeWindow::new(
            previous.and_time(t(18, 0)),
            date().and_time(t(11, 0)),
        )];
        let slots = open_slots(&query(&h, &[], &busy));
        assert_eq!(slots.first(), Some(&t(11, 0)));
    }

    #[test]
    fn test_split_shift_and_dedup() {
        let h = [
            hours(Weekday::Wed, t(9, 0), t(12, 0)),
            hours(Weekday::Wed, t(13, 0), t(15, 0)),
            hours(Weekday::Wed, t(9, 0), t(10, 0)),
        ];
        let slots = open_slots(&query(&h, &[], &[]));
        assert_eq!(
            slots,
            vec![t(9, 0), t(9, 30), t(10, 0), t(10, 30), t(11, 0), t(13, 0), t(13, 30), t(14, 0)]
        );
    }

    #[test]
    fn test_not_before_drops_past_starts() {
        let h = [hours(Weekday::Wed, t(9, 0), t(17, 0))];
        let mut q = query(&h, &[], &[]);
        q.not_before = Some(date().and_time(t(15, 10)));
        assert_eq!(open_slots(&q), vec![t(15, 30), t(16, 0)]);
    }

    #[test]
    fn test_session_longer_than_opening_has_no_slots() {
        let h = [hours(Weekday::Wed, t(9, 0), t(10, 0))];
        let mut q = query(&h, &[], &[]);
        q.duration_minutes = 90;
        assert!(open_slots(&q).is_empty());
    }

    #[test]
    fn test_grid_stops_at_end_of_calendar() {
        let last = NaiveDate::MAX;
        let h = [hours(last.weekday(), t(22, 0), t(23, 30))];
        let mut q = query(&h, &[], &[]);
        q.date = last;
        assert_eq!(open_slots(&q), vec![t(22, 0), t(22, 30)]);
    }
}
