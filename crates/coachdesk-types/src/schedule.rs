//! Calendar types: business hours, busy slots and time windows
//!
//! Calendar quantities are wall-clock values in the business's own timezone,
//! so they are modelled with chrono's naive types.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ParseError;

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| ParseError::Date(s.to_string()))
}

/// Parse an `HH:MM` (or `HH:MM:SS`) time of day
pub fn parse_time(s: &str) -> Result<NaiveTime, ParseError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| ParseError::Time(s.to_string()))
}

/// Format a time of day as `HH:MM`
pub fn format_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// Half-open interval `[start, end)` of local wall-clock time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Window starting at `date time` and lasting `minutes`
    pub fn starting_at(date: NaiveDate, time: NaiveTime, minutes: u32) -> Self {
        let start = date.and_time(time);
        Self {
            start,
            end: start + Duration::minutes(i64::from(minutes)),
        }
    }

    /// Whether two windows share any instant. Touching windows do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Opening hours for one weekday. Several entries per weekday model split shifts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessHours {
    pub weekday: Weekday,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub is_closed: bool,
}

impl BusinessHours {
    /// The opening window on `date`, if the business is open
    pub fn window_on(&self, date: NaiveDate) -> Option<TimeWindow> {
        if self.is_closed || self.close_time <= self.open_time {
            return None;
        }
        Some(TimeWindow::new(
            date.and_time(self.open_time),
            date.and_time(self.close_time),
        ))
    }
}

/// Admin-defined block of time excluded from availability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusySlot {
    pub id: Uuid,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub title: String,
    pub description: Option<String>,
    /// Admin is away (vacation, travel) rather than in another appointment
    pub away_status: bool,
}

impl BusySlot {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_time, self.end_time)
    }
}

/// Weekday from the database encoding (0 = Monday .. 6 = Sunday)
pub fn weekday_from_index(index: i16) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Database encoding of a weekday (0 = Monday .. 6 = Sunday)
pub fn weekday_index(weekday: Weekday) -> i16 {
    weekday.num_days_from_monday() as i16
}
