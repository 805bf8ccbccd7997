//! Program calendar: maps (week, day) slots to business dates.
//!
//! Slot `(1, 1)` is the first business day on or after the program start
//! date; every later slot is the next business day. Saturdays and Sundays
//! belong to no slot.

use crate::catalog::DAYS_PER_WEEK;
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc, Weekday};

/// The calendar date of `instant` on the local clock.
///
/// Every "today" in RampLO (request defaults, activity dates) comes from here.
pub fn local_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

pub fn today() -> NaiveDate {
    local_date(Utc::now())
}

fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn first_business_day(start: NaiveDate) -> NaiveDate {
    let mut d = start;
    while !is_business_day(d) {
        d += Duration::days(1);
    }
    d
}

/// Zero-based position of a slot in the program.
pub fn slot_index(week: u32, day: u32) -> u32 {
    (week.saturating_sub(1)) * DAYS_PER_WEEK + day.saturating_sub(1)
}

fn slot_at(index: u32) -> (u32, u32) {
    (index / DAYS_PER_WEEK + 1, index % DAYS_PER_WEEK + 1)
}

/// Business date of `(week, day)` for a program that started on `start`.
pub fn slot_date(start: NaiveDate, week: u32, day: u32) -> NaiveDate {
    let index = i64::from(slot_index(week, day));
    let first = first_business_day(start);
    // Every business week is 7 calendar days; `first` may be mid-week.
    let offset_in_week = first.weekday().num_days_from_monday() as i64;
    let total = offset_in_week + index;
    let weeks = total / 5;
    let rem = total % 5;
    first - Duration::days(offset_in_week) + Duration::days(weeks * 7 + rem)
}

/// The slot falling on `date`, or `None` for weekends and dates before the start.
pub fn slot_for(start: NaiveDate, date: NaiveDate) -> Option<(u32, u32)> {
    if !is_business_day(date) {
        return None;
    }
    let first = first_business_day(start);
    if date < first {
        return None;
    }
    Some(slot_at(business_days_between(first, date)))
}

/// The last slot whose date is on or before `date`.
pub fn last_slot_on_or_before(start: NaiveDate, date: NaiveDate) -> Option<(u32, u32)> {
    let first = first_business_day(start);
    if date < first {
        return None;
    }
    let mut d = date;
    while !is_business_day(d) {
        d -= Duration::days(1);
    }
    Some(slot_at(business_days_between(first, d)))
}

/// Business days from `from` (a business day) up to but excluding `to`.
fn business_days_between(from: NaiveDate, to: NaiveDate) -> u32 {
    let monday_from = from - Duration::days(from.weekday().num_days_from_monday() as i64);
    let monday_to = to - Duration::days(to.weekday().num_days_from_monday() as i64);
    let whole_weeks = (monday_to - monday_from).num_days() / 7;
    let days = whole_weeks * 5 + to.weekday().num_days_from_monday() as i64
        - from.weekday().num_days_from_monday() as i64;
    days.max(0) as u32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2024-06-03 is a Monday.

    #[test]
    fn local_date_follows_local_clock() {
        let instant = Utc::now();
        assert_eq!(local_date(instant), instant.with_timezone(&Local).date_naive());
        let evening = chrono::NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(23, 30, 0)
            .unwrap()
            .and_local_timezone(Local)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(local_date(evening), date(2024, 6, 3));
    }

    #[test]
    fn monday_start_maps_weeks_to_calendar_weeks() {
        let start = date(2024, 6, 3);
        assert_eq!(slot_date(start, 1, 1), date(2024, 6, 3));
        assert_eq!(slot_date(start, 1, 5), date(2024, 6, 7));
        assert_eq!(slot_date(start, 2, 1), date(2024, 6, 10));
        assert_eq!(slot_date(start, 13, 5), date(2024, 8, 30));
    }

    #[test]
    fn midweek_start_skips_weekend() {
        // Wednesday
        let start = date(2024, 6, 5);
        assert_eq!(slot_date(start, 1, 1), date(2024, 6, 5));
        assert_eq!(slot_date(start, 1, 3), date(2024, 6, 7));
        assert_eq!(slot_date(start, 1, 4), date(2024, 6, 10));
        assert_eq!(slot_date(start, 2, 1), date(2024, 6, 12));
    }

    #[test]
    fn weekend_start_begins_monday() {
        let start = date(2024, 6, 8);
        assert_eq!(slot_date(start, 1, 1), date(2024, 6, 10));
    }

    #[test]
    fn slot_for_inverts_slot_date() {
        for start in [date(2024, 6, 3), date(2024, 6, 5), date(2024, 6, 9)] {
            for week in 1..=13 {
                for day in 1..=5 {
                    let d = slot_date(start, week, day);
                    assert_eq!(slot_for(start, d), Some((week, day)), "start {start} slot {week}/{day}");
                }
            }
        }
    }

    #[test]
    fn weekends_and_early_dates_have_no_slot() {
        let start = date(2024, 6, 5);
        assert_eq!(slot_for(start, date(2024, 6, 8)), None);
        assert_eq!(slot_for(start, date(2024, 6, 4)), None);
    }

    #[test]
    fn last_slot_on_weekend_is_friday() {
        let start = date(2024, 6, 3);
        assert_eq!(last_slot_on_or_before(start, date(2024, 6, 9)), Some((1, 5)));
        assert_eq!(last_slot_on_or_before(start, date(2024, 6, 2)), None);
    }
}
