//! Observed-holiday provider.
//!
//! Computes the Alberta statutory holidays for a given year from fixed
//! rules (fixed dates, nth-weekday-of-month, Easter-relative offsets). No
//! network dependency; days in this set are never eligible for automatic
//! placement.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// All observed holidays for a year, as local calendar days.
pub fn holidays_for(year: i32) -> BTreeSet<NaiveDate> {
    let mut days = BTreeSet::new();
    let fixed = |month, day| NaiveDate::from_ymd_opt(year, month, day).expect("valid fixed date");

    // New Year's Day
    days.insert(fixed(1, 1));
    // Family Day: third Monday of February
    days.insert(nth_weekday(year, 2, Weekday::Mon, 3));
    // Good Friday: two days before Easter Sunday
    days.insert(easter_sunday(year) - Duration::days(2));
    // Victoria Day: the Monday on or before May 24
    days.insert(monday_on_or_before(fixed(5, 24)));
    // Canada Day
    days.insert(fixed(7, 1));
    // Heritage Day: first Monday of August
    days.insert(nth_weekday(year, 8, Weekday::Mon, 1));
    // Labour Day: first Monday of September
    days.insert(nth_weekday(year, 9, Weekday::Mon, 1));
    // Thanksgiving: second Monday of October
    days.insert(nth_weekday(year, 10, Weekday::Mon, 2));
    // Remembrance Day
    days.insert(fixed(11, 11));
    // Christmas Day and Boxing Day
    days.insert(fixed(12, 25));
    days.insert(fixed(12, 26));

    days
}

/// Whether `date` is an observed holiday.
pub fn is_holiday(date: NaiveDate) -> bool {
    holidays_for(date.year()).contains(&date)
}

/// The nth occurrence of `weekday` in a month (n is 1-based).
fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid month start");
    let offset = weekday.days_since(first.weekday());
    first + Duration::days(offset as i64 + 7 * (n as i64 - 1))
}

fn monday_on_or_before(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().days_since(Weekday::Mon);
    date - Duration::days(back as i64)
}

/// Easter Sunday by the anonymous Gregorian computus.
fn easter_sunday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32).expect("computus yields a valid date")
}
