use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub const HOURS_PER_DAY: i64 = 8;

/// Weekdays in `[start, end]` that are not skipped. An inverted range is empty.
pub fn working_days(
    start: NaiveDate,
    end: NaiveDate,
    skipped: &BTreeSet<NaiveDate>,
) -> BTreeSet<NaiveDate> {
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .filter(|day| !skipped.contains(day))
        .collect()
}

pub fn working_hours(days: &BTreeSet<NaiveDate>) -> i64 {
    days.len() as i64 * HOURS_PER_DAY
}

pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next - Duration::days(1)))
}

/// Monday-to-Sunday windows covering the month, clipped to its first and last day.
pub fn month_weeks(year: i32, month: u32) -> Vec<(NaiveDate, NaiveDate)> {
    let Some((first, last)) = month_bounds(year, month) else {
        return Vec::new();
    };

    let mut weeks = Vec::new();
    let mut start = first;
    while start <= last {
        let to_sunday = 6 - start.weekday().num_days_from_monday() as i64;
        let end = (start + Duration::days(to_sunday)).min(last);
        weeks.push((start, end));
        start = end + Duration::days(1);
    }
    weeks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn single_weekday_is_a_working_day() {
        let days = working_days(date(2024, 1, 2), date(2024, 1, 2), &BTreeSet::new());
        assert_eq!(days, BTreeSet::from([date(2024, 1, 2)]));
    }

    #[test]
    fn weekend_yields_no_hours() {
        let days = working_days(date(2024, 1, 6), date(2024, 1, 7), &BTreeSet::new());
        assert!(days.is_empty());
        assert_eq!(working_hours(&days), 0);
    }

    #[test]
    fn inverted_range_is_empty() {
        let days = working_days(date(2024, 1, 10), date(2024, 1, 2), &BTreeSet::new());
        assert!(days.is_empty());
    }

    #[test]
    fn skipped_dates_are_removed_and_range_respected() {
        let start = date(2024, 1, 1);
        let end = date(2024, 1, 14);
        let skipped = BTreeSet::from([date(2024, 1, 3), date(2024, 1, 6), date(2024, 2, 1)]);
        let days = working_days(start, end, &skipped);

        assert_eq!(days.len(), 9);
        assert!(days.iter().all(|d| *d >= start && *d <= end));
        assert!(days.is_disjoint(&skipped));
        assert_eq!(working_hours(&days), 72);
        assert_eq!(days.iter().next(), Some(&date(2024, 1, 1)));
    }

    #[test]
    fn month_bounds_handle_december_and_leap_years() {
        assert_eq!(month_bounds(2024, 2), Some((date(2024, 2, 1), date(2024, 2, 29))));
        assert_eq!(month_bounds(2023, 12), Some((date(2023, 12, 1), date(2023, 12, 31))));
        assert_eq!(month_bounds(2024, 13), None);
    }

    #[test]
    fn month_weeks_cover_the_month_without_gaps() {
        let weeks = month_weeks(2024, 1);
        assert_eq!(weeks.first(), Some(&(date(2024, 1, 1), date(2024, 1, 7))));
        assert_eq!(weeks.last(), Some(&(date(2024, 1, 29), date(2024, 1, 31))));
        assert_eq!(weeks.len(), 5);
        for pair in weeks.windows(2) {
            assert_eq!(pair[0].1 + Duration::days(1), pair[1].0);
        }
    }

    #[test]
    fn month_starting_midweek_gets_short_first_week() {
        let weeks = month_weeks(2024, 5);
        assert_eq!(weeks[0], (date(2024, 5, 1), date(2024, 5, 5)));
    }
}
