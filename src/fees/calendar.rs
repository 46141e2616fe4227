use chrono::{Datelike, NaiveDate};

/// signed number of days from `start` to `end`
pub fn whole_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// complete calendar months from `start` to `end`, truncating.
///
/// a month completes when `end` reaches the day-of-month of `start`;
/// jan 31 -> feb 29 is zero months. returns 0 when `end <= start`.
pub fn whole_months(start: NaiveDate, end: NaiveDate) -> u32 {
    if end <= start {
        return 0;
    }
    let start_index = start.year() as i64 * 12 + start.month0() as i64;
    let end_index = end.year() as i64 * 12 + end.month0() as i64;
    let mut months = end_index - start_index;
    if months > 0 && end.day() < start.day() {
        months -= 1;
    }
    months.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_whole_days() {
        assert_eq!(whole_days(date(2024, 1, 1), date(2024, 2, 1)), 31);
        assert_eq!(whole_days(date(2024, 2, 28), date(2024, 3, 1)), 2);
        assert_eq!(whole_days(date(2024, 3, 1), date(2024, 2, 28)), -2);
    }

    #[test]
    fn test_whole_months_truncates() {
        assert_eq!(whole_months(date(2024, 1, 15), date(2024, 2, 14)), 0);
        assert_eq!(whole_months(date(2024, 1, 15), date(2024, 2, 15)), 1);
        assert_eq!(whole_months(date(2024, 1, 15), date(2025, 2, 20)), 13);
    }

    #[test]
    fn test_whole_months_short_months() {
        // end of month never reaches day 31 in february
        assert_eq!(whole_months(date(2024, 1, 31), date(2024, 2, 29)), 0);
        assert_eq!(whole_months(date(2024, 1, 31), date(2024, 3, 1)), 1);
        assert_eq!(whole_months(date(2023, 12, 31), date(2024, 1, 31)), 1);
    }

    #[test]
    fn test_whole_months_not_after_start() {
        assert_eq!(whole_months(date(2024, 5, 1), date(2024, 5, 1)), 0);
        assert_eq!(whole_months(date(2024, 5, 1), date(2024, 4, 1)), 0);
    }
}
