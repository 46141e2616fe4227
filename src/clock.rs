use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;

/// source of "now" for every ledger operation
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// calendar date of `now` in utc
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

impl Clock for SafeTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        SafeTimeProvider::now(self)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use hourglass_rs::TimeSource;

    #[test]
    fn test_time_provider_drives_today() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 31, 23, 0, 0).unwrap()
        ));
        let control = time.test_control().unwrap();

        assert_eq!(Clock::today(&time), NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());

        control.advance(Duration::hours(2));
        assert_eq!(Clock::today(&time), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }
}
