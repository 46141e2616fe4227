use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::LateFeePolicy;
use crate::decimal::{Money, Rate};
use crate::fees::calendar::{whole_days, whole_months};

/// day count the daily component wraps around
const DAYS_PER_FEE_MONTH: u32 = 30;

/// engine for late fees on overdue dues
#[derive(Debug, Clone, Copy)]
pub struct LateFeeEngine {
    pub policy: LateFeePolicy,
}

impl LateFeeEngine {
    pub fn new(policy: LateFeePolicy) -> Self {
        Self { policy }
    }

    /// Late fee owed on `amount` due on `due_date`, as of `today`.
    ///
    /// The fee is a monthly charge per complete calendar month late plus a
    /// daily charge on `days_late % 30`, capped at a share of the amount.
    /// Nothing is chargeable until at least one full month has passed.
    pub fn assess(&self, amount: Money, due_date: NaiveDate, today: NaiveDate) -> LateFeeAssessment {
        let days_late = whole_days(due_date, today);
        if days_late <= 0 {
            return LateFeeAssessment::not_late();
        }

        let days_late = days_late as u32;
        let months_late = whole_months(due_date, today);
        let remaining_days = days_late % DAYS_PER_FEE_MONTH;

        let base = amount.as_decimal();
        let monthly_component = scaled(base, self.policy.monthly_late_fee_rate, months_late);
        let daily_component = scaled(base, self.policy.daily_late_fee_rate, remaining_days);
        let cap = scaled(base, self.policy.max_late_fee_percentage, 1).unwrap_or(Decimal::MAX);

        // a fee past the decimal range saturates and counts as capped
        let raw_fee = monthly_component
            .zip(daily_component)
            .and_then(|(monthly, daily)| monthly.checked_add(daily));
        let overflowed = raw_fee.is_none();
        let raw_fee = raw_fee.unwrap_or(Decimal::MAX);
        let monthly_component = monthly_component.unwrap_or(Decimal::MAX);
        let daily_component = daily_component.unwrap_or(Decimal::MAX);

        let capped = overflowed || raw_fee > cap;
        let fee = if months_late > 0 {
            Money::from_decimal(raw_fee.min(cap))
        } else {
            Money::ZERO
        };

        LateFeeAssessment {
            days_late,
            months_late,
            remaining_days,
            monthly_component,
            daily_component,
            raw_fee,
            cap,
            capped,
            fee,
        }
    }
}

/// `base * rate * count`, or `None` past the decimal range
fn scaled(base: Decimal, rate: Rate, count: u32) -> Option<Decimal> {
    base.checked_mul(rate.as_decimal())?.checked_mul(Decimal::from(count))
}

/// late fee breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LateFeeAssessment {
    pub days_late: u32,
    pub months_late: u32,
    /// `days_late % 30`, not the days past the last full month
    pub remaining_days: u32,
    pub monthly_component: Decimal,
    pub daily_component: Decimal,
    pub raw_fee: Decimal,
    pub cap: Decimal,
    pub capped: bool,
    /// zero unless chargeable
    pub fee: Money,
}

impl LateFeeAssessment {
    fn not_late() -> Self {
        Self {
            days_late: 0,
            months_late: 0,
            remaining_days: 0,
            monthly_component: Decimal::ZERO,
            daily_component: Decimal::ZERO,
            raw_fee: Decimal::ZERO,
            cap: Decimal::ZERO,
            capped: false,
            fee: Money::ZERO,
        }
    }

    /// a fee is written back only after a full calendar month
    pub fn is_chargeable(&self) -> bool {
        self.months_late > 0
    }

    pub fn total_for(&self, amount: Money) -> Money {
        amount + self.fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn engine() -> LateFeeEngine {
        LateFeeEngine::new(LateFeePolicy::default())
    }

    #[test]
    fn test_not_yet_due() {
        let today = date(2024, 6, 15);
        let amount = Money::from_major(1_000);

        let on_due = engine().assess(amount, today, today);
        assert_eq!(on_due.fee, Money::ZERO);
        assert!(!on_due.is_chargeable());

        let future = engine().assess(amount, today + Duration::days(5), today);
        assert_eq!(future.fee, Money::ZERO);
        assert_eq!(future.days_late, 0);
    }

    #[test]
    fn test_forty_days_late() {
        let today = date(2024, 6, 15);
        let due = today - Duration::days(40);
        let result = engine().assess(Money::from_major(1_000), due, today);

        assert_eq!(result.days_late, 40);
        assert_eq!(result.months_late, 1);
        assert_eq!(result.remaining_days, 10);
        assert_eq!(result.monthly_component, dec!(50));
        assert_eq!(result.daily_component, dec!(20));
        assert_eq!(result.fee, Money::from_major(70));
        assert_eq!(result.total_for(Money::from_major(1_000)), Money::from_major(1_070));
        assert!(!result.capped);
    }

    #[test]
    fn test_cap_applies() {
        let today = date(2024, 6, 15);
        let due = today - Duration::days(400);
        let result = engine().assess(Money::from_major(1_000), due, today);

        assert_eq!(result.months_late, 13);
        assert!(result.raw_fee > dec!(650));
        assert!(result.capped);
        assert_eq!(result.fee, Money::from_major(500));
    }

    #[test]
    fn test_sub_month_lateness_not_chargeable() {
        let today = date(2024, 6, 15);
        let due = today - Duration::days(10);
        let result = engine().assess(Money::from_major(1_000), due, today);

        assert_eq!(result.days_late, 10);
        assert_eq!(result.months_late, 0);
        assert!(!result.is_chargeable());
        assert_eq!(result.fee, Money::ZERO);
        // the daily part is still reported
        assert_eq!(result.daily_component, dec!(20));
    }

    #[test]
    fn test_remaining_days_use_raw_count() {
        // 62 days spanning two 31-day months: 2 full months, 62 % 30 = 2
        let due = date(2024, 7, 1);
        let today = date(2024, 9, 1);
        let result = engine().assess(Money::from_major(1_000), due, today);

        assert_eq!(result.days_late, 62);
        assert_eq!(result.months_late, 2);
        assert_eq!(result.remaining_days, 2);
        assert_eq!(result.fee, Money::from_major(104));
    }

    #[test]
    fn test_bankers_rounding_on_fee() {
        // 0.25 * 0.05 * 1 + 0.25 * 0.002 * 10 = 0.0175 -> 0.02
        let due = date(2024, 1, 5);
        let today = date(2024, 2, 14);
        let result = engine().assess(Money::from_minor(25), due, today);

        assert_eq!(result.raw_fee, dec!(0.0175));
        assert_eq!(result.fee, Money::from_minor(2));
    }

    #[test]
    fn test_huge_amount_saturates_at_cap() {
        let policy = LateFeePolicy::new(Rate::ONE, Rate::ONE, Rate::ONE);
        let engine = LateFeeEngine::new(policy);
        let amount = Money::from_decimal(Decimal::MAX);
        let due = date(2024, 1, 10);
        let today = date(2024, 3, 25);

        let result = engine.assess(amount, due, today);
        assert_eq!(result.months_late, 2);
        assert_eq!(result.remaining_days, 15);
        assert_eq!(result.monthly_component, Decimal::MAX);
        assert_eq!(result.raw_fee, Decimal::MAX);
        assert!(result.capped);
        assert_eq!(result.fee, amount);
    }

    #[test]
    fn test_custom_policy() {
        let policy = LateFeePolicy::new(
            Rate::from_percentage(10),
            Rate::ZERO,
            Rate::from_percentage(15),
        );
        let engine = LateFeeEngine::new(policy);
        let due = date(2024, 1, 10);
        let today = date(2024, 3, 10);

        let result = engine.assess(Money::from_major(200), due, today);
        assert_eq!(result.months_late, 2);
        assert_eq!(result.fee, Money::from_major(30));
        assert!(result.capped);
    }
}
