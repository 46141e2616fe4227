use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

use crate::decimal::Money;
use crate::payment::Payment;
use crate::types::{DueMonth, PaymentStatus};

/// digits the paid/dues quotient keeps before scaling to a percentage
const COLLECTION_RATE_SCALE: u32 = 4;

/// per-status sums and counts over a set of payments
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    /// base amount of every payment, whatever its status
    pub total_dues: Money,
    pub total_paid: Money,
    pub total_pending: Money,
    /// includes accrued late fees, unlike paid and pending
    pub total_overdue: Money,
    pub total_late_fees: Money,
    /// cancelled payments count here but in no status bucket
    pub total_payments: u64,
    pub paid_payments: u64,
    pub pending_payments: u64,
    pub overdue_payments: u64,
}

impl PeriodTotals {
    pub fn record(&mut self, payment: &Payment) {
        self.total_dues += payment.amount;
        self.total_late_fees += payment.late_fee;
        self.total_payments += 1;

        match payment.status {
            PaymentStatus::Paid => {
                self.total_paid += payment.amount;
                self.paid_payments += 1;
            }
            PaymentStatus::Pending => {
                self.total_pending += payment.amount;
                self.pending_payments += 1;
            }
            PaymentStatus::Overdue => {
                self.total_overdue += payment.total_amount;
                self.overdue_payments += 1;
            }
            PaymentStatus::Cancelled => {}
        }
    }

    /// paid share of dues as a percentage; zero when nothing is due
    pub fn collection_rate(&self) -> Decimal {
        self.total_paid
            .ratio(self.total_dues, COLLECTION_RATE_SCALE)
            .map(|quotient| quotient * dec!(100))
            .unwrap_or(Decimal::ZERO)
    }

    /// mean base amount per payment; zero for an empty period
    pub fn average_payment(&self) -> Money {
        self.total_dues
            .average_over(self.total_payments)
            .unwrap_or(Money::ZERO)
    }
}

impl AddAssign for PeriodTotals {
    fn add_assign(&mut self, other: PeriodTotals) {
        self.total_dues += other.total_dues;
        self.total_paid += other.total_paid;
        self.total_pending += other.total_pending;
        self.total_overdue += other.total_overdue;
        self.total_late_fees += other.total_late_fees;
        self.total_payments += other.total_payments;
        self.paid_payments += other.paid_payments;
        self.pending_payments += other.pending_payments;
        self.overdue_payments += other.overdue_payments;
    }
}

impl<'a> FromIterator<&'a Payment> for PeriodTotals {
    fn from_iter<I: IntoIterator<Item = &'a Payment>>(iter: I) -> Self {
        let mut totals = PeriodTotals::default();
        for payment in iter {
            totals.record(payment);
        }
        totals
    }
}

/// one due month's roll-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    #[serde(flatten)]
    pub totals: PeriodTotals,
    pub collection_rate: Decimal,
    pub average_payment: Money,
}

impl MonthlySummary {
    pub fn new(due_month: DueMonth, totals: PeriodTotals) -> Self {
        Self {
            year: due_month.year(),
            month: due_month.month(),
            month_name: due_month.month_name().to_string(),
            totals,
            collection_rate: totals.collection_rate(),
            average_payment: totals.average_payment(),
        }
    }
}

/// a calendar year's roll-up with its twelve months in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlySummary {
    pub year: i32,
    #[serde(flatten)]
    pub totals: PeriodTotals,
    /// recomputed from the year's totals, not averaged over months
    pub collection_rate: Decimal,
    pub average_payment: Money,
    pub monthly_breakdown: Vec<MonthlySummary>,
}

impl YearlySummary {
    pub fn from_months(year: i32, monthly_breakdown: Vec<MonthlySummary>) -> Self {
        let mut totals = PeriodTotals::default();
        for month in &monthly_breakdown {
            totals += month.totals;
        }

        Self {
            year,
            totals,
            collection_rate: totals.collection_rate(),
            average_payment: totals.average_payment(),
            monthly_breakdown,
        }
    }
}

/// site-wide figures across every period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatistics {
    #[serde(flatten)]
    pub totals: PeriodTotals,
    pub collection_rate: Decimal,
    pub average_payment: Money,
}

impl From<PeriodTotals> for PaymentStatistics {
    fn from(totals: PeriodTotals) -> Self {
        Self {
            totals,
            collection_rate: totals.collection_rate(),
            average_payment: totals.average_payment(),
        }
    }
}
