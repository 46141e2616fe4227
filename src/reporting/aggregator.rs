use tracing::debug;

use crate::errors::{LedgerError, Result};
use crate::reporting::summary::{MonthlySummary, PaymentStatistics, PeriodTotals, YearlySummary};
use crate::store::{PageRequest, PaymentFilter, PaymentStore};
use crate::types::DueMonth;

/// folds stored payments into period summaries, reading in bounded pages
pub struct PeriodAggregator<'a, S: PaymentStore + ?Sized> {
    store: &'a S,
    batch_size: usize,
}

impl<'a, S: PaymentStore + ?Sized> PeriodAggregator<'a, S> {
    pub fn new(store: &'a S, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// fold every payment of a tenant matching `filter`
    pub fn fold(&self, tenant_id: &str, filter: &PaymentFilter) -> Result<PeriodTotals> {
        let mut totals = PeriodTotals::default();
        let mut request = PageRequest::first(self.batch_size);

        loop {
            let page = self.store.query(tenant_id, filter, request)?;
            for payment in &page.items {
                totals.record(payment);
            }
            if page.items.len() < self.batch_size || page.is_last() {
                break;
            }
            request = request.next();
        }

        Ok(totals)
    }

    pub fn monthly_summary(&self, tenant_id: &str, year: i32, month: u32) -> Result<MonthlySummary> {
        let due_month = DueMonth::new(year, month)?;
        let totals = self.fold(tenant_id, &PaymentFilter::by_due_month(due_month))?;

        debug!(
            tenant_id,
            due_month = %due_month,
            payments = totals.total_payments,
            "Monthly summary computed"
        );
        Ok(MonthlySummary::new(due_month, totals))
    }

    /// twelve monthly folds in month order, then summed
    pub fn yearly_summary(&self, tenant_id: &str, year: i32) -> Result<YearlySummary> {
        let months = (1..=12)
            .map(|month| self.monthly_summary(tenant_id, year, month))
            .collect::<Result<Vec<_>>>()?;

        let summary = YearlySummary::from_months(year, months);
        debug!(
            tenant_id,
            year,
            payments = summary.totals.total_payments,
            collection_rate = %summary.collection_rate,
            "Yearly summary computed"
        );
        Ok(summary)
    }

    /// site-wide figures, not scoped to a period
    pub fn statistics(&self, tenant_id: &str) -> Result<PaymentStatistics> {
        if tenant_id.trim().is_empty() {
            return Err(LedgerError::invalid("tenant id is required"));
        }
        let totals = self.fold(tenant_id, &PaymentFilter::all())?;
        debug!(tenant_id, payments = totals.total_payments, "Payment statistics computed");
        Ok(totals.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::errors::StoreError;
    use crate::payment::{NewPayment, Payment};
    use crate::store::InMemoryPaymentStore;
    use crate::types::PaymentStatus;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn seed(store: &InMemoryPaymentStore, tenant: &str, due: (i32, u32, u32), amount: i64, status: PaymentStatus) {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let due = NaiveDate::from_ymd_opt(due.0, due.1, due.2).unwrap();
        let request = NewPayment::new(Money::from_major(amount), due).status(status);
        store.insert(Payment::create(tenant, request, now).unwrap()).unwrap();
    }

    #[test]
    fn test_fold_spans_pages() {
        let store = InMemoryPaymentStore::new();
        for day in 1..=7 {
            seed(&store, "site-a", (2024, 3, day), 100, PaymentStatus::Pending);
        }

        let aggregator = PeriodAggregator::new(&store, 3);
        let summary = aggregator.monthly_summary("site-a", 2024, 3).unwrap();

        assert_eq!(summary.totals.total_payments, 7);
        assert_eq!(summary.totals.total_dues, Money::from_major(700));
        assert_eq!(summary.month_name, "March");
    }

    #[test]
    fn test_monthly_scopes_by_tenant_and_month() {
        let store = InMemoryPaymentStore::new();
        seed(&store, "site-a", (2024, 3, 1), 100, PaymentStatus::Paid);
        seed(&store, "site-a", (2024, 4, 1), 900, PaymentStatus::Paid);
        seed(&store, "site-b", (2024, 3, 1), 500, PaymentStatus::Paid);

        let aggregator = PeriodAggregator::new(&store, 100);
        let summary = aggregator.monthly_summary("site-a", 2024, 3).unwrap();

        assert_eq!(summary.totals.total_dues, Money::from_major(100));
        assert_eq!(summary.collection_rate, dec!(100));
    }

    #[test]
    fn test_yearly_equals_sum_of_months() {
        let store = InMemoryPaymentStore::new();
        seed(&store, "site-a", (2024, 1, 5), 100, PaymentStatus::Paid);
        seed(&store, "site-a", (2024, 6, 5), 250, PaymentStatus::Pending);
        seed(&store, "site-a", (2024, 12, 31), 400, PaymentStatus::Overdue);
        seed(&store, "site-a", (2023, 12, 31), 999, PaymentStatus::Paid);

        let aggregator = PeriodAggregator::new(&store, 2);
        let yearly = aggregator.yearly_summary("site-a", 2024).unwrap();

        assert_eq!(yearly.monthly_breakdown.len(), 12);
        let months: Vec<u32> = yearly.monthly_breakdown.iter().map(|m| m.month).collect();
        assert_eq!(months, (1..=12).collect::<Vec<_>>());

        let summed: Money = yearly.monthly_breakdown.iter().map(|m| m.totals.total_dues).sum();
        assert_eq!(yearly.totals.total_dues, summed);
        assert_eq!(yearly.totals.total_dues, Money::from_major(750));
        assert_eq!(yearly.totals.total_overdue, Money::from_major(400));
        assert_eq!(yearly.average_payment, Money::from_major(250));
    }

    #[test]
    fn test_empty_month() {
        let store = InMemoryPaymentStore::new();
        let aggregator = PeriodAggregator::new(&store, 10);
        let summary = aggregator.monthly_summary("site-a", 2024, 2).unwrap();

        assert_eq!(summary.totals, PeriodTotals::default());
        assert_eq!(summary.collection_rate, Decimal::ZERO);
        assert_eq!(summary.average_payment, Money::ZERO);
    }

    #[test]
    fn test_invalid_month_rejected() {
        let store = InMemoryPaymentStore::new();
        let aggregator = PeriodAggregator::new(&store, 10);
        assert!(matches!(
            aggregator.monthly_summary("site-a", 2024, 13),
            Err(LedgerError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_store_failure_propagates() {
        let store = InMemoryPaymentStore::new();
        store.set_fail_reads(true);
        let aggregator = PeriodAggregator::new(&store, 10);

        let err = aggregator.statistics("site-a").unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Infrastructure(StoreError::Unavailable { .. })
        ));
    }

    #[test]
    fn test_statistics_across_periods() {
        let store = InMemoryPaymentStore::new();
        seed(&store, "site-a", (2023, 5, 1), 100, PaymentStatus::Paid);
        seed(&store, "site-a", (2024, 5, 1), 300, PaymentStatus::Pending);
        seed(&store, "site-a", (2024, 6, 1), 100, PaymentStatus::Cancelled);

        let stats = PeriodAggregator::new(&store, 10).statistics("site-a").unwrap();

        assert_eq!(stats.totals.total_payments, 3);
        assert_eq!(stats.totals.paid_payments, 1);
        assert_eq!(stats.totals.pending_payments, 1);
        assert_eq!(stats.collection_rate, dec!(20));
    }
}
