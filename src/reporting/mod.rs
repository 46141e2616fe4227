pub mod aggregator;
pub mod summary;

pub use aggregator::PeriodAggregator;
pub use summary::{MonthlySummary, PaymentStatistics, PeriodTotals, YearlySummary};
