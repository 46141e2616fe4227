pub mod clock;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod fees;
pub mod ledger;
pub mod payment;
pub mod reporting;
pub mod store;
pub mod types;

// re-export key types
pub use clock::Clock;
pub use config::{LateFeePolicy, LedgerConfig};
pub use decimal::{Money, Rate};
pub use errors::{ErrorKind, LedgerError, Result, StoreError, StoreResult};
pub use events::{EventStore, LedgerEvent};
pub use fees::{LateFeeAssessment, LateFeeEngine};
pub use ledger::PaymentLedger;
pub use payment::{NewPayment, Payment, PaymentPatch, PaymentReceipt};
pub use reporting::{MonthlySummary, PaymentStatistics, PeriodAggregator, PeriodTotals, YearlySummary};
pub use store::{InMemoryPaymentStore, Page, PageRequest, PaymentFilter, PaymentStore};
pub use types::{
    CallerIdentity, CallerRole, DueMonth, PaymentId, PaymentMethod, PaymentPlan, PaymentStatus,
    PaymentType, TenantContext, TenantId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
