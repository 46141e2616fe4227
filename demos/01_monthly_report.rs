/// monthly report - seed a year of dues and print the period roll-ups
use chrono::{NaiveDate, TimeZone, Utc};
use site_payment_ledger::{
    InMemoryPaymentStore, LedgerConfig, Money, NewPayment, PaymentLedger, PaymentStatus,
    SafeTimeProvider, TenantContext, TimeSource,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap()
    ));
    let ledger = PaymentLedger::new(InMemoryPaymentStore::new(), &time, LedgerConfig::default())?;
    let ctx = TenantContext::system("sunrise-gardens");

    // three apartments, twelve months; every fifth payment is still open
    for month in 1..=12 {
        for (index, apartment) in ["1", "2", "3"].iter().enumerate() {
            let due = NaiveDate::from_ymd_opt(2024, month, 5).ok_or("bad date")?;
            let status = match (month as usize + index) % 5 {
                0 => PaymentStatus::Pending,
                1 => PaymentStatus::Overdue,
                _ => PaymentStatus::Paid,
            };
            let request = NewPayment::new(Money::from_major(750), due)
                .apartment("A", *apartment)
                .status(status);
            ledger.create_payment(&ctx, request)?;
        }
    }

    let yearly = ledger.get_yearly_payment_summary(&ctx, 2024)?;
    println!("=== 2024 ===");
    for month in &yearly.monthly_breakdown {
        println!(
            "{:<10} dues {:>9}  paid {:>9}  rate {:>6}%",
            month.month_name, month.totals.total_dues, month.totals.total_paid, month.collection_rate
        );
    }
    println!(
        "year       dues {:>9}  paid {:>9}  rate {:>6}%  avg {}",
        yearly.totals.total_dues, yearly.totals.total_paid, yearly.collection_rate, yearly.average_payment
    );

    let overdue = ledger.get_overdue_payments(&ctx)?;
    println!("\npending past due: {}", overdue.len());

    let stats = ledger.get_payment_statistics(&ctx)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
