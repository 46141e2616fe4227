/// quick start - create a dues payment, let it fall late, then settle it
use chrono::{Duration, TimeZone, Utc};
use site_payment_ledger::{
    InMemoryPaymentStore, LedgerConfig, Money, NewPayment, PaymentLedger, PaymentMethod,
    PaymentReceipt, PaymentType, SafeTimeProvider, TenantContext, TimeSource,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let ledger = PaymentLedger::new(InMemoryPaymentStore::new(), &time, LedgerConfig::default())?;
    let ctx = TenantContext::system("sunrise-gardens");

    // january dues for apartment 12 in building B
    let request = NewPayment::new(Money::from_major(1_000), time.now().date_naive())
        .obligor("resident-42")
        .apartment("B", "12")
        .payment_type(PaymentType::Dues);
    let payment = ledger.create_payment(&ctx, request)?;
    println!("created {} due {}", payment.id, payment.due_date);

    // forty days later the fee is one month plus ten days
    controller.advance(Duration::days(40));
    let fee = ledger.calculate_late_fee(&ctx, &payment.id)?;
    println!("late fee after 40 days: {}", fee);

    let receipt = PaymentReceipt::new("https://files.example/receipts/42-01.pdf", PaymentMethod::BankTransfer)
        .with_reference("TRX-2024-0042");
    let paid = ledger.record_payment_receipt(&ctx, &payment.id, receipt)?;

    println!("{}", serde_json::to_string_pretty(&paid)?);
    Ok(())
}
