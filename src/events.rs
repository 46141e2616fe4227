use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{PaymentId, PaymentMethod, PaymentStatus, TenantId};

/// audit events emitted by ledger mutations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    PaymentCreated {
        payment_id: PaymentId,
        tenant_id: TenantId,
        amount: Money,
        due_date: NaiveDate,
        actor: String,
        timestamp: DateTime<Utc>,
    },
    PaymentUpdated {
        payment_id: PaymentId,
        actor: String,
        timestamp: DateTime<Utc>,
    },
    StatusChanged {
        payment_id: PaymentId,
        old_status: PaymentStatus,
        new_status: PaymentStatus,
        actor: String,
        timestamp: DateTime<Utc>,
    },
    ReceiptRecorded {
        payment_id: PaymentId,
        previous_status: PaymentStatus,
        method: PaymentMethod,
        receipt_url: String,
        actor: String,
        timestamp: DateTime<Utc>,
    },
    LateFeeAssessed {
        payment_id: PaymentId,
        fee_amount: Money,
        total_amount: Money,
        months_late: u32,
        remaining_days: u32,
        capped: bool,
        timestamp: DateTime<Utc>,
    },
    PaymentDeleted {
        payment_id: PaymentId,
        actor: String,
        timestamp: DateTime<Utc>,
    },
}

impl LedgerEvent {
    pub fn payment_id(&self) -> &str {
        match self {
            LedgerEvent::PaymentCreated { payment_id, .. }
            | LedgerEvent::PaymentUpdated { payment_id, .. }
            | LedgerEvent::StatusChanged { payment_id, .. }
            | LedgerEvent::ReceiptRecorded { payment_id, .. }
            | LedgerEvent::LateFeeAssessed { payment_id, .. }
            | LedgerEvent::PaymentDeleted { payment_id, .. } => payment_id,
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<LedgerEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
