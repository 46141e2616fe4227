use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::{DueMonth, PaymentId, PaymentMethod, PaymentPlan, PaymentStatus, PaymentType, TenantId};

/// a single dues obligation of an apartment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    // identification
    pub id: PaymentId,
    pub tenant_id: TenantId,

    // obligor
    pub obligor_id: Option<String>,
    pub apartment_number: Option<String>,
    pub building_number: Option<String>,

    // due period; the derived keys are fixed at creation
    pub due_date: NaiveDate,
    due_month: DueMonth,
    due_year: i32,
    due_month_number: u32,

    // amounts
    pub amount: Money,
    pub late_fee: Money,
    pub total_amount: Money,
    pub discount_amount: Option<Money>,
    pub discount_reason: Option<String>,

    // classification
    pub description: Option<String>,
    pub payment_type: Option<PaymentType>,
    pub admin_notes: Option<String>,
    pub installment_number: Option<u32>,
    pub total_installments: Option<u32>,
    pub payment_plan: Option<PaymentPlan>,

    // status and settlement
    pub status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub payment_date: Option<DateTime<Utc>>,
    pub receipt_url: Option<String>,
    pub transaction_reference: Option<String>,

    // reminders, maintained by the reminder job
    pub payment_reminders_sent: u32,
    pub last_reminder_sent: Option<DateTime<Utc>>,

    // audit
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// optimistic concurrency stamp, owned by the store
    pub version: u64,
}

impl Payment {
    /// build a new pending payment from a creation request
    pub fn create(tenant_id: &str, request: NewPayment, now: DateTime<Utc>) -> Result<Self> {
        if tenant_id.trim().is_empty() {
            return Err(LedgerError::invalid("tenant id is required"));
        }
        let amount = request
            .amount
            .ok_or_else(|| LedgerError::invalid("amount is required"))?;
        if !amount.is_positive() {
            return Err(LedgerError::invalid(format!("amount must be greater than 0, got {amount}")));
        }
        let due_date = request
            .due_date
            .ok_or_else(|| LedgerError::invalid("due date is required"))?;

        let due_month = request.due_month.unwrap_or_else(|| DueMonth::from_date(due_date));
        let status = request.status.unwrap_or(PaymentStatus::Pending);

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            obligor_id: request.obligor_id,
            apartment_number: request.apartment_number,
            building_number: request.building_number,
            due_date,
            due_month,
            due_year: due_month.year(),
            due_month_number: due_month.month(),
            amount,
            late_fee: Money::ZERO,
            total_amount: amount,
            discount_amount: request.discount_amount,
            discount_reason: request.discount_reason,
            description: request.description,
            payment_type: request.payment_type,
            admin_notes: request.admin_notes,
            installment_number: request.installment_number,
            total_installments: request.total_installments,
            payment_plan: request.payment_plan,
            status,
            payment_method: None,
            payment_date: (status == PaymentStatus::Paid).then_some(now),
            receipt_url: None,
            transaction_reference: None,
            payment_reminders_sent: 0,
            last_reminder_sent: None,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    pub fn due_month(&self) -> DueMonth {
        self.due_month
    }

    pub fn due_year(&self) -> i32 {
        self.due_year
    }

    pub fn due_month_number(&self) -> u32 {
        self.due_month_number
    }

    /// write a late fee and keep the total in step
    pub fn set_late_fee(&mut self, fee: Money, now: DateTime<Utc>) {
        self.late_fee = fee;
        self.total_amount = self.amount + fee;
        self.updated_at = now;
    }

    /// move to `status`; a first move to paid stamps the payment date
    pub fn set_status(&mut self, status: PaymentStatus, now: DateTime<Utc>) {
        self.status = status;
        self.stamp_payment_date(now);
        self.updated_at = now;
    }

    /// a paid payment always carries a payment date
    fn stamp_payment_date(&mut self, now: DateTime<Utc>) {
        if self.status == PaymentStatus::Paid && self.payment_date.is_none() {
            self.payment_date = Some(now);
        }
    }

    /// mark as paid with evidence, regardless of prior status
    pub fn record_receipt(&mut self, receipt: PaymentReceipt, now: DateTime<Utc>) {
        self.receipt_url = Some(receipt.receipt_url);
        self.payment_method = Some(receipt.payment_method);
        if receipt.transaction_reference.is_some() {
            self.transaction_reference = receipt.transaction_reference;
        }
        self.payment_date = Some(now);
        self.status = PaymentStatus::Paid;
        self.updated_at = now;
    }

    /// apply a field-level patch; due month keys are never re-derived
    pub fn apply_patch(&mut self, patch: PaymentPatch, now: DateTime<Utc>) -> Result<()> {
        if let Some(amount) = patch.amount {
            if !amount.is_positive() {
                return Err(LedgerError::invalid(format!("amount must be greater than 0, got {amount}")));
            }
        }
        if let Some(fee) = patch.late_fee {
            if fee.is_negative() {
                return Err(LedgerError::invalid(format!("late fee must not be negative, got {fee}")));
            }
        }

        if patch.obligor_id.is_some() {
            self.obligor_id = patch.obligor_id;
        }
        if patch.apartment_number.is_some() {
            self.apartment_number = patch.apartment_number;
        }
        if patch.building_number.is_some() {
            self.building_number = patch.building_number;
        }
        if patch.discount_amount.is_some() {
            self.discount_amount = patch.discount_amount;
        }
        if patch.discount_reason.is_some() {
            self.discount_reason = patch.discount_reason;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if patch.payment_type.is_some() {
            self.payment_type = patch.payment_type;
        }
        if patch.admin_notes.is_some() {
            self.admin_notes = patch.admin_notes;
        }
        if patch.installment_number.is_some() {
            self.installment_number = patch.installment_number;
        }
        if patch.total_installments.is_some() {
            self.total_installments = patch.total_installments;
        }
        if patch.payment_plan.is_some() {
            self.payment_plan = patch.payment_plan;
        }
        if patch.payment_method.is_some() {
            self.payment_method = patch.payment_method;
        }
        if patch.payment_date.is_some() {
            self.payment_date = patch.payment_date;
        }
        if patch.receipt_url.is_some() {
            self.receipt_url = patch.receipt_url;
        }
        if patch.transaction_reference.is_some() {
            self.transaction_reference = patch.transaction_reference;
        }
        if patch.last_reminder_sent.is_some() {
            self.last_reminder_sent = patch.last_reminder_sent;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(sent) = patch.payment_reminders_sent {
            self.payment_reminders_sent = sent;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(fee) = patch.late_fee {
            self.late_fee = fee;
        }
        self.stamp_payment_date(now);
        self.total_amount = self.amount + self.late_fee;
        self.updated_at = now;
        Ok(())
    }
}

/// request to create a payment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPayment {
    pub obligor_id: Option<String>,
    pub apartment_number: Option<String>,
    pub building_number: Option<String>,
    pub due_date: Option<NaiveDate>,
    /// overrides the month derived from `due_date`
    pub due_month: Option<DueMonth>,
    pub amount: Option<Money>,
    pub status: Option<PaymentStatus>,
    pub description: Option<String>,
    pub payment_type: Option<PaymentType>,
    pub admin_notes: Option<String>,
    pub installment_number: Option<u32>,
    pub total_installments: Option<u32>,
    pub payment_plan: Option<PaymentPlan>,
    pub discount_amount: Option<Money>,
    pub discount_reason: Option<String>,
}

impl NewPayment {
    pub fn new(amount: Money, due_date: NaiveDate) -> Self {
        Self {
            amount: Some(amount),
            due_date: Some(due_date),
            ..Default::default()
        }
    }

    pub fn obligor(mut self, obligor_id: impl Into<String>) -> Self {
        self.obligor_id = Some(obligor_id.into());
        self
    }

    pub fn apartment(mut self, building: impl Into<String>, apartment: impl Into<String>) -> Self {
        self.building_number = Some(building.into());
        self.apartment_number = Some(apartment.into());
        self
    }

    pub fn status(mut self, status: PaymentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn payment_type(mut self, payment_type: PaymentType) -> Self {
        self.payment_type = Some(payment_type);
        self
    }
}

/// field-level update; `None` leaves a field untouched.
/// there are no due month fields here: they are frozen at creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentPatch {
    pub obligor_id: Option<String>,
    pub apartment_number: Option<String>,
    pub building_number: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub amount: Option<Money>,
    pub late_fee: Option<Money>,
    pub discount_amount: Option<Money>,
    pub discount_reason: Option<String>,
    pub description: Option<String>,
    pub payment_type: Option<PaymentType>,
    pub admin_notes: Option<String>,
    pub installment_number: Option<u32>,
    pub total_installments: Option<u32>,
    pub payment_plan: Option<PaymentPlan>,
    pub status: Option<PaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_date: Option<DateTime<Utc>>,
    pub receipt_url: Option<String>,
    pub transaction_reference: Option<String>,
    pub payment_reminders_sent: Option<u32>,
    pub last_reminder_sent: Option<DateTime<Utc>>,
}

/// evidence of settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub receipt_url: String,
    pub payment_method: PaymentMethod,
    pub transaction_reference: Option<String>,
}

impl PaymentReceipt {
    pub fn new(receipt_url: impl Into<String>, payment_method: PaymentMethod) -> Self {
        Self {
            receipt_url: receipt_url.into(),
            payment_method,
            transaction_reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.transaction_reference = Some(reference.into());
        self
    }
}
