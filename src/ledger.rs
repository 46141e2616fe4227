use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::LedgerConfig;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result, StoreError};
use crate::events::{EventStore, LedgerEvent};
use crate::fees::{LateFeeAssessment, LateFeeEngine};
use crate::payment::{NewPayment, Payment, PaymentPatch, PaymentReceipt};
use crate::reporting::{MonthlySummary, PaymentStatistics, PeriodAggregator, YearlySummary};
use crate::store::{Page, PageRequest, PaymentFilter, PaymentStore};
use crate::types::{DueMonth, PaymentStatus, TenantContext};

/// outcome of a read-modify-write step
enum Mutation<T> {
    /// persist the modified record
    Write(T),
    /// leave the stored record untouched
    Skip(T),
}

/// the payment lifecycle manager; sole writer of payment records
pub struct PaymentLedger<S, C> {
    store: S,
    clock: C,
    config: LedgerConfig,
    events: Mutex<EventStore>,
}

impl<S: PaymentStore, C: Clock> PaymentLedger<S, C> {
    pub fn new(store: S, clock: C, config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            clock,
            config,
            events: Mutex::new(EventStore::new()),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// drain the audit events recorded so far
    pub fn take_events(&self) -> Vec<LedgerEvent> {
        self.event_log().take_events()
    }

    /// create a payment; status defaults to pending
    pub fn create_payment(&self, ctx: &TenantContext, request: NewPayment) -> Result<Payment> {
        let tenant = ctx.require_tenant()?;
        info!(
            tenant_id = tenant,
            obligor_id = request.obligor_id.as_deref().unwrap_or("-"),
            "Creating new payment"
        );

        let now = self.clock.now();
        let payment = Payment::create(tenant, request, now)?;
        let stored = self.store.insert(payment)?;

        self.emit(LedgerEvent::PaymentCreated {
            payment_id: stored.id.clone(),
            tenant_id: stored.tenant_id.clone(),
            amount: stored.amount,
            due_date: stored.due_date,
            actor: ctx.caller.user_id.clone(),
            timestamp: now,
        });
        info!(payment_id = %stored.id, due_month = %stored.due_month(), "Payment created");
        Ok(stored)
    }

    /// field-level update; the due month keys stay as created
    pub fn update_payment(&self, ctx: &TenantContext, id: &str, patch: PaymentPatch) -> Result<Payment> {
        info!(payment_id = id, "Updating payment");

        let ((), updated) = self.mutate(ctx, id, |payment, now| {
            if let Some(next) = patch.status {
                self.check_transition(payment.status, next)?;
            }
            payment.apply_patch(patch.clone(), now)?;
            Ok(Mutation::Write(()))
        })?;

        self.emit(LedgerEvent::PaymentUpdated {
            payment_id: updated.id.clone(),
            actor: ctx.caller.user_id.clone(),
            timestamp: updated.updated_at,
        });
        info!(payment_id = id, version = updated.version, "Payment updated");
        Ok(updated)
    }

    pub fn get_payment_by_id(&self, ctx: &TenantContext, id: &str) -> Result<Option<Payment>> {
        debug!(payment_id = id, "Getting payment by id");
        let tenant = ctx.require_tenant()?;
        Ok(self.store.get(tenant, id)?)
    }

    /// one page of the tenant's payments matching `filter`
    pub fn list_payments(
        &self,
        ctx: &TenantContext,
        filter: &PaymentFilter,
        page: PageRequest,
    ) -> Result<Page<Payment>> {
        let tenant = ctx.require_tenant()?;
        if page.size == 0 {
            return Err(LedgerError::invalid("page size must be positive"));
        }
        debug!(tenant_id = tenant, page = page.page, size = page.size, "Listing payments");
        Ok(self.store.query(tenant, filter, page)?)
    }

    pub fn get_payments_by_user(&self, ctx: &TenantContext, obligor_id: &str) -> Result<Vec<Payment>> {
        debug!(obligor_id, "Getting payments for user");
        self.collect(ctx, &PaymentFilter::by_obligor(obligor_id))
    }

    pub fn get_payments_by_apartment(&self, ctx: &TenantContext, apartment_number: &str) -> Result<Vec<Payment>> {
        debug!(apartment_number, "Getting payments for apartment");
        self.collect(ctx, &PaymentFilter::by_apartment(apartment_number))
    }

    pub fn get_payments_by_building(&self, ctx: &TenantContext, building_number: &str) -> Result<Vec<Payment>> {
        debug!(building_number, "Getting payments for building");
        self.collect(ctx, &PaymentFilter::by_building(building_number))
    }

    pub fn get_payments_by_due_month(&self, ctx: &TenantContext, due_month: DueMonth) -> Result<Vec<Payment>> {
        debug!(due_month = %due_month, "Getting payments for month");
        self.collect(ctx, &PaymentFilter::by_due_month(due_month))
    }

    /// pending payments whose due date has passed; computed, never persisted
    pub fn get_overdue_payments(&self, ctx: &TenantContext) -> Result<Vec<Payment>> {
        let today = self.clock.today();
        debug!(%today, "Getting overdue payments");
        self.collect(ctx, &PaymentFilter::overdue_as_of(today))
    }

    pub fn get_payments_with_late_fees(&self, ctx: &TenantContext) -> Result<Vec<Payment>> {
        debug!("Getting payments with late fees");
        self.collect(ctx, &PaymentFilter::with_late_fees())
    }

    /// Set the status. Moving to paid stamps the payment date if unset.
    ///
    /// Any transition is accepted unless `enforce_status_transitions` is on.
    pub fn update_payment_status(
        &self,
        ctx: &TenantContext,
        id: &str,
        status: PaymentStatus,
    ) -> Result<Payment> {
        info!(payment_id = id, status = ?status, "Updating payment status");

        let (old_status, updated) = self.mutate(ctx, id, |payment, now| {
            let old_status = payment.status;
            self.check_transition(old_status, status)?;
            payment.set_status(status, now);
            Ok(Mutation::Write(old_status))
        })?;

        self.emit(LedgerEvent::StatusChanged {
            payment_id: updated.id.clone(),
            old_status,
            new_status: status,
            actor: ctx.caller.user_id.clone(),
            timestamp: updated.updated_at,
        });
        info!(payment_id = id, from = ?old_status, to = ?status, "Payment status updated");
        Ok(updated)
    }

    /// mark paid with a receipt, whatever the current status; late fees stay
    pub fn record_payment_receipt(
        &self,
        ctx: &TenantContext,
        id: &str,
        receipt: PaymentReceipt,
    ) -> Result<Payment> {
        info!(payment_id = id, method = ?receipt.payment_method, "Recording payment receipt");

        let (previous_status, updated) = self.mutate(ctx, id, |payment, now| {
            let previous = payment.status;
            payment.record_receipt(receipt.clone(), now);
            Ok(Mutation::Write(previous))
        })?;

        self.emit(LedgerEvent::ReceiptRecorded {
            payment_id: updated.id.clone(),
            previous_status,
            method: receipt.payment_method,
            receipt_url: receipt.receipt_url,
            actor: ctx.caller.user_id.clone(),
            timestamp: updated.updated_at,
        });
        info!(payment_id = id, "Payment receipt recorded");
        Ok(updated)
    }

    /// Late fee owed as of now, written back onto the payment.
    ///
    /// Paid payments, payments not yet past due and payments less than one
    /// full calendar month late return zero and are left untouched.
    pub fn calculate_late_fee(&self, ctx: &TenantContext, id: &str) -> Result<Money> {
        debug!(payment_id = id, "Calculating late fee");
        let engine = LateFeeEngine::new(self.config.policy_for(&ctx.tenant_id));

        let (assessment, updated) = self.mutate(ctx, id, |payment, now| {
            if payment.status == PaymentStatus::Paid {
                return Ok(Mutation::Skip(None));
            }
            let assessment = engine.assess(payment.amount, payment.due_date, now.date_naive());
            if !assessment.is_chargeable() {
                return Ok(Mutation::Skip(None));
            }
            payment.set_late_fee(assessment.fee, now);
            Ok(Mutation::Write(Some(assessment)))
        })?;

        let Some(assessment) = assessment else {
            return Ok(Money::ZERO);
        };

        self.emit(LedgerEvent::LateFeeAssessed {
            payment_id: updated.id.clone(),
            fee_amount: assessment.fee,
            total_amount: updated.total_amount,
            months_late: assessment.months_late,
            remaining_days: assessment.remaining_days,
            capped: assessment.capped,
            timestamp: updated.updated_at,
        });
        info!(
            payment_id = id,
            fee = %assessment.fee,
            months_late = assessment.months_late,
            remaining_days = assessment.remaining_days,
            "Late fee calculated"
        );
        Ok(assessment.fee)
    }

    /// breakdown of the fee the payment would be charged now, without writing
    pub fn preview_late_fee(&self, ctx: &TenantContext, id: &str) -> Result<LateFeeAssessment> {
        let payment = self.require(ctx, id)?;
        let engine = LateFeeEngine::new(self.config.policy_for(&payment.tenant_id));
        Ok(engine.assess(payment.amount, payment.due_date, self.clock.today()))
    }

    /// hard delete
    pub fn delete_payment(&self, ctx: &TenantContext, id: &str) -> Result<()> {
        info!(payment_id = id, "Deleting payment");
        let tenant = ctx.require_tenant()?;

        if !self.store.delete(tenant, id)? {
            return Err(not_found(id));
        }

        self.emit(LedgerEvent::PaymentDeleted {
            payment_id: id.to_string(),
            actor: ctx.caller.user_id.clone(),
            timestamp: self.clock.now(),
        });
        info!(payment_id = id, "Payment deleted");
        Ok(())
    }

    pub fn get_monthly_payment_summary(&self, ctx: &TenantContext, year: i32, month: u32) -> Result<MonthlySummary> {
        let tenant = ctx.require_tenant()?;
        self.aggregator().monthly_summary(tenant, year, month)
    }

    pub fn get_yearly_payment_summary(&self, ctx: &TenantContext, year: i32) -> Result<YearlySummary> {
        let tenant = ctx.require_tenant()?;
        self.aggregator().yearly_summary(tenant, year)
    }

    pub fn get_payment_statistics(&self, ctx: &TenantContext) -> Result<PaymentStatistics> {
        let tenant = ctx.require_tenant()?;
        self.aggregator().statistics(tenant)
    }

    fn aggregator(&self) -> PeriodAggregator<'_, S> {
        PeriodAggregator::new(&self.store, self.config.aggregation_batch_size)
    }

    fn require(&self, ctx: &TenantContext, id: &str) -> Result<Payment> {
        let tenant = ctx.require_tenant()?;
        self.store.get(tenant, id)?.ok_or_else(|| not_found(id))
    }

    /// every match, read page by page
    fn collect(&self, ctx: &TenantContext, filter: &PaymentFilter) -> Result<Vec<Payment>> {
        let tenant = ctx.require_tenant()?;
        let mut request = PageRequest::first(self.config.aggregation_batch_size);
        let mut found = Vec::new();

        loop {
            let page = self.store.query(tenant, filter, request)?;
            let done = page.items.len() < request.size || page.is_last();
            found.extend(page.items);
            if done {
                return Ok(found);
            }
            request = request.next();
        }
    }

    fn check_transition(&self, from: PaymentStatus, to: PaymentStatus) -> Result<()> {
        if self.config.enforce_status_transitions && from != to && !from.can_transition_to(to) {
            warn!(from = ?from, to = ?to, "Rejected status transition");
            return Err(LedgerError::InvalidTransition { from, to });
        }
        Ok(())
    }

    /// Re-read, apply, and write back with a version check.
    ///
    /// On a version conflict the whole step is redone against a fresh read,
    /// up to `max_conflict_retries` times.
    fn mutate<T>(
        &self,
        ctx: &TenantContext,
        id: &str,
        mut apply: impl FnMut(&mut Payment, DateTime<Utc>) -> Result<Mutation<T>>,
    ) -> Result<(T, Payment)> {
        let max_attempts = self.config.max_conflict_retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let mut payment = self.require(ctx, id)?;
            let now = self.clock.now();

            let value = match apply(&mut payment, now)? {
                Mutation::Skip(value) => return Ok((value, payment)),
                Mutation::Write(value) => value,
            };

            match self.store.update(payment) {
                Ok(stored) => return Ok((value, stored)),
                Err(StoreError::VersionConflict { expected, actual, .. }) => {
                    if attempt >= max_attempts {
                        warn!(payment_id = id, attempts = attempt, "Giving up after repeated version conflicts");
                        return Err(LedgerError::Conflict {
                            id: id.to_string(),
                            attempts: attempt,
                        });
                    }
                    warn!(payment_id = id, expected, actual, attempt, "Version conflict, retrying");
                }
                Err(StoreError::Missing { .. }) => return Err(not_found(id)),
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn emit(&self, event: LedgerEvent) {
        self.event_log().emit(event);
    }

    fn event_log(&self) -> MutexGuard<'_, EventStore> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn not_found(id: &str) -> LedgerError {
    LedgerError::NotFound { id: id.to_string() }
}
