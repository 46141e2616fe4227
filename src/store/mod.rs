//! Persistence seam for payment records.
//!
//! The ledger only talks to [`PaymentStore`]; a document database driver
//! lives behind it in production and [`InMemoryPaymentStore`] in tests.

pub mod memory;

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::StoreResult;
use crate::payment::Payment;
use crate::types::{DueMonth, PaymentMethod, PaymentStatus, PaymentType};

pub use memory::InMemoryPaymentStore;

/// storage operations the ledger relies on. every call is scoped by tenant.
pub trait PaymentStore: Send + Sync {
    /// persist a new record; the store assigns version 1
    fn insert(&self, payment: Payment) -> StoreResult<Payment>;

    fn get(&self, tenant_id: &str, id: &str) -> StoreResult<Option<Payment>>;

    /// replace a record if its stored version equals `payment.version`.
    /// returns the stored copy with the bumped version.
    fn update(&self, payment: Payment) -> StoreResult<Payment>;

    /// hard delete; false when nothing matched
    fn delete(&self, tenant_id: &str, id: &str) -> StoreResult<bool>;

    /// filtered page ordered by (due date, created at, id)
    fn query(&self, tenant_id: &str, filter: &PaymentFilter, page: PageRequest) -> StoreResult<Page<Payment>>;

    fn count(&self, tenant_id: &str, filter: &PaymentFilter) -> StoreResult<u64>;
}

impl<T: PaymentStore + ?Sized> PaymentStore for Arc<T> {
    fn insert(&self, payment: Payment) -> StoreResult<Payment> {
        (**self).insert(payment)
    }

    fn get(&self, tenant_id: &str, id: &str) -> StoreResult<Option<Payment>> {
        (**self).get(tenant_id, id)
    }

    fn update(&self, payment: Payment) -> StoreResult<Payment> {
        (**self).update(payment)
    }

    fn delete(&self, tenant_id: &str, id: &str) -> StoreResult<bool> {
        (**self).delete(tenant_id, id)
    }

    fn query(&self, tenant_id: &str, filter: &PaymentFilter, page: PageRequest) -> StoreResult<Page<Payment>> {
        (**self).query(tenant_id, filter, page)
    }

    fn count(&self, tenant_id: &str, filter: &PaymentFilter) -> StoreResult<u64> {
        (**self).count(tenant_id, filter)
    }
}

/// conjunctive payment filter; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentFilter {
    pub obligor_id: Option<String>,
    pub apartment_number: Option<String>,
    pub building_number: Option<String>,
    pub due_month: Option<DueMonth>,
    pub due_year: Option<i32>,
    pub status: Option<PaymentStatus>,
    pub payment_type: Option<PaymentType>,
    pub payment_method: Option<PaymentMethod>,
    pub min_amount: Option<Money>,
    pub max_amount: Option<Money>,
    /// inclusive
    pub due_from: Option<NaiveDate>,
    /// inclusive
    pub due_to: Option<NaiveDate>,
    /// exclusive
    pub due_before: Option<NaiveDate>,
    pub with_late_fee: bool,
}

impl PaymentFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_obligor(obligor_id: impl Into<String>) -> Self {
        Self {
            obligor_id: Some(obligor_id.into()),
            ..Self::default()
        }
    }

    pub fn by_apartment(apartment_number: impl Into<String>) -> Self {
        Self {
            apartment_number: Some(apartment_number.into()),
            ..Self::default()
        }
    }

    pub fn by_building(building_number: impl Into<String>) -> Self {
        Self {
            building_number: Some(building_number.into()),
            ..Self::default()
        }
    }

    pub fn by_due_month(due_month: DueMonth) -> Self {
        Self {
            due_month: Some(due_month),
            ..Self::default()
        }
    }

    /// pending and past due as of `today`
    pub fn overdue_as_of(today: NaiveDate) -> Self {
        Self {
            status: Some(PaymentStatus::Pending),
            due_before: Some(today),
            ..Self::default()
        }
    }

    pub fn with_late_fees() -> Self {
        Self {
            with_late_fee: true,
            ..Self::default()
        }
    }

    pub fn matches(&self, payment: &Payment) -> bool {
        fn eq<T: PartialEq>(want: &Option<T>, have: &T) -> bool {
            want.as_ref().map_or(true, |w| w == have)
        }
        fn eq_opt<T: PartialEq>(want: &Option<T>, have: &Option<T>) -> bool {
            want.as_ref().map_or(true, |w| have.as_ref() == Some(w))
        }

        eq_opt(&self.obligor_id, &payment.obligor_id)
            && eq_opt(&self.apartment_number, &payment.apartment_number)
            && eq_opt(&self.building_number, &payment.building_number)
            && eq(&self.due_month, &payment.due_month())
            && eq(&self.due_year, &payment.due_year())
            && eq(&self.status, &payment.status)
            && eq_opt(&self.payment_type, &payment.payment_type)
            && eq_opt(&self.payment_method, &payment.payment_method)
            && self.min_amount.map_or(true, |min| payment.amount >= min)
            && self.max_amount.map_or(true, |max| payment.amount <= max)
            && self.due_from.map_or(true, |from| payment.due_date >= from)
            && self.due_to.map_or(true, |to| payment.due_date <= to)
            && self.due_before.map_or(true, |before| payment.due_date < before)
            && (!self.with_late_fee || payment.late_fee.is_positive())
    }
}

/// zero-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn new(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    pub fn first(size: usize) -> Self {
        Self { page: 0, size }
    }

    pub fn next(&self) -> Self {
        Self {
            page: self.page + 1,
            size: self.size,
        }
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: 20 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub size: usize,
    /// matches across all pages
    pub total: u64,
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        (self.page.saturating_add(1)).saturating_mul(self.size) as u64 >= self.total
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total.div_ceil(self.size as u64)
    }
}
