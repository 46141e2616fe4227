//! In-memory payment store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::errors::{StoreError, StoreResult};
use crate::payment::Payment;
use crate::store::{Page, PageRequest, PaymentFilter, PaymentStore};
use crate::types::PaymentId;

/// Payment store backed by a hash map.
///
/// Enforces the same version check a document store would do with a
/// conditional update, and can be told to fail reads or writes so callers
/// can exercise their error paths.
#[derive(Default)]
pub struct InMemoryPaymentStore {
    payments: RwLock<HashMap<PaymentId, Payment>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// number of records across all tenants
    pub fn len(&self) -> usize {
        self.payments.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<PaymentId, Payment>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(unavailable("reads disabled"));
        }
        self.payments.read().map_err(|_| unavailable("lock poisoned"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<PaymentId, Payment>>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable("writes disabled"));
        }
        self.payments.write().map_err(|_| unavailable("lock poisoned"))
    }

    fn matching(
        payments: &HashMap<PaymentId, Payment>,
        tenant_id: &str,
        filter: &PaymentFilter,
    ) -> Vec<Payment> {
        let mut found: Vec<Payment> = payments
            .values()
            .filter(|p| p.tenant_id == tenant_id && filter.matches(p))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.due_date
                .cmp(&b.due_date)
                .then(a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        found
    }
}

fn unavailable(message: &str) -> StoreError {
    StoreError::Unavailable {
        message: message.to_string(),
    }
}

impl PaymentStore for InMemoryPaymentStore {
    fn insert(&self, mut payment: Payment) -> StoreResult<Payment> {
        let mut payments = self.write()?;
        if payments.contains_key(&payment.id) {
            return Err(StoreError::DuplicateId { id: payment.id });
        }
        payment.version = 1;
        payments.insert(payment.id.clone(), payment.clone());
        Ok(payment)
    }

    fn get(&self, tenant_id: &str, id: &str) -> StoreResult<Option<Payment>> {
        let payments = self.read()?;
        Ok(payments
            .get(id)
            .filter(|p| p.tenant_id == tenant_id)
            .cloned())
    }

    fn update(&self, mut payment: Payment) -> StoreResult<Payment> {
        let mut payments = self.write()?;
        let stored = payments
            .get_mut(&payment.id)
            .filter(|p| p.tenant_id == payment.tenant_id)
            .ok_or_else(|| StoreError::Missing { id: payment.id.clone() })?;

        if stored.version != payment.version {
            return Err(StoreError::VersionConflict {
                id: payment.id,
                expected: payment.version,
                actual: stored.version,
            });
        }

        payment.version += 1;
        *stored = payment.clone();
        Ok(payment)
    }

    fn delete(&self, tenant_id: &str, id: &str) -> StoreResult<bool> {
        let mut payments = self.write()?;
        let owned = payments.get(id).is_some_and(|p| p.tenant_id == tenant_id);
        if owned {
            payments.remove(id);
        }
        Ok(owned)
    }

    fn query(&self, tenant_id: &str, filter: &PaymentFilter, page: PageRequest) -> StoreResult<Page<Payment>> {
        let payments = self.read()?;
        let found = Self::matching(&payments, tenant_id, filter);
        let total = found.len() as u64;
        let items = found
            .into_iter()
            .skip(page.offset())
            .take(page.size)
            .collect();

        Ok(Page {
            items,
            page: page.page,
            size: page.size,
            total,
        })
    }

    fn count(&self, tenant_id: &str, filter: &PaymentFilter) -> StoreResult<u64> {
        let payments = self.read()?;
        Ok(payments
            .values()
            .filter(|p| p.tenant_id == tenant_id && filter.matches(p))
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::payment::NewPayment;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn payment(tenant: &str, amount: i64, day: u32) -> Payment {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let due = NaiveDate::from_ymd_opt(2024, 2, day).unwrap();
        Payment::create(tenant, NewPayment::new(Money::from_major(amount), due), now).unwrap()
    }

    #[test]
    fn test_insert_assigns_version() {
        let store = InMemoryPaymentStore::new();
        let stored = store.insert(payment("site-a", 100, 1)).unwrap();

        assert_eq!(stored.version, 1);
        assert_eq!(store.len(), 1);

        let duplicate = store.insert(stored.clone());
        assert!(matches!(duplicate, Err(StoreError::DuplicateId { .. })));
    }

    #[test]
    fn test_version_checked_update() {
        let store = InMemoryPaymentStore::new();
        let stored = store.insert(payment("site-a", 100, 1)).unwrap();

        let mut first = stored.clone();
        first.description = Some("first".to_string());
        let first = store.update(first).unwrap();
        assert_eq!(first.version, 2);

        // a writer still holding version 1 loses
        let mut stale = stored;
        stale.description = Some("stale".to_string());
        let err = store.update(stale).unwrap_err();
        assert_eq!(
            err,
            StoreError::VersionConflict {
                id: first.id.clone(),
                expected: 1,
                actual: 2,
            }
        );

        let current = store.get("site-a", &first.id).unwrap().unwrap();
        assert_eq!(current.description.as_deref(), Some("first"));
    }

    #[test]
    fn test_tenant_isolation() {
        let store = InMemoryPaymentStore::new();
        let a = store.insert(payment("site-a", 100, 1)).unwrap();
        store.insert(payment("site-b", 200, 1)).unwrap();

        assert!(store.get("site-b", &a.id).unwrap().is_none());
        assert!(!store.delete("site-b", &a.id).unwrap());
        assert_eq!(store.count("site-a", &PaymentFilter::all()).unwrap(), 1);

        let mut foreign = a.clone();
        foreign.tenant_id = "site-b".to_string();
        assert!(matches!(store.update(foreign), Err(StoreError::Missing { .. })));

        assert!(store.delete("site-a", &a.id).unwrap());
        assert!(store.get("site-a", &a.id).unwrap().is_none());
    }

    #[test]
    fn test_query_orders_and_pages() {
        let store = InMemoryPaymentStore::new();
        for day in [5, 1, 3, 4, 2] {
            store.insert(payment("site-a", day as i64 * 10, day)).unwrap();
        }

        let first = store.query("site-a", &PaymentFilter::all(), PageRequest::first(2)).unwrap();
        assert_eq!(first.total, 5);
        let days: Vec<u32> = first.items.iter().map(|p| chrono::Datelike::day(&p.due_date)).collect();
        assert_eq!(days, vec![1, 2]);

        let last = store.query("site-a", &PaymentFilter::all(), PageRequest::new(2, 2)).unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(last.is_last());
    }

    #[test]
    fn test_failure_injection() {
        let store = InMemoryPaymentStore::new();
        store.set_fail_writes(true);
        assert!(matches!(
            store.insert(payment("site-a", 100, 1)),
            Err(StoreError::Unavailable { .. })
        ));

        store.set_fail_writes(false);
        store.set_fail_reads(true);
        assert!(store.query("site-a", &PaymentFilter::all(), PageRequest::default()).is_err());
    }
}
