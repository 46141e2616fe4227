use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{LedgerError, Result};

/// unique identifier for a payment
pub type PaymentId = String;

/// site (tenant) identifier every record is scoped by
pub type TenantId = String;

/// payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// created, not yet settled
    Pending,
    /// settled; terminal
    Paid,
    /// flagged late by an external sweep
    Overdue,
    /// voided by an administrator; terminal
    Cancelled,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Cancelled)
    }

    /// whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Pending, Overdue) | (Pending, Cancelled) | (Overdue, Paid) | (Overdue, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    BankTransfer,
    Cash,
    Check,
    OnlinePayment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Dues,
    Maintenance,
    Electricity,
    Water,
    Gas,
    Other,
}

/// installment cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentPlan {
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
    Custom,
}

/// the (year, month) bucket a payment's obligation falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DueMonth {
    year: i32,
    month: u32,
}

impl DueMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::invalid(format!("month must be between 1 and 12, got {month}")));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// full english month name, e.g. "March"
    pub fn month_name(&self) -> &'static str {
        Month::try_from(self.month as u8).map(|m| m.name()).unwrap_or("")
    }
}

impl fmt::Display for DueMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallerRole {
    SuperAdmin,
    Admin,
    Resident,
}

/// who is calling; authenticated upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_id: String,
    pub role: CallerRole,
}

/// scope attached to every inbound call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant_id: TenantId,
    pub caller: CallerIdentity,
}

impl TenantContext {
    pub fn new(tenant_id: impl Into<TenantId>, caller: CallerIdentity) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            caller,
        }
    }

    /// context for scheduled jobs running on behalf of a site
    pub fn system(tenant_id: impl Into<TenantId>) -> Self {
        Self::new(
            tenant_id,
            CallerIdentity {
                user_id: "system".to_string(),
                role: CallerRole::SuperAdmin,
            },
        )
    }

    pub(crate) fn require_tenant(&self) -> Result<&str> {
        if self.tenant_id.trim().is_empty() {
            return Err(LedgerError::invalid("tenant id is required"));
        }
        Ok(&self.tenant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        use PaymentStatus::*;

        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Overdue));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Overdue.can_transition_to(Paid));
        assert!(Overdue.can_transition_to(Cancelled));

        assert!(!Paid.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Paid));
        assert!(!Overdue.can_transition_to(Pending));
        assert!(Paid.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Overdue.is_terminal());
    }

    #[test]
    fn test_due_month() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let month = DueMonth::from_date(date);

        assert_eq!(month.year(), 2024);
        assert_eq!(month.month(), 3);
        assert_eq!(month.month_name(), "March");
        assert_eq!(month.to_string(), "2024-03");

        assert!(DueMonth::new(2024, 0).is_err());
        assert!(DueMonth::new(2024, 13).is_err());
        assert!(DueMonth::new(2024, 12).unwrap() > DueMonth::new(2024, 1).unwrap());
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&PaymentStatus::Overdue).unwrap();
        assert_eq!(json, "\"OVERDUE\"");

        let method: PaymentMethod = serde_json::from_str("\"BANK_TRANSFER\"").unwrap();
        assert_eq!(method, PaymentMethod::BankTransfer);
    }

    #[test]
    fn test_blank_tenant_rejected() {
        assert!(TenantContext::system("   ").require_tenant().is_err());
        assert_eq!(TenantContext::system("site-a").require_tenant().unwrap(), "site-a");
    }
}
