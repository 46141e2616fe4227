use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::decimal::Rate;
use crate::errors::{LedgerError, Result};
use crate::types::TenantId;

/// late fee policy applied to a site's overdue dues
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LateFeePolicy {
    /// charged per full calendar month late
    pub monthly_late_fee_rate: Rate,
    /// charged per remaining day late
    pub daily_late_fee_rate: Rate,
    /// cap as a fraction of the base amount
    pub max_late_fee_percentage: Rate,
}

impl Default for LateFeePolicy {
    fn default() -> Self {
        Self {
            monthly_late_fee_rate: Rate::from_decimal(dec!(0.05)),
            daily_late_fee_rate: Rate::from_decimal(dec!(0.002)),
            max_late_fee_percentage: Rate::from_decimal(dec!(0.50)),
        }
    }
}

impl LateFeePolicy {
    pub fn new(monthly: Rate, daily: Rate, cap: Rate) -> Self {
        Self {
            monthly_late_fee_rate: monthly,
            daily_late_fee_rate: daily,
            max_late_fee_percentage: cap,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.monthly_late_fee_rate.is_negative() || self.daily_late_fee_rate.is_negative() {
            return Err(LedgerError::InvalidConfiguration {
                message: "late fee rates must not be negative".to_string(),
            });
        }
        if self.max_late_fee_percentage.is_negative() || self.max_late_fee_percentage > Rate::ONE {
            return Err(LedgerError::InvalidConfiguration {
                message: format!(
                    "late fee cap must be within 0% and 100%, got {}",
                    self.max_late_fee_percentage
                ),
            });
        }
        Ok(())
    }
}

/// ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// policy for sites without an override
    pub late_fee_policy: LateFeePolicy,
    /// per-site overrides
    pub tenant_policies: HashMap<TenantId, LateFeePolicy>,
    /// spacing between reminders, read by the reminder job
    pub reminder_interval_days: u32,
    /// page size used when folding a period's payments
    pub aggregation_batch_size: usize,
    /// re-reads allowed after a version conflict
    pub max_conflict_retries: u32,
    /// reject status changes outside the lifecycle graph
    pub enforce_status_transitions: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            late_fee_policy: LateFeePolicy::default(),
            tenant_policies: HashMap::new(),
            reminder_interval_days: 7,
            aggregation_batch_size: 500,
            max_conflict_retries: 3,
            enforce_status_transitions: false,
        }
    }
}

impl LedgerConfig {
    /// parse and validate a json document; missing keys take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig =
            serde_json::from_str(json).map_err(|e| LedgerError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.late_fee_policy.validate()?;
        for (tenant, policy) in &self.tenant_policies {
            policy.validate().map_err(|e| LedgerError::InvalidConfiguration {
                message: format!("site {tenant}: {e}"),
            })?;
        }
        if self.aggregation_batch_size == 0 {
            return Err(LedgerError::InvalidConfiguration {
                message: "aggregation batch size must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// effective late fee policy for a site
    pub fn policy_for(&self, tenant_id: &str) -> LateFeePolicy {
        self.tenant_policies
            .get(tenant_id)
            .copied()
            .unwrap_or(self.late_fee_policy)
    }

    pub fn with_tenant_policy(mut self, tenant_id: impl Into<TenantId>, policy: LateFeePolicy) -> Self {
        self.tenant_policies.insert(tenant_id.into(), policy);
        self
    }

    pub fn with_status_guard(mut self, enforce: bool) -> Self {
        self.enforce_status_transitions = enforce;
        self
    }
}
