use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// stable identifier for an extra payment entry
pub type EntryId = Uuid;

/// how often the scheduled payment falls due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentFrequency {
    Weekly,
    Fortnightly,
    Monthly,
    Yearly,
}

impl PaymentFrequency {
    /// exact match on payments per year
    pub fn from_per_year(payments_per_year: u32) -> Option<Self> {
        match payments_per_year {
            52 => Some(PaymentFrequency::Weekly),
            26 => Some(PaymentFrequency::Fortnightly),
            12 => Some(PaymentFrequency::Monthly),
            1 => Some(PaymentFrequency::Yearly),
            _ => None,
        }
    }

    /// unknown frequencies behave as monthly
    pub fn resolve(payments_per_year: u32) -> Self {
        Self::from_per_year(payments_per_year).unwrap_or(PaymentFrequency::Monthly)
    }

    pub fn per_year(&self) -> u32 {
        match self {
            PaymentFrequency::Weekly => 52,
            PaymentFrequency::Fortnightly => 26,
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::Yearly => 1,
        }
    }

    /// approximate days between two scheduled payments
    pub fn period_step_days(&self) -> i64 {
        match self {
            PaymentFrequency::Weekly => 7,
            PaymentFrequency::Fortnightly => 14,
            PaymentFrequency::Monthly => 30,
            PaymentFrequency::Yearly => 365,
        }
    }
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentFrequency::Weekly => "weekly",
            PaymentFrequency::Fortnightly => "fortnightly",
            PaymentFrequency::Monthly => "monthly",
            PaymentFrequency::Yearly => "yearly",
        };
        f.write_str(name)
    }
}

/// day-count convention used for lump-sum interest accrual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccrualMode {
    /// annual / 365 per day
    #[default]
    Daily,
    /// annual / 12 per 30-day month
    Monthly,
    /// annual per 365-day year
    Yearly,
}

impl AccrualMode {
    /// parse a mode name, falling back to daily for anything unrecognized
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => AccrualMode::Monthly,
            "yearly" => AccrualMode::Yearly,
            _ => AccrualMode::Daily,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccrualMode::Daily => "daily",
            AccrualMode::Monthly => "monthly",
            AccrualMode::Yearly => "yearly",
        }
    }
}

impl fmt::Display for AccrualMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ledger row origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    /// periodic payment on the schedule cadence
    Scheduled,
    /// standalone date-anchored lump sum
    LumpSum,
}
