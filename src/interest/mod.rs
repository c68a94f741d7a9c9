pub mod accrual;

use rust_decimal::Decimal;

use crate::decimal::Rate;
use crate::types::{AccrualMode, PaymentFrequency};

pub use accrual::AccrualEngine;

/// per-period rate for the scheduled payment cadence
///
/// the divisor follows the payment frequency; yearly payments use the annual
/// rate unchanged and unknown frequencies fall back to the monthly divisor.
pub fn periodic_rate(annual_rate: Rate, payments_per_year: u32) -> Rate {
    let annual = annual_rate.as_decimal();
    let rate = match PaymentFrequency::resolve(payments_per_year) {
        PaymentFrequency::Yearly => annual,
        frequency => annual / Decimal::from(frequency.per_year()),
    };
    Rate::from_decimal(rate)
}

/// accrued interest fraction for `days` calendar days under an accrual mode
pub fn accrued_rate_for_days(annual_rate: Rate, mode: AccrualMode, days: i64) -> Rate {
    AccrualEngine::new(mode).accrued_rate(annual_rate, days)
}
