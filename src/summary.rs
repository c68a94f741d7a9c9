use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::LoanInputs;
use crate::decimal::Money;
use crate::payments::Schedule;

/// calendar gap between the baseline and actual payoff dates
///
/// years are 365 days and months 30 days of the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSaved {
    pub days: i64,
    pub years: i64,
    pub months: i64,
}

impl TimeSaved {
    pub fn from_days(days: i64) -> Self {
        let days = days.abs();
        Self {
            days,
            years: days / 365,
            months: (days % 365) / 30,
        }
    }

    pub fn between(a: NaiveDate, b: NaiveDate) -> Self {
        Self::from_days(b.signed_duration_since(a).num_days())
    }
}

impl fmt::Display for TimeSaved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn unit(n: i64, name: &str) -> String {
            if n > 1 {
                format!("{} {}s", n, name)
            } else {
                format!("{} {}", n, name)
            }
        }

        match (self.years, self.months) {
            (0, 0) => f.write_str("Less than 1 month"),
            (y, 0) => f.write_str(&unit(y, "year")),
            (0, m) => f.write_str(&unit(m, "month")),
            (y, m) => write!(f, "{} {}", unit(y, "year"), unit(m, "month")),
        }
    }
}

/// aggregate figures for a schedule compared against its baseline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub scheduled_payment: Money,
    pub contractual_payment_count: u32,
    pub actual_payment_count: u32,
    pub total_extra_paid: Money,
    pub total_interest: Money,
    pub total_paid: Money,
    pub interest_saved: Money,
    pub payoff_date: Option<NaiveDate>,
    pub baseline_payoff_date: Option<NaiveDate>,
    /// only set when extra payments were made
    pub time_saved: Option<TimeSaved>,
}

impl Summary {
    pub fn has_extra_payments(&self) -> bool {
        self.total_extra_paid.is_positive()
    }
}

pub struct SummaryCalculator;

impl SummaryCalculator {
    /// reduce a schedule and its no-extras baseline into summary figures
    pub fn calculate(
        inputs: &LoanInputs,
        scheduled_payment: Money,
        schedule: &Schedule,
        baseline: &Schedule,
    ) -> Summary {
        let total_interest = schedule.total_interest();
        let total_extra_paid = schedule.total_extra_paid();
        let payoff_date = schedule.payoff_date();
        let baseline_payoff_date = baseline.payoff_date();

        let time_saved = match (payoff_date, baseline_payoff_date) {
            (Some(actual), Some(baseline)) if total_extra_paid.is_positive() => {
                Some(TimeSaved::between(actual, baseline))
            }
            _ => None,
        };

        let summary = Summary {
            scheduled_payment,
            contractual_payment_count: inputs.contractual_payment_count(),
            actual_payment_count: schedule.len() as u32,
            total_extra_paid,
            total_interest,
            total_paid: inputs.loan_amount + total_interest + total_extra_paid,
            interest_saved: baseline.total_interest() - total_interest,
            payoff_date,
            baseline_payoff_date,
            time_saved,
        };

        debug!(
            "summary: {} payments, interest {:.2}, saved {:.2}",
            summary.actual_payment_count, summary.total_interest, summary.interest_saved
        );

        summary
    }
}
