use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::decimal::{Money, Rate};
use crate::types::AccrualMode;

/// engine for accruing interest between cash events
#[derive(Debug, Clone, Copy)]
pub struct AccrualEngine {
    pub mode: AccrualMode,
}

impl AccrualEngine {
    pub fn new(mode: AccrualMode) -> Self {
        Self { mode }
    }

    /// calendar days between two dates (negative if `end` precedes `start`)
    pub fn calculate_days(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        end.signed_duration_since(start).num_days()
    }

    /// fraction of the annual rate accrued over `days`
    ///
    /// monthly mode counts a month as 30 days and yearly mode a year as 365,
    /// regardless of the calendar.
    pub fn accrued_rate(&self, annual_rate: Rate, days: i64) -> Rate {
        let annual = annual_rate.as_decimal();
        let days = Decimal::from(days);
        let rate = match self.mode {
            AccrualMode::Daily => annual / dec!(365) * days,
            AccrualMode::Monthly => annual / dec!(12) * (days / dec!(30)),
            AccrualMode::Yearly => annual * (days / dec!(365)),
        };
        Rate::from_decimal(rate)
    }

    /// interest on `balance` from `last_event` up to `date`
    pub fn accrue(
        &self,
        balance: Money,
        annual_rate: Rate,
        last_event: NaiveDate,
        date: NaiveDate,
    ) -> EventAccrual {
        let days = self.calculate_days(last_event, date);
        let rate = self.accrued_rate(annual_rate, days);

        EventAccrual {
            days,
            rate,
            interest_amount: balance.interest_at(rate),
        }
    }
}

/// interest accrued ahead of a date-anchored payment
#[derive(Debug, Clone, PartialEq)]
pub struct EventAccrual {
    pub days: i64,
    pub rate: Rate,
    pub interest_amount: Money,
}
