use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::LoanInputs;
use crate::decimal::Money;
use crate::payments::{PaymentLedgerEntry, Schedule};

/// one yearly sample of a schedule series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub year: i32,
    pub value: Money,
}

/// sampled series for a schedule and its baseline
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChartSeries {
    pub with_extra: Vec<ChartPoint>,
    pub without_extra: Vec<ChartPoint>,
}

/// where a yearly sample falls relative to the schedule
enum Sample<'a> {
    Row(&'a PaymentLedgerEntry),
    Final(&'a PaymentLedgerEntry),
    AfterPayoff,
}

/// walk the schedule one year of payments at a time
///
/// samples the row opening each year, then the final row once, then the
/// paid-off value until the term is covered.
fn sample_years<F>(schedule: &Schedule, inputs: &LoanInputs, mut value: F) -> Vec<ChartPoint>
where
    F: FnMut(Sample<'_>) -> Money,
{
    let Some(last) = schedule.last() else {
        return Vec::new();
    };

    let per_year = inputs.payments_per_year.max(1) as usize;
    let rows = schedule.len();
    let total_years = rows.div_ceil(per_year);
    let max_years = Decimal::from(total_years as u64).max(inputs.term_years);
    let start_year = schedule.rows[0].payment_date.year();

    let mut points = Vec::new();
    let mut year = 0usize;
    while Decimal::from(year as u64) <= max_years {
        let index = year * per_year;
        let sample = if index < rows {
            Sample::Row(&schedule.rows[index])
        } else if year == total_years {
            Sample::Final(last)
        } else {
            Sample::AfterPayoff
        };

        points.push(ChartPoint {
            year: start_year + year as i32,
            value: value(sample),
        });
        year += 1;
    }
    points
}

/// outstanding balance at the start of each year
pub fn balance_by_year(schedule: &Schedule, inputs: &LoanInputs) -> Vec<ChartPoint> {
    sample_years(schedule, inputs, |sample| match sample {
        Sample::Row(row) => row.beginning_balance,
        Sample::Final(row) => row.ending_balance,
        Sample::AfterPayoff => Money::ZERO,
    })
}

/// property equity at the start of each year
pub fn net_worth_by_year(schedule: &Schedule, inputs: &LoanInputs) -> Vec<ChartPoint> {
    let property_value = inputs.property.property_value;
    sample_years(schedule, inputs, |sample| match sample {
        Sample::Row(row) => (property_value - row.beginning_balance).max(Money::ZERO),
        Sample::Final(row) => (property_value - row.ending_balance).max(Money::ZERO),
        Sample::AfterPayoff => property_value,
    })
}

/// equity after each ledger row
pub fn net_worth_for_rows(schedule: &Schedule, property_value: Money) -> Vec<Money> {
    schedule
        .iter()
        .map(|row| (property_value - row.ending_balance).max(Money::ZERO))
        .collect()
}

pub fn balance_series(schedule: &Schedule, baseline: &Schedule, inputs: &LoanInputs) -> ChartSeries {
    ChartSeries {
        with_extra: balance_by_year(schedule, inputs),
        without_extra: balance_by_year(baseline, inputs),
    }
}

pub fn net_worth_series(schedule: &Schedule, baseline: &Schedule, inputs: &LoanInputs) -> ChartSeries {
    ChartSeries {
        with_extra: net_worth_by_year(schedule, inputs),
        without_extra: net_worth_by_year(baseline, inputs),
    }
}
