use log::debug;
use serde::{Deserialize, Serialize};

use crate::chart::{self, ChartSeries};
use crate::config::LoanInputs;
use crate::decimal::Money;
use crate::errors::Result;
use crate::payments::{PaymentAmountSolver, Schedule, ScheduleGenerator};
use crate::summary::{Summary, SummaryCalculator};

/// everything produced for one set of loan inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub inputs: LoanInputs,
    pub scheduled_payment: Money,
    pub schedule: Schedule,
    /// same loan with no extra payments
    pub baseline: Schedule,
    pub summary: Summary,
}

impl CalculationResult {
    pub fn balance_chart(&self) -> ChartSeries {
        chart::balance_series(&self.schedule, &self.baseline, &self.inputs)
    }

    /// `None` without a property value
    pub fn net_worth_chart(&self) -> Option<ChartSeries> {
        self.inputs
            .property
            .has_property_value()
            .then(|| chart::net_worth_series(&self.schedule, &self.baseline, &self.inputs))
    }

    /// per-row equity, when a property value is known
    pub fn net_worth_by_row(&self) -> Option<Vec<Money>> {
        let value = self.inputs.property.property_value;
        self.inputs
            .property
            .has_property_value()
            .then(|| chart::net_worth_for_rows(&self.schedule, value))
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// validate, solve, generate and summarize in one call
pub struct MortgageCalculator;

impl MortgageCalculator {
    pub fn calculate(inputs: &LoanInputs) -> Result<CalculationResult> {
        inputs.validate()?;

        let scheduled_payment = PaymentAmountSolver::for_inputs(inputs)?;
        let schedule = ScheduleGenerator::new(inputs, scheduled_payment)?.generate()?;

        let baseline_inputs = inputs.without_extra_payments();
        let baseline = ScheduleGenerator::new(&baseline_inputs, scheduled_payment)?.generate()?;

        let summary = SummaryCalculator::calculate(inputs, scheduled_payment, &schedule, &baseline);

        debug!(
            "calculated {} rows ({} baseline), payment {:.2}",
            schedule.len(),
            baseline.len(),
            scheduled_payment
        );

        Ok(CalculationResult {
            inputs: inputs.clone(),
            scheduled_payment,
            schedule,
            baseline,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CalculatorError;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn mortgage() -> crate::config::LoanInputsBuilder {
        LoanInputs::builder()
            .amount(Money::from_major(300_000))
            .rate_percent(dec!(6))
            .term_years(dec!(30))
            .start_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .property_value(Money::from_major(450_000))
    }

    #[test]
    fn test_calculate_with_extras() {
        let inputs = mortgage()
            .recurring(Money::from_major(200), None)
            .lump_sum(Money::from_major(10_000), NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
            .build()
            .unwrap();

        let result = MortgageCalculator::calculate(&inputs).unwrap();

        assert_eq!(result.baseline.len(), 360);
        assert!(result.schedule.len() < result.baseline.len());
        assert!(result.summary.interest_saved.is_positive());
        assert!(result.summary.time_saved.is_some());
        assert_eq!(result.summary.scheduled_payment, result.scheduled_payment);

        let chart = result.balance_chart();
        assert_eq!(chart.with_extra[0].value, Money::from_major(300_000));
        assert_eq!(chart.with_extra.len(), chart.without_extra.len());

        let net_worth = result.net_worth_chart().unwrap();
        assert_eq!(net_worth.with_extra[0].value, Money::from_major(150_000));
        assert_eq!(result.net_worth_by_row().unwrap().len(), result.schedule.len());
    }

    #[test]
    fn test_calculate_is_deterministic() {
        let inputs = mortgage().custom_total(Money::from_major(2_200)).build().unwrap();
        assert_eq!(
            MortgageCalculator::calculate(&inputs).unwrap(),
            MortgageCalculator::calculate(&inputs).unwrap()
        );
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let inputs = mortgage().rate_percent(dec!(0)).build().unwrap();
        assert!(matches!(
            MortgageCalculator::calculate(&inputs),
            Err(CalculatorError::Validation(_))
        ));

        let conflict = mortgage()
            .recurring(Money::from_major(100), Some(12))
            .custom_total(Money::from_major(2_500))
            .build()
            .unwrap();
        assert!(matches!(
            MortgageCalculator::calculate(&conflict),
            Err(CalculatorError::Conflict(_))
        ));
    }

    #[test]
    fn test_json_output() {
        let inputs = mortgage().build().unwrap();
        let result = MortgageCalculator::calculate(&inputs).unwrap();
        let json = result.to_json_pretty().unwrap();

        assert!(json.contains("\"scheduled_payment\""));
        assert!(json.contains("\"interest_saved\""));
    }
}
