use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{CalculatorError, Field, FieldError, Result, ValidationErrors};
use crate::interest;
use crate::payments::{ExtraPaymentIntent, ExtraPayments, PaymentAmountSolver, PlanValidator};
use crate::types::{AccrualMode, PaymentFrequency};

/// upper bound on term years x payments per year
pub const MAX_TOTAL_PERIODS: u32 = 10_000;

/// property purchase details
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyDetails {
    /// current value, used for equity figures
    pub property_value: Money,
    pub property_offer: Money,
    pub deposit_percentage: Decimal,
    pub deposit_value: Money,
}

impl PropertyDetails {
    pub fn has_property_value(&self) -> bool {
        self.property_value.is_positive()
    }

    /// offer minus deposit when both are set
    pub fn derived_loan_amount(&self) -> Option<Money> {
        if self.property_offer.is_positive() && self.deposit_value.is_positive() {
            Some((self.property_offer - self.deposit_value).max(Money::ZERO))
        } else {
            None
        }
    }

    /// deposit value for the current percentage, rounded to whole units
    pub fn deposit_value_from_percentage(&self) -> Option<Money> {
        if self.property_offer.is_positive() && self.deposit_percentage > Decimal::ZERO {
            let value = self.property_offer.percentage(self.deposit_percentage);
            Some(Money::from_decimal(
                value
                    .as_decimal()
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
            ))
        } else {
            None
        }
    }

    /// deposit percentage for the current value, to one decimal place
    pub fn deposit_percentage_from_value(&self) -> Option<Decimal> {
        if self.property_offer.is_positive() && self.deposit_value.is_positive() {
            let pct = self.deposit_value.as_decimal() / self.property_offer.as_decimal() * dec!(100);
            Some(pct.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
        } else {
            None
        }
    }
}

/// everything a single calculation depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanInputs {
    pub loan_amount: Money,
    /// nominal annual rate in percent (6.5 = 6.5%)
    pub annual_rate_percent: Decimal,
    pub accrual_mode: AccrualMode,
    /// may be fractional
    pub term_years: Decimal,
    pub payments_per_year: u32,
    pub start_date: NaiveDate,
    pub first_payment_date: NaiveDate,
    pub property: PropertyDetails,
    pub extra_payments: ExtraPayments,
}

impl LoanInputs {
    pub fn builder() -> LoanInputsBuilder {
        LoanInputsBuilder::new()
    }

    pub fn annual_rate(&self) -> Rate {
        Rate::from_percent_decimal(self.annual_rate_percent)
    }

    /// rate applied to each scheduled payment period
    pub fn periodic_rate(&self) -> Rate {
        interest::periodic_rate(self.annual_rate(), self.payments_per_year)
    }

    pub fn frequency(&self) -> PaymentFrequency {
        PaymentFrequency::resolve(self.payments_per_year)
    }

    /// term years x payments per year, unrounded
    pub fn total_periods(&self) -> Decimal {
        self.term_years * Decimal::from(self.payments_per_year)
    }

    /// number of payments the contract calls for (rounded up)
    pub fn contractual_payment_count(&self) -> u32 {
        self.total_periods().ceil().to_u32().unwrap_or(u32::MAX)
    }

    /// number of periodic rows on the payment timeline (whole periods only)
    pub fn periodic_row_count(&self) -> u32 {
        self.total_periods().floor().to_u32().unwrap_or(u32::MAX)
    }

    pub fn scheduled_payment(&self) -> Result<Money> {
        PaymentAmountSolver::for_inputs(self)
    }

    /// same loan with every extra payment removed
    pub fn without_extra_payments(&self) -> LoanInputs {
        LoanInputs {
            extra_payments: ExtraPayments::new(),
            ..self.clone()
        }
    }

    /// check every field, collecting all errors
    ///
    /// a recurring/custom-total conflict is reported on its own as
    /// [`CalculatorError::Conflict`], carrying any loan field errors.
    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();

        if !self.loan_amount.is_positive() {
            errors.push(FieldError::new(
                Field::LoanAmount,
                "Please enter a valid loan amount greater than 0.",
            ));
        }

        if self.annual_rate_percent <= Decimal::ZERO || self.annual_rate_percent > dec!(100) {
            errors.push(FieldError::new(
                Field::InterestRate,
                "Please enter a valid interest rate between 0 and 100%.",
            ));
        }

        let periods = self.total_periods();
        if self.term_years <= Decimal::ZERO {
            errors.push(FieldError::new(
                Field::LoanPeriod,
                "Please enter a valid loan period greater than 0.",
            ));
        } else if periods > Decimal::from(MAX_TOTAL_PERIODS) {
            errors.push(FieldError::new(
                Field::LoanPeriod,
                format!(
                    "Loan period is too long: at most {} payments are supported.",
                    MAX_TOTAL_PERIODS
                ),
            ));
        } else if periods < Decimal::ONE {
            errors.push(FieldError::new(
                Field::LoanPeriod,
                "Loan period must cover at least one payment.",
            ));
        }

        if self.first_payment_date < self.start_date {
            errors.push(FieldError::new(
                Field::FirstPaymentDate,
                "First payment date cannot be before the start date.",
            ));
        }

        // custom totals are compared against a payment that only exists for sane loans
        let scheduled = if errors.is_empty() {
            self.scheduled_payment().ok()
        } else {
            None
        };

        PlanValidator::new(self.start_date, scheduled)
            .with_errors(errors)
            .check(&self.extra_payments)
    }
}

/// builder for loan inputs
#[derive(Debug, Default)]
pub struct LoanInputsBuilder {
    loan_amount: Option<Money>,
    annual_rate_percent: Option<Decimal>,
    accrual_mode: Option<AccrualMode>,
    term_years: Option<Decimal>,
    payments_per_year: Option<u32>,
    start_date: Option<NaiveDate>,
    first_payment_date: Option<NaiveDate>,
    property: PropertyDetails,
    extra_payments: ExtraPayments,
    today: Option<NaiveDate>,
}

impl LoanInputsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn amount(mut self, amount: Money) -> Self {
        self.loan_amount = Some(amount);
        self
    }

    pub fn rate_percent(mut self, percent: Decimal) -> Self {
        self.annual_rate_percent = Some(percent);
        self
    }

    pub fn accrual(mut self, mode: AccrualMode) -> Self {
        self.accrual_mode = Some(mode);
        self
    }

    pub fn term_years(mut self, years: Decimal) -> Self {
        self.term_years = Some(years);
        self
    }

    pub fn payments_per_year(mut self, payments: u32) -> Self {
        self.payments_per_year = Some(payments);
        self
    }

    pub fn frequency(self, frequency: PaymentFrequency) -> Self {
        self.payments_per_year(frequency.per_year())
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn first_payment_date(mut self, date: NaiveDate) -> Self {
        self.first_payment_date = Some(date);
        self
    }

    pub fn property_value(mut self, value: Money) -> Self {
        self.property.property_value = value;
        self
    }

    pub fn property_offer(mut self, offer: Money) -> Self {
        self.property.property_offer = offer;
        self
    }

    pub fn deposit_percentage(mut self, percent: Decimal) -> Self {
        self.property.deposit_percentage = percent;
        self
    }

    pub fn deposit_value(mut self, value: Money) -> Self {
        self.property.deposit_value = value;
        self
    }

    pub fn extra_payment(mut self, intent: ExtraPaymentIntent) -> Self {
        self.extra_payments.push(intent);
        self
    }

    pub fn extra_payments(mut self, payments: ExtraPayments) -> Self {
        self.extra_payments = payments;
        self
    }

    /// recurring top-up; `None` occurrences repeats until payoff
    pub fn recurring(self, amount: Money, occurrences: Option<u32>) -> Self {
        self.extra_payment(ExtraPaymentIntent::Recurring { amount, occurrences })
    }

    pub fn custom_total(self, total_per_payment: Money) -> Self {
        self.extra_payment(ExtraPaymentIntent::CustomTotal { total_per_payment })
    }

    pub fn lump_sum(self, amount: Money, date: NaiveDate) -> Self {
        self.extra_payment(ExtraPaymentIntent::LumpSum {
            amount,
            date: Some(date),
        })
    }

    /// use the provider's current date when no start date is given
    pub fn set_time(mut self, time: &SafeTimeProvider) -> Self {
        self.today = Some(time.now().date_naive());
        self
    }

    pub fn build(self) -> Result<LoanInputs> {
        let start_date = self.start_date.or(self.today).ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            errors.push(FieldError::new(Field::StartDate, "Please select a start date."));
            CalculatorError::Validation(errors)
        })?;

        let loan_amount = self
            .property
            .derived_loan_amount()
            .or(self.loan_amount)
            .unwrap_or(Money::ZERO)
            .max(Money::ZERO);

        Ok(LoanInputs {
            loan_amount,
            annual_rate_percent: self.annual_rate_percent.unwrap_or(Decimal::ZERO),
            accrual_mode: self.accrual_mode.unwrap_or_default(),
            term_years: self.term_years.unwrap_or(Decimal::ZERO),
            payments_per_year: self.payments_per_year.unwrap_or(12),
            start_date,
            first_payment_date: self.first_payment_date.unwrap_or(start_date),
            property: self.property,
            extra_payments: self.extra_payments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn mortgage() -> LoanInputsBuilder {
        LoanInputs::builder()
            .amount(Money::from_major(300_000))
            .rate_percent(dec!(6))
            .term_years(dec!(30))
            .frequency(PaymentFrequency::Monthly)
            .start_date(date(2024, 1, 1))
    }

    #[test]
    fn test_builder_defaults() {
        let inputs = mortgage().build().unwrap();

        assert_eq!(inputs.first_payment_date, inputs.start_date);
        assert_eq!(inputs.accrual_mode, AccrualMode::Daily);
        assert_eq!(inputs.contractual_payment_count(), 360);
        assert_eq!(inputs.periodic_rate().as_decimal(), dec!(0.005));
        assert!(inputs.validate().is_ok());
    }

    #[test]
    fn test_start_date_from_time_provider() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap(),
        ));

        let inputs = LoanInputs::builder()
            .amount(Money::from_major(100_000))
            .set_time(&time)
            .build()
            .unwrap();

        assert_eq!(inputs.start_date, date(2025, 3, 14));
        assert_eq!(inputs.first_payment_date, date(2025, 3, 14));
    }

    #[test]
    fn test_missing_start_date() {
        let err = LoanInputs::builder().amount(Money::from_major(1)).build().unwrap_err();
        assert_eq!(err.field_errors()[0].field, Field::StartDate);
    }

    #[test]
    fn test_loan_amount_from_property() {
        let inputs = mortgage()
            .property_offer(Money::from_major(400_000))
            .deposit_value(Money::from_major(80_000))
            .build()
            .unwrap();

        assert_eq!(inputs.loan_amount, Money::from_major(320_000));
    }

    #[test]
    fn test_deposit_helpers() {
        let property = PropertyDetails {
            property_offer: Money::from_major(350_000),
            deposit_percentage: dec!(12.5),
            deposit_value: Money::from_major(50_000),
            ..Default::default()
        };

        assert_eq!(property.deposit_value_from_percentage(), Some(Money::from_major(43_750)));
        assert_eq!(property.deposit_percentage_from_value(), Some(dec!(14.3)));

        let empty = PropertyDetails::default();
        assert_eq!(empty.derived_loan_amount(), None);
        assert_eq!(empty.deposit_value_from_percentage(), None);
    }

    #[test]
    fn test_validation_collects_all_fields() {
        let inputs = LoanInputs::builder()
            .amount(Money::ZERO)
            .rate_percent(dec!(120))
            .term_years(Decimal::ZERO)
            .start_date(date(2024, 6, 1))
            .first_payment_date(date(2024, 5, 1))
            .build()
            .unwrap();

        let err = inputs.validate().unwrap_err();
        let fields: Vec<Field> = err.field_errors().iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![Field::LoanAmount, Field::InterestRate, Field::LoanPeriod, Field::FirstPaymentDate]
        );
    }

    #[test]
    fn test_validation_rejects_pathological_terms() {
        let inputs = mortgage()
            .term_years(dec!(500))
            .frequency(PaymentFrequency::Weekly)
            .build()
            .unwrap();

        let err = inputs.validate().unwrap_err();
        match err {
            CalculatorError::Validation(errors) => {
                assert!(errors.message_for(Field::LoanPeriod).unwrap().contains("too long"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_custom_total_must_exceed_scheduled_payment() {
        let inputs = mortgage().custom_total(Money::from_major(1_700)).build().unwrap();
        let err = inputs.validate().unwrap_err();
        assert_eq!(err.field_errors()[0].field, Field::CustomTotal);

        let ok = mortgage().custom_total(Money::from_major(2_000)).build().unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_conflict_reported_with_loan_errors() {
        let inputs = mortgage()
            .amount(Money::ZERO)
            .recurring(Money::from_major(100), None)
            .custom_total(Money::from_major(2_500))
            .build()
            .unwrap();

        match inputs.validate().unwrap_err() {
            CalculatorError::Conflict(conflict) => {
                assert_eq!(conflict.field_errors.len(), 1);
                assert_eq!(conflict.field_errors[0].field, Field::LoanAmount);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_fractional_term_counts() {
        let inputs = mortgage()
            .term_years(dec!(0.3))
            .frequency(PaymentFrequency::Fortnightly)
            .build()
            .unwrap();

        // 7.8 periods
        assert_eq!(inputs.contractual_payment_count(), 8);
        assert_eq!(inputs.periodic_row_count(), 7);
    }

    #[test]
    fn test_without_extra_payments() {
        let inputs = mortgage().recurring(Money::from_major(200), None).build().unwrap();
        let baseline = inputs.without_extra_payments();

        assert!(baseline.extra_payments.is_empty());
        assert_eq!(baseline.loan_amount, inputs.loan_amount);
        assert_eq!(inputs.extra_payments.len(), 1);
    }
}
