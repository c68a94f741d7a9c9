use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::LoanInputs;
use crate::decimal::Money;
use crate::errors::{CalculatorError, Field, FieldError, Result, ValidationErrors};
use crate::payments::{ExtraPaymentIntent, ExtraPayments};
use crate::types::AccrualMode;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// one extra payment in share form
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtraPaymentRecord {
    /// recurring, custom or lump
    pub t: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
}

/// compact key/value form of a calculation, as carried in a share link
///
/// values are kept as the raw strings of the link so decoding can apply the
/// same defaults as the input form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShareState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub la: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fpd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub po: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dv: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ep: Vec<ExtraPaymentRecord>,
}

fn invalid(key: &str, value: impl ToString) -> CalculatorError {
    CalculatorError::InvalidShareState {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// non-empty trimmed value for a key
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn decimal_or_zero(key: &str, value: &Option<String>) -> Result<Decimal> {
    match present(value) {
        None => Ok(Decimal::ZERO),
        Some(raw) => Decimal::from_str(raw).map_err(|_| invalid(key, raw)),
    }
}

fn money_or_zero(key: &str, value: &Option<String>) -> Result<Money> {
    decimal_or_zero(key, value).map(Money::from_decimal)
}

fn date(key: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| invalid(key, raw))
}

fn record_money(key: &str, value: Option<f64>) -> Result<Money> {
    match value {
        None => Ok(Money::ZERO),
        Some(v) => Decimal::from_f64(v)
            .map(Money::from_decimal)
            .ok_or_else(|| invalid(key, v)),
    }
}

fn money_f64(money: Money) -> Option<f64> {
    money.as_decimal().to_f64()
}

impl ShareState {
    /// build a share state from `key=value` pairs; unknown keys are ignored
    ///
    /// `ep` must already be decoded to its JSON text.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut state = ShareState::default();
        for (key, value) in pairs {
            let value = value.into();
            let slot = match key.as_ref() {
                "la" => &mut state.la,
                "ir" => &mut state.ir,
                "ia" => &mut state.ia,
                "lp" => &mut state.lp,
                "pf" => &mut state.pf,
                "sd" => &mut state.sd,
                "fpd" => &mut state.fpd,
                "pv" => &mut state.pv,
                "po" => &mut state.po,
                "dp" => &mut state.dp,
                "dv" => &mut state.dv,
                "ep" => {
                    state.ep = serde_json::from_str(&value).map_err(|_| invalid("ep", &value))?;
                    continue;
                }
                _ => continue,
            };
            *slot = Some(value);
        }
        Ok(state)
    }

    /// `key=value` pairs in link order, with `ep` as JSON text
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let fields = [
            ("la", &self.la),
            ("ir", &self.ir),
            ("ia", &self.ia),
            ("lp", &self.lp),
            ("pf", &self.pf),
            ("sd", &self.sd),
            ("fpd", &self.fpd),
            ("pv", &self.pv),
            ("po", &self.po),
            ("dp", &self.dp),
            ("dv", &self.dv),
        ];

        let mut pairs: Vec<(&'static str, String)> = fields
            .into_iter()
            .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
            .collect();

        if !self.ep.is_empty() {
            if let Ok(json) = serde_json::to_string(&self.ep) {
                pairs.push(("ep", json));
            }
        }
        pairs
    }

    /// decode into loan inputs, defaulting dates from `time`
    pub fn into_inputs(&self, time: &SafeTimeProvider) -> Result<LoanInputs> {
        let start_date = match present(&self.sd) {
            Some(raw) => Some(date("sd", raw)?),
            None => None,
        };
        let first_payment_date = match present(&self.fpd) {
            Some(raw) => Some(date("fpd", raw)?),
            None => None,
        };

        let payments_per_year = match present(&self.pf) {
            None => 12,
            Some(raw) => match raw.parse::<u32>() {
                Ok(0) => 12,
                Ok(n) => n,
                Err(_) => return Err(invalid("pf", raw)),
            },
        };

        let mut builder = LoanInputs::builder()
            .set_time(time)
            .amount(money_or_zero("la", &self.la)?)
            .rate_percent(decimal_or_zero("ir", &self.ir)?)
            .accrual(present(&self.ia).map(AccrualMode::parse_lenient).unwrap_or_default())
            .term_years(decimal_or_zero("lp", &self.lp)?)
            .payments_per_year(payments_per_year)
            .property_value(money_or_zero("pv", &self.pv)?)
            .property_offer(money_or_zero("po", &self.po)?)
            .deposit_percentage(decimal_or_zero("dp", &self.dp)?)
            .deposit_value(money_or_zero("dv", &self.dv)?)
            .extra_payments(self.extra_payments()?);

        if let Some(start) = start_date {
            builder = builder.start_date(start);
        }
        if let Some(first) = first_payment_date {
            builder = builder.first_payment_date(first);
        }

        builder.build()
    }

    /// decode the extra payment records, dropping incomplete ones
    fn extra_payments(&self) -> Result<ExtraPayments> {
        let mut payments = ExtraPayments::new();
        let mut errors = ValidationErrors::new();

        for record in &self.ep {
            let intent = match record.t.as_str() {
                "recurring" => {
                    let amount = record_money("ep.a", record.a)?;
                    let count = record.c.unwrap_or(0);
                    if !amount.is_positive() {
                        continue;
                    }
                    let Ok(count) = u32::try_from(count) else {
                        if count < 0 {
                            errors.push(FieldError::new(
                                Field::Count,
                                "Number of payments cannot be negative.",
                            ));
                            continue;
                        }
                        return Err(invalid("ep.c", count));
                    };
                    ExtraPaymentIntent::Recurring {
                        amount,
                        occurrences: (count > 0).then_some(count),
                    }
                }
                "custom" => {
                    let total = record_money("ep.ct", record.ct)?;
                    if !total.is_positive() {
                        continue;
                    }
                    ExtraPaymentIntent::CustomTotal {
                        total_per_payment: total,
                    }
                }
                "lump" => {
                    let amount = record_money("ep.a", record.a)?;
                    let Some(raw) = record.d.as_deref().filter(|d| !d.trim().is_empty()) else {
                        continue;
                    };
                    if !amount.is_positive() {
                        continue;
                    }
                    ExtraPaymentIntent::LumpSum {
                        amount,
                        date: Some(date("ep.d", raw)?),
                    }
                }
                other => return Err(invalid("ep.t", other)),
            };
            payments.push(intent);
        }

        errors.into_result()?;
        Ok(payments)
    }

    /// encode loan inputs the way the input form would share them
    pub fn from_inputs(inputs: &LoanInputs) -> Self {
        let ep = inputs
            .extra_payments
            .iter()
            .map(|entry| match &entry.intent {
                ExtraPaymentIntent::Recurring { amount, occurrences } => ExtraPaymentRecord {
                    t: "recurring".to_string(),
                    a: money_f64(*amount),
                    c: Some(i64::from(occurrences.unwrap_or(0))),
                    ..Default::default()
                },
                ExtraPaymentIntent::CustomTotal { total_per_payment } => ExtraPaymentRecord {
                    t: "custom".to_string(),
                    ct: money_f64(*total_per_payment),
                    ..Default::default()
                },
                ExtraPaymentIntent::LumpSum { amount, date } => ExtraPaymentRecord {
                    t: "lump".to_string(),
                    a: money_f64(*amount),
                    d: date.map(|d| d.format(DATE_FORMAT).to_string()),
                    ..Default::default()
                },
            })
            .collect();

        let property = &inputs.property;
        ShareState {
            la: Some(inputs.loan_amount.as_decimal().normalize().to_string()),
            ir: Some(inputs.annual_rate_percent.normalize().to_string()),
            ia: Some(inputs.accrual_mode.to_string()),
            lp: Some(inputs.term_years.normalize().to_string()),
            pf: Some(inputs.payments_per_year.to_string()),
            sd: Some(inputs.start_date.format(DATE_FORMAT).to_string()),
            fpd: Some(inputs.first_payment_date.format(DATE_FORMAT).to_string()),
            pv: Some(property.property_value.as_decimal().normalize().to_string()),
            po: Some(property.property_offer.as_decimal().normalize().to_string()),
            dp: Some(property.deposit_percentage.normalize().to_string()),
            dv: Some(property.deposit_value.as_decimal().normalize().to_string()),
            ep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentFrequency;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()))
    }

    fn record(t: &str) -> ExtraPaymentRecord {
        ExtraPaymentRecord {
            t: t.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_with_defaults() {
        let state = ShareState::from_pairs([("la", "250000"), ("ir", "5.5"), ("lp", "25")]).unwrap();
        let inputs = state.into_inputs(&time()).unwrap();

        assert_eq!(inputs.loan_amount, Money::from_major(250_000));
        assert_eq!(inputs.annual_rate_percent, dec!(5.5));
        assert_eq!(inputs.payments_per_year, 12);
        assert_eq!(inputs.accrual_mode, AccrualMode::Daily);
        assert_eq!(inputs.start_date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(inputs.first_payment_date, inputs.start_date);
    }

    #[test]
    fn test_decode_full_state() {
        let ep = r#"[{"t":"recurring","a":200,"c":0},{"t":"lump","a":10000,"d":"2025-03-01"},{"t":"lump","a":500}]"#;
        let state = ShareState::from_pairs([
            ("la", "0"),
            ("ir", "6"),
            ("ia", "monthly"),
            ("lp", "30"),
            ("pf", "26"),
            ("sd", "2025-01-01"),
            ("fpd", "2025-01-15"),
            ("po", "400000"),
            ("dv", "80000"),
            ("ep", ep),
        ])
        .unwrap();
        let inputs = state.into_inputs(&time()).unwrap();

        assert_eq!(inputs.loan_amount, Money::from_major(320_000));
        assert_eq!(inputs.frequency(), PaymentFrequency::Fortnightly);
        assert_eq!(inputs.accrual_mode, AccrualMode::Monthly);
        // the lump sum without a date is dropped
        assert_eq!(inputs.extra_payments.len(), 2);

        let intents: Vec<&ExtraPaymentIntent> = inputs.extra_payments.iter().map(|e| &e.intent).collect();
        assert_eq!(
            intents[0],
            &ExtraPaymentIntent::Recurring {
                amount: Money::from_major(200),
                occurrences: None
            }
        );
        assert!(intents[1].is_lump_sum());
    }

    #[test]
    fn test_unparseable_value_is_rejected() {
        let state = ShareState::from_pairs([("la", "lots"), ("sd", "2025-01-01")]).unwrap();
        let err = state.into_inputs(&time()).unwrap_err();

        assert_eq!(
            err,
            CalculatorError::InvalidShareState {
                key: "la".to_string(),
                value: "lots".to_string()
            }
        );

        assert!(ShareState::from_pairs([("ep", "not json")]).is_err());
    }

    #[test]
    fn test_negative_count_is_field_error() {
        let state = ShareState {
            sd: Some("2025-01-01".to_string()),
            ep: vec![ExtraPaymentRecord {
                a: Some(100.0),
                c: Some(-2),
                ..record("recurring")
            }],
            ..Default::default()
        };

        let err = state.into_inputs(&time()).unwrap_err();
        assert_eq!(err.field_errors()[0].field, Field::Count);
    }

    #[test]
    fn test_unknown_record_type() {
        let state = ShareState {
            ep: vec![record("weekly")],
            ..Default::default()
        };
        assert!(matches!(
            state.into_inputs(&time()),
            Err(CalculatorError::InvalidShareState { .. })
        ));
    }

    #[test]
    fn test_encode_then_decode_keeps_inputs() {
        let inputs = LoanInputs::builder()
            .amount(Money::from_major(180_000))
            .rate_percent(dec!(4.25))
            .term_years(dec!(20))
            .frequency(PaymentFrequency::Weekly)
            .start_date(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap())
            .custom_total(Money::from_major(300))
            .lump_sum(Money::from_major(5_000), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
            .build()
            .unwrap();

        let state = ShareState::from_inputs(&inputs);
        assert_eq!(state.pf.as_deref(), Some("52"));
        assert_eq!(state.ep[0].ct, Some(300.0));

        let pairs = state.to_pairs();
        let decoded = ShareState::from_pairs(pairs).unwrap().into_inputs(&time()).unwrap();

        assert_eq!(decoded.loan_amount, inputs.loan_amount);
        assert_eq!(decoded.annual_rate_percent, inputs.annual_rate_percent);
        assert_eq!(decoded.start_date, inputs.start_date);
        let intents: Vec<_> = decoded.extra_payments.iter().map(|e| e.intent.clone()).collect();
        let expected: Vec<_> = inputs.extra_payments.iter().map(|e| e.intent.clone()).collect();
        assert_eq!(intents, expected);
    }
}
