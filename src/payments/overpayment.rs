use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{
    CalculatorError, ConflictError, Field, FieldError, Result, ValidationErrors,
};
use crate::types::EntryId;

/// a user-requested extra payment strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtraPaymentIntent {
    /// fixed top-up on every scheduled payment, optionally for a limited count
    Recurring {
        amount: Money,
        /// `None` or `Some(0)` means every remaining payment
        occurrences: Option<u32>,
    },
    /// pay this total each period instead of the scheduled amount
    CustomTotal { total_per_payment: Money },
    /// one-off payment on a specific date
    LumpSum {
        amount: Money,
        date: Option<NaiveDate>,
    },
}

impl ExtraPaymentIntent {
    pub fn is_recurring(&self) -> bool {
        matches!(self, ExtraPaymentIntent::Recurring { .. })
    }

    pub fn is_custom_total(&self) -> bool {
        matches!(self, ExtraPaymentIntent::CustomTotal { .. })
    }

    pub fn is_lump_sum(&self) -> bool {
        matches!(self, ExtraPaymentIntent::LumpSum { .. })
    }
}

/// extra payment intent with its stable identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraPaymentEntry {
    pub id: EntryId,
    pub intent: ExtraPaymentIntent,
}

/// ordered extra payment entries, addressable by entry id
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraPayments {
    entries: Vec<ExtraPaymentEntry>,
}

impl ExtraPayments {
    pub fn new() -> Self {
        Self::default()
    }

    /// append an intent under a fresh id
    pub fn push(&mut self, intent: ExtraPaymentIntent) -> EntryId {
        let id = Uuid::new_v4();
        self.entries.push(ExtraPaymentEntry { id, intent });
        id
    }

    pub fn get(&self, id: EntryId) -> Option<&ExtraPaymentIntent> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.intent)
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut ExtraPaymentIntent> {
        self.entries.iter_mut().find(|e| e.id == id).map(|e| &mut e.intent)
    }

    pub fn remove(&mut self, id: EntryId) -> Option<ExtraPaymentIntent> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index).intent)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtraPaymentEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// true if any entry other than `exclude` is recurring
    pub fn has_recurring(&self, exclude: Option<EntryId>) -> bool {
        self.entries
            .iter()
            .any(|e| Some(e.id) != exclude && e.intent.is_recurring())
    }

    /// true if any entry other than `exclude` is a custom total
    pub fn has_custom_total(&self, exclude: Option<EntryId>) -> bool {
        self.entries
            .iter()
            .any(|e| Some(e.id) != exclude && e.intent.is_custom_total())
    }

    pub fn has_lump_sums(&self) -> bool {
        self.entries.iter().any(|e| e.intent.is_lump_sum())
    }

    /// recurring and custom-total entries cannot be combined
    pub fn has_conflict(&self) -> bool {
        self.has_recurring(None) && self.has_custom_total(None)
    }
}

impl<'a> IntoIterator for &'a ExtraPayments {
    type Item = &'a ExtraPaymentEntry;
    type IntoIter = std::slice::Iter<'a, ExtraPaymentEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<ExtraPaymentIntent> for ExtraPayments {
    fn from_iter<I: IntoIterator<Item = ExtraPaymentIntent>>(iter: I) -> Self {
        let mut payments = ExtraPayments::new();
        for intent in iter {
            payments.push(intent);
        }
        payments
    }
}

/// validation context for an extra payment plan
///
/// carries the loan facts the per-entry checks depend on plus the type flags
/// and errors gathered so far.
#[derive(Debug)]
pub struct PlanValidator {
    start_date: NaiveDate,
    scheduled_payment: Option<Money>,
    has_recurring: bool,
    has_custom_total: bool,
    errors: ValidationErrors,
}

impl PlanValidator {
    pub fn new(start_date: NaiveDate, scheduled_payment: Option<Money>) -> Self {
        Self {
            start_date,
            scheduled_payment,
            has_recurring: false,
            has_custom_total: false,
            errors: ValidationErrors::new(),
        }
    }

    /// continue from errors already found on the loan fields
    pub fn with_errors(mut self, errors: ValidationErrors) -> Self {
        self.errors = errors;
        self
    }

    /// check the plan, returning every field error or the plan-level conflict
    pub fn check(mut self, payments: &ExtraPayments) -> Result<()> {
        self.has_recurring = payments.has_recurring(None);
        self.has_custom_total = payments.has_custom_total(None);

        if self.has_recurring && self.has_custom_total {
            return Err(CalculatorError::Conflict(ConflictError {
                field_errors: self.errors.errors,
            }));
        }

        for entry in payments {
            self.check_entry(entry);
        }

        self.errors.into_result()
    }

    fn check_entry(&mut self, entry: &ExtraPaymentEntry) {
        let id = entry.id;
        match &entry.intent {
            ExtraPaymentIntent::Recurring { amount, .. } => {
                if !amount.is_positive() {
                    self.errors.push(FieldError::for_entry(
                        id,
                        Field::Amount,
                        "Please enter a valid extra payment amount greater than 0.",
                    ));
                }
            }
            ExtraPaymentIntent::CustomTotal { total_per_payment } => {
                if !total_per_payment.is_positive() {
                    self.errors.push(FieldError::for_entry(
                        id,
                        Field::CustomTotal,
                        "Please enter a valid custom total payment greater than 0.",
                    ));
                } else if let Some(scheduled) = self.scheduled_payment {
                    if *total_per_payment <= scheduled {
                        self.errors.push(FieldError::for_entry(
                            id,
                            Field::CustomTotal,
                            format!(
                                "Custom total payment must be greater than the scheduled payment (${:.2}).",
                                scheduled
                            ),
                        ));
                    }
                }
            }
            ExtraPaymentIntent::LumpSum { amount, date } => {
                if !amount.is_positive() {
                    self.errors.push(FieldError::for_entry(
                        id,
                        Field::LumpAmount,
                        "Please enter a valid lump sum amount greater than 0.",
                    ));
                }
                match date {
                    None => self.errors.push(FieldError::for_entry(
                        id,
                        Field::LumpDate,
                        "Please select a lump sum payment date.",
                    )),
                    Some(date) if *date < self.start_date => {
                        self.errors.push(FieldError::for_entry(
                            id,
                            Field::LumpDate,
                            "Lump sum date cannot be before the loan start date.",
                        ))
                    }
                    Some(_) => {}
                }
            }
        }
    }
}

/// source of the extra amount on a ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "amount", rename_all = "snake_case")]
pub enum ExtraComponent {
    Recurring(Money),
    CustomTotal(Money),
    /// extra left after the final payment was clamped to the balance
    Adjusted(Money),
    LumpSum(Money),
}

impl ExtraComponent {
    pub fn amount(&self) -> Money {
        match self {
            ExtraComponent::Recurring(m)
            | ExtraComponent::CustomTotal(m)
            | ExtraComponent::Adjusted(m)
            | ExtraComponent::LumpSum(m) => *m,
        }
    }
}

impl fmt::Display for ExtraComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExtraComponent::Recurring(_) => "Recurring",
            ExtraComponent::CustomTotal(_) => "Custom Total",
            ExtraComponent::Adjusted(_) => "Adjusted Extra",
            ExtraComponent::LumpSum(_) => "Lump Sum",
        };
        write!(f, "{}: +${:.2}", label, self.amount())
    }
}

/// remaining occurrences of one recurring extra
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringCounter {
    pub entry: EntryId,
    pub amount: Money,
    /// `None` is unlimited
    pub remaining: Option<u32>,
}

impl RecurringCounter {
    /// amount for the next payment, consuming one occurrence
    fn take(&mut self) -> Option<Money> {
        match self.remaining {
            None => Some(self.amount),
            Some(0) => None,
            Some(n) => {
                self.remaining = Some(n - 1);
                Some(self.amount)
            }
        }
    }
}

/// date-anchored lump sum outside the periodic cadence
#[derive(Debug, Clone, PartialEq)]
pub struct LumpSumEvent {
    pub entry: EntryId,
    pub date: NaiveDate,
    pub amount: Money,
}

/// extra payment intents normalized for one schedule run
///
/// recurring counters are consumed as periodic rows are emitted, so a plan is
/// single use.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtraPaymentPlan {
    recurring: Vec<RecurringCounter>,
    custom_extras: Vec<Money>,
    lump_sums: Vec<LumpSumEvent>,
}

impl ExtraPaymentPlan {
    /// plan with no extra payments (baseline runs)
    pub fn empty() -> Self {
        Self::default()
    }

    /// normalize the entries, rejecting recurring mixed with custom total
    pub fn build(payments: &ExtraPayments, scheduled_payment: Money) -> Result<Self> {
        if payments.has_conflict() {
            return Err(CalculatorError::Conflict(ConflictError::default()));
        }
        Ok(Self::build_unchecked(payments, scheduled_payment))
    }

    /// normalize without the conflict check; custom totals then take precedence
    pub fn build_unchecked(payments: &ExtraPayments, scheduled_payment: Money) -> Self {
        let mut plan = Self::empty();

        for entry in payments {
            match &entry.intent {
                ExtraPaymentIntent::Recurring { amount, occurrences } => {
                    if !amount.is_positive() {
                        warn!("ignoring recurring extra {} with non-positive amount", entry.id);
                        continue;
                    }
                    plan.recurring.push(RecurringCounter {
                        entry: entry.id,
                        amount: *amount,
                        remaining: occurrences.filter(|n| *n > 0),
                    });
                }
                ExtraPaymentIntent::CustomTotal { total_per_payment } => {
                    if !total_per_payment.is_positive() {
                        warn!("ignoring custom total {} with non-positive amount", entry.id);
                        continue;
                    }
                    plan.custom_extras
                        .push((*total_per_payment - scheduled_payment).max(Money::ZERO));
                }
                ExtraPaymentIntent::LumpSum { amount, date } => match date {
                    Some(date) if amount.is_positive() => plan.lump_sums.push(LumpSumEvent {
                        entry: entry.id,
                        date: *date,
                        amount: *amount,
                    }),
                    _ => warn!("ignoring lump sum {} without a positive amount and date", entry.id),
                },
            }
        }

        if !plan.recurring.is_empty() && !plan.custom_extras.is_empty() {
            warn!("custom total payments present; recurring extras will not be applied");
        }

        plan
    }

    pub fn lump_sums(&self) -> &[LumpSumEvent] {
        &self.lump_sums
    }

    pub fn has_lump_sums(&self) -> bool {
        !self.lump_sums.is_empty()
    }

    pub fn recurring_counters(&self) -> &[RecurringCounter] {
        &self.recurring
    }

    /// extra amount for the next periodic row and its breakdown
    pub fn next_periodic_extra(&mut self) -> (Money, Vec<ExtraComponent>) {
        let mut extra = Money::ZERO;
        let mut details = Vec::new();

        if !self.custom_extras.is_empty() {
            for custom in self.custom_extras.iter().filter(|m| m.is_positive()) {
                extra += *custom;
                details.push(ExtraComponent::CustomTotal(*custom));
            }
        } else {
            for counter in self.recurring.iter_mut() {
                if let Some(amount) = counter.take() {
                    extra += amount;
                    details.push(ExtraComponent::Recurring(amount));
                }
            }
        }

        (extra, details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn recurring(amount: i64, occurrences: Option<u32>) -> ExtraPaymentIntent {
        ExtraPaymentIntent::Recurring {
            amount: Money::from_major(amount),
            occurrences,
        }
    }

    fn custom(total: i64) -> ExtraPaymentIntent {
        ExtraPaymentIntent::CustomTotal {
            total_per_payment: Money::from_major(total),
        }
    }

    #[test]
    fn test_entries_indexed_by_id() {
        let mut payments = ExtraPayments::new();
        let first = payments.push(recurring(100, None));
        let second = payments.push(ExtraPaymentIntent::LumpSum {
            amount: Money::from_major(5_000),
            date: Some(date(2024, 6, 1)),
        });

        assert_eq!(payments.len(), 2);
        assert!(payments.get(second).unwrap().is_lump_sum());

        if let Some(ExtraPaymentIntent::Recurring { amount, .. }) = payments.get_mut(first) {
            *amount = Money::from_major(150);
        }
        assert_eq!(payments.get(first), Some(&recurring(150, None)));

        assert!(payments.remove(first).is_some());
        assert!(payments.get(first).is_none());
        assert_eq!(payments.len(), 1);
    }

    #[test]
    fn test_conflict_detection_with_exclusion() {
        let mut payments = ExtraPayments::new();
        let rec = payments.push(recurring(100, None));
        payments.push(custom(2_000));

        assert!(payments.has_conflict());
        // switching the recurring entry's type would not conflict with itself
        assert!(!payments.has_recurring(Some(rec)));
    }

    #[test]
    fn test_build_rejects_conflict() {
        let payments: ExtraPayments = vec![recurring(100, None), custom(2_000)].into_iter().collect();
        let err = ExtraPaymentPlan::build(&payments, Money::from_major(1_500)).unwrap_err();
        assert!(matches!(err, CalculatorError::Conflict(_)));
    }

    #[test]
    fn test_recurring_counter_limits() {
        let payments: ExtraPayments =
            vec![recurring(100, Some(2)), recurring(50, Some(0))].into_iter().collect();
        let mut plan = ExtraPaymentPlan::build(&payments, Money::from_major(1_000)).unwrap();

        assert_eq!(plan.next_periodic_extra().0, Money::from_major(150));
        assert_eq!(plan.next_periodic_extra().0, Money::from_major(150));
        // the limited counter is exhausted, the zero-count one is unlimited
        let (extra, details) = plan.next_periodic_extra();
        assert_eq!(extra, Money::from_major(50));
        assert_eq!(details, vec![ExtraComponent::Recurring(Money::from_major(50))]);
    }

    #[test]
    fn test_custom_totals_are_additive() {
        let payments: ExtraPayments = vec![custom(1_200), custom(1_100)].into_iter().collect();
        let mut plan = ExtraPaymentPlan::build(&payments, Money::from_major(1_000)).unwrap();

        let (extra, details) = plan.next_periodic_extra();
        assert_eq!(extra, Money::from_major(300));
        assert_eq!(details.len(), 2);
    }

    #[test]
    fn test_custom_total_takes_precedence_when_unchecked() {
        let payments: ExtraPayments = vec![recurring(100, Some(3)), custom(1_250)].into_iter().collect();
        let mut plan = ExtraPaymentPlan::build_unchecked(&payments, Money::from_major(1_000));

        let (extra, details) = plan.next_periodic_extra();
        assert_eq!(extra, Money::from_major(250));
        assert_eq!(details, vec![ExtraComponent::CustomTotal(Money::from_major(250))]);
        // recurring counters were never consumed
        assert_eq!(plan.recurring_counters()[0].remaining, Some(3));
    }

    #[test]
    fn test_lump_sums_stay_out_of_periodic_extra() {
        let payments: ExtraPayments = vec![
            ExtraPaymentIntent::LumpSum {
                amount: Money::from_major(10_000),
                date: Some(date(2024, 2, 15)),
            },
            ExtraPaymentIntent::LumpSum {
                amount: Money::from_major(1_000),
                date: None,
            },
        ]
        .into_iter()
        .collect();
        let mut plan = ExtraPaymentPlan::build(&payments, Money::from_major(1_000)).unwrap();

        assert_eq!(plan.lump_sums().len(), 1);
        assert_eq!(plan.next_periodic_extra().0, Money::ZERO);
    }

    #[test]
    fn test_validator_collects_entry_errors() {
        let payments: ExtraPayments = vec![
            recurring(0, None),
            ExtraPaymentIntent::LumpSum {
                amount: Money::ZERO,
                date: Some(date(2023, 12, 31)),
            },
            ExtraPaymentIntent::LumpSum {
                amount: Money::from_major(10),
                date: None,
            },
        ]
        .into_iter()
        .collect();

        let err = PlanValidator::new(date(2024, 1, 1), Some(Money::from_major(1_000)))
            .check(&payments)
            .unwrap_err();

        let fields: Vec<Field> = err.field_errors().iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![Field::Amount, Field::LumpAmount, Field::LumpDate, Field::LumpDate]
        );
    }

    #[test]
    fn test_validator_custom_total_must_exceed_scheduled() {
        let payments: ExtraPayments = vec![custom(1_798)].into_iter().collect();
        let err = PlanValidator::new(date(2024, 1, 1), Some(Money::from_str_exact("1798.65").unwrap()))
            .check(&payments)
            .unwrap_err();

        assert_eq!(
            err.field_errors()[0].message,
            "Custom total payment must be greater than the scheduled payment ($1798.65)."
        );
    }

    #[test]
    fn test_validator_conflict_short_circuits_entries() {
        let payments: ExtraPayments = vec![recurring(0, None), custom(0)].into_iter().collect();
        let mut loan_errors = ValidationErrors::new();
        loan_errors.push(FieldError::new(Field::LoanAmount, "bad"));

        let err = PlanValidator::new(date(2024, 1, 1), None)
            .with_errors(loan_errors)
            .check(&payments)
            .unwrap_err();

        match err {
            CalculatorError::Conflict(conflict) => {
                // only the loan field error, none of the entry errors
                assert_eq!(conflict.field_errors.len(), 1);
                assert_eq!(conflict.field_errors[0].field, Field::LoanAmount);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_component_display() {
        let c = ExtraComponent::LumpSum(Money::from_major(10_000));
        assert_eq!(c.to_string(), "Lump Sum: +$10000.00");
    }
}
