use chrono::{Duration, NaiveDate};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::config::{LoanInputs, MAX_TOTAL_PERIODS};
use crate::decimal::{Money, Rate};
use crate::errors::{CalculatorError, Result};
use crate::interest::AccrualEngine;
use crate::payments::amortization::PaymentAmountSolver;
use crate::payments::overpayment::{ExtraComponent, ExtraPaymentPlan, LumpSumEvent};
use crate::types::RowKind;

/// one row of the amortization schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLedgerEntry {
    /// 1-based, counts lump sum rows too
    pub payment_number: u32,
    pub payment_date: NaiveDate,
    pub kind: RowKind,
    pub beginning_balance: Money,
    pub scheduled_payment: Money,
    pub extra_payment: Money,
    pub extra_details: Vec<ExtraComponent>,
    pub total_payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub ending_balance: Money,
    pub cumulative_interest: Money,
}

impl PaymentLedgerEntry {
    pub fn is_lump_sum(&self) -> bool {
        self.kind == RowKind::LumpSum
    }
}

/// ordered ledger rows for one calculation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    pub rows: Vec<PaymentLedgerEntry>,
}

impl Schedule {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&PaymentLedgerEntry> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&PaymentLedgerEntry> {
        self.rows.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaymentLedgerEntry> {
        self.rows.iter()
    }

    /// cumulative interest of the final row
    pub fn total_interest(&self) -> Money {
        self.last().map(|r| r.cumulative_interest).unwrap_or(Money::ZERO)
    }

    pub fn total_extra_paid(&self) -> Money {
        self.rows.iter().map(|r| r.extra_payment).sum()
    }

    pub fn total_principal(&self) -> Money {
        self.rows.iter().map(|r| r.principal).sum()
    }

    pub fn payoff_date(&self) -> Option<NaiveDate> {
        self.last().map(|r| r.payment_date)
    }

    pub fn final_balance(&self) -> Option<Money> {
        self.last().map(|r| r.ending_balance)
    }
}

/// cash event on the payment timeline
#[derive(Debug, Clone)]
enum TimelineEvent {
    Periodic(NaiveDate),
    LumpSum(LumpSumEvent),
}

impl TimelineEvent {
    fn date(&self) -> NaiveDate {
        match self {
            TimelineEvent::Periodic(date) => *date,
            TimelineEvent::LumpSum(lump) => lump.date,
        }
    }
}

/// running state while the timeline is replayed
struct Ledger {
    balance: Money,
    cumulative_interest: Money,
    last_date: NaiveDate,
    rows: Vec<PaymentLedgerEntry>,
}

impl Ledger {
    fn new(principal: Money, start_date: NaiveDate) -> Self {
        Self {
            balance: principal,
            cumulative_interest: Money::ZERO,
            last_date: start_date,
            rows: Vec::new(),
        }
    }

    fn is_paid_off(&self) -> bool {
        self.balance.is_paid_off()
    }

    fn record(&mut self, kind: RowKind, payment_date: NaiveDate, amounts: RowAmounts) {
        let RowAmounts {
            scheduled_payment,
            extra_payment,
            extra_details,
            total_payment,
            principal,
            interest,
        } = amounts;
        let beginning_balance = self.balance;
        self.balance = beginning_balance - principal;
        self.cumulative_interest += interest;
        self.last_date = payment_date;

        let row = PaymentLedgerEntry {
            payment_number: self.rows.len() as u32 + 1,
            payment_date,
            kind,
            beginning_balance,
            scheduled_payment,
            extra_payment,
            extra_details,
            total_payment,
            principal,
            interest,
            ending_balance: self.balance,
            cumulative_interest: self.cumulative_interest,
        };

        trace!(
            "row {} {} {:?}: principal {:.2} interest {:.2} balance {:.2}",
            row.payment_number,
            row.payment_date,
            row.kind,
            row.principal,
            row.interest,
            row.ending_balance
        );

        self.rows.push(row);
    }
}

/// cash split of one row; a lump row pays its full amount even when
/// only part of it is needed to clear the balance
struct RowAmounts {
    scheduled_payment: Money,
    extra_payment: Money,
    extra_details: Vec<ExtraComponent>,
    total_payment: Money,
    principal: Money,
    interest: Money,
}

/// builds the ledger for one set of loan inputs
pub struct ScheduleGenerator<'a> {
    inputs: &'a LoanInputs,
    scheduled_payment: Money,
    periodic_rate: Rate,
    accrual: AccrualEngine,
    plan: ExtraPaymentPlan,
}

impl<'a> ScheduleGenerator<'a> {
    /// generator for the inputs' own extra payments
    ///
    /// rejects recurring extras mixed with custom totals.
    pub fn new(inputs: &'a LoanInputs, scheduled_payment: Money) -> Result<Self> {
        let plan = ExtraPaymentPlan::build(&inputs.extra_payments, scheduled_payment)?;
        Ok(Self::with_plan(inputs, scheduled_payment, plan))
    }

    /// generator over an already normalized plan
    pub fn with_plan(inputs: &'a LoanInputs, scheduled_payment: Money, plan: ExtraPaymentPlan) -> Self {
        Self {
            inputs,
            scheduled_payment,
            periodic_rate: inputs.periodic_rate(),
            accrual: AccrualEngine::new(inputs.accrual_mode),
            plan,
        }
    }

    /// replay the payment timeline until payoff or the end of the term
    pub fn generate(mut self) -> Result<Schedule> {
        let events = self.timeline()?;

        debug!(
            "generating schedule: principal {:.2}, payment {:.2}, {} events",
            self.inputs.loan_amount,
            self.scheduled_payment,
            events.len()
        );

        let mut ledger = Ledger::new(self.inputs.loan_amount, self.inputs.start_date);
        let mut events = events.into_iter();

        for event in events.by_ref() {
            match event {
                TimelineEvent::Periodic(date) => self.periodic_row(&mut ledger, date),
                TimelineEvent::LumpSum(lump) => self.lump_sum_row(&mut ledger, &lump),
            }

            if ledger.is_paid_off() {
                debug!(
                    "loan paid off on {} after {} rows",
                    ledger.last_date,
                    ledger.rows.len()
                );
                break;
            }
        }

        for event in events {
            if let TimelineEvent::LumpSum(lump) = event {
                warn!(
                    "lump sum {} of {:.2} on {} falls after payoff and was not applied",
                    lump.entry, lump.amount, lump.date
                );
            }
        }

        Ok(Schedule { rows: ledger.rows })
    }

    /// periodic payment dates merged with lump sums in date order
    fn timeline(&self) -> Result<Vec<TimelineEvent>> {
        let periods = self.inputs.periodic_row_count();
        if periods > MAX_TOTAL_PERIODS {
            return Err(CalculatorError::computation(format!(
                "{} payment periods exceeds the limit of {}",
                periods, MAX_TOTAL_PERIODS
            )));
        }
        if periods == 0 {
            return Err(CalculatorError::computation(
                "loan term does not cover a single payment period",
            ));
        }

        let step = self.inputs.frequency().period_step_days();
        let mut events = Vec::with_capacity(periods as usize + self.plan.lump_sums().len());
        for n in 0..i64::from(periods) {
            let date = self
                .inputs
                .first_payment_date
                .checked_add_signed(Duration::days(n * step))
                .ok_or_else(|| CalculatorError::computation("payment date out of range"))?;
            events.push(TimelineEvent::Periodic(date));
        }

        if self.plan.has_lump_sums() {
            events.extend(self.plan.lump_sums().iter().cloned().map(TimelineEvent::LumpSum));
            // stable: periodic rows stay ahead of lump sums on the same date
            events.sort_by_key(TimelineEvent::date);
        }

        Ok(events)
    }

    fn periodic_row(&mut self, ledger: &mut Ledger, date: NaiveDate) {
        let interest = ledger.balance.interest_at(self.periodic_rate);
        let (mut extra, mut details) = self.plan.next_periodic_extra();
        let mut scheduled = self.scheduled_payment;
        let mut principal = scheduled + extra - interest;

        if principal > ledger.balance {
            principal = ledger.balance;
            let total = principal + interest;
            let adjusted = (total - scheduled).max(Money::ZERO);

            if adjusted != extra {
                details = if adjusted.is_positive() {
                    vec![ExtraComponent::Adjusted(adjusted)]
                } else {
                    Vec::new()
                };
            }
            if adjusted.is_zero() {
                scheduled = total;
            }
            extra = adjusted;
        }

        ledger.record(
            RowKind::Scheduled,
            date,
            RowAmounts {
                scheduled_payment: scheduled,
                extra_payment: extra,
                extra_details: details,
                total_payment: principal + interest,
                principal,
                interest,
            },
        );
    }

    fn lump_sum_row(&self, ledger: &mut Ledger, lump: &LumpSumEvent) {
        let accrued = self.accrual.accrue(
            ledger.balance,
            self.inputs.annual_rate(),
            ledger.last_date,
            lump.date,
        );
        let principal = (lump.amount - accrued.interest_amount).min(ledger.balance);

        trace!(
            "lump sum {} accrued {} days at {}",
            lump.entry,
            accrued.days,
            accrued.rate
        );

        ledger.record(
            RowKind::LumpSum,
            lump.date,
            RowAmounts {
                scheduled_payment: Money::ZERO,
                extra_payment: lump.amount,
                extra_details: vec![ExtraComponent::LumpSum(lump.amount)],
                total_payment: lump.amount,
                principal,
                interest: accrued.interest_amount,
            },
        );
    }
}

/// schedule for the inputs using their own scheduled payment
pub fn generate_schedule(inputs: &LoanInputs) -> Result<Schedule> {
    let scheduled_payment = PaymentAmountSolver::for_inputs(inputs)?;
    ScheduleGenerator::new(inputs, scheduled_payment)?.generate()
}
