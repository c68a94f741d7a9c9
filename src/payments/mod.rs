pub mod amortization;
pub mod overpayment;
pub mod schedule;

pub use amortization::{compound_factor, PaymentAmountSolver};
pub use overpayment::{
    ExtraComponent, ExtraPaymentEntry, ExtraPaymentIntent, ExtraPaymentPlan, ExtraPayments,
    LumpSumEvent, PlanValidator, RecurringCounter,
};
pub use schedule::{generate_schedule, PaymentLedgerEntry, Schedule, ScheduleGenerator};
