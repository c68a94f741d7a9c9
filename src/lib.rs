pub mod calculator;
pub mod chart;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod interest;
pub mod payments;
pub mod share;
pub mod summary;
pub mod types;

// re-export key types
pub use calculator::{CalculationResult, MortgageCalculator};
pub use chart::{ChartPoint, ChartSeries};
pub use config::{LoanInputs, LoanInputsBuilder, PropertyDetails, MAX_TOTAL_PERIODS};
pub use decimal::{Money, Rate};
pub use errors::{CalculatorError, ConflictError, Field, FieldError, Result, ValidationErrors};
pub use interest::{accrued_rate_for_days, periodic_rate, AccrualEngine};
pub use payments::{
    generate_schedule, ExtraComponent, ExtraPaymentIntent, ExtraPaymentPlan, ExtraPayments,
    PaymentAmountSolver, PaymentLedgerEntry, Schedule, ScheduleGenerator,
};
pub use share::{ExtraPaymentRecord, ShareState};
pub use summary::{Summary, SummaryCalculator, TimeSaved};
pub use types::{AccrualMode, EntryId, PaymentFrequency, RowKind};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
