use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};

use crate::config::LoanInputs;
use crate::decimal::{Money, Rate};
use crate::errors::{CalculatorError, Result};

/// fixed periodic payment for a fully amortizing loan
pub struct PaymentAmountSolver;

impl PaymentAmountSolver {
    /// scheduled payment for the loan described by `inputs`
    pub fn for_inputs(inputs: &LoanInputs) -> Result<Money> {
        Self::scheduled_payment(inputs.loan_amount, inputs.periodic_rate(), inputs.total_periods())
    }

    /// scheduled payment for `total_periods` (possibly fractional) periods
    ///
    /// PMT = P * r * (1 + r)^n / ((1 + r)^n - 1), or P / n when r is zero.
    pub fn scheduled_payment(
        principal: Money,
        periodic_rate: Rate,
        total_periods: Decimal,
    ) -> Result<Money> {
        if total_periods <= Decimal::ZERO {
            return Err(CalculatorError::computation(format!(
                "total payment periods must be positive, got {}",
                total_periods
            )));
        }

        let r = periodic_rate.as_decimal();
        if r.is_zero() {
            return Ok(Money::from_decimal(principal.as_decimal() / total_periods));
        }

        let p = principal.as_decimal();
        let payment = match compound_factor(r, total_periods) {
            Some(compound) => compound
                .checked_div(compound - Decimal::ONE)
                .and_then(|ratio| p.checked_mul(r)?.checked_mul(ratio)),
            // (1 + r)^n beyond the decimal range: the payment has converged to P * r
            None => p.checked_mul(r),
        }
        .ok_or_else(|| CalculatorError::computation("scheduled payment overflow"))?;

        Ok(Money::from_decimal(payment))
    }
}

/// (1 + r)^n, or `None` when it overflows
///
/// whole periods compound by repeated multiplication; a fractional remainder
/// uses a decimal power.
pub fn compound_factor(rate: Decimal, periods: Decimal) -> Option<Decimal> {
    let base = Decimal::ONE + rate;
    let whole = periods.trunc();
    let fraction = periods - whole;

    let mut compound = Decimal::ONE;
    for _ in 0..whole.to_u32()? {
        compound = compound.checked_mul(base)?;
    }

    if !fraction.is_zero() {
        compound = compound.checked_mul(base.checked_powd(fraction)?)?;
    }

    Some(compound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_thirty_year_mortgage_payment() {
        let payment = PaymentAmountSolver::scheduled_payment(
            Money::from_major(300_000),
            Rate::from_decimal(dec!(0.005)),
            dec!(360),
        )
        .unwrap();

        assert_eq!(payment.round_dp(2), Money::from_minor(179865, 2));
    }

    #[test]
    fn test_one_year_monthly_payment() {
        let payment = PaymentAmountSolver::scheduled_payment(
            Money::from_major(100_000),
            Rate::from_decimal(dec!(0.01)),
            dec!(12),
        )
        .unwrap();

        assert_eq!(payment.round_dp(2), Money::from_minor(888488, 2));
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let payment = PaymentAmountSolver::scheduled_payment(
            Money::from_major(12_000),
            Rate::ZERO,
            dec!(12),
        )
        .unwrap();

        assert_eq!(payment, Money::from_major(1_000));
    }

    #[test]
    fn test_fractional_period_count() {
        let payment = PaymentAmountSolver::scheduled_payment(
            Money::from_major(1_000),
            Rate::from_decimal(dec!(0.01)),
            dec!(2.5),
        )
        .unwrap();

        // 407.0174...
        assert!((payment - Money::from_minor(40702, 2)).abs() < Money::from_minor(1, 2));
    }

    #[test]
    fn test_overflowing_factor_converges() {
        // 2^100 is outside the decimal range
        let payment = PaymentAmountSolver::scheduled_payment(
            Money::from_major(50_000),
            Rate::ONE,
            dec!(100),
        )
        .unwrap();

        assert_eq!(payment, Money::from_major(50_000));
    }

    #[test]
    fn test_zero_periods_is_computation_error() {
        let err = PaymentAmountSolver::scheduled_payment(
            Money::from_major(1_000),
            Rate::from_percentage(5),
            Decimal::ZERO,
        )
        .unwrap_err();

        assert!(matches!(err, CalculatorError::Computation { .. }));
    }

    #[test]
    fn test_compound_factor_whole_periods() {
        assert_eq!(compound_factor(dec!(0.1), dec!(2)), Some(dec!(1.21)));
        assert_eq!(compound_factor(dec!(0.1), Decimal::ZERO), Some(Decimal::ONE));
    }
}
