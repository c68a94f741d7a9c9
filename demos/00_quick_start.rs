/// quick start - minimal example to get started
use mortgage_schedule_rs::chrono::NaiveDate;
use mortgage_schedule_rs::{Decimal, LoanInputs, Money, MortgageCalculator};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // a $300,000 mortgage at 6% over 30 years, paid monthly
    let inputs = LoanInputs::builder()
        .amount(Money::from_major(300_000))
        .rate_percent(Decimal::from(6))
        .term_years(Decimal::from(30))
        .start_date(NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?)
        .build()?;

    let result = MortgageCalculator::calculate(&inputs)?;

    println!("scheduled payment: {:.2}", result.scheduled_payment);
    println!("total interest:    {:.2}", result.summary.total_interest);
    println!("payments:          {}", result.summary.actual_payment_count);

    Ok(())
}
