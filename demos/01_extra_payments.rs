/// extra payments - recurring top-ups and a lump sum against the baseline
use mortgage_schedule_rs::chrono::NaiveDate;
use mortgage_schedule_rs::{
    CalculatorError, Decimal, LoanInputs, Money, MortgageCalculator, PaymentFrequency,
};

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    Ok(NaiveDate::from_ymd_opt(y, m, d).ok_or("bad date")?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== recurring extra plus lump sum ===\n");

    let inputs = LoanInputs::builder()
        .amount(Money::from_major(250_000))
        .rate_percent(Decimal::new(55, 1))
        .term_years(Decimal::from(25))
        .frequency(PaymentFrequency::Fortnightly)
        .start_date(date(2024, 3, 1)?)
        .first_payment_date(date(2024, 3, 15)?)
        .recurring(Money::from_major(100), None)
        .lump_sum(Money::from_major(15_000), date(2026, 7, 1)?)
        .build()?;

    let result = MortgageCalculator::calculate(&inputs)?;
    let summary = &result.summary;

    println!("scheduled payment: {:.2}", summary.scheduled_payment);
    println!("payments:          {} (baseline {})", summary.actual_payment_count, result.baseline.len());
    println!("extra paid:        {:.2}", summary.total_extra_paid);
    println!("interest saved:    {:.2}", summary.interest_saved);
    if let Some(saved) = summary.time_saved {
        println!("time saved:        {}", saved);
    }

    // rows with extra payment detail
    for row in result.schedule.iter().filter(|r| r.is_lump_sum()) {
        let details: Vec<String> = row.extra_details.iter().map(|d| d.to_string()).collect();
        println!(
            "row {} on {}: principal {:.2}, interest {:.2} [{}]",
            row.payment_number,
            row.payment_date,
            row.principal,
            row.interest,
            details.join(", ")
        );
    }

    println!("\n=== recurring and custom total cannot be combined ===\n");

    let conflicting = LoanInputs::builder()
        .amount(Money::from_major(250_000))
        .rate_percent(Decimal::new(55, 1))
        .term_years(Decimal::from(25))
        .start_date(date(2024, 3, 1)?)
        .recurring(Money::from_major(100), Some(12))
        .custom_total(Money::from_major(2_000))
        .build()?;

    match MortgageCalculator::calculate(&conflicting) {
        Err(CalculatorError::Conflict(conflict)) => println!("rejected: {}", conflict),
        other => println!("unexpected: {:?}", other.map(|r| r.summary)),
    }

    Ok(())
}
