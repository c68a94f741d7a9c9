/// share state - decode a shared calculation and encode it again
use chrono::{TimeZone, Utc};
use mortgage_schedule_rs::{MortgageCalculator, SafeTimeProvider, ShareState, TimeSource};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // pin "today" so a missing start date is reproducible
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    ));

    let state = ShareState::from_pairs([
        ("ir", "4.75"),
        ("lp", "30"),
        ("pf", "12"),
        ("pv", "520000"),
        ("po", "500000"),
        ("dp", "20"),
        ("dv", "100000"),
        ("ep", r#"[{"t":"custom","ct":2500},{"t":"lump","a":20000,"d":"2027-01-01"}]"#),
    ])?;

    let inputs = state.into_inputs(&time)?;
    println!("loan amount from offer and deposit: {:.2}", inputs.loan_amount);

    let result = MortgageCalculator::calculate(&inputs)?;
    println!("payments: {}", result.summary.actual_payment_count);

    if let Some(chart) = result.net_worth_chart() {
        for point in chart.with_extra.iter().step_by(5) {
            println!("{}: equity {:.0}", point.year, point.value);
        }
    }

    // encode back to link parameters
    for (key, value) in ShareState::from_inputs(&inputs).to_pairs() {
        println!("{}={}", key, value);
    }

    Ok(())
}
