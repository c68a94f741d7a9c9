use std::fs;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use log::info;

use mortgage_schedule_rs::{
    AccrualMode, CalculationResult, Decimal, LoanInputs, Money, MortgageCalculator,
    SafeTimeProvider, ShareState, TimeSource,
};

/// Mortgage amortization schedules with extra payments
#[derive(Parser, Debug)]
#[command(name = "mortgage-calc", version, about)]
struct Cli {
    /// loan amount
    #[arg(long)]
    amount: Option<Decimal>,

    /// annual interest rate in percent
    #[arg(long)]
    rate: Option<Decimal>,

    /// loan term in years (may be fractional)
    #[arg(long)]
    years: Option<Decimal>,

    /// payments per year: 52, 26, 12 or 1
    #[arg(long, default_value_t = 12)]
    payments_per_year: u32,

    /// interest accrual for lump sums: daily, monthly or yearly
    #[arg(long, default_value = "daily")]
    accrual: String,

    /// loan start date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    start: Option<NaiveDate>,

    /// first payment date (YYYY-MM-DD), defaults to the start date
    #[arg(long)]
    first_payment: Option<NaiveDate>,

    #[arg(long)]
    property_value: Option<Decimal>,

    #[arg(long)]
    property_offer: Option<Decimal>,

    #[arg(long)]
    deposit_value: Option<Decimal>,

    #[arg(long)]
    deposit_percentage: Option<Decimal>,

    /// recurring extra as AMOUNT or AMOUNTxCOUNT, repeatable
    #[arg(long, value_name = "AMOUNT[xCOUNT]")]
    recurring: Vec<String>,

    /// custom total per payment, repeatable
    #[arg(long)]
    custom_total: Vec<Decimal>,

    /// lump sum as AMOUNT@YYYY-MM-DD, repeatable
    #[arg(long, value_name = "AMOUNT@DATE")]
    lump: Vec<String>,

    /// read inputs from a share state JSON file instead of flags
    #[arg(long, value_name = "FILE")]
    share: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Summary,
    Table,
    Json,
    Csv,
}

fn money(value: Decimal) -> Money {
    Money::from_decimal(value)
}

/// `200` or `200x12`
fn parse_recurring(raw: &str) -> anyhow::Result<(Money, Option<u32>)> {
    let (amount, count) = match raw.split_once(['x', 'X']) {
        Some((amount, count)) => (amount, Some(count)),
        None => (raw, None),
    };
    let amount = Money::from_str(amount).map_err(|e| anyhow!("invalid recurring amount `{raw}`: {e}"))?;
    let count = count
        .map(|c| c.trim().parse::<u32>())
        .transpose()
        .with_context(|| format!("invalid recurring count `{raw}`"))?;
    Ok((amount, count.filter(|c| *c > 0)))
}

/// `10000@2026-01-15`
fn parse_lump(raw: &str) -> anyhow::Result<(Money, NaiveDate)> {
    let Some((amount, date)) = raw.split_once('@') else {
        bail!("lump sum `{raw}` must look like AMOUNT@YYYY-MM-DD");
    };
    let amount = Money::from_str(amount).map_err(|e| anyhow!("invalid lump amount `{raw}`: {e}"))?;
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid lump date `{raw}`"))?;
    Ok((amount, date))
}

fn inputs_from_flags(cli: &Cli, time: &SafeTimeProvider) -> anyhow::Result<LoanInputs> {
    let mut builder = LoanInputs::builder()
        .set_time(time)
        .payments_per_year(cli.payments_per_year)
        .accrual(AccrualMode::parse_lenient(&cli.accrual));

    if let Some(amount) = cli.amount {
        builder = builder.amount(money(amount));
    }
    if let Some(rate) = cli.rate {
        builder = builder.rate_percent(rate);
    }
    if let Some(years) = cli.years {
        builder = builder.term_years(years);
    }
    if let Some(start) = cli.start {
        builder = builder.start_date(start);
    }
    if let Some(first) = cli.first_payment {
        builder = builder.first_payment_date(first);
    }
    if let Some(value) = cli.property_value {
        builder = builder.property_value(money(value));
    }
    if let Some(offer) = cli.property_offer {
        builder = builder.property_offer(money(offer));
    }
    if let Some(deposit) = cli.deposit_value {
        builder = builder.deposit_value(money(deposit));
    }
    if let Some(pct) = cli.deposit_percentage {
        builder = builder.deposit_percentage(pct);
    }

    for raw in &cli.recurring {
        let (amount, count) = parse_recurring(raw)?;
        builder = builder.recurring(amount, count);
    }
    for total in &cli.custom_total {
        builder = builder.custom_total(money(*total));
    }
    for raw in &cli.lump {
        let (amount, date) = parse_lump(raw)?;
        builder = builder.lump_sum(amount, date);
    }

    Ok(builder.build()?)
}

fn print_summary(result: &CalculationResult) {
    let s = &result.summary;
    println!("Scheduled payment:     {:.2}", s.scheduled_payment);
    println!("Contractual payments:  {}", s.contractual_payment_count);
    println!("Actual payments:       {}", s.actual_payment_count);
    println!("Total extra paid:      {:.2}", s.total_extra_paid);
    println!("Total interest:        {:.2}", s.total_interest);
    println!("Total paid:            {:.2}", s.total_paid);
    println!("Interest saved:        {:.2}", s.interest_saved);
    if let Some(date) = s.baseline_payoff_date {
        println!("Original payoff:       {}", date.format("%B %-d, %Y"));
    }
    if let Some(date) = s.payoff_date.filter(|_| s.has_extra_payments()) {
        println!("Early payoff:          {}", date.format("%B %-d, %Y"));
    }
    if let Some(saved) = s.time_saved {
        println!("Time saved:            {} earlier", saved);
    }
}

fn print_table(result: &CalculationResult) {
    println!(
        "{:>5}  {:<10}  {:>14}  {:>12}  {:>10}  {:>12}  {:>12}  {:>12}  {:>14}",
        "#", "Date", "Beginning", "Scheduled", "Extra", "Total", "Principal", "Interest", "Ending"
    );
    for row in result.schedule.iter() {
        println!(
            "{:>5}  {:<10}  {:>14.2}  {:>12.2}  {:>10.2}  {:>12.2}  {:>12.2}  {:>12.2}  {:>14.2}",
            row.payment_number,
            row.payment_date,
            row.beginning_balance,
            row.scheduled_payment,
            row.extra_payment,
            row.total_payment,
            row.principal,
            row.interest,
            row.ending_balance
        );
    }
}

fn write_csv(result: &CalculationResult) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record([
        "payment_number",
        "payment_date",
        "kind",
        "beginning_balance",
        "scheduled_payment",
        "extra_payment",
        "extra_details",
        "total_payment",
        "principal",
        "interest",
        "ending_balance",
        "cumulative_interest",
    ])?;

    for row in result.schedule.iter() {
        let details: Vec<String> = row.extra_details.iter().map(|d| d.to_string()).collect();
        writer.write_record([
            row.payment_number.to_string(),
            row.payment_date.to_string(),
            format!("{:?}", row.kind),
            format!("{:.2}", row.beginning_balance),
            format!("{:.2}", row.scheduled_payment),
            format!("{:.2}", row.extra_payment),
            details.join("; "),
            format!("{:.2}", row.total_payment),
            format!("{:.2}", row.principal),
            format!("{:.2}", row.interest),
            format!("{:.2}", row.ending_balance),
            format!("{:.2}", row.cumulative_interest),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let time = SafeTimeProvider::new(TimeSource::System);

    let inputs = match &cli.share {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading share state {}", path.display()))?;
            let state: ShareState = serde_json::from_str(&text).context("parsing share state")?;
            state.into_inputs(&time)?
        }
        None => inputs_from_flags(&cli, &time)?,
    };

    info!(
        "calculating {} over {} years at {}%",
        inputs.loan_amount, inputs.term_years, inputs.annual_rate_percent
    );

    let result = MortgageCalculator::calculate(&inputs).map_err(|err| {
        for field in err.field_errors() {
            eprintln!("  {}", field);
        }
        err
    })?;

    match cli.format {
        OutputFormat::Summary => print_summary(&result),
        OutputFormat::Table => print_table(&result),
        OutputFormat::Json => println!("{}", result.to_json_pretty()?),
        OutputFormat::Csv => write_csv(&result)?,
    }

    Ok(())
}
