use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "basket-metrics")]
#[command(
    version,
    about = "Daily position and basket metrics in a single target currency"
)]
#[command(
    long_about = "Values every position of a portfolio day by day, converts it into the target currency, aggregates the basket and submits the quantized result to the metrics API."
)]
pub struct Cli {
    /// JSON array of position records
    #[arg(long, value_name = "FILE")]
    pub positions_file: PathBuf,

    /// Currency every value is reported in
    #[arg(long, default_value = "USD")]
    pub target_currency: String,

    /// First day of the window (YYYY-MM-DD or YYYYMMDD)
    #[arg(long, default_value = "2023-01-01", value_parser = parse_date)]
    pub start_date: NaiveDate,

    /// Last day of the window, inclusive (YYYY-MM-DD or YYYYMMDD)
    #[arg(long, default_value = "2024-11-10", value_parser = parse_date)]
    pub end_date: NaiveDate,

    /// Read FX rates and prices from this JSON file instead of the API
    #[arg(long, value_name = "FILE")]
    pub market_data: Option<PathBuf>,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Fractional digits kept in the output
    #[arg(long, allow_hyphen_values = true)]
    pub precision: Option<i64>,

    /// Print the payload instead of submitting it
    #[arg(long)]
    pub dry_run: bool,

    /// Print a summary table to stderr
    #[arg(long)]
    pub summary: bool,

    /// Disable colorized/ANSI output
    #[arg(long = "no-color")]
    pub no_color: bool,
}

/// Accepts ISO dates and the compact form the API uses
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .map_err(|_| format!("Invalid date '{}': expected YYYY-MM-DD or YYYYMMDD", s))
}
