use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::io::IsTerminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use basket_metrics::cli::Cli;
use basket_metrics::config::Config;
use basket_metrics::models::PositionRecord;
use basket_metrics::orchestrator::{CalculationRequest, MetricsRunner};
use basket_metrics::payload::SubmitPayload;
use basket_metrics::positions::load_positions;
use basket_metrics::reports::format_summary_table;
use basket_metrics::resolver::{ApiClient, ApiResolver, FileResolver, ResourceResolver};
use basket_metrics::submit::SubmitClient;

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(precision) = cli.precision {
        config.value_precision = precision;
    }

    let positions = load_positions(&cli.positions_file)?;
    let request = CalculationRequest {
        target_currency: cli.target_currency.trim().to_ascii_uppercase(),
        start_date: cli.start_date,
        end_date: cli.end_date,
    };

    let payload = match &cli.market_data {
        Some(path) => {
            calculate(FileResolver::new(path), &config, &positions, &request, &cli).await?
        }
        None => {
            let client = ApiClient::new(&config)?;
            calculate(ApiResolver::new(client), &config, &positions, &request, &cli).await?
        }
    };

    if cli.dry_run {
        println!("{}", serde_json::to_string_pretty(&payload)?);
        eprintln!("\n{} Dry run - nothing submitted", "ℹ".blue().bold());
        return Ok(());
    }

    let submitter = SubmitClient::new(ApiClient::new(&config)?);
    let response = submitter.submit(&payload).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    eprintln!("{} Metrics submitted", "✓".green().bold());

    Ok(())
}

async fn calculate<R: ResourceResolver>(
    resolver: R,
    config: &Config,
    positions: &[PositionRecord],
    request: &CalculationRequest,
    cli: &Cli,
) -> Result<SubmitPayload> {
    let runner = MetricsRunner::new(resolver, config)?;
    let metrics = runner
        .calculate(positions, request)
        .await
        .context("Metric calculation failed")?;

    info!(
        "Calculated {} position series over {} days",
        metrics.positions.len(),
        metrics.dates.len()
    );

    if cli.summary {
        eprintln!("{}", format_summary_table(&metrics, &request.target_currency));
    }

    Ok(runner.payload(&metrics))
}
