//! Calculation run
//!
//! Resolves market data for the whole portfolio once, values every position
//! against it and folds the series into the basket. Any failure aborts the
//! run: a basket missing one position would misstate the portfolio total.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::basket::BasketAggregator;
use crate::calendar::Calendar;
use crate::config::Config;
use crate::error::MetricsError;
use crate::models::PositionRecord;
use crate::payload::{FinancialMetrics, SubmitPayload};
use crate::precision::PrecisionPolicy;
use crate::resolver::{MarketData, ResourceRequest, ResourceResolver};
use crate::valuation::{DailyMetricSeries, PositionValuationEngine};

/// Target currency and window of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationRequest {
    pub target_currency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub struct MetricsRunner<R> {
    resolver: R,
    precision: PrecisionPolicy,
}

impl<R: ResourceResolver> MetricsRunner<R> {
    /// Fails when the configured precision is unusable
    pub fn new(resolver: R, config: &Config) -> Result<Self> {
        let precision = PrecisionPolicy::new(config.value_precision)
            .context("Invalid value precision in configuration")?;
        Ok(Self {
            resolver,
            precision,
        })
    }

    pub async fn calculate(
        &self,
        positions: &[PositionRecord],
        request: &CalculationRequest,
    ) -> Result<FinancialMetrics> {
        let calendar = Calendar::generate(request.start_date, request.end_date)?;
        validate_positions(positions)?;

        info!(
            "Calculating metrics for {} positions in {} from {} to {} ({} days)",
            positions.len(),
            request.target_currency,
            calendar.start(),
            calendar.end(),
            calendar.len()
        );

        let resources =
            ResourceRequest::for_positions(positions, &request.target_currency, &calendar);
        let market = self
            .resolver
            .resolve(&resources)
            .await
            .context("Failed to resolve market data")?;

        let mut basket = BasketAggregator::new(&calendar);
        let mut series_by_position = Vec::with_capacity(positions.len());

        for position in positions {
            let series = value_position(position, &request.target_currency, &calendar, &market)
                .and_then(|series| basket.add(&series).map(|()| series))
                .with_context(|| format!("Failed to value position {}", position.id))?;

            debug!(
                "Position {}: {} open days, return {}",
                position.id,
                series.days_open(),
                series.total_return()
            );
            series_by_position.push((position.id.clone(), series));
        }

        let basket = basket.calculate().context("Failed to aggregate the basket")?;

        Ok(FinancialMetrics {
            dates: calendar.days().to_vec(),
            positions: series_by_position,
            basket,
        })
    }

    /// Quantize a finished run into the submission body
    pub fn payload(&self, metrics: &FinancialMetrics) -> SubmitPayload {
        metrics.to_payload(&self.precision)
    }
}

fn value_position(
    position: &PositionRecord,
    target_currency: &str,
    calendar: &Calendar,
    market: &MarketData,
) -> Result<DailyMetricSeries, MetricsError> {
    let fx_rates = market.fx_slice(&position.currency_pair(target_currency))?;
    let prices = market.price_slice(&position.instrument_id)?;
    PositionValuationEngine::calculate(position, calendar, &fx_rates, prices)
}

fn validate_positions(positions: &[PositionRecord]) -> Result<()> {
    let mut seen = HashSet::new();
    for position in positions {
        position
            .validate()
            .with_context(|| format!("Invalid position {}", position.id))?;
        if !seen.insert(position.id.as_str()) {
            return Err(MetricsError::InvalidPosition {
                id: position.id.clone(),
                reason: "duplicate position id".to_string(),
            }
            .into());
        }
    }
    Ok(())
}
