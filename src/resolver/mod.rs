//! Market data resolution
//!
//! A [`ResourceResolver`] turns the set of FX pairs and instruments a
//! portfolio needs into date-indexed observation series. Gaps in those series
//! are the resolver's concern; the valuation engine fails on any missing
//! observation it actually needs.

pub mod api;
pub mod file;

use anyhow::Result;
use chrono::NaiveDate;
use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;

use crate::calendar::Calendar;
use crate::error::MetricsError;
use crate::models::{CurrencyPair, PositionRecord, PriceSeries, RateSeries};

pub use api::{ApiClient, ApiResolver};
pub use file::FileResolver;

/// Everything a portfolio needs fetched for one window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub target_currency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub pairs: BTreeSet<CurrencyPair>,
    pub instrument_ids: BTreeSet<String>,
}

impl ResourceRequest {
    /// Unique non-trivial FX pairs and unique instruments across `positions`
    pub fn for_positions(
        positions: &[PositionRecord],
        target_currency: &str,
        calendar: &Calendar,
    ) -> Self {
        let pairs = positions
            .iter()
            .map(|p| p.currency_pair(target_currency))
            .filter(|pair| !pair.is_identity())
            .collect();
        let instrument_ids = positions.iter().map(|p| p.instrument_id.clone()).collect();

        Self {
            target_currency: target_currency.trim().to_ascii_uppercase(),
            start_date: calendar.start(),
            end_date: calendar.end(),
            pairs,
            instrument_ids,
        }
    }
}

/// Observation series keyed by pair code ("EURUSD") and instrument id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketData {
    pub fx_rates: HashMap<String, RateSeries>,
    pub prices: HashMap<String, PriceSeries>,
}

impl MarketData {
    /// Rates for `pair`; the identity pair needs no observations
    pub fn fx_slice(&self, pair: &CurrencyPair) -> Result<Cow<'_, RateSeries>, MetricsError> {
        if pair.is_identity() {
            return Ok(Cow::Owned(RateSeries::identity()));
        }
        self.fx_rates
            .get(&pair.to_string())
            .map(Cow::Borrowed)
            .ok_or_else(|| MetricsError::MissingSeries(format!("FX rates for {}", pair)))
    }

    pub fn price_slice(&self, instrument_id: &str) -> Result<&PriceSeries, MetricsError> {
        self.prices.get(instrument_id).ok_or_else(|| {
            MetricsError::MissingSeries(format!("prices for instrument {}", instrument_id))
        })
    }
}

/// Source of FX and price observations.
///
/// Implementations should issue independent fetches concurrently and return
/// only once all of them have completed.
pub trait ResourceResolver {
    fn resolve(&self, request: &ResourceRequest) -> impl Future<Output = Result<MarketData>>;
}

/// Resolver over data already in memory
impl ResourceResolver for MarketData {
    async fn resolve(&self, _request: &ResourceRequest) -> Result<MarketData> {
        Ok(self.clone())
    }
}
