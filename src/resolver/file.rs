use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{MarketData, ResourceRequest, ResourceResolver};
use crate::models::{PriceObservation, RateObservation};

/// On-disk layout: the two API responses side by side
#[derive(Debug, Deserialize)]
struct MarketDataFile {
    #[serde(default)]
    fx_rates: HashMap<String, Vec<RateObservation>>,
    #[serde(default)]
    prices: HashMap<String, Vec<PriceObservation>>,
}

/// Resolver reading previously captured observations from a JSON file.
///
/// ```json
/// {
///   "fx_rates": { "EURUSD": [{ "date": "2023-01-02", "rate": 1.07 }] },
///   "prices":   { "42":     [{ "date": "2023-01-02", "price": 101.5 }] }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileResolver {
    path: PathBuf,
}

impl FileResolver {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn parse(content: &str) -> Result<MarketData> {
        let file: MarketDataFile = serde_json::from_str(content)?;
        Ok(MarketData {
            fx_rates: file
                .fx_rates
                .into_iter()
                .map(|(pair, obs)| (pair.to_ascii_uppercase(), obs.into()))
                .collect(),
            prices: file
                .prices
                .into_iter()
                .map(|(id, obs)| (id, obs.into()))
                .collect(),
        })
    }
}

impl ResourceResolver for FileResolver {
    async fn resolve(&self, request: &ResourceRequest) -> Result<MarketData> {
        info!("Loading market data from {}", self.path.display());

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read market data file {}", self.path.display()))?;
        let data = Self::parse(&content)
            .with_context(|| format!("Failed to parse market data file {}", self.path.display()))?;

        for pair in &request.pairs {
            if !data.fx_rates.contains_key(&pair.to_string()) {
                warn!("Market data file has no FX rates for {}", pair);
            }
        }
        for id in &request.instrument_ids {
            if !data.prices.contains_key(id) {
                warn!("Market data file has no prices for instrument {}", id);
            }
        }

        Ok(data)
    }
}
