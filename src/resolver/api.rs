use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use itertools::Itertools;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use super::{MarketData, ResourceRequest, ResourceResolver};
use crate::config::Config;
use crate::models::{PriceObservation, PriceSeries, RateObservation, RateSeries};

/// Maximum concurrent API requests to avoid rate limiting
const MAX_CONCURRENT_REQUESTS: usize = 5;

/// Thin client over the market data / submission API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    api_key: String,
    candidate_id: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        config.require_api()?;

        // Url::join drops the last segment unless the base ends in '/'
        let mut base = config.api_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url =
            Url::parse(&base).with_context(|| format!("Invalid API URL: {}", config.api_url))?;

        let client = Client::builder()
            .user_agent(concat!("basket-metrics/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            candidate_id: config.candidate_id.clone(),
        })
    }

    pub fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .with_context(|| format!("Invalid API endpoint: {}", path))?;
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(path, params)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header("x-api-key", &self.api_key)
            .header("candidate_id", &self.candidate_id)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", path))?;

        if !response.status().is_success() {
            return Err(anyhow!("{} returned error status: {}", path, response.status()));
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", path))
    }

    /// Rates for several pairs in one call, keyed by pair code
    pub async fn fetch_fx_rates(
        &self,
        pairs: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<HashMap<String, RateSeries>> {
        let params = [
            ("pairs", pairs.iter().join(",")),
            ("start_date", api_date(start_date)),
            ("end_date", api_date(end_date)),
        ];
        let raw: HashMap<String, Vec<RateObservation>> = self.get_json("fx-rates", &params).await?;
        Ok(raw.into_iter().map(|(pair, obs)| (pair, obs.into())).collect())
    }

    /// Prices of one instrument, keyed by instrument id
    pub async fn fetch_prices(
        &self,
        instrument_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<HashMap<String, PriceSeries>> {
        let params = [
            ("instrument_id", instrument_id.to_string()),
            ("start_date", api_date(start_date)),
            ("end_date", api_date(end_date)),
        ];
        let raw: HashMap<String, Vec<PriceObservation>> = self.get_json("prices", &params).await?;
        Ok(raw.into_iter().map(|(id, obs)| (id, obs.into())).collect())
    }

    /// POST a JSON body to `path` and return the JSON response
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<serde_json::Value> {
        let url = self.endpoint(path, &[])?;
        info!("Submitting results to {}", url);

        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("candidate_id", &self.candidate_id)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to post to {}", path))?;

        if !response.status().is_success() {
            return Err(anyhow!("{} returned error status: {}", path, response.status()));
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", path))
    }
}

/// Dates travel as YYYYMMDD in query strings
fn api_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

enum Fetched {
    FxRates(HashMap<String, RateSeries>),
    Prices(HashMap<String, PriceSeries>),
}

/// Resolver backed by the remote API; all requests run concurrently
#[derive(Debug, Clone)]
pub struct ApiResolver {
    client: ApiClient,
}

impl ApiResolver {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl ResourceResolver for ApiResolver {
    async fn resolve(&self, request: &ResourceRequest) -> Result<MarketData> {
        let (start, end) = (request.start_date, request.end_date);
        info!(
            "Fetching {} FX pairs and {} instruments from {} to {}",
            request.pairs.len(),
            request.instrument_ids.len(),
            start,
            end
        );

        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS));
        let mut join_set = JoinSet::new();

        if !request.pairs.is_empty() {
            let client = self.client.clone();
            let sem = semaphore.clone();
            let pairs: Vec<String> = request.pairs.iter().map(|p| p.to_string()).collect();
            join_set.spawn(async move {
                let _permit = sem.acquire_owned().await?;
                let rates = client
                    .fetch_fx_rates(&pairs, start, end)
                    .await
                    .with_context(|| format!("Failed to fetch FX rates for {}", pairs.join(",")))?;
                Ok::<_, anyhow::Error>(Fetched::FxRates(rates))
            });
        }

        for instrument_id in &request.instrument_ids {
            let client = self.client.clone();
            let sem = semaphore.clone();
            let instrument_id = instrument_id.clone();
            join_set.spawn(async move {
                let _permit = sem.acquire_owned().await?;
                let prices = client
                    .fetch_prices(&instrument_id, start, end)
                    .await
                    .with_context(|| {
                        format!("Failed to fetch prices for instrument {}", instrument_id)
                    })?;
                Ok::<_, anyhow::Error>(Fetched::Prices(prices))
            });
        }

        // Wait for every request; the first failure aborts the rest
        let mut data = MarketData::default();
        while let Some(result) = join_set.join_next().await {
            match result.context("Market data task panicked")? {
                Ok(Fetched::FxRates(rates)) => data.fx_rates.extend(rates),
                Ok(Fetched::Prices(prices)) => data.prices.extend(prices),
                Err(e) => {
                    join_set.abort_all();
                    return Err(e);
                }
            }
        }

        debug!(
            "Resolved {} FX series and {} price series",
            data.fx_rates.len(),
            data.prices.len()
        );
        Ok(data)
    }
}
