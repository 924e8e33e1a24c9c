//! Result submission

use anyhow::{Context, Result};
use tracing::info;

use crate::payload::SubmitPayload;
use crate::resolver::ApiClient;

const SUBMIT_PATH: &str = "submit";

/// Posts finished payloads to the API's submission endpoint
#[derive(Debug, Clone)]
pub struct SubmitClient {
    client: ApiClient,
}

impl SubmitClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Returns the API's JSON reply unchanged
    pub async fn submit(&self, payload: &SubmitPayload) -> Result<serde_json::Value> {
        info!(
            "Submitting metrics for {} positions over {} days",
            payload.positions.len(),
            payload.dates.len()
        );
        self.client
            .post_json(SUBMIT_PATH, payload)
            .await
            .context("Failed to submit metrics")
    }
}
