//! Output payload
//!
//! The only place exact decimals leave the crate: series are quantized by the
//! [`PrecisionPolicy`] and rendered as JSON numbers carrying exactly the
//! quantized digits (no detour through `f64`), with `null` for undefined
//! entries.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::precision::PrecisionPolicy;
use crate::valuation::{BasketMetric, DailyMetricSeries};

/// Result of one calculation run, still in exact decimals
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialMetrics {
    pub dates: Vec<NaiveDate>,
    /// Position series in input order
    pub positions: Vec<(String, DailyMetricSeries)>,
    pub basket: BasketMetric,
}

impl FinancialMetrics {
    pub fn position(&self, id: &str) -> Option<&DailyMetricSeries> {
        self.positions
            .iter()
            .find(|(pid, _)| pid == id)
            .map(|(_, series)| series)
    }

    pub fn to_payload(&self, policy: &PrecisionPolicy) -> SubmitPayload {
        SubmitPayload {
            positions: self
                .positions
                .iter()
                .map(|(id, series)| (id.clone(), MetricPayload::from_series(series, policy)))
                .collect(),
            basket: MetricPayload::from_series(&self.basket, policy),
            dates: self
                .dates
                .iter()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .collect(),
        }
    }
}

/// Body accepted by the submission endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitPayload {
    pub positions: BTreeMap<String, MetricPayload>,
    pub basket: MetricPayload,
    pub dates: Vec<String>,
}

/// Reported metrics of a position or the basket, aligned with `dates`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricPayload {
    pub is_open: Vec<Option<Number>>,
    pub price: Vec<Option<Number>>,
    pub value: Vec<Option<Number>>,
    pub return_per_period: Vec<Option<Number>>,
    pub return_per_period_percentage: Vec<Option<Number>>,
}

impl MetricPayload {
    pub fn from_series(series: &DailyMetricSeries, policy: &PrecisionPolicy) -> Self {
        let rounded = policy.quantize(series);

        let defined = |values: &[Decimal]| -> Vec<Option<Number>> {
            values.iter().map(|v| json_number(*v)).collect()
        };
        let optional = |values: &[Option<Decimal>]| -> Vec<Option<Number>> {
            values.iter().map(|v| v.and_then(json_number)).collect()
        };

        Self {
            is_open: defined(&rounded.is_open),
            price: optional(&rounded.price_local),
            value: defined(&rounded.value_target),
            return_per_period: defined(&rounded.return_per_period),
            return_per_period_percentage: defined(&rounded.return_per_period_percentage),
        }
    }
}

/// JSON number with the decimal's exact digits, trailing zeros dropped
fn json_number(value: Decimal) -> Option<Number> {
    Number::from_str(&value.normalize().to_string()).ok()
}
