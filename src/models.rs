use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::MetricsError;

/// A single holding as read from the positions file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub open_date: NaiveDate,
    #[serde(default)]
    pub close_date: Option<NaiveDate>,
    pub open_price: Decimal,
    #[serde(default)]
    pub close_price: Option<Decimal>,
    pub quantity: Decimal,
    #[serde(deserialize_with = "string_or_number")]
    pub instrument_id: String,
    pub instrument_currency: String,
}

impl PositionRecord {
    /// Check the record invariants before any valuation runs
    pub fn validate(&self) -> Result<(), MetricsError> {
        if let Some(close_date) = self.close_date {
            if close_date < self.open_date {
                return Err(MetricsError::InvalidDateRange {
                    start: self.open_date,
                    end: close_date,
                });
            }
            if self.close_price.is_none() {
                return Err(MetricsError::InvalidPosition {
                    id: self.id.clone(),
                    reason: format!("closed on {} without a close price", close_date),
                });
            }
        }

        if self.instrument_currency.trim().is_empty() {
            return Err(MetricsError::InvalidPosition {
                id: self.id.clone(),
                reason: "instrument currency is empty".to_string(),
            });
        }

        Ok(())
    }

    /// FX pair converting this position's local currency into `target_currency`
    pub fn currency_pair(&self, target_currency: &str) -> CurrencyPair {
        CurrencyPair::new(&self.instrument_currency, target_currency)
    }
}

/// Local → target conversion pair, rendered as e.g. "EURUSD"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyPair {
    pub local: String,
    pub target: String,
}

impl CurrencyPair {
    pub fn new(local: &str, target: &str) -> Self {
        Self {
            local: local.trim().to_ascii_uppercase(),
            target: target.trim().to_ascii_uppercase(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.local == self.target
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.local, self.target)
    }
}

/// Date-indexed decimal observations (FX rates or instrument prices).
///
/// A constant series answers every date with the same value; it stands in for
/// the FX pair of a position already quoted in the target currency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationSeries {
    observations: BTreeMap<NaiveDate, Decimal>,
    constant: Option<Decimal>,
}

pub type RateSeries = ObservationSeries;
pub type PriceSeries = ObservationSeries;

impl ObservationSeries {
    pub fn new(observations: BTreeMap<NaiveDate, Decimal>) -> Self {
        Self {
            observations,
            constant: None,
        }
    }

    pub fn constant(value: Decimal) -> Self {
        Self {
            observations: BTreeMap::new(),
            constant: Some(value),
        }
    }

    pub fn identity() -> Self {
        Self::constant(Decimal::ONE)
    }

    pub fn get(&self, date: NaiveDate) -> Option<Decimal> {
        self.constant
            .or_else(|| self.observations.get(&date).copied())
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constant.is_none() && self.observations.is_empty()
    }
}

impl FromIterator<(NaiveDate, Decimal)> for ObservationSeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, Decimal)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// FX rate observation as served by the market data API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateObservation {
    pub date: NaiveDate,
    pub rate: Decimal,
}

/// Instrument price observation as served by the market data API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub price: Decimal,
}

impl From<Vec<RateObservation>> for ObservationSeries {
    fn from(items: Vec<RateObservation>) -> Self {
        items.into_iter().map(|o| (o.date, o.rate)).collect()
    }
}

impl From<Vec<PriceObservation>> for ObservationSeries {
    fn from(items: Vec<PriceObservation>) -> Self {
        items.into_iter().map(|o| (o.date, o.price)).collect()
    }
}

/// Identifiers show up both as JSON numbers and strings. Going through
/// `Value` keeps this working with arbitrary-precision numbers, which untagged
/// enums cannot buffer.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected an integer or string identifier, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn position() -> PositionRecord {
        PositionRecord {
            id: "1".to_string(),
            open_date: date(2023, 1, 2),
            close_date: Some(date(2023, 1, 5)),
            open_price: dec!(102),
            close_price: Some(dec!(105)),
            quantity: dec!(10),
            instrument_id: "7".to_string(),
            instrument_currency: "EUR".to_string(),
        }
    }

    #[test]
    fn test_deserialize_numeric_and_null_fields() {
        let json = r#"{
            "id": 12,
            "open_date": "2023-01-02",
            "close_date": null,
            "open_price": 101.25,
            "close_price": null,
            "quantity": 3,
            "instrument_id": "AAPL",
            "instrument_currency": "USD"
        }"#;
        let record: PositionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "12");
        assert_eq!(record.instrument_id, "AAPL");
        assert_eq!(record.open_price, dec!(101.25));
        assert_eq!(record.quantity, dec!(3));
        assert!(record.close_date.is_none());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_long_decimals_and_fractional_ids() {
        let json = r#"{
            "id": "7",
            "open_date": "2023-01-02",
            "open_price": 9876543210.12345678901,
            "quantity": 1,
            "instrument_id": 4,
            "instrument_currency": "EUR"
        }"#;
        let record: PositionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.open_price, dec!(9876543210.12345678901));
        assert_eq!(record.instrument_id, "4");

        let fractional = json.replace(r#""instrument_id": 4"#, r#""instrument_id": 4.5"#);
        assert!(serde_json::from_str::<PositionRecord>(&fractional).is_err());
    }

    #[test]
    fn test_close_before_open_is_invalid_range() {
        let mut record = position();
        record.close_date = Some(date(2023, 1, 1));
        assert!(matches!(
            record.validate(),
            Err(MetricsError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_close_without_price_is_invalid() {
        let mut record = position();
        record.close_price = None;
        assert!(matches!(
            record.validate(),
            Err(MetricsError::InvalidPosition { .. })
        ));
    }

    #[test]
    fn test_currency_pair_display() {
        let pair = position().currency_pair("usd");
        assert_eq!(pair.to_string(), "EURUSD");
        assert!(!pair.is_identity());
        assert!(CurrencyPair::new("USD", "USD").is_identity());
    }

    #[test]
    fn test_observation_lookup() {
        let series: ObservationSeries = vec![
            RateObservation { date: date(2023, 1, 1), rate: dec!(1.1) },
            RateObservation { date: date(2023, 1, 3), rate: dec!(1.2) },
        ]
        .into();
        assert_eq!(series.get(date(2023, 1, 1)), Some(dec!(1.1)));
        assert_eq!(series.get(date(2023, 1, 2)), None);
        assert_eq!(series.len(), 2);

        let identity = ObservationSeries::identity();
        assert_eq!(identity.get(date(1999, 12, 31)), Some(Decimal::ONE));
        assert!(!identity.is_empty());
    }
}
