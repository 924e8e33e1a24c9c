//! Error handling for basket metrics
//!
//! Defines the typed failures raised by the valuation core and establishes a
//! unified Result type using anyhow for context chaining at the edges.

use chrono::NaiveDate;
use thiserror::Error;

/// Core error types for metric calculations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    #[error("invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("missing market data: no {series} observation for {date}")]
    MissingMarketData { series: String, date: NaiveDate },

    #[error("missing market data: {0} is not available")]
    MissingSeries(String),

    #[error("invalid precision: {0} fractional digits")]
    InvalidPrecision(i64),

    #[error("invalid position {id}: {reason}")]
    InvalidPosition { id: String, reason: String },

    #[error("series mismatch: {0}")]
    SeriesMismatch(String),

    /// A result left the 96-bit range of `Decimal`
    #[error("arithmetic overflow: {0}")]
    Overflow(String),
}

impl MetricsError {
    /// True for both flavours of absent observations
    pub fn is_missing_market_data(&self) -> bool {
        matches!(
            self,
            MetricsError::MissingMarketData { .. } | MetricsError::MissingSeries(_)
        )
    }
}

/// Result type alias for orchestration and I/O
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting_is_readable() {
        let err = MetricsError::MissingMarketData {
            series: "price 42".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "missing market data: no price 42 observation for 2023-01-02"
        );
    }

    #[test]
    fn test_anyhow_context_keeps_typed_error() {
        use anyhow::Context;
        let result: Result<()> = Err(MetricsError::InvalidPrecision(-1))
            .context("failed to build payload");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("failed to build payload"));
        assert_eq!(
            err.downcast_ref::<MetricsError>(),
            Some(&MetricsError::InvalidPrecision(-1))
        );
    }

    #[test]
    fn test_overflow_message() {
        let err = MetricsError::Overflow("value of position 3 on 2023-01-02".into());
        assert_eq!(
            err.to_string(),
            "arithmetic overflow: value of position 3 on 2023-01-02"
        );
    }

    #[test]
    fn test_missing_market_data_variants() {
        assert!(MetricsError::MissingSeries("fx USDEUR".into()).is_missing_market_data());
        assert!(!MetricsError::SeriesMismatch("x".into()).is_missing_market_data());
    }
}
