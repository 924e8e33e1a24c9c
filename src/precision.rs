//! Output rounding.
//!
//! The engines work on exact decimals; rounding happens once, when a finished
//! series is turned into the output payload.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::MetricsError;
use crate::valuation::DailyMetricSeries;

/// Largest scale a `Decimal` can carry
const MAX_DIGITS: i64 = 28;

/// Round-half-up (ties away from zero) to a fixed number of fractional digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecisionPolicy {
    digits: u32,
}

impl PrecisionPolicy {
    pub fn new(digits: i64) -> Result<Self, MetricsError> {
        if !(0..=MAX_DIGITS).contains(&digits) {
            return Err(MetricsError::InvalidPrecision(digits));
        }
        Ok(Self {
            digits: digits as u32,
        })
    }

    pub fn quantize_value(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.digits, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Round every defined value of `series`; undefined entries pass through
    pub fn quantize(&self, series: &DailyMetricSeries) -> DailyMetricSeries {
        series.map_values(|v| self.quantize_value(v))
    }
}

impl Default for PrecisionPolicy {
    fn default() -> Self {
        Self { digits: 8 }
    }
}
