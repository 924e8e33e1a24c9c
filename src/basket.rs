//! Basket aggregation
//!
//! Folds every position's [`DailyMetricSeries`] into one portfolio-level
//! series. Only exact decimal sums and a max are involved, so the order in
//! which positions are added never changes the result.

use rust_decimal::Decimal;

use crate::calendar::Calendar;
use crate::error::MetricsError;
use crate::valuation::checked;
use crate::valuation::{BasketMetric, DailyMetricSeries};

/// Running sums over a fixed calendar
#[derive(Debug, Clone)]
pub struct BasketAggregator {
    dates: Vec<chrono::NaiveDate>,
    is_open: Vec<Decimal>,
    value: Vec<Decimal>,
    value_start: Vec<Decimal>,
    return_per_period: Vec<Decimal>,
    positions: usize,
}

impl BasketAggregator {
    pub fn new(calendar: &Calendar) -> Self {
        let n = calendar.len();
        Self {
            dates: calendar.days().to_vec(),
            is_open: vec![Decimal::ZERO; n],
            value: vec![Decimal::ZERO; n],
            value_start: vec![Decimal::ZERO; n],
            return_per_period: vec![Decimal::ZERO; n],
            positions: 0,
        }
    }

    /// Number of series added so far
    pub fn len(&self) -> usize {
        self.positions
    }

    pub fn is_empty(&self) -> bool {
        self.positions == 0
    }

    /// Accumulate one position series. The series must cover exactly the
    /// basket calendar.
    pub fn add(&mut self, series: &DailyMetricSeries) -> Result<(), MetricsError> {
        if series.dates != self.dates || !series.is_aligned() {
            return Err(MetricsError::SeriesMismatch(format!(
                "series with {} days does not match the {}-day basket calendar",
                series.len(),
                self.dates.len()
            )));
        }

        // Sum into fresh buffers so an overflow leaves the running totals intact
        let sum = |totals: &[Decimal], values: &[Decimal], what: &str| {
            totals
                .iter()
                .zip(values)
                .zip(&self.dates)
                .map(|((total, value), day)| {
                    checked::add(*total, *value, || format!("basket {} on {}", what, day))
                })
                .collect::<Result<Vec<_>, _>>()
        };
        let value = sum(&self.value, &series.value_target, "value")?;
        let value_start = sum(&self.value_start, &series.value_start, "start value")?;
        let return_per_period = sum(&self.return_per_period, &series.return_per_period, "return")?;

        for (open, position_open) in self.is_open.iter_mut().zip(&series.is_open) {
            *open = (*open).max(*position_open);
        }
        self.value = value;
        self.value_start = value_start;
        self.return_per_period = return_per_period;
        self.positions += 1;

        Ok(())
    }

    /// Finish the basket. Consumes the aggregator so nothing can be added
    /// after the totals are taken.
    pub fn calculate(self) -> Result<BasketMetric, MetricsError> {
        let mut basket = DailyMetricSeries::zeroed(&self.dates);

        basket.value_end = self
            .value_start
            .iter()
            .zip(&self.return_per_period)
            .zip(&self.dates)
            .map(|((start, ret), day)| {
                checked::add(*start, *ret, || format!("basket end value on {}", day)).map(Some)
            })
            .collect::<Result<_, _>>()?;
        basket.return_per_period_percentage = self
            .return_per_period
            .iter()
            .zip(&self.value_start)
            .zip(&self.dates)
            .map(|((ret, start), day)| {
                checked::ratio_or_zero(*ret, *start, || {
                    format!("basket percentage return on {}", day)
                })
            })
            .collect::<Result<_, _>>()?;

        // Price stays 0: no single local price describes a basket
        basket.is_open = self.is_open;
        basket.value_local = self.value.clone();
        basket.value_target = self.value;
        basket.value_start = self.value_start;
        basket.return_per_period = self.return_per_period;

        Ok(basket)
    }
}
