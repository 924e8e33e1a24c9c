//! Per-position daily valuation
//!
//! Turns one position plus its FX and price observations into a complete
//! [`DailyMetricSeries`]. The metrics depend on each other in a fixed order,
//! so they are evaluated as one straight pipeline:
//!
//! ```text
//! is_open -> quantity ─┐
//! price_local ─────────┴> value_local -> value_target -> {value_start, value_end}
//! price_local -> price_target                          -> return_per_period
//!                                                      -> return_per_period_percentage
//! ```
//!
//! All arithmetic stays in exact decimals and is overflow-checked. Nothing is
//! rounded here.

pub(crate) mod checked;
mod lifecycle;
pub mod series;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::calendar::Calendar;
use crate::error::MetricsError;
use crate::models::{PositionRecord, PriceSeries, RateSeries};

pub use lifecycle::Lifecycle;
pub use series::{BasketMetric, DailyMetricSeries};

/// Stateless entry point for valuing a single position
pub struct PositionValuationEngine;

impl PositionValuationEngine {
    /// Value `position` on every day of `calendar`.
    ///
    /// `fx_rates` converts the instrument currency into the target currency
    /// (a constant-1 series when they are the same). Fails when a rate or
    /// price needed for an open day, the open day or the close day is absent.
    pub fn calculate(
        position: &PositionRecord,
        calendar: &Calendar,
        fx_rates: &RateSeries,
        prices: &PriceSeries,
    ) -> Result<DailyMetricSeries, MetricsError> {
        position.validate()?;
        Pipeline {
            position,
            calendar,
            lifecycle: Lifecycle::new(position),
            fx_rates,
            prices,
        }
        .run()
    }
}

struct Pipeline<'a> {
    position: &'a PositionRecord,
    calendar: &'a Calendar,
    lifecycle: Lifecycle,
    fx_rates: &'a RateSeries,
    prices: &'a PriceSeries,
}

impl Pipeline<'_> {
    fn run(&self) -> Result<DailyMetricSeries, MetricsError> {
        let is_open = self.is_open();
        let quantity = self.quantity(&is_open);
        let price_local = self.price_local()?;
        let price_target = self.price_target(&price_local)?;
        let value_local = self.value_local(&price_local, &quantity)?;
        let value_target = self.value_target(&value_local)?;
        let value_start = self.value_start(&value_target)?;
        let value_end = self.value_end(&value_target)?;
        let return_per_period = self.return_per_period(&value_start, &value_end)?;
        let return_per_period_percentage =
            self.return_per_period_percentage(&return_per_period, &value_start)?;

        Ok(DailyMetricSeries {
            dates: self.days().to_vec(),
            is_open,
            price_local,
            price_target,
            value_local,
            value_target,
            value_start,
            value_end,
            return_per_period,
            return_per_period_percentage,
        })
    }

    fn days(&self) -> &[NaiveDate] {
        self.calendar.days()
    }

    /// Names the figure being computed in overflow errors
    fn describe(&self, what: &str, day: NaiveDate) -> String {
        format!("{} of position {} on {}", what, self.position.id, day)
    }

    fn is_open(&self) -> Vec<Decimal> {
        self.days()
            .iter()
            .map(|d| {
                if self.lifecycle.is_held(*d) {
                    Decimal::ONE
                } else {
                    Decimal::ZERO
                }
            })
            .collect()
    }

    fn quantity(&self, is_open: &[Decimal]) -> Vec<Decimal> {
        is_open
            .iter()
            .map(|o| {
                if o.is_zero() {
                    Decimal::ZERO
                } else {
                    self.position.quantity
                }
            })
            .collect()
    }

    fn price_local(&self) -> Result<Vec<Option<Decimal>>, MetricsError> {
        self.days()
            .iter()
            .map(|d| {
                if self.lifecycle.is_pre_open(*d) {
                    return Ok(Some(Decimal::ZERO));
                }
                match self.prices.get(*d) {
                    Some(price) => Ok(Some(price)),
                    None if self.lifecycle.is_held(*d) => Err(self.missing_price(*d)),
                    None => Ok(None),
                }
            })
            .collect()
    }

    fn price_target(
        &self,
        price_local: &[Option<Decimal>],
    ) -> Result<Vec<Option<Decimal>>, MetricsError> {
        self.days()
            .iter()
            .zip(price_local)
            .map(|(d, price)| match (*price, self.fx_rates.get(*d)) {
                (Some(p), _) if p.is_zero() => Ok(Some(Decimal::ZERO)),
                (Some(p), Some(rate)) => {
                    checked::mul(p, rate, || self.describe("target price", *d)).map(Some)
                }
                _ => Ok(None),
            })
            .collect()
    }

    fn value_local(
        &self,
        price_local: &[Option<Decimal>],
        quantity: &[Decimal],
    ) -> Result<Vec<Decimal>, MetricsError> {
        self.days()
            .iter()
            .zip(price_local.iter().zip(quantity))
            .map(|(d, (price, qty))| match price {
                // quantity is zero on every day a price may be undefined
                Some(p) if !qty.is_zero() => {
                    checked::mul(*p, *qty, || self.describe("local value", *d))
                }
                _ => Ok(Decimal::ZERO),
            })
            .collect()
    }

    fn value_target(&self, value_local: &[Decimal]) -> Result<Vec<Decimal>, MetricsError> {
        self.days()
            .iter()
            .zip(value_local)
            .map(|(d, value)| {
                if self.lifecycle.is_held(*d) {
                    checked::mul(*value, self.rate(*d)?, || self.describe("target value", *d))
                } else {
                    Ok(Decimal::ZERO)
                }
            })
            .collect()
    }

    /// `price × fx(day) × quantity` for the open or close valuation
    fn boundary_value(
        &self,
        what: &str,
        price: Decimal,
        day: NaiveDate,
    ) -> Result<Decimal, MetricsError> {
        let converted = checked::mul(price, self.rate(day)?, || self.describe(what, day))?;
        checked::mul(converted, self.position.quantity, || self.describe(what, day))
    }

    /// open_price × fx(open) × quantity, when the open falls inside the window
    fn open_value_target(&self) -> Result<Option<Decimal>, MetricsError> {
        let open = self.lifecycle.open();
        if !self.calendar.contains(open) {
            return Ok(None);
        }
        self.boundary_value("open value", self.position.open_price, open).map(Some)
    }

    /// close_price × fx(close) × quantity, when the close falls inside the window
    fn close_value_target(&self) -> Result<Option<Decimal>, MetricsError> {
        let Some(close) = self.lifecycle.close() else {
            return Ok(None);
        };
        if !self.calendar.contains(close) {
            return Ok(None);
        }
        let close_price = self.position.close_price.ok_or_else(|| {
            MetricsError::InvalidPosition {
                id: self.position.id.clone(),
                reason: format!("closed on {} without a close price", close),
            }
        })?;
        self.boundary_value("close value", close_price, close).map(Some)
    }

    fn value_start(&self, value_target: &[Decimal]) -> Result<Vec<Decimal>, MetricsError> {
        let open_value = self.open_value_target()?;

        Ok(self
            .days()
            .iter()
            .enumerate()
            .map(|(i, d)| match open_value {
                Some(open) if self.lifecycle.is_open_day(*d) => open,
                _ if i == 0 => value_target[0],
                _ => value_target[i - 1],
            })
            .collect())
    }

    fn value_end(&self, value_target: &[Decimal]) -> Result<Vec<Option<Decimal>>, MetricsError> {
        let close_value = self.close_value_target()?;

        Ok(self
            .days()
            .iter()
            .zip(value_target)
            .map(|(d, value)| {
                if self.lifecycle.is_pre_close(*d) {
                    Some(*value)
                } else if self.lifecycle.is_close_day(*d) {
                    close_value
                } else {
                    None
                }
            })
            .collect())
    }

    fn return_per_period(
        &self,
        value_start: &[Decimal],
        value_end: &[Option<Decimal>],
    ) -> Result<Vec<Decimal>, MetricsError> {
        self.days()
            .iter()
            .zip(value_start.iter().zip(value_end))
            .map(|(d, (start, end))| match end {
                Some(end) if self.lifecycle.is_held_or_close(*d) => {
                    checked::sub(*end, *start, || self.describe("return", *d))
                }
                _ => Ok(Decimal::ZERO),
            })
            .collect()
    }

    fn return_per_period_percentage(
        &self,
        return_per_period: &[Decimal],
        value_start: &[Decimal],
    ) -> Result<Vec<Decimal>, MetricsError> {
        self.days()
            .iter()
            .zip(return_per_period.iter().zip(value_start))
            .map(|(d, (ret, start))| {
                checked::ratio_or_zero(*ret, *start, || self.describe("percentage return", *d))
            })
            .collect()
    }

    fn rate(&self, day: NaiveDate) -> Result<Decimal, MetricsError> {
        self.fx_rates
            .get(day)
            .ok_or_else(|| MetricsError::MissingMarketData {
                series: format!(
                    "FX rate ({}) for position {}",
                    self.position.instrument_currency, self.position.id
                ),
                date: day,
            })
    }

    fn missing_price(&self, day: NaiveDate) -> MetricsError {
        MetricsError::MissingMarketData {
            series: format!("price of instrument {}", self.position.instrument_id),
            date: day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ObservationSeries;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn calendar(from: u32, to: u32) -> Calendar {
        Calendar::generate(date(from), date(to)).unwrap()
    }

    /// rate 1.00, 1.01, 1.02, ... from 2023-01-01
    fn rising_rates() -> RateSeries {
        (0..10u32)
            .map(|i| (date(1 + i), dec!(1) + Decimal::new(i as i64, 2)))
            .collect()
    }

    /// price 100, 101, 102, ... from 2023-01-01
    fn rising_prices() -> PriceSeries {
        (0..10u32)
            .map(|i| (date(1 + i), Decimal::from(100 + i)))
            .collect()
    }

    fn position() -> PositionRecord {
        PositionRecord {
            id: "1".to_string(),
            open_date: date(2),
            close_date: Some(date(5)),
            open_price: dec!(102),
            close_price: Some(dec!(105)),
            quantity: dec!(10),
            instrument_id: "1".to_string(),
            instrument_currency: "EUR".to_string(),
        }
    }

    fn run(cal: &Calendar) -> DailyMetricSeries {
        PositionValuationEngine::calculate(&position(), cal, &rising_rates(), &rising_prices())
            .unwrap()
    }

    #[test]
    fn test_is_open_and_prices() {
        let series = run(&calendar(1, 10));
        let is_open: Vec<Decimal> = [0, 1, 1, 1, 0, 0, 0, 0, 0, 0]
            .iter()
            .map(|v| Decimal::from(*v))
            .collect();
        assert_eq!(series.is_open, is_open);
        assert_eq!(series.price_local[0], Some(dec!(0)));
        assert_eq!(series.price_local[1], Some(dec!(101)));
        assert_eq!(series.price_local[9], Some(dec!(109)));
        assert_eq!(series.price_target[1], Some(dec!(102.01)));
        assert_eq!(series.price_target[4], Some(dec!(108.16)));
    }

    #[test]
    fn test_values_follow_fx() {
        let series = run(&calendar(1, 10));
        assert_eq!(
            &series.value_target[..5],
            &[dec!(0), dec!(1020.1), dec!(1040.4), dec!(1060.9), dec!(0)]
        );
        assert_eq!(&series.value_local[1..4], &[dec!(1010), dec!(1020), dec!(1030)]);
    }

    #[test]
    fn test_value_start_and_end_boundaries() {
        let series = run(&calendar(1, 10));
        // open day: 102 * 1.01 * 10
        assert_eq!(series.value_start[1], dec!(1030.2));
        assert_eq!(series.value_start[2], dec!(1020.1));
        assert_eq!(series.value_start[4], dec!(1060.9));
        // close day: 105 * 1.04 * 10
        assert_eq!(series.value_end[4], Some(dec!(1092)));
        assert_eq!(series.value_end[5], None);
        assert_eq!(series.value_end[3], Some(dec!(1060.9)));
    }

    #[test]
    fn test_returns() {
        let series = run(&calendar(1, 10));
        assert_eq!(
            &series.return_per_period[..6],
            &[dec!(0), dec!(-10.1), dec!(20.3), dec!(20.5), dec!(31.1), dec!(0)]
        );
        assert_eq!(
            series.return_per_period_percentage[1],
            dec!(-10.1) / dec!(1030.2)
        );
        assert_eq!(series.return_per_period_percentage[0], Decimal::ZERO);
        assert_eq!(series.return_per_period_percentage[7], Decimal::ZERO);
    }

    #[test]
    fn test_window_starting_mid_position() {
        let series = run(&calendar(3, 6));
        // first day falls after the open: start from that day's own value
        assert_eq!(series.value_start[0], dec!(1040.4));
        assert_eq!(series.return_per_period[0], Decimal::ZERO);
        assert_eq!(series.return_per_period[1], dec!(20.5));
    }

    #[test]
    fn test_open_on_first_window_day() {
        let series = run(&calendar(2, 10));
        // 102 * 1.01 * 10, not the previous day's (absent) value
        assert_eq!(series.value_start[0], dec!(1030.2));
        assert_eq!(series.value_target[0], dec!(1020.1));
        assert_eq!(series.return_per_period[0], dec!(-10.1));
        assert_eq!(series.is_open[0], Decimal::ONE);
    }

    #[test]
    fn test_same_day_round_trip() {
        let mut pos = position();
        pos.open_date = date(3);
        pos.close_date = Some(date(3));
        let series = PositionValuationEngine::calculate(
            &pos,
            &calendar(1, 10),
            &rising_rates(),
            &rising_prices(),
        )
        .unwrap();

        assert!(series.is_open.iter().all(|o| o.is_zero()));
        assert!(series.value_target.iter().all(|v| v.is_zero()));
        // 102 * 1.02 * 10 in, 105 * 1.02 * 10 out
        assert_eq!(series.value_start[2], dec!(1040.4));
        assert_eq!(series.value_end[2], Some(dec!(1071)));
        assert_eq!(series.return_per_period[2], dec!(30.6));
        assert_eq!(
            series.return_per_period_percentage[2],
            dec!(30.6) / dec!(1040.4)
        );
        for (i, ret) in series.return_per_period.iter().enumerate() {
            if i != 2 {
                assert_eq!(*ret, Decimal::ZERO, "day {}", i + 1);
            }
        }
        assert_eq!(series.value_end[3], None);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let mut pos = position();
        pos.quantity = Decimal::MAX;
        let err = PositionValuationEngine::calculate(
            &pos,
            &calendar(1, 10),
            &rising_rates(),
            &rising_prices(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            MetricsError::Overflow("local value of position 1 on 2023-01-02".to_string())
        );
    }

    #[test]
    fn test_window_before_any_price() {
        let cal = Calendar::generate(
            NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
            date(4),
        )
        .unwrap();
        let series = run(&cal);
        assert_eq!(series.price_local[0], Some(Decimal::ZERO));
        assert_eq!(series.price_target[0], Some(Decimal::ZERO));
        assert_eq!(series.value_start[2], dec!(1030.2));
    }

    #[test]
    fn test_missing_price_on_open_day_fails() {
        let prices: PriceSeries = rising_prices()
            .get(date(1))
            .into_iter()
            .map(|p| (date(1), p))
            .collect();
        let err = PositionValuationEngine::calculate(
            &position(),
            &calendar(1, 10),
            &rising_rates(),
            &prices,
        )
        .unwrap_err();
        assert_eq!(
            err,
            MetricsError::MissingMarketData {
                series: "price of instrument 1".to_string(),
                date: date(2),
            }
        );
    }

    #[test]
    fn test_missing_price_after_close_is_undefined() {
        let prices: PriceSeries = (1..=5u32).map(|d| (date(d), Decimal::from(99 + d))).collect();
        let series = PositionValuationEngine::calculate(
            &position(),
            &calendar(1, 10),
            &rising_rates(),
            &prices,
        )
        .unwrap();
        assert_eq!(series.price_local[6], None);
        assert_eq!(series.price_target[6], None);
        assert_eq!(series.value_local[6], Decimal::ZERO);
    }

    #[test]
    fn test_missing_rate_on_close_day_fails() {
        let rates: RateSeries = (1..=4u32).map(|d| (date(d), dec!(1))).collect();
        let err = PositionValuationEngine::calculate(
            &position(),
            &calendar(1, 10),
            &rates,
            &rising_prices(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MetricsError::MissingMarketData { date: d, .. } if d == date(5)
        ));
    }

    #[test]
    fn test_identity_rates() {
        let series = PositionValuationEngine::calculate(
            &position(),
            &calendar(1, 6),
            &ObservationSeries::identity(),
            &rising_prices(),
        )
        .unwrap();
        assert_eq!(series.value_start[1], dec!(1020));
        assert_eq!(series.value_end[4], Some(dec!(1050)));
        assert_eq!(series.price_target, series.price_local);
    }

    #[test]
    fn test_invalid_position_is_rejected() {
        let mut pos = position();
        pos.close_date = Some(date(1));
        let err = PositionValuationEngine::calculate(
            &pos,
            &calendar(1, 10),
            &rising_rates(),
            &rising_prices(),
        )
        .unwrap_err();
        assert!(matches!(err, MetricsError::InvalidDateRange { .. }));
    }
}
