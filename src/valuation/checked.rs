//! Overflow-checked decimal arithmetic
//!
//! `Decimal` operators panic when a result leaves the 96-bit mantissa. Every
//! product, sum and ratio in the engines goes through these instead, naming
//! what was being computed when the range ran out.

use rust_decimal::Decimal;

use crate::error::MetricsError;

fn overflow(what: impl FnOnce() -> String) -> MetricsError {
    MetricsError::Overflow(what())
}

pub(crate) fn mul(
    a: Decimal,
    b: Decimal,
    what: impl FnOnce() -> String,
) -> Result<Decimal, MetricsError> {
    a.checked_mul(b).ok_or_else(|| overflow(what))
}

pub(crate) fn add(
    a: Decimal,
    b: Decimal,
    what: impl FnOnce() -> String,
) -> Result<Decimal, MetricsError> {
    a.checked_add(b).ok_or_else(|| overflow(what))
}

pub(crate) fn sub(
    a: Decimal,
    b: Decimal,
    what: impl FnOnce() -> String,
) -> Result<Decimal, MetricsError> {
    a.checked_sub(b).ok_or_else(|| overflow(what))
}

/// `a / b`, or zero when `b` is zero
pub(crate) fn ratio_or_zero(
    a: Decimal,
    b: Decimal,
    what: impl FnOnce() -> String,
) -> Result<Decimal, MetricsError> {
    if b.is_zero() {
        return Ok(Decimal::ZERO);
    }
    a.checked_div(b).ok_or_else(|| overflow(what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_in_range_results_are_exact() {
        assert_eq!(mul(dec!(1.01), dec!(1010), String::new).unwrap(), dec!(1020.1));
        assert_eq!(add(dec!(0.1), dec!(0.2), String::new).unwrap(), dec!(0.3));
        assert_eq!(sub(dec!(1020.1), dec!(1030.2), String::new).unwrap(), dec!(-10.1));
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = mul(Decimal::MAX, dec!(2), || "quantity × price".to_string()).unwrap_err();
        assert_eq!(err, MetricsError::Overflow("quantity × price".to_string()));
        assert!(add(Decimal::MAX, Decimal::ONE, String::new).is_err());
        assert!(sub(Decimal::MIN, Decimal::ONE, String::new).is_err());
    }

    #[test]
    fn test_ratio_with_zero_denominator() {
        assert_eq!(ratio_or_zero(dec!(5), Decimal::ZERO, String::new).unwrap(), Decimal::ZERO);
        assert_eq!(ratio_or_zero(dec!(1), dec!(4), String::new).unwrap(), dec!(0.25));
        assert!(ratio_or_zero(Decimal::MAX, dec!(0.1), String::new).is_err());
    }
}
