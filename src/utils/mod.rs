//! Formatting helpers for terminal output
//!
//! Amounts are shown with `,` thousands separators and `.` as the decimal
//! point, rounded half away from zero to two places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Core formatting function with full control over output.
///
/// # Arguments
/// * `value` - The decimal value to format
/// * `width` - Minimum width for padding (0 for no padding, right-aligned)
/// * `currency` - Optional currency code appended after the number
///
/// # Examples
/// ```
/// use basket_metrics::utils::format_amount_with_width;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_amount_with_width(dec!(1234.56), 0, Some("USD")), "1,234.56 USD");
/// assert_eq!(format_amount_with_width(dec!(1234), 12, None), "    1,234.00");
/// ```
pub fn format_amount_with_width(value: Decimal, width: usize, currency: Option<&str>) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let is_negative = rounded < Decimal::ZERO;

    let formatted = format!("{:.2}", rounded.abs());
    let (integer_part, decimal_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let with_separators = group_thousands(integer_part);

    let sign = if is_negative { "-" } else { "" };
    let result = match currency {
        Some(code) => format!("{}{}.{} {}", sign, with_separators, decimal_part, code),
        None => format!("{}{}.{}", sign, with_separators, decimal_part),
    };

    if width > 0 && result.len() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// "1,234.56"
pub fn format_amount(value: Decimal) -> String {
    format_amount_with_width(value, 0, None)
}

/// A ratio as a percentage: 0.0125 -> "1.25%"
///
/// # Examples
/// ```
/// use basket_metrics::utils::format_ratio_pct;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_ratio_pct(dec!(-0.0034)), "-0.34%");
/// ```
pub fn format_ratio_pct(ratio: Decimal) -> String {
    format!("{}%", format_amount(ratio * Decimal::ONE_HUNDRED))
}
