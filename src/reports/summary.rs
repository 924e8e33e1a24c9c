use colored::Colorize;
use rust_decimal::Decimal;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use crate::payload::FinancialMetrics;
use crate::utils::{format_amount, format_ratio_pct};
use crate::valuation::DailyMetricSeries;

/// Headline figures of one series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSummary {
    pub days_open: usize,
    /// Target-currency value on the last day
    pub last_value: Decimal,
    pub total_return: Decimal,
    /// Daily percentage returns compounded over the window
    pub cumulative_return: Decimal,
}

pub fn summarize(series: &DailyMetricSeries) -> SeriesSummary {
    let growth = series
        .return_per_period_percentage
        .iter()
        .fold(Decimal::ONE, |acc, r| acc * (Decimal::ONE + r));

    SeriesSummary {
        days_open: series.days_open(),
        last_value: series.value_target.last().copied().unwrap_or_default(),
        total_return: series.total_return(),
        cumulative_return: growth - Decimal::ONE,
    }
}

fn signed(text: String, value: Decimal) -> String {
    if value > Decimal::ZERO {
        text.green().to_string()
    } else if value < Decimal::ZERO {
        text.red().to_string()
    } else {
        text
    }
}

/// Table with one row per position and a closing basket row
pub fn format_summary_table(metrics: &FinancialMetrics, target_currency: &str) -> String {
    #[derive(Tabled)]
    struct SummaryRow {
        #[tabled(rename = "Position")]
        id: String,
        #[tabled(rename = "Days Open")]
        days_open: String,
        #[tabled(rename = "Last Value")]
        last_value: String,
        #[tabled(rename = "Total Return")]
        total_return: String,
        #[tabled(rename = "Cumulative %")]
        cumulative: String,
    }

    let row = |id: String, series: &DailyMetricSeries| {
        let s = summarize(series);
        SummaryRow {
            id,
            days_open: s.days_open.to_string(),
            last_value: format_amount(s.last_value),
            total_return: signed(format_amount(s.total_return), s.total_return),
            cumulative: signed(format_ratio_pct(s.cumulative_return), s.cumulative_return),
        }
    };

    let mut rows: Vec<SummaryRow> = metrics
        .positions
        .iter()
        .map(|(id, series)| row(id.clone(), series))
        .collect();
    rows.push(row("Basket".bold().to_string(), &metrics.basket));

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    table.modify(Columns::new(1..), Alignment::right());

    let (first, last) = match (metrics.dates.first(), metrics.dates.last()) {
        (Some(first), Some(last)) => (first.to_string(), last.to_string()),
        _ => (String::new(), String::new()),
    };

    format!(
        "\n{} Basket metrics in {} ({} to {}, {} days)\n\n{}\n",
        "📊".cyan().bold(),
        target_currency,
        first,
        last,
        metrics.dates.len(),
        table
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn metrics() -> FinancialMetrics {
        let dates: Vec<NaiveDate> = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .iter_days()
            .take(3)
            .collect();
        let mut series = DailyMetricSeries::zeroed(&dates);
        series.is_open = vec![dec!(0), dec!(1), dec!(1)];
        series.value_target = vec![dec!(0), dec!(1000), dec!(1100)];
        series.return_per_period = vec![dec!(0), dec!(0), dec!(100)];
        series.return_per_period_percentage = vec![dec!(0), dec!(0), dec!(0.1)];

        FinancialMetrics {
            dates: dates.clone(),
            positions: vec![("1".to_string(), series.clone())],
            basket: series,
        }
    }

    #[test]
    fn test_summarize() {
        let m = metrics();
        let s = summarize(&m.basket);
        assert_eq!(s.days_open, 2);
        assert_eq!(s.last_value, dec!(1100));
        assert_eq!(s.total_return, dec!(100));
        assert_eq!(s.cumulative_return, dec!(0.1));
    }

    #[test]
    fn test_compounding() {
        let mut series = metrics().basket;
        series.return_per_period_percentage = vec![dec!(0.1), dec!(0.1), dec!(0)];
        assert_eq!(summarize(&series).cumulative_return, dec!(0.21));
    }

    #[test]
    fn test_table_lists_positions_and_basket() {
        colored::control::set_override(false);
        let table = format_summary_table(&metrics(), "USD");
        assert!(table.contains("Basket metrics in USD (2023-01-01 to 2023-01-03, 3 days)"));
        assert!(table.contains("Basket"));
        assert!(table.contains("1,100.00"));
        assert!(table.contains("10.00%"));
    }
}
