//! Day axis for every metric series.

use chrono::NaiveDate;

use crate::error::MetricsError;

/// Consecutive calendar days of a requested window, both ends inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    days: Vec<NaiveDate>,
}

impl Calendar {
    pub fn generate(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, MetricsError> {
        if start_date > end_date {
            return Err(MetricsError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }

        let days = start_date
            .iter_days()
            .take_while(|d| *d <= end_date)
            .collect();

        Ok(Self { days })
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Always false for a generated calendar; kept for clippy's len_without_is_empty
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn start(&self) -> NaiveDate {
        self.days[0]
    }

    pub fn end(&self) -> NaiveDate {
        self.days[self.days.len() - 1]
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date <= self.end()
    }
}
