use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Daily metrics of one position, or of the whole basket.
///
/// Every field holds exactly one entry per calendar day, aligned with
/// `dates`. `None` marks a value that is undefined on that day (for example
/// `value_end` after the position was closed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyMetricSeries {
    pub dates: Vec<NaiveDate>,
    pub is_open: Vec<Decimal>,
    pub price_local: Vec<Option<Decimal>>,
    pub price_target: Vec<Option<Decimal>>,
    pub value_local: Vec<Decimal>,
    pub value_target: Vec<Decimal>,
    pub value_start: Vec<Decimal>,
    pub value_end: Vec<Option<Decimal>>,
    pub return_per_period: Vec<Decimal>,
    pub return_per_period_percentage: Vec<Decimal>,
}

/// The basket shares the position series shape
pub type BasketMetric = DailyMetricSeries;

impl DailyMetricSeries {
    /// All-zero series over `dates`
    pub fn zeroed(dates: &[NaiveDate]) -> Self {
        let n = dates.len();
        Self {
            dates: dates.to_vec(),
            is_open: vec![Decimal::ZERO; n],
            price_local: vec![Some(Decimal::ZERO); n],
            price_target: vec![Some(Decimal::ZERO); n],
            value_local: vec![Decimal::ZERO; n],
            value_target: vec![Decimal::ZERO; n],
            value_start: vec![Decimal::ZERO; n],
            value_end: vec![Some(Decimal::ZERO); n],
            return_per_period: vec![Decimal::ZERO; n],
            return_per_period_percentage: vec![Decimal::ZERO; n],
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Position of `date` on the day axis
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Number of days flagged open
    pub fn days_open(&self) -> usize {
        self.is_open.iter().filter(|v| !v.is_zero()).count()
    }

    /// Sum of the daily absolute returns over the window
    pub fn total_return(&self) -> Decimal {
        self.return_per_period.iter().copied().sum()
    }

    /// Every field has one entry per date and dates strictly ascend
    pub fn is_aligned(&self) -> bool {
        let n = self.dates.len();
        self.dates.windows(2).all(|w| w[0] < w[1])
            && self.is_open.len() == n
            && self.price_local.len() == n
            && self.price_target.len() == n
            && self.value_local.len() == n
            && self.value_target.len() == n
            && self.value_start.len() == n
            && self.value_end.len() == n
            && self.return_per_period.len() == n
            && self.return_per_period_percentage.len() == n
    }

    /// Apply `f` to every defined value, leaving undefined entries alone
    pub fn map_values<F>(&self, f: F) -> Self
    where
        F: Fn(Decimal) -> Decimal,
    {
        let plain = |v: &[Decimal]| v.iter().map(|x| f(*x)).collect::<Vec<_>>();
        let optional = |v: &[Option<Decimal>]| v.iter().map(|x| x.map(&f)).collect::<Vec<_>>();

        Self {
            dates: self.dates.clone(),
            is_open: plain(&self.is_open),
            price_local: optional(&self.price_local),
            price_target: optional(&self.price_target),
            value_local: plain(&self.value_local),
            value_target: plain(&self.value_target),
            value_start: plain(&self.value_start),
            value_end: optional(&self.value_end),
            return_per_period: plain(&self.return_per_period),
            return_per_period_percentage: plain(&self.return_per_period_percentage),
        }
    }
}
