use chrono::NaiveDate;

use crate::models::PositionRecord;

/// Where a calendar day sits relative to a position's open and close dates.
///
/// An absent close date behaves as a close after the end of any window.
#[derive(Debug, Clone, Copy)]
pub struct Lifecycle {
    open: NaiveDate,
    close: Option<NaiveDate>,
}

impl Lifecycle {
    pub fn new(position: &PositionRecord) -> Self {
        Self {
            open: position.open_date,
            close: position.close_date,
        }
    }

    pub fn open(&self) -> NaiveDate {
        self.open
    }

    pub fn close(&self) -> Option<NaiveDate> {
        self.close
    }

    pub fn is_pre_open(&self, day: NaiveDate) -> bool {
        day < self.open
    }

    pub fn is_open_day(&self, day: NaiveDate) -> bool {
        day == self.open
    }

    pub fn is_pre_close(&self, day: NaiveDate) -> bool {
        self.close.map_or(true, |close| day < close)
    }

    pub fn is_close_day(&self, day: NaiveDate) -> bool {
        self.close == Some(day)
    }

    /// open <= day < close
    pub fn is_held(&self, day: NaiveDate) -> bool {
        !self.is_pre_open(day) && self.is_pre_close(day)
    }

    /// open <= day <= close; the days that carry a return
    pub fn is_held_or_close(&self, day: NaiveDate) -> bool {
        self.is_held(day) || self.is_close_day(day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn lifecycle(close: Option<NaiveDate>) -> Lifecycle {
        Lifecycle {
            open: date(2),
            close,
        }
    }

    #[test]
    fn test_held_excludes_close_day() {
        let lc = lifecycle(Some(date(5)));
        let held: Vec<bool> = (1..=6).map(|d| lc.is_held(date(d))).collect();
        assert_eq!(held, vec![false, true, true, true, false, false]);
        assert!(lc.is_held_or_close(date(5)));
        assert!(!lc.is_held_or_close(date(6)));
    }

    #[test]
    fn test_open_ended_position_never_closes() {
        let lc = lifecycle(None);
        assert!(lc.is_held(date(31)));
        assert!(!lc.is_close_day(date(31)));
        assert!(lc.is_pre_close(date(31)));
    }

    #[test]
    fn test_same_day_open_and_close() {
        let lc = lifecycle(Some(date(2)));
        assert!(!lc.is_held(date(2)));
        assert!(lc.is_held_or_close(date(2)));
        assert!(lc.is_open_day(date(2)));
    }
}
