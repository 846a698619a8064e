use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// One recorded reading of a metric stream for a calendar day.
///
/// `value` is `None` when every fetch tier failed; the row still exists so
/// that a rerun on the same day does not fetch again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub stream: String,
    pub value: Option<i64>,
    pub source: String,
}

/// Mention count recorded for a day under one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionCount {
    pub date: NaiveDate,
    pub category: String,
    pub count: i64,
}

/// One dense, reconciled day of the output series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRow {
    pub date: NaiveDate,
    pub metric: Option<i64>,
    pub mentions: i64,
}

/// Change of the metric between its first and last observation in a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthSummary {
    pub start_value: i64,
    pub end_value: i64,
    pub absolute_delta: i64,
    /// `None` when `start_value` is zero.
    pub percent_delta: Option<f64>,
}

impl std::fmt::Display for GrowthSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} = {:+}",
            self.start_value, self.end_value, self.absolute_delta
        )?;
        match self.percent_delta {
            Some(pct) => write!(f, " ({pct:.2}%)"),
            None => write!(f, " (n/a%)"),
        }
    }
}

/// Half-open calendar window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The `days`-long window whose last included day is `today`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyWindow`] for `days == 0` and
    /// [`CoreError::DateOverflow`] when the bounds fall off the calendar.
    pub fn ending_at(today: NaiveDate, days: u32) -> Result<Self, CoreError> {
        if days == 0 {
            return Err(CoreError::EmptyWindow(days));
        }
        let start = today
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .ok_or(CoreError::DateOverflow { date: today })?;
        let end = today
            .checked_add_days(Days::new(1))
            .ok_or(CoreError::DateOverflow { date: today })?;
        Ok(Self { start, end })
    }

    /// Number of days in the window; zero when `end <= start`.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::try_from((self.end - self.start).num_days().max(0)).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every day in the window, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d < end)
    }

    /// Last day included in the window.
    #[must_use]
    pub fn last_day(&self) -> Option<NaiveDate> {
        if self.is_empty() {
            None
        } else {
            self.end.pred_opt()
        }
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn window_ending_at_today_is_half_open() {
        let window = DateWindow::ending_at(d(2024, 3, 10), 3).unwrap();
        assert_eq!(window.start, d(2024, 3, 8));
        assert_eq!(window.end, d(2024, 3, 11));
        assert_eq!(window.len(), 3);
        assert_eq!(window.last_day(), Some(d(2024, 3, 10)));
    }

    #[test]
    fn single_day_window_contains_only_today() {
        let window = DateWindow::ending_at(d(2024, 1, 1), 1).unwrap();
        let days: Vec<_> = window.days().collect();
        assert_eq!(days, vec![d(2024, 1, 1)]);
    }

    #[test]
    fn zero_day_window_is_rejected() {
        assert!(matches!(
            DateWindow::ending_at(d(2024, 1, 1), 0),
            Err(CoreError::EmptyWindow(0))
        ));
    }

    #[test]
    fn overflow_reports_the_requested_end_day() {
        let err = DateWindow::ending_at(NaiveDate::MAX, 1).unwrap_err();
        assert!(matches!(err, CoreError::DateOverflow { date } if date == NaiveDate::MAX));

        let err = DateWindow::ending_at(NaiveDate::MIN, 2).unwrap_err();
        assert!(matches!(err, CoreError::DateOverflow { date } if date == NaiveDate::MIN));
        assert!(err.to_string().contains("window ending"));
    }

    #[test]
    fn window_crosses_month_and_leap_day() {
        let window = DateWindow::ending_at(d(2024, 3, 1), 3).unwrap();
        let days: Vec<_> = window.days().collect();
        assert_eq!(days, vec![d(2024, 2, 28), d(2024, 2, 29), d(2024, 3, 1)]);
    }

    #[test]
    fn inverted_window_is_empty() {
        let window = DateWindow::new(d(2024, 1, 5), d(2024, 1, 1));
        assert!(window.is_empty());
        assert_eq!(window.days().count(), 0);
        assert_eq!(window.last_day(), None);
    }

    #[test]
    fn growth_summary_display_formats_percent() {
        let growth = GrowthSummary {
            start_value: 100,
            end_value: 150,
            absolute_delta: 50,
            percent_delta: Some(50.0),
        };
        assert_eq!(growth.to_string(), "100 -> 150 = +50 (50.00%)");

        let undefined = GrowthSummary {
            start_value: 0,
            end_value: 10,
            absolute_delta: 10,
            percent_delta: None,
        };
        assert_eq!(undefined.to_string(), "0 -> 10 = +10 (n/a%)");
    }

    #[test]
    fn snapshot_serializes_null_value() {
        let snapshot = DailySnapshot {
            date: d(2024, 1, 1),
            stream: "steam:730".to_string(),
            value: None,
            source: "local_history".to_string(),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["value"].is_null());
        assert_eq!(json["date"], "2024-01-01");
    }
}
