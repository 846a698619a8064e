//! Reconciliation of sparse daily readings into a dense series.
//!
//! The metric stream is forward-filled from the last observation seen while
//! scanning the window left to right; the mention stream is zero-filled.
//! The scan only ever consults the day being emitted, so a value recorded
//! later in the window can never leak into an earlier row.

use chrono::NaiveDate;

use crate::types::{DateWindow, SeriesRow};

/// Build one [`SeriesRow`] per day of `window`, ascending.
///
/// `metric_on(day)` returns the day's direct metric observation, if any (a
/// stored snapshot whose value is null counts as no observation).
/// `mentions_on(day)` returns the day's recorded mention total, if any.
pub fn reconcile<M, C>(window: &DateWindow, mut metric_on: M, mut mentions_on: C) -> Vec<SeriesRow>
where
    M: FnMut(NaiveDate) -> Option<i64>,
    C: FnMut(NaiveDate) -> Option<i64>,
{
    window
        .days()
        .scan(None::<i64>, |carry, date| {
            let metric = match metric_on(date) {
                Some(value) => {
                    *carry = Some(value);
                    Some(value)
                }
                None => *carry,
            };
            Some(SeriesRow {
                date,
                metric,
                mentions: mentions_on(date).unwrap_or(0),
            })
        })
        .collect()
}
