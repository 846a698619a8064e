//! Growth of the metric stream across a reconciled series.

use crate::types::{GrowthSummary, SeriesRow};

/// Compare the first and last non-null metric values of `rows`.
///
/// Rows are taken in the order given, which for a reconciled series is
/// chronological. Returns `None` when no row carries a metric value.
#[must_use]
pub fn compute_growth(rows: &[SeriesRow]) -> Option<GrowthSummary> {
    let mut observed = rows.iter().filter_map(|row| row.metric);
    let start_value = observed.next()?;
    let end_value = observed.last().unwrap_or(start_value);
    let absolute_delta = end_value - start_value;

    #[allow(clippy::cast_precision_loss)]
    let percent_delta =
        (start_value != 0).then(|| absolute_delta as f64 / start_value as f64 * 100.0);

    Some(GrowthSummary {
        start_value,
        end_value,
        absolute_delta,
        percent_delta,
    })
}
