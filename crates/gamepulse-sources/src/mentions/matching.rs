//! Category matching and day boundaries shared by the mention sources.

use chrono::{Days, NaiveDate};

/// Lowercased category with any leading `#` removed.
#[must_use]
pub fn category_token(category: &str) -> String {
    category.trim_start_matches('#').to_lowercase()
}

/// Whether the post's title or body mentions `token` (already normalised
/// with [`category_token`]).
#[must_use]
pub fn matches_category(title: Option<&str>, body: Option<&str>, token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    let combined = format!("{} {}", title.unwrap_or_default(), body.unwrap_or_default());
    combined.to_lowercase().contains(token)
}

/// Unix seconds of `[date 00:00, next day 00:00)` in UTC.
#[must_use]
pub fn day_bounds(date: NaiveDate) -> (i64, i64) {
    let start = date.and_hms_opt(0, 0, 0).map_or(0, |dt| dt.and_utc().timestamp());
    let end = date
        .checked_add_days(Days::new(1))
        .and_then(|next| next.and_hms_opt(0, 0, 0))
        .map_or(start + 86_400, |dt| dt.and_utc().timestamp());
    (start, end)
}
