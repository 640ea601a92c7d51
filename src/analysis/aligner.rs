//! Alignment of per-author sentiment onto a fixed calendar.
//!
//! Every author map is projected onto the same trailing week so repeated
//! renders share one x-axis, whatever dates the model happened to score.

use crate::models::{AuthorSentiment, SentimentSeries, SeriesColumn};
use chrono::{Duration, NaiveDate};

/// Number of dates in the aligned series.
pub const SERIES_DAYS: i64 = 7;

/// `today` and the six days before it, oldest first.
pub fn trailing_dates(today: NaiveDate) -> Vec<NaiveDate> {
    (0..SERIES_DAYS)
        .rev()
        .map(|offset| today - Duration::days(offset))
        .collect()
}

/// Build the aligned series for all tracked authors.
///
/// Missing scores stay `None` (distinct from a score of 0). The `Overall`
/// column averages the scores present on each date and is only added when
/// at least one author is tracked.
pub fn align_series(sentiment: &AuthorSentiment, today: NaiveDate) -> SentimentSeries {
    let dates = trailing_dates(today);

    let mut columns: Vec<SeriesColumn> = sentiment
        .iter()
        .map(|(handle, scores)| SeriesColumn {
            name: handle.to_string(),
            values: dates
                .iter()
                .map(|date| scores.get(date).map(|s| f64::from(*s)))
                .collect(),
        })
        .collect();

    if !columns.is_empty() {
        let overall = (0..dates.len())
            .map(|row| mean(columns.iter().filter_map(|c| c.values[row])))
            .collect();
        columns.push(SeriesColumn {
            name: SentimentSeries::OVERALL.to_string(),
            values: overall,
        });
    }

    SentimentSeries { dates, columns }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
