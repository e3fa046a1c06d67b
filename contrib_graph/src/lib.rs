//! Core contribution-calendar pipeline: trailing-year date range, per-source
//! merge, intensity classification, and SVG grid rendering.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Days, NaiveDate};

pub mod levels;
pub mod sources;
pub mod svg;

pub use levels::{classify_calendar, level_for, quantile_thresholds};

#[derive(Debug)]
pub enum GraphError {
    Status {
        source: &'static str,
        status: u16,
        body: String,
    },
    Transport {
        source: &'static str,
        cause: reqwest::Error,
    },
    Decode {
        source: &'static str,
        cause: serde_json::Error,
    },
    Shape {
        source: &'static str,
        detail: String,
    },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::Status {
                source,
                status,
                body,
            } => write!(f, "{source} responded with HTTP {status}: {body}"),
            GraphError::Transport { source, cause } => {
                write!(f, "request to {source} failed: {cause}")
            }
            GraphError::Decode { source, cause } => {
                write!(f, "failed to decode {source} response: {cause}")
            }
            GraphError::Shape { source, detail } => {
                write!(f, "unexpected {source} response shape: {detail}")
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// Inclusive calendar-date window, UTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    /// The 365 consecutive dates ending at `end`.
    pub fn trailing_year(end: NaiveDate) -> Self {
        let start = end.checked_sub_days(Days::new(364)).unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Merged count and assigned intensity level for one date.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DayStat {
    pub count: u64,
    pub level: u8,
}

/// In-range totals accumulated during the merge, per source and overall.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub per_source: Vec<(String, u64)>,
    pub total: u64,
}

/// Build the zero-initialized calendar covering every date in the window,
/// end date included.
pub fn build_base_range(window: &Window) -> BTreeMap<NaiveDate, u64> {
    let mut range = BTreeMap::new();
    for day in window.start.iter_days() {
        if day > window.end {
            break;
        }
        range.insert(day, 0);
    }
    range
}

/// Sum fetched counts into the base calendar. Dates absent from the base
/// range are dropped; the key set never grows. In-range totals per source
/// and overall are accumulated for reporting.
pub fn merge_into(
    base: &mut BTreeMap<NaiveDate, u64>,
    fetched: &[(&str, BTreeMap<NaiveDate, u64>)],
) -> MergeSummary {
    let mut summary = MergeSummary::default();
    for (name, counts) in fetched {
        let mut source_total = 0u64;
        for (date, count) in counts {
            if let Some(slot) = base.get_mut(date) {
                *slot += count;
                source_total += count;
            }
        }
        summary.per_source.push((name.to_string(), source_total));
        summary.total += source_total;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn trailing_year_covers_365_days() {
        let window = Window::trailing_year(date("2025-08-07"));
        assert_eq!(window.start, date("2024-08-08"));
        let range = build_base_range(&window);
        assert_eq!(range.len(), 365);
        assert_eq!(range.keys().next().copied(), Some(window.start));
        assert_eq!(range.keys().next_back().copied(), Some(window.end));
        assert!(range.values().all(|&count| count == 0));
    }

    #[test]
    fn base_range_includes_end_date() {
        let window = Window {
            start: date("2024-02-27"),
            end: date("2024-03-02"),
        };
        let range = build_base_range(&window);
        // Leap year: Feb 29 is in range.
        assert_eq!(range.len(), 5);
        assert!(range.contains_key(&date("2024-02-29")));
        assert!(range.contains_key(&date("2024-03-02")));
    }

    #[test]
    fn date_string_round_trips() {
        let original = "2024-01-05";
        let parsed = date(original);
        assert_eq!(parsed.format("%Y-%m-%d").to_string(), original);
    }

    #[test]
    fn merge_sums_in_range_and_drops_outside() {
        let window = Window {
            start: date("2024-06-01"),
            end: date("2024-06-03"),
        };
        let mut base = build_base_range(&window);

        let mut a = BTreeMap::new();
        a.insert(date("2024-06-01"), 2);
        a.insert(date("2024-06-02"), 1);
        a.insert(date("2023-04-28"), 400); // ~400 days earlier, dropped
        let mut b = BTreeMap::new();
        b.insert(date("2024-06-01"), 3);
        b.insert(date("2024-06-03"), 7);

        let summary = merge_into(&mut base, &[("GitHub", a), ("GitLab", b)]);

        assert_eq!(base.len(), 3);
        assert_eq!(base[&date("2024-06-01")], 5);
        assert_eq!(base[&date("2024-06-02")], 1);
        assert_eq!(base[&date("2024-06-03")], 7);
        assert_eq!(
            summary.per_source,
            vec![("GitHub".to_string(), 3), ("GitLab".to_string(), 10)]
        );
        assert_eq!(summary.total, 13);
    }

    #[test]
    fn merge_with_empty_sources_keeps_zeros() {
        let window = Window {
            start: date("2024-06-01"),
            end: date("2024-06-02"),
        };
        let mut base = build_base_range(&window);
        let summary = merge_into(&mut base, &[("GitHub", BTreeMap::new()), ("GitLab", BTreeMap::new())]);
        assert_eq!(summary.total, 0);
        assert!(base.values().all(|&count| count == 0));
    }

    #[test]
    fn status_error_reports_code_and_body() {
        let err = GraphError::Status {
            source: "GitHub",
            status: 403,
            body: "rate limited".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("403"));
        assert!(message.contains("rate limited"));
    }
}
