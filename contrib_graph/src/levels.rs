//! Quantile-based intensity classification over the merged calendar.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::DayStat;

/// Nearest-rank quantile cut points at the 25th, 50th, and 75th percentiles
/// of the full value set, zeros included. Empty input yields all-zero
/// thresholds.
pub fn quantile_thresholds(counts: &[u64]) -> [u64; 3] {
    if counts.is_empty() {
        return [0; 3];
    }
    let mut sorted = counts.to_vec();
    sorted.sort_unstable();
    let pick = |p: f64| {
        let idx = ((sorted.len() - 1) as f64 * p).floor() as usize;
        sorted[idx]
    };
    [pick(0.25), pick(0.50), pick(0.75)]
}

/// Intensity level for one count. Zero is always level 0; positive counts
/// take the lowest band whose threshold they do not exceed, so a count
/// sitting exactly on a cut point lands in the lower level.
pub fn level_for(count: u64, thresholds: &[u64; 3]) -> u8 {
    if count == 0 {
        0
    } else if count <= thresholds[0] {
        1
    } else if count <= thresholds[1] {
        2
    } else if count <= thresholds[2] {
        3
    } else {
        4
    }
}

/// Assign a level to every date from thresholds computed over the whole
/// calendar.
pub fn classify_calendar(calendar: &BTreeMap<NaiveDate, u64>) -> BTreeMap<NaiveDate, DayStat> {
    let counts: Vec<u64> = calendar.values().copied().collect();
    let thresholds = quantile_thresholds(&counts);
    calendar
        .iter()
        .map(|(&date, &count)| {
            (
                date,
                DayStat {
                    count,
                    level: level_for(count, &thresholds),
                },
            )
        })
        .collect()
}
