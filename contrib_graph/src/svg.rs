//! Week-aligned contribution grid rendered as a self-contained SVG document.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};

use crate::{DayStat, MergeSummary, Window};

const CELL_SIZE: i64 = 11;
const CELL_GAP: i64 = 3;
const MARGIN: i64 = 12;
const HEADER_HEIGHT: i64 = 34;

/// Light-to-dark fill per intensity level.
const PALETTE: [&str; 5] = ["#ebedf0", "#9be9a8", "#40c463", "#30a14e", "#216e39"];
const BACKGROUND: &str = "#ffffff";
const TEXT_PRIMARY: &str = "#24292f";
const TEXT_MUTED: &str = "#57606a";

#[derive(Clone, Copy, Debug)]
pub struct RenderOptions {
    /// Reserve a band above the grid for the totals and date-range labels.
    pub header: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { header: true }
    }
}

/// Sunday on or before the given date.
pub fn grid_start(start: NaiveDate) -> NaiveDate {
    start - Days::new(start.weekday().num_days_from_sunday() as u64)
}

/// Saturday on or after the given date.
pub fn grid_end(end: NaiveDate) -> NaiveDate {
    end + Days::new((6 - end.weekday().num_days_from_sunday()) as u64)
}

/// Column count: whole weeks between the padded endpoints, rounded up, plus
/// one trailing column.
pub fn week_columns(grid_start: NaiveDate, grid_end: NaiveDate) -> i64 {
    let days = (grid_end - grid_start).num_days();
    (days + 6) / 7 + 1
}

/// "1 contribution" vs "N contributions".
pub fn contributions_label(count: u64) -> String {
    if count == 1 {
        "1 contribution".to_string()
    } else {
        format!("{count} contributions")
    }
}

/// Render the calendar as an SVG string. Deterministic; dates missing from
/// `stats` (grid padding) fall back to count 0 / level 0.
pub fn render_svg(
    stats: &BTreeMap<NaiveDate, DayStat>,
    window: &Window,
    summary: &MergeSummary,
    opts: &RenderOptions,
) -> String {
    let start = grid_start(window.start);
    let end = grid_end(window.end);
    let columns = week_columns(start, end);
    let header = if opts.header { HEADER_HEIGHT } else { 0 };
    let width = MARGIN * 2 + columns * (CELL_SIZE + CELL_GAP) - CELL_GAP;
    let height = MARGIN * 2 + header + 7 * (CELL_SIZE + CELL_GAP) - CELL_GAP;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"0 0 {width} {height}\" role=\"img\" \
         aria-label=\"Contribution calendar, {from} to {to}\">\n",
        from = window.start,
        to = window.end,
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{BACKGROUND}\"/>\n"
    ));

    if opts.header {
        let per_source = summary
            .per_source
            .iter()
            .map(|(name, total)| format!("{name} {total}"))
            .collect::<Vec<_>>()
            .join(" \u{2022} ");
        svg.push_str(&format!(
            "<text x=\"{x}\" y=\"{y}\" font-family=\"sans-serif\" font-size=\"13\" \
             font-weight=\"600\" fill=\"{TEXT_PRIMARY}\">Total: {total} ({per_source})</text>\n",
            x = MARGIN,
            y = MARGIN + 13,
            total = summary.total,
        ));
        svg.push_str(&format!(
            "<text x=\"{x}\" y=\"{y}\" font-family=\"sans-serif\" font-size=\"11\" \
             fill=\"{TEXT_MUTED}\">{from} to {to}</text>\n",
            x = MARGIN,
            y = MARGIN + 28,
            from = window.start,
            to = window.end,
        ));
    }

    for week in 0..columns {
        for weekday in 0..7i64 {
            let date = start + Days::new((week * 7 + weekday) as u64);
            let stat = stats.get(&date).copied().unwrap_or_default();
            let x = MARGIN + week * (CELL_SIZE + CELL_GAP);
            let y = MARGIN + header + weekday * (CELL_SIZE + CELL_GAP);
            let fill = PALETTE[usize::from(stat.level.min(4))];
            svg.push_str(&format!(
                "<rect x=\"{x}\" y=\"{y}\" width=\"{CELL_SIZE}\" height=\"{CELL_SIZE}\" \
                 rx=\"2\" fill=\"{fill}\"><title>{date}: {label}</title></rect>\n",
                label = contributions_label(stat.count),
            ));
        }
    }

    svg.push_str("</svg>\n");
    svg
}
