//! Plain-text box tables for terminal output.

use std::collections::HashMap;

use unicode_width::{UnicodeWidthChar as _, UnicodeWidthStr as _};

use crate::model::ScenarioTriageRecord;

#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    pub key: &'a str,
    pub label: &'a str,
    pub width: usize,
}

impl<'a> Column<'a> {
    #[must_use]
    pub const fn new(key: &'a str, label: &'a str, width: usize) -> Self {
        Self { key, label, width }
    }
}

pub type Row = HashMap<String, String>;

/// Cut `text` to `width` display columns, marking the cut with `…`.
#[must_use]
pub fn ellipsize(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width <= 1 {
        return "…".to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn pad_right(text: &str, width: usize) -> String {
    let w = text.width();
    if w >= width {
        return text.to_string();
    }
    format!("{text}{}", " ".repeat(width - w))
}

fn cell(text: &str, width: usize) -> String {
    format!(" {} ", pad_right(&ellipsize(text, width), width))
}

fn rule(columns: &[Column<'_>], left: char, mid: char, right: char) -> String {
    let inner = columns
        .iter()
        .map(|c| "─".repeat(c.width + 2))
        .collect::<Vec<_>>()
        .join(&mid.to_string());
    format!("{left}{inner}{right}")
}

/// Render rows as a box-drawing table. Missing cells render blank.
#[must_use]
pub fn render_table(rows: &[Row], columns: &[Column<'_>]) -> String {
    let header = format!(
        "│{}│",
        columns
            .iter()
            .map(|c| cell(c.label, c.width))
            .collect::<Vec<_>>()
            .join("│")
    );

    let mut body: Vec<String> = rows
        .iter()
        .map(|row| {
            let cells = columns
                .iter()
                .map(|c| cell(row.get(c.key).map_or("", String::as_str), c.width))
                .collect::<Vec<_>>()
                .join("│");
            format!("│{cells}│")
        })
        .collect();
    if body.is_empty() {
        let blank = columns
            .iter()
            .map(|c| " ".repeat(c.width + 2))
            .collect::<Vec<_>>()
            .join("│");
        body.push(format!("│{blank}│"));
    }

    let mut lines = Vec::with_capacity(body.len() + 4);
    lines.push(rule(columns, '┌', '┬', '┐'));
    lines.push(header);
    lines.push(rule(columns, '├', '┼', '┤'));
    lines.extend(body);
    lines.push(rule(columns, '└', '┴', '┘'));
    lines.join("\n")
}

/// `(category, count)` pairs, most frequent first, ties by name.
#[must_use]
pub fn category_counts(records: &[ScenarioTriageRecord]) -> Vec<(&'static str, usize)> {
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.category.as_str()).or_default() += 1;
    }
    let mut rows: Vec<_> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    rows
}

#[allow(clippy::cast_precision_loss)]
fn share(count: usize, total: usize) -> String {
    format!("{}%", (count as f64 / total.max(1) as f64 * 100.0).round())
}

#[must_use]
pub fn category_summary_rows(records: &[ScenarioTriageRecord]) -> Vec<Row> {
    category_counts(records)
        .into_iter()
        .map(|(category, count)| {
            Row::from([
                ("category".to_string(), category.to_string()),
                ("count".to_string(), count.to_string()),
                ("pct".to_string(), share(count, records.len())),
            ])
        })
        .collect()
}

pub const SUMMARY_COLUMNS: [Column<'static>; 3] = [
    Column::new("category", "Category", 22),
    Column::new("count", "Count", 7),
    Column::new("pct", "%", 6),
];

pub const DETAIL_COLUMNS: [Column<'static>; 9] = [
    Column::new("#", "#", 3),
    Column::new("feature", "Feature", 18),
    Column::new("scenario", "Scenario", 30),
    Column::new("step", "Step", 24),
    Column::new("location", "Location", 22),
    Column::new("category", "Category", 18),
    Column::new("conf", "Conf", 6),
    Column::new("fp", "FP", 10),
    Column::new("top_error", "Top error", 40),
];

#[must_use]
pub fn detail_rows(records: &[ScenarioTriageRecord]) -> Vec<Row> {
    records
        .iter()
        .enumerate()
        .map(|(idx, r)| {
            Row::from([
                ("#".to_string(), (idx + 1).to_string()),
                ("feature".to_string(), r.feature.clone()),
                ("scenario".to_string(), r.scenario.clone()),
                ("step".to_string(), r.step.clone()),
                ("location".to_string(), r.location.clone()),
                ("category".to_string(), r.category.to_string()),
                (
                    "conf".to_string(),
                    format!("{}%", crate::ticket::percent(r.confidence)),
                ),
                ("fp".to_string(), r.fingerprint.clone()),
                ("top_error".to_string(), r.top_error.clone()),
            ])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ellipsize_respects_width() {
        assert_eq!(ellipsize("abc", 3), "abc");
        assert_eq!(ellipsize("abcdef", 4), "abc…");
        assert_eq!(ellipsize("abcdef", 1), "…");
    }

    #[test]
    fn renders_box_table() {
        let rows = vec![Row::from([
            ("a".to_string(), "x".to_string()),
            ("b".to_string(), "long value".to_string()),
        ])];
        let table = render_table(&rows, &[Column::new("a", "A", 2), Column::new("b", "B", 4)]);
        let expected = "\
┌────┬──────┐
│ A  │ B    │
├────┼──────┤
│ x  │ lon… │
└────┴──────┘";
        assert_eq!(table, expected);
    }

    #[test]
    fn empty_body_renders_blank_row() {
        let table = render_table(&[], &[Column::new("a", "A", 1)]);
        assert_eq!(table.lines().nth(3), Some("│   │"));
    }

    #[test]
    fn wide_chars_are_measured_by_display_width() {
        assert_eq!(ellipsize("日本語テキスト", 5), "日本…");
        assert_eq!(pad_right("日本", 5), "日本 ");
    }
}
