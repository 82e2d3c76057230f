//! Self-contained HTML triage report for business and engineering review.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::model::{RunContext, ScenarioTriageRecord};
use crate::table::category_counts;

pub const HIGH_CONFIDENCE: f64 = 0.8;
pub const MEDIUM_CONFIDENCE: f64 = 0.55;
const MAX_ACTION_ITEMS: usize = 8;

const STYLE: &str = r"
  :root { --ink: #0f172a; --muted: #475569; --line: #dbe3ef; --bg: #f4f7fb; }
  * { box-sizing: border-box; }
  body { margin: 0; font-family: -apple-system, Segoe UI, Roboto, sans-serif; color: var(--ink); background: var(--bg); }
  .container { max-width: 1280px; margin: 24px auto; padding: 0 16px 32px; }
  .card { background: #fff; border: 1px solid var(--line); border-radius: 12px; padding: 18px; margin-bottom: 16px; }
  .hero { background: linear-gradient(135deg, #0b3a78, #1d4ed8); color: #fff; }
  .meta, .muted { color: var(--muted); font-size: 13px; }
  .hero .meta { color: #dbeafe; }
  .grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 12px; margin-top: 14px; }
  .metric { border-radius: 10px; padding: 12px; background: rgba(255, 255, 255, 0.12); }
  .metric .label { font-size: 12px; font-weight: 600; text-transform: uppercase; }
  .metric .value { font-size: 24px; font-weight: 700; margin-top: 4px; }
  .two-col { display: grid; grid-template-columns: 1fr 1fr; gap: 20px; }
  table { width: 100%; border-collapse: collapse; font-size: 13px; }
  th, td { border-bottom: 1px solid var(--line); padding: 8px; text-align: left; vertical-align: top; }
  th { background: #f8fafc; }
  .scroll { max-height: 640px; overflow: auto; }
  .badge, .confidence { display: inline-block; padding: 2px 8px; border-radius: 999px; border: 1px solid; font-size: 12px; font-weight: 600; }
  .cat-timeout { background: #fff7ed; color: #9a3412; border-color: #fed7aa; }
  .cat-env { background: #eff6ff; color: #1d4ed8; border-color: #bfdbfe; }
  .cat-infra { background: #f5f3ff; color: #6d28d9; border-color: #ddd6fe; }
  .cat-test { background: #f0fdf4; color: #166534; border-color: #bbf7d0; }
  .cat-regression { background: #fff1f2; color: #be123c; border-color: #fecdd3; }
  .cat-flake { background: #fefce8; color: #854d0e; border-color: #fef08a; }
  .cat-neutral { background: #f8fafc; color: #334155; border-color: #cbd5e1; }
  .confidence.high { background: #ecfdf3; color: #166534; border-color: #bbf7d0; }
  .confidence.medium { background: #fffbeb; color: #92400e; border-color: #fde68a; }
  .confidence.low { background: #fff1f2; color: #9f1239; border-color: #fecdd3; }
  code { font-family: ui-monospace, Menlo, monospace; font-size: 12px; }
  .tab-shell { position: sticky; top: 0; z-index: 5; margin-bottom: 16px; }
  .tab-bar { display: flex; gap: 8px; padding: 6px; border: 1px solid var(--line); border-radius: 12px; background: rgba(255, 255, 255, 0.92); }
  .tab-btn { border: 0; border-radius: 8px; padding: 8px 14px; font-weight: 600; background: transparent; color: var(--muted); cursor: pointer; }
  .tab-btn:hover { background: #f1f5f9; }
  .tab-btn.active { background: #1d4ed8; color: #fff; }
  .tab-panel { display: none; }
  .tab-panel.active { display: block; }
  .details-head { display: flex; justify-content: space-between; align-items: baseline; gap: 12px; }
  .details-count { color: var(--muted); font-size: 13px; }
  .filters { display: grid; grid-template-columns: 2fr 1fr 1fr auto; gap: 12px; align-items: end; margin: 12px 0; }
  .filter-item label { display: block; font-size: 12px; font-weight: 600; color: var(--muted); margin-bottom: 4px; }
  .filter-item input, .filter-item select { width: 100%; padding: 7px 9px; border: 1px solid var(--line); border-radius: 8px; font-size: 13px; }
  .btn-reset { padding: 8px 12px; border: 1px solid var(--line); border-radius: 8px; background: #fff; cursor: pointer; }
  .btn-reset:hover { background: #f8fafc; }
  @media print {
    body { background: #fff; } .card { break-inside: avoid; } .scroll { max-height: none; overflow: visible; }
    .tab-shell { display: none; } .tab-panel { display: block !important; }
    .filters, .details-count, .btn-reset { display: none !important; }
  }
  @media (max-width: 900px) { .two-col, .filters { grid-template-columns: 1fr; } }
";

/// Tab switching and the details filter bar. Rows carry `data-category`,
/// `data-confidence` and a lowercased `data-search` haystack.
const SCRIPT: &str = r"
(function () {
  var buttons = Array.prototype.slice.call(document.querySelectorAll('.tab-btn'));
  var panels = Array.prototype.slice.call(document.querySelectorAll('.tab-panel'));
  function activate(tab) {
    buttons.forEach(function (btn) {
      var selected = btn.getAttribute('data-tab') === tab;
      btn.classList.toggle('active', selected);
      btn.setAttribute('aria-selected', selected ? 'true' : 'false');
    });
    panels.forEach(function (panel) {
      panel.classList.toggle('active', panel.id === 'tab-' + tab);
    });
  }
  buttons.forEach(function (btn) {
    btn.addEventListener('click', function () {
      var tab = btn.getAttribute('data-tab');
      if (tab) activate(tab);
    });
  });

  var searchInput = document.getElementById('filter-search');
  var categorySelect = document.getElementById('filter-category');
  var confidenceSelect = document.getElementById('filter-confidence');
  var resetButton = document.getElementById('filter-reset');
  var detailsCount = document.getElementById('details-count');
  var emptyRow = document.getElementById('details-empty');
  var rows = Array.prototype.slice.call(document.querySelectorAll('#details-tbody .detail-row'));

  function applyFilters() {
    var search = (searchInput.value || '').toLowerCase().trim();
    var category = categorySelect.value || 'all';
    var confidence = confidenceSelect.value || 'all';
    var visible = 0;
    rows.forEach(function (row) {
      var show = (!search || (row.getAttribute('data-search') || '').indexOf(search) !== -1)
        && (category === 'all' || row.getAttribute('data-category') === category)
        && (confidence === 'all' || row.getAttribute('data-confidence') === confidence);
      row.style.display = show ? '' : 'none';
      if (show) visible += 1;
    });
    detailsCount.textContent = 'Showing ' + visible + ' of ' + rows.length + ' scenarios';
    emptyRow.style.display = visible === 0 ? '' : 'none';
  }

  searchInput.addEventListener('input', applyFilters);
  categorySelect.addEventListener('change', applyFilters);
  confidenceSelect.addEventListener('change', applyFilters);
  resetButton.addEventListener('click', function () {
    searchInput.value = '';
    categorySelect.value = 'all';
    confidenceSelect.value = 'all';
    applyFilters();
  });
  applyFilters();
})();
";

#[must_use]
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[must_use]
pub fn confidence_label(confidence: f64) -> &'static str {
    if confidence >= HIGH_CONFIDENCE {
        "High"
    } else if confidence >= MEDIUM_CONFIDENCE {
        "Medium"
    } else {
        "Low"
    }
}

fn confidence_class(confidence: f64) -> &'static str {
    match confidence_label(confidence) {
        "High" => "high",
        "Medium" => "medium",
        _ => "low",
    }
}

fn category_class(category: &str) -> &'static str {
    let token = category.to_ascii_lowercase();
    if token.contains("timeout") {
        "cat-timeout"
    } else if token.contains("env") {
        "cat-env"
    } else if token.contains("infra") {
        "cat-infra"
    } else if token.contains("test_bug") {
        "cat-test"
    } else if token.contains("regression") {
        "cat-regression"
    } else if token.contains("flake") {
        "cat-flake"
    } else {
        "cat-neutral"
    }
}

/// First suggested fix of each record, deduplicated, in record order.
#[must_use]
pub fn top_action_items(records: &[ScenarioTriageRecord], max_items: usize) -> Vec<&str> {
    let mut actions: Vec<&str> = Vec::new();
    for record in records {
        let Some(action) = record.suggested_fix.first() else {
            continue;
        };
        if actions.contains(&action.as_str()) {
            continue;
        }
        actions.push(action);
        if actions.len() >= max_items {
            break;
        }
    }
    actions
}

fn context_rows(ctx: &RunContext) -> Vec<(&'static str, &str)> {
    [
        ("Repository", &ctx.repo),
        ("Branch", &ctx.branch),
        ("Commit", &ctx.commit_sha),
        ("Pull Request", &ctx.pr_number),
        ("Environment", &ctx.environment),
        ("Base URL", &ctx.base_url),
        ("Workflow URL", &ctx.workflow_url),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(|v| (label, v))
    })
    .collect()
}

/// Render the full HTML document.
#[must_use]
#[allow(clippy::too_many_lines, clippy::cast_precision_loss)]
pub fn render_html_report(
    records: &[ScenarioTriageRecord],
    context: &RunContext,
    generated_at: &str,
) -> String {
    let total = records.len();
    let categories = category_counts(records);
    let top_category = categories.first().map_or("UNKNOWN", |(c, _)| *c);
    let high = records
        .iter()
        .filter(|r| r.confidence >= HIGH_CONFIDENCE)
        .count();
    let medium = records
        .iter()
        .filter(|r| (MEDIUM_CONFIDENCE..HIGH_CONFIDENCE).contains(&r.confidence))
        .count();
    let low = records
        .iter()
        .filter(|r| r.confidence < MEDIUM_CONFIDENCE)
        .count();

    let mut html = String::with_capacity(16 * 1024);
    let _ = write!(
        html,
        "<!doctype html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\" />\n  \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n  \
         <title>E2E Triage Report</title>\n  <style>{STYLE}</style>\n</head>\n<body>\n<div class=\"container\">\n"
    );

    let _ = write!(
        html,
        "<section class=\"card hero\">\n  <h1>Playwright + Cucumber Failure Triage Report</h1>\n  \
         <div class=\"meta\">Generated at {}</div>\n  <div class=\"grid\">\n",
        escape_html(generated_at)
    );
    for (label, value) in [
        ("Failed Scenarios", total.to_string()),
        ("Top Category", top_category.to_string()),
        ("High Confidence", high.to_string()),
        ("Medium Confidence", medium.to_string()),
        ("Low Confidence", low.to_string()),
    ] {
        let _ = writeln!(
            html,
            "    <div class=\"metric\"><div class=\"label\">{label}</div><div class=\"value\">{}</div></div>",
            escape_html(&value)
        );
    }
    html.push_str("  </div>\n</section>\n");

    html.push_str(
        "<div class=\"tab-shell\">\n  <div class=\"tab-bar\" role=\"tablist\" aria-label=\"Report sections\">\n    \
         <button class=\"tab-btn active\" id=\"tab-summary-btn\" role=\"tab\" aria-selected=\"true\" \
         aria-controls=\"tab-summary\" data-tab=\"summary\">Summary</button>\n    \
         <button class=\"tab-btn\" id=\"tab-details-btn\" role=\"tab\" aria-selected=\"false\" \
         aria-controls=\"tab-details\" data-tab=\"details\">Failed Scenario Details</button>\n  </div>\n</div>\n",
    );

    html.push_str(
        "<section id=\"tab-summary\" class=\"tab-panel active\" role=\"tabpanel\" aria-labelledby=\"tab-summary-btn\">\n\
         <section class=\"card\">\n  <h2>Business Summary</h2>\n  <p class=\"muted\">This report groups failed \
         scenarios into likely root causes and provides recommended next actions. Focus first on categories \
         with the highest count and scenarios with higher confidence.</p>\n  <div class=\"two-col\">\n    <div>\n      \
         <h3>Category Breakdown</h3>\n      <table class=\"summary-table\">\n        \
         <thead><tr><th>Category</th><th>Count</th><th>Share</th></tr></thead>\n        <tbody>\n",
    );
    for (category, count) in &categories {
        let pct = (*count as f64 / total.max(1) as f64 * 100.0).round();
        let _ = writeln!(
            html,
            "          <tr><td><span class=\"badge {}\">{}</span></td><td>{count}</td><td>{pct}%</td></tr>",
            category_class(category),
            escape_html(category)
        );
    }
    html.push_str("        </tbody>\n      </table>\n    </div>\n    <div>\n      <h3>Recommended Action Plan</h3>\n      <ul>\n");
    for action in top_action_items(records, MAX_ACTION_ITEMS) {
        let _ = writeln!(html, "        <li>{}</li>", escape_html(action));
    }
    html.push_str(
        "      </ul>\n      <h3>Confidence Guide</h3>\n      <ul>\n        \
         <li><strong>High</strong>: likely accurate categorization, prioritize immediately.</li>\n        \
         <li><strong>Medium</strong>: likely directionally correct, validate with traces/logs.</li>\n        \
         <li><strong>Low</strong>: needs human review before assigning ownership.</li>\n      \
         </ul>\n    </div>\n  </div>\n</section>\n",
    );

    html.push_str("<section class=\"card\">\n  <h2>Run Context</h2>\n");
    let ctx_rows = context_rows(context);
    if ctx_rows.is_empty() {
        html.push_str("  <p class=\"muted\">No run context metadata was provided.</p>\n");
    } else {
        html.push_str("  <table class=\"context-table\"><tbody>\n");
        for (label, value) in ctx_rows {
            let _ = writeln!(
                html,
                "    <tr><th>{label}</th><td>{}</td></tr>",
                escape_html(value)
            );
        }
        html.push_str("  </tbody></table>\n");
    }
    html.push_str("</section>\n</section>\n");

    let _ = write!(
        html,
        "<section id=\"tab-details\" class=\"tab-panel\" role=\"tabpanel\" aria-labelledby=\"tab-details-btn\">\n\
         <section class=\"card\">\n  <div class=\"details-head\">\n    <h2>Failed Scenario Details</h2>\n    \
         <div id=\"details-count\" class=\"details-count\">Showing {total} of {total} scenarios</div>\n  </div>\n  \
         <div class=\"filters\">\n    <div class=\"filter-item\">\n      <label for=\"filter-search\">Search</label>\n      \
         <input id=\"filter-search\" type=\"text\" placeholder=\"Feature, scenario, error, location, fingerprint...\" />\n    \
         </div>\n    <div class=\"filter-item\">\n      <label for=\"filter-category\">Category</label>\n      \
         <select id=\"filter-category\">\n        <option value=\"all\">All Categories</option>\n"
    );
    for (category, _) in &categories {
        let value = escape_html(category);
        let _ = writeln!(html, "        <option value=\"{value}\">{value}</option>");
    }
    html.push_str(
        "      </select>\n    </div>\n    <div class=\"filter-item\">\n      \
         <label for=\"filter-confidence\">Confidence</label>\n      <select id=\"filter-confidence\">\n        \
         <option value=\"all\">All Levels</option>\n        <option value=\"high\">High</option>\n        \
         <option value=\"medium\">Medium</option>\n        <option value=\"low\">Low</option>\n      </select>\n    \
         </div>\n    <button id=\"filter-reset\" class=\"btn-reset\" type=\"button\">Reset Filters</button>\n  </div>\n  \
         <div class=\"scroll\">\n  <table class=\"details-table\">\n    <thead><tr><th>#</th><th>Feature</th><th>Scenario</th>\
         <th>Category</th><th>Confidence</th><th>Top Error</th><th>Location</th><th>Fingerprint</th></tr></thead>\n    \
         <tbody id=\"details-tbody\">\n",
    );
    for (idx, r) in records.iter().enumerate() {
        let search = format!(
            "{} {} {} {} {}",
            r.feature, r.scenario, r.top_error, r.location, r.fingerprint
        )
        .to_lowercase();
        let top_error = if r.top_error.is_empty() {
            "N/A"
        } else {
            r.top_error.as_str()
        };
        let _ = writeln!(
            html,
            "      <tr class=\"detail-row\" data-category=\"{}\" data-confidence=\"{}\" data-search=\"{}\">\
             <td>{}</td><td>{}</td><td>{}</td><td><span class=\"badge {}\">{}</span></td>\
             <td><span class=\"confidence {}\">{}% ({})</span></td><td>{}</td><td>{}</td><td><code>{}</code></td></tr>",
            escape_html(r.category.as_str()),
            confidence_class(r.confidence),
            escape_html(&search),
            idx + 1,
            escape_html(&r.feature),
            escape_html(&r.scenario),
            category_class(r.category.as_str()),
            r.category,
            confidence_class(r.confidence),
            crate::ticket::percent(r.confidence),
            confidence_label(r.confidence),
            escape_html(top_error),
            escape_html(&r.location),
            escape_html(&r.fingerprint),
        );
    }
    html.push_str(
        "      <tr id=\"details-empty\" class=\"empty-row\" style=\"display:none;\">\
         <td colspan=\"8\" class=\"muted\">No scenarios match the selected filters.</td></tr>\n",
    );
    html.push_str("    </tbody>\n  </table>\n  </div>\n</section>\n</section>\n");

    html.push_str(
        "<p class=\"muted\">Categories are heuristic triage hints with a bounded confidence score; \
         confirm with traces before assigning ownership.</p>\n</div>\n",
    );
    let _ = writeln!(html, "<script>{SCRIPT}</script>\n</body>\n</html>");
    html
}

/// Render and write the report, stamped with the current UTC time.
pub fn write_html_report(
    path: &Path,
    records: &[ScenarioTriageRecord],
    context: &RunContext,
) -> Result<()> {
    let generated_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    fs::write(path, render_html_report(records, context, &generated_at))?;
    Ok(())
}
