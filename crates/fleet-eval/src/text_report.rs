//! Plain-text rendering of a report for `--view report`.

use std::fmt::Write;

use fleet_core::formatting;
use fleet_core::models::{Decision, EvaluatedRecord};
use fleet_core::report::{ReportFilter, ReportTotals};
use fleet_data::analysis::RunMetadata;
use fleet_ui::table_view::{totals_cells, RecordCells, COLUMNS};

/// Summary block followed by an aligned table of `records`.
pub fn render(
    records: &[&EvaluatedRecord],
    metadata: &RunMetadata,
    filter: &ReportFilter,
) -> String {
    let totals = ReportTotals::from_records(records.iter().copied());
    let mut out = String::new();

    let _ = writeln!(out, "Fleet evaluation for {}", metadata.input_dir.display());
    let _ = writeln!(out, "Generated at {}", metadata.generated_at);
    let _ = writeln!(out, "Filter: {}", filter.describe());
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Units: {} ({} from a single table)",
        totals.records, totals.orphans
    );
    for decision in Decision::ALL {
        let _ = writeln!(
            out,
            "  {:<8}{:>5} ({:.1}%)",
            decision.as_str(),
            totals.count(decision),
            totals.share(decision)
        );
    }
    let _ = writeln!(
        out,
        "Company repair cost: {}",
        formatting::format_currency(totals.total_company_cost)
    );
    let _ = writeln!(
        out,
        "Distance travelled:  {}",
        formatting::format_distance(totals.total_distance_km)
    );
    let _ = writeln!(
        out,
        "Estimated liability: {}",
        formatting::format_currency(totals.total_estimated_liability)
    );
    let _ = writeln!(out);

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(records.len() + 2);
    rows.push(COLUMNS.iter().map(|c| c.to_string()).collect());
    rows.extend(records.iter().map(|r| RecordCells::from_record(r).to_vec()));
    rows.push(totals_cells(&totals));

    let mut widths = vec![0usize; COLUMNS.len()];
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let last = rows.len() - 1;
    for (i, row) in rows.iter().enumerate() {
        if i == last {
            let _ = writeln!(out, "{}", rule(&widths));
        }
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(col, (cell, w))| pad(cell, *w, col >= 4))
            .collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
        if i == 0 {
            let _ = writeln!(out, "{}", rule(&widths));
        }
    }

    out
}

fn rule(widths: &[usize]) -> String {
    let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    "-".repeat(total)
}

/// Numeric columns are right-aligned.
fn pad(cell: &str, width: usize, right: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(cell.chars().count()));
    if right {
        format!("{fill}{cell}")
    } else {
        format!("{cell}{fill}")
    }
}
