//! Records table for the fleet TUI.
//!
//! Renders a bordered [`ratatui::widgets::Table`] with one row per evaluated
//! unit plus a highlighted totals row at the bottom.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use fleet_core::formatting::{self, or_unset};
use fleet_core::models::EvaluatedRecord;
use fleet_core::report::ReportTotals;

use crate::components::distribution::fit_width;
use crate::themes::Theme;

pub const COLUMNS: [&str; 10] = [
    "Unit",
    "Decision",
    "Rule",
    "Ownership",
    "Repairs",
    "Company Cost",
    "Avg Cost",
    "Distance",
    "Avg/Day",
    "Liability",
];

const UNIT_WIDTH: u16 = 14;

/// Display strings for one table row. Unset values are [`formatting::UNSET`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordCells {
    pub unit: String,
    pub decision: String,
    pub rule: String,
    pub ownership: String,
    pub repairs: String,
    pub company_cost: String,
    pub avg_cost: String,
    pub distance: String,
    pub avg_daily: String,
    pub liability: String,
}

impl RecordCells {
    pub fn from_record(r: &EvaluatedRecord) -> Self {
        let m = r.record.maintenance.as_ref();
        let f = r.record.finance.as_ref();
        let d = r.record.distance.as_ref();
        Self {
            unit: r.record.display_unit(),
            decision: r.decision.to_string(),
            rule: r.rule.to_string(),
            ownership: or_unset(f.map(|f| f.ownership_class), |c| c.to_string()),
            repairs: or_unset(m.map(|m| m.total_repairs), |n| n.to_string()),
            company_cost: or_unset(m.map(|m| m.total_company_cost), formatting::format_currency),
            avg_cost: or_unset(m.and_then(|m| m.avg_cost_per_repair), formatting::format_currency),
            distance: or_unset(d.map(|d| d.total_distance_km), formatting::format_distance),
            avg_daily: or_unset(d.map(|d| d.avg_daily_distance_km), formatting::format_distance),
            liability: or_unset(
                f.map(|f| f.total_estimated_liability),
                formatting::format_currency,
            ),
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        vec![
            self.unit.clone(),
            self.decision.clone(),
            self.rule.clone(),
            self.ownership.clone(),
            self.repairs.clone(),
            self.company_cost.clone(),
            self.avg_cost.clone(),
            self.distance.clone(),
            self.avg_daily.clone(),
            self.liability.clone(),
        ]
    }
}

/// Cells of the totals row.
pub fn totals_cells(totals: &ReportTotals) -> Vec<String> {
    vec![
        "TOTAL".to_string(),
        format!("{} units", totals.records),
        format!("{} orphans", totals.orphans),
        String::new(),
        String::new(),
        formatting::format_currency(totals.total_company_cost),
        String::new(),
        formatting::format_distance(totals.total_distance_km),
        String::new(),
        formatting::format_currency(totals.total_estimated_liability),
    ]
}

/// Render the records table into `area`.
///
/// `offset` is the index of the first record shown; the totals row always
/// stays visible.
pub fn render_table_view(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    records: &[&EvaluatedRecord],
    totals: &ReportTotals,
    offset: usize,
    theme: &Theme,
) {
    let header_cells = COLUMNS
        .iter()
        .map(|h| Cell::from(*h).style(theme.table_header));
    let header = Row::new(header_cells).height(1);

    // Borders, header and totals row take four lines.
    let visible = area.height.saturating_sub(4) as usize;
    let start = offset.min(records.len().saturating_sub(1));

    let data_rows: Vec<Row> = records
        .iter()
        .enumerate()
        .skip(start)
        .take(visible.max(1))
        .map(|(i, r)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            let cells = RecordCells::from_record(r);
            Row::new(vec![
                Cell::from(fit_width(&cells.unit, UNIT_WIDTH as usize)),
                Cell::from(cells.decision).style(theme.decision_style(r.decision)),
                Cell::from(cells.rule),
                Cell::from(cells.ownership)
                    .style(theme.ownership_style(r.record.ownership_class())),
                Cell::from(cells.repairs),
                Cell::from(cells.company_cost),
                Cell::from(cells.avg_cost),
                Cell::from(cells.distance),
                Cell::from(cells.avg_daily),
                Cell::from(cells.liability),
            ])
            .style(style)
        })
        .collect();

    let total_row = Row::new(totals_cells(totals).into_iter().map(Cell::from))
        .style(theme.table_total);

    let mut all_rows = data_rows;
    all_rows.push(total_row);

    let widths = [
        Constraint::Length(UNIT_WIDTH),
        Constraint::Length(9),
        Constraint::Length(20),
        Constraint::Length(16),
        Constraint::Length(8),
        Constraint::Length(14),
        Constraint::Length(12),
        Constraint::Length(13),
        Constraint::Length(10),
        Constraint::Length(14),
    ];

    let table = Table::new(all_rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" {} ", title)),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Render a placeholder when no record passes the filter or the run failed.
pub fn render_no_data(frame: &mut Frame, area: Rect, message: Option<&str>, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No fleet records to show", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(
            message.unwrap_or("Adjust the filters or check the input directory."),
            theme.dim,
        )),
        Line::from(Span::styled(
            "Press 'a' to reset filters, 'q' or Ctrl+C to exit",
            theme.dim,
        )),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Fleet Evaluation "),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::models::{
        CombinedRecord, Decision, DistanceSummary, FinanceSummary, MaintenanceSummary,
        OwnershipClass, RuleOutcome, UnitKey,
    };
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn full(unit: &str) -> EvaluatedRecord {
        let key = UnitKey::Known(unit.to_string());
        EvaluatedRecord {
            record: CombinedRecord {
                key: key.clone(),
                maintenance: Some(MaintenanceSummary {
                    key: key.clone(),
                    unit_id: unit.to_string(),
                    total_repairs: 4,
                    total_company_cost: 12500.0,
                    avg_cost_per_repair: Some(3125.0),
                }),
                finance: Some(FinanceSummary {
                    key: key.clone(),
                    unit_id: Some(unit.to_string()),
                    ownership_type: Some("owned".to_string()),
                    ownership_class: OwnershipClass::Owned,
                    monthly_payment: None,
                    balloon_payment: None,
                    status: None,
                    purchase_amount: None,
                    est_remaining_payments: 0.0,
                    total_estimated_liability: 0.0,
                }),
                distance: Some(DistanceSummary {
                    key,
                    unit_id: unit.to_string(),
                    total_distance_km: 150000.0,
                    avg_daily_distance_km: 410.9,
                    data_points: 365,
                }),
            },
            decision: Decision::Keep,
            rule: RuleOutcome::CheapOwned,
        }
    }

    fn distance_only(unit: &str) -> EvaluatedRecord {
        let key = UnitKey::Known(unit.to_string());
        let mut record = CombinedRecord::new(key.clone());
        record.distance = Some(DistanceSummary {
            key,
            unit_id: unit.to_string(),
            total_distance_km: 900.0,
            avg_daily_distance_km: 900.0,
            data_points: 1,
        });
        EvaluatedRecord {
            record,
            decision: Decision::Inspect,
            rule: RuleOutcome::NoRuleMatched,
        }
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_record_cells_full() {
        let cells = RecordCells::from_record(&full("T 1"));
        assert_eq!(cells.unit, "T 1");
        assert_eq!(cells.decision, "KEEP");
        assert_eq!(cells.rule, "cheap_owned");
        assert_eq!(cells.ownership, "owned");
        assert_eq!(cells.repairs, "4");
        assert_eq!(cells.company_cost, "$12,500.00");
        assert_eq!(cells.avg_cost, "$3,125.00");
        assert_eq!(cells.distance, "150,000 km");
        assert_eq!(cells.avg_daily, "411 km");
        assert_eq!(cells.liability, "$0.00");
        assert_eq!(cells.to_vec().len(), COLUMNS.len());
    }

    #[test]
    fn test_record_cells_unset_values() {
        let cells = RecordCells::from_record(&distance_only("9"));
        assert_eq!(cells.ownership, formatting::UNSET);
        assert_eq!(cells.repairs, formatting::UNSET);
        assert_eq!(cells.company_cost, formatting::UNSET);
        assert_eq!(cells.liability, formatting::UNSET);
        assert_eq!(cells.distance, "900 km");
    }

    #[test]
    fn test_totals_cells() {
        let records = vec![full("1"), distance_only("2")];
        let totals = ReportTotals::from_records(&records);
        let cells = totals_cells(&totals);
        assert_eq!(cells.len(), COLUMNS.len());
        assert_eq!(cells[1], "2 units");
        assert_eq!(cells[2], "1 orphans");
        assert_eq!(cells[5], "$12,500.00");
        assert_eq!(cells[7], "150,900 km");
    }

    #[test]
    fn test_render_table_view_shows_rows() {
        let backend = TestBackend::new(150, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();
        let records = vec![full("T 1"), distance_only("D 2")];
        let refs: Vec<&EvaluatedRecord> = records.iter().collect();
        let totals = ReportTotals::from_records(refs.iter().copied());

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_table_view(frame, area, "Fleet", &refs, &totals, 0, &theme);
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Company Cost"));
        assert!(text.contains("T 1"));
        assert!(text.contains("D 2"));
        assert!(text.contains("TOTAL"));
    }

    #[test]
    fn test_render_table_view_offset_skips_rows() {
        let backend = TestBackend::new(150, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();
        let records = vec![full("FIRST"), full("SECOND")];
        let refs: Vec<&EvaluatedRecord> = records.iter().collect();
        let totals = ReportTotals::from_records(refs.iter().copied());

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_table_view(frame, area, "Fleet", &refs, &totals, 1, &theme);
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(!text.contains("FIRST"));
        assert!(text.contains("SECOND"));
    }

    #[test]
    fn test_render_table_view_empty_does_not_panic() {
        let backend = TestBackend::new(150, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::light();
        let refs: Vec<&EvaluatedRecord> = Vec::new();
        let totals = ReportTotals::default();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_table_view(frame, area, "Fleet", &refs, &totals, 3, &theme);
            })
            .unwrap();
    }

    #[test]
    fn test_render_no_data_shows_message() {
        let backend = TestBackend::new(80, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_no_data(frame, area, Some("Missing required table"), &theme);
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("No fleet records to show"));
        assert!(text.contains("Missing required table"));
    }
}
