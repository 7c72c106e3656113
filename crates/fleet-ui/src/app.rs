//! Main application state and TUI event loop for the fleet evaluator.
//!
//! [`App`] owns the theme, the active filter and the last evaluation report.
//! It drives both the static table view and the watch view.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use fleet_core::models::{Decision, EvaluatedRecord};
use fleet_core::report::{sort_by_decision, OwnershipFilter, ReportFilter, ReportTotals};
use fleet_data::analysis::EvaluationReport;
use fleet_data::export::{export_records, ExportFormat};
use fleet_runtime::orchestrator::EvaluationSnapshot;

use crate::components::distribution::{
    DecisionDistribution, DecisionShareBar, UnitBars, UnitMetric,
};
use crate::components::header::Header;
use crate::table_view;
use crate::themes::Theme;

// ── ViewMode ──────────────────────────────────────────────────────────────────

/// Which loop the TUI is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// One evaluation, browsed until the user quits.
    Table,
    /// Re-evaluated whenever the inputs change.
    Watch,
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the fleet TUI.
pub struct App {
    pub theme: Theme,
    pub view_mode: ViewMode,
    /// Directory shown in the header.
    pub input_dir: PathBuf,
    pub filter: ReportFilter,
    /// Index of the first table row on screen.
    pub offset: usize,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    /// Most recent report, `None` until the first evaluation succeeded.
    pub report: Option<EvaluationReport>,
    /// Error of the most recent watch run, if it failed.
    pub last_error: Option<String>,
    pub run_count: u64,
    /// Where `e` writes the filtered view.
    pub export_path: PathBuf,
    pub export_format: ExportFormat,
    /// One-line message shown under the charts (export results).
    pub status: Option<String>,
}

impl App {
    pub fn new(
        theme_name: &str,
        view_mode: ViewMode,
        input_dir: &Path,
        filter: ReportFilter,
        export_path: PathBuf,
        export_format: ExportFormat,
    ) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            view_mode,
            input_dir: input_dir.to_path_buf(),
            filter,
            offset: 0,
            should_quit: false,
            report: None,
            last_error: None,
            run_count: 0,
            export_path,
            export_format,
            status: None,
        }
    }

    // ── Public event loops ────────────────────────────────────────────────────

    /// Browse a single report until `q` / `Ctrl+C`.
    pub async fn run_table(mut self, report: EvaluationReport) -> io::Result<()> {
        self.report = Some(report);
        self.run_loop(None)
    }

    /// Run the watch TUI, receiving snapshots from `rx`.
    ///
    /// Uses `crossterm::event::poll` with a 250 ms timeout so the terminal
    /// loop stays on the current thread while snapshots arrive on the async
    /// channel via `try_recv`.
    pub async fn run_watch(mut self, mut rx: mpsc::Receiver<EvaluationSnapshot>) -> io::Result<()> {
        self.run_loop(Some(&mut rx))
    }

    fn run_loop(&mut self, mut rx: Option<&mut mpsc::Receiver<EvaluationSnapshot>>) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            if let Some(rx) = rx.as_deref_mut() {
                loop {
                    match rx.try_recv() {
                        Ok(snapshot) => self.update_from_snapshot(snapshot),
                        Err(mpsc::error::TryRecvError::Empty) => break,
                        Err(mpsc::error::TryRecvError::Disconnected) => {
                            self.should_quit = true;
                            break;
                        }
                    }
                }
            }

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    // ── State updates ─────────────────────────────────────────────────────────

    /// Apply one key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('c') {
                self.should_quit = true;
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Char('k') => self.toggle_decision(Decision::Keep),
            KeyCode::Char('s') => self.toggle_decision(Decision::Sell),
            KeyCode::Char('i') => self.toggle_decision(Decision::Inspect),
            KeyCode::Char('o') => self.toggle_ownership(OwnershipFilter::Owned),
            KeyCode::Char('l') => self.toggle_ownership(OwnershipFilter::LeasedFinanced),
            KeyCode::Char('u') => self.toggle_ownership(OwnershipFilter::Unknown),
            KeyCode::Char('a') => {
                self.filter = ReportFilter::all();
                self.offset = 0;
            }
            KeyCode::Char('e') => self.export_view(),
            KeyCode::Down | KeyCode::Char('j') => {
                let last = self.visible_records().len().saturating_sub(1);
                self.offset = (self.offset + 1).min(last);
            }
            KeyCode::Up => self.offset = self.offset.saturating_sub(1),
            KeyCode::Home => self.offset = 0,
            _ => {}
        }
    }

    /// Store a watch snapshot. A failed run keeps the previous report on
    /// screen.
    pub fn update_from_snapshot(&mut self, snapshot: EvaluationSnapshot) {
        if let Some(report) = snapshot.report {
            self.report = Some(report);
        }
        self.last_error = snapshot.error;
        self.run_count = snapshot.run_count;

        let last = self.visible_records().len().saturating_sub(1);
        self.offset = self.offset.min(last);
    }

    /// Records passing the current filter, ordered by decision.
    pub fn visible_records(&self) -> Vec<&EvaluatedRecord> {
        match &self.report {
            Some(report) => {
                let mut records = self.filter.apply(&report.records);
                sort_by_decision(&mut records);
                records
            }
            None => Vec::new(),
        }
    }

    fn toggle_decision(&mut self, decision: Decision) {
        self.filter.toggle_decision(decision);
        self.offset = 0;
    }

    fn toggle_ownership(&mut self, ownership: OwnershipFilter) {
        self.filter.toggle_ownership(ownership);
        self.offset = 0;
    }

    /// Write the filtered view to `export_path`.
    fn export_view(&mut self) {
        if self.report.is_none() {
            self.status = Some("Nothing to export yet".to_string());
            return;
        }
        let records = self.visible_records();
        let status = match export_records(records, &self.export_path, self.export_format) {
            Ok(n) => format!("Exported {} records to {}", n, self.export_path.display()),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.export_path.display(), "export failed");
                format!("Export failed: {}", e)
            }
        };
        self.status = Some(status);
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Render the current application state into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let Some(report) = &self.report else {
            let message = self
                .last_error
                .clone()
                .unwrap_or_else(|| "Waiting for the first evaluation...".to_string());
            table_view::render_no_data(frame, area, Some(&message), &self.theme);
            return;
        };

        let records = self.visible_records();
        let totals = ReportTotals::from_records(records.iter().copied());

        let input_dir = self.input_dir.display().to_string();
        let filter_desc = self.filter.describe();

        let mut top: Vec<Line> = Header::new(&input_dir, &filter_desc, &self.theme).to_lines();
        top.push(self.filter_chips());
        top.push(DecisionShareBar::new(&totals, &self.theme).to_line());
        top.extend(DecisionDistribution::new(&totals, &self.theme).to_lines());
        top.push(self.status_line(report));

        let metrics = [UnitMetric::RepairCost, UnitMetric::Distance];
        let charts: Vec<(UnitMetric, Vec<Line>)> = metrics
            .into_iter()
            .map(|metric| {
                let mut chart = UnitBars::new(&records, metric, &self.theme);
                chart.config.width = 20;
                (metric, chart.to_lines())
            })
            .collect();
        let chart_height = charts.iter().map(|(_, lines)| lines.len()).max().unwrap_or(1);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(top.len() as u16),
                Constraint::Length(chart_height as u16 + 2),
                Constraint::Min(5),
            ])
            .split(area);
        let chart_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        frame.render_widget(Paragraph::new(Text::from(top)), chunks[0]);
        for ((metric, lines), chart_area) in charts.into_iter().zip(chart_areas.iter()) {
            frame.render_widget(
                Paragraph::new(Text::from(lines)).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(self.theme.table_border)
                        .title(metric.title()),
                ),
                *chart_area,
            );
        }

        if records.is_empty() {
            table_view::render_no_data(
                frame,
                chunks[2],
                Some("No record matches the current filter."),
                &self.theme,
            );
        } else {
            let title = match self.view_mode {
                ViewMode::Table => "Fleet".to_string(),
                ViewMode::Watch => format!("Fleet (run {})", self.run_count),
            };
            table_view::render_table_view(
                frame,
                chunks[2],
                &title,
                &records,
                &totals,
                self.offset,
                &self.theme,
            );
        }
    }

    fn filter_chips(&self) -> Line<'static> {
        let mut spans = Vec::new();
        for (key, decision) in [('k', Decision::Keep), ('s', Decision::Sell), ('i', Decision::Inspect)] {
            let selected = self.filter.decisions.contains(&decision);
            spans.push(Span::styled(
                format!(" [{}] {} ", key, decision),
                self.theme.filter_style(selected),
            ));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled("| ", self.theme.dim));
        for (key, ownership) in [
            ('o', OwnershipFilter::Owned),
            ('l', OwnershipFilter::LeasedFinanced),
            ('u', OwnershipFilter::Unknown),
        ] {
            let selected = self.filter.ownership.contains(&ownership);
            spans.push(Span::styled(
                format!(" [{}] {} ", key, ownership),
                self.theme.filter_style(selected),
            ));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled("[a] all  [e] export  [q] quit", self.theme.dim));
        Line::from(spans)
    }

    fn status_line(&self, report: &EvaluationReport) -> Line<'static> {
        if let Some(err) = &self.last_error {
            return Line::from(Span::styled(format!("Last run failed: {}", err), self.theme.error));
        }
        if let Some(status) = &self.status {
            return Line::from(Span::styled(status.clone(), self.theme.info));
        }
        Line::from(Span::styled(
            format!(
                "{} units evaluated at {}",
                report.records.len(),
                report.metadata.generated_at
            ),
            self.theme.dim,
        ))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
