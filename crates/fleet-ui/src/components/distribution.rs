//! Bar-chart components: decision distribution, and repair cost or distance
//! by unit.

use fleet_core::formatting;
use fleet_core::models::{Decision, EvaluatedRecord};
use fleet_core::report::ReportTotals;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::themes::Theme;

/// Configuration controlling visual appearance of a bar.
pub struct BarConfig {
    /// Width in terminal columns of the bar portion (excluding labels).
    pub width: u16,
    pub filled_char: char,
    pub empty_char: char,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            width: 40,
            filled_char: '\u{2588}', // █  FULL BLOCK
            empty_char: '\u{2591}',  // ░  LIGHT SHADE
        }
    }
}

/// Pad or truncate `text` to exactly `width` display columns.
pub fn fit_width(text: &str, width: usize) -> String {
    let current = text.width();
    if current <= width {
        return format!("{}{}", text, " ".repeat(width - current));
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

// ── DecisionShareBar ─────────────────────────────────────────────────────────

/// A proportional multi-coloured bar with one segment per decision.
pub struct DecisionShareBar<'a> {
    /// `(decision, percentage)` in display order.
    pub shares: Vec<(Decision, f64)>,
    pub theme: &'a Theme,
    pub width: u16,
}

impl<'a> DecisionShareBar<'a> {
    pub fn new(totals: &ReportTotals, theme: &'a Theme) -> Self {
        let shares = Decision::ALL
            .iter()
            .map(|d| (*d, totals.share(*d)))
            .collect();
        Self {
            shares,
            theme,
            width: 50,
        }
    }

    /// Cell count of each segment.
    ///
    /// Segment edges are rounded from the cumulative share, so the segments
    /// always add up to the full width when the shares sum to 100%.
    pub fn segment_widths(&self) -> Vec<usize> {
        let width = f64::from(self.width);
        let mut cumulative = 0.0;
        let mut edge = 0usize;
        self.shares
            .iter()
            .map(|(_, pct)| {
                cumulative += pct.max(0.0);
                let next = ((cumulative / 100.0) * width).round() as usize;
                let next = next.clamp(edge, self.width as usize);
                let chars = next - edge;
                edge = next;
                chars
            })
            .collect()
    }

    pub fn to_line(&self) -> Line<'a> {
        let mut spans: Vec<Span<'a>> = Vec::new();

        for ((decision, _), chars) in self.shares.iter().zip(self.segment_widths()) {
            if chars > 0 {
                spans.push(Span::styled(
                    "█".repeat(chars),
                    self.theme.decision_style(*decision),
                ));
            }
        }

        spans.push(Span::raw(" "));

        for (decision, pct) in &self.shares {
            if *pct > 0.0 {
                spans.push(Span::styled(
                    format!("{}: {:.0}% ", decision, pct),
                    self.theme.decision_style(*decision),
                ));
            }
        }

        Line::from(spans)
    }
}

// ── DecisionDistribution ─────────────────────────────────────────────────────

/// One bar per decision: `KEEP  ████░░░░ 45.0% (9)`.
pub struct DecisionDistribution<'a> {
    pub totals: &'a ReportTotals,
    pub theme: &'a Theme,
    pub config: BarConfig,
}

impl<'a> DecisionDistribution<'a> {
    pub fn new(totals: &'a ReportTotals, theme: &'a Theme) -> Self {
        Self {
            totals,
            theme,
            config: BarConfig::default(),
        }
    }

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        Decision::ALL
            .iter()
            .map(|decision| {
                let pct = self.totals.share(*decision);
                let filled = ((pct / 100.0) * f64::from(self.config.width)).round() as usize;
                let filled = filled.min(self.config.width as usize);
                let empty = self.config.width as usize - filled;

                Line::from(vec![
                    Span::styled(
                        format!("{:<8}", decision.as_str()),
                        self.theme.decision_style(*decision),
                    ),
                    Span::styled(
                        std::iter::repeat_n(self.config.filled_char, filled).collect::<String>(),
                        self.theme.decision_style(*decision),
                    ),
                    Span::styled(
                        std::iter::repeat_n(self.config.empty_char, empty).collect::<String>(),
                        self.theme.bar_empty,
                    ),
                    Span::styled(
                        format!(" {:>5.1}% ({})", pct, self.totals.count(*decision)),
                        self.theme.bar_label,
                    ),
                ])
            })
            .collect()
    }
}

// ── UnitBars ─────────────────────────────────────────────────────────────────

/// Per-unit quantity a [`UnitBars`] chart plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitMetric {
    /// Total company-covered repair cost.
    RepairCost,
    /// Total distance travelled.
    Distance,
}

impl UnitMetric {
    pub fn value(&self, record: &EvaluatedRecord) -> Option<f64> {
        match self {
            UnitMetric::RepairCost => record.record.total_company_cost(),
            UnitMetric::Distance => record.record.total_distance_km(),
        }
    }

    pub fn format(&self, value: f64) -> String {
        match self {
            UnitMetric::RepairCost => formatting::format_currency(value),
            UnitMetric::Distance => formatting::format_distance(value),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            UnitMetric::RepairCost => " Repair cost by unit ",
            UnitMetric::Distance => " Distance by unit ",
        }
    }

    fn empty_message(&self) -> &'static str {
        match self {
            UnitMetric::RepairCost => "No maintenance costs in view",
            UnitMetric::Distance => "No distance data in view",
        }
    }
}

/// Horizontal bars of one [`UnitMetric`] per unit, coloured by decision and
/// scaled to the largest value.
///
/// Units without a value for the metric are skipped. Bars are sorted
/// highest first and cut to `limit` entries.
pub struct UnitBars<'a> {
    pub records: &'a [&'a EvaluatedRecord],
    pub metric: UnitMetric,
    pub theme: &'a Theme,
    pub config: BarConfig,
    /// Display width reserved for the unit label.
    pub label_width: usize,
    pub limit: usize,
}

impl<'a> UnitBars<'a> {
    pub fn new(records: &'a [&'a EvaluatedRecord], metric: UnitMetric, theme: &'a Theme) -> Self {
        Self {
            records,
            metric,
            theme,
            config: BarConfig::default(),
            label_width: 12,
            limit: 10,
        }
    }

    /// `(unit label, value, decision)` in display order.
    pub fn entries(&self) -> Vec<(String, f64, Decision)> {
        let mut entries: Vec<(String, f64, Decision)> = self
            .records
            .iter()
            .filter_map(|r| {
                self.metric
                    .value(r)
                    .map(|value| (r.record.display_unit(), value, r.decision))
            })
            .collect();
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        entries.truncate(self.limit);
        entries
    }

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let entries = self.entries();
        if entries.is_empty() {
            return vec![Line::from(Span::styled(
                self.metric.empty_message(),
                self.theme.dim,
            ))];
        }

        let max = entries.iter().map(|e| e.1).fold(0.0_f64, f64::max);
        let width = self.config.width as usize;

        entries
            .into_iter()
            .map(|(unit, value, decision)| {
                let filled = if max > 0.0 {
                    ((value.max(0.0) / max) * width as f64).round() as usize
                } else {
                    0
                };
                let filled = filled.min(width);
                Line::from(vec![
                    Span::styled(fit_width(&unit, self.label_width), self.theme.label),
                    Span::raw(" "),
                    Span::styled(
                        std::iter::repeat_n(self.config.filled_char, filled).collect::<String>(),
                        self.theme.decision_style(decision),
                    ),
                    Span::styled(
                        std::iter::repeat_n(self.config.empty_char, width - filled)
                            .collect::<String>(),
                        self.theme.bar_empty,
                    ),
                    Span::styled(
                        format!(" {}", self.metric.format(value)),
                        self.theme.bar_label,
                    ),
                ])
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
