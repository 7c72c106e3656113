use fleet_core::models::{Decision, OwnershipClass};
use ratatui::style::{Color, Modifier, Style};

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
    Unknown,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`. Background values
/// 0–6 are considered dark; 7–15 are considered light. If the variable is
/// absent or unparseable, `BackgroundType::Dark` is returned.
pub fn detect_background() -> BackgroundType {
    if let Ok(val) = std::env::var("COLORFGBG") {
        if let Some(bg) = val.split(';').next_back() {
            if let Ok(bg_num) = bg.parse::<u8>() {
                return if bg_num <= 6 {
                    BackgroundType::Dark
                } else {
                    BackgroundType::Light
                };
            }
        }
    }
    BackgroundType::Dark
}

/// Complete theme definition carrying all UI styles used by fleet-ui
/// components.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub header_accent: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub bold: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub info: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,

    // ── Decisions ────────────────────────────────────────────────────────────
    pub decision_keep: Style,
    pub decision_sell: Style,
    pub decision_inspect: Style,

    // ── Ownership ────────────────────────────────────────────────────────────
    pub ownership_owned: Style,
    pub ownership_leased: Style,
    pub ownership_unknown: Style,

    // ── Bars ─────────────────────────────────────────────────────────────────
    /// Unfilled portion of a distribution or cost bar.
    pub bar_empty: Style,
    pub bar_label: Style,

    // ── Table ────────────────────────────────────────────────────────────────
    pub table_header: Style,
    pub table_border: Style,
    pub table_row: Style,
    pub table_row_alt: Style,
    pub table_total: Style,

    // ── Filter chips ─────────────────────────────────────────────────────────
    pub filter_on: Style,
    pub filter_off: Style,
}

impl Theme {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            header_accent: Style::default().fg(Color::Yellow),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            bold: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            decision_keep: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            decision_sell: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            decision_inspect: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),

            ownership_owned: Style::default().fg(Color::Cyan),
            ownership_leased: Style::default().fg(Color::Magenta),
            ownership_unknown: Style::default().fg(Color::Gray),

            bar_empty: Style::default().fg(Color::DarkGray),
            bar_label: Style::default().fg(Color::Gray),

            table_header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),

            filter_on: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan),
            filter_off: Style::default().fg(Color::DarkGray),
        }
    }

    /// Light-background terminal theme.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            header_accent: Style::default().fg(Color::Magenta),
            separator: Style::default().fg(Color::Gray),

            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            bold: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Blue),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            decision_keep: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            decision_sell: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            decision_inspect: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),

            ownership_owned: Style::default().fg(Color::Blue),
            ownership_leased: Style::default().fg(Color::Magenta),
            ownership_unknown: Style::default().fg(Color::DarkGray),

            bar_empty: Style::default().fg(Color::Gray),
            bar_label: Style::default().fg(Color::DarkGray),

            table_header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::Gray),
            table_row: Style::default().fg(Color::Black),
            table_row_alt: Style::default().fg(Color::DarkGray),
            table_total: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),

            filter_on: Style::default()
                .fg(Color::White)
                .bg(Color::Blue),
            filter_off: Style::default().fg(Color::Gray),
        }
    }

    /// Classic theme using only the basic 8-colour ANSI palette, no bold.
    pub fn classic() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan),
            header_accent: Style::default().fg(Color::White),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            bold: Style::default().fg(Color::White),
            label: Style::default().fg(Color::Gray),
            value: Style::default().fg(Color::White),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            decision_keep: Style::default().fg(Color::Green),
            decision_sell: Style::default().fg(Color::Red),
            decision_inspect: Style::default().fg(Color::Yellow),

            ownership_owned: Style::default().fg(Color::Cyan),
            ownership_leased: Style::default().fg(Color::Magenta),
            ownership_unknown: Style::default().fg(Color::White),

            bar_empty: Style::default().fg(Color::DarkGray),
            bar_label: Style::default().fg(Color::White),

            table_header: Style::default().fg(Color::Cyan),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default().fg(Color::Yellow),

            filter_on: Style::default().fg(Color::Cyan),
            filter_off: Style::default().fg(Color::DarkGray),
        }
    }

    /// Choose a theme automatically based on the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Construct a theme by name. Falls back to `auto_detect` for unknown
    /// names.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    // ── Style helpers ────────────────────────────────────────────────────────

    pub fn decision_style(&self, decision: Decision) -> Style {
        match decision {
            Decision::Keep => self.decision_keep,
            Decision::Sell => self.decision_sell,
            Decision::Inspect => self.decision_inspect,
        }
    }

    /// Style for an ownership class; `None` (no finance row) is "unknown".
    pub fn ownership_style(&self, class: Option<OwnershipClass>) -> Style {
        match class {
            Some(OwnershipClass::Owned) => self.ownership_owned,
            Some(OwnershipClass::LeasedFinanced) => self.ownership_leased,
            None => self.ownership_unknown,
        }
    }

    /// Style for a filter chip depending on whether it is selected.
    pub fn filter_style(&self, selected: bool) -> Style {
        if selected {
            self.filter_on
        } else {
            self.filter_off
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
