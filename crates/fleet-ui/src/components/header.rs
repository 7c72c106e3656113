use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Marks placed either side of the application title.
pub const TITLE_MARKS: &str = "▚▚▚";

/// Dashboard header rendering four lines:
///
/// 1. Application title.
/// 2. A 60-column `=` separator.
/// 3. Input directory and active filter in `[ dir | filter ]` format.
/// 4. An empty line.
pub struct Header<'a> {
    /// Directory the exports were read from.
    pub input_dir: &'a str,
    /// Human-readable description of the active filter.
    pub filter: &'a str,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(input_dir: &'a str, filter: &'a str, theme: &'a Theme) -> Self {
        Self {
            input_dir,
            filter,
            theme,
        }
    }

    /// Render the header as exactly four lines.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let separator = "=".repeat(60);

        vec![
            Line::from(vec![
                Span::styled(TITLE_MARKS, self.theme.header_accent),
                Span::styled(" FLEET EVALUATION ", self.theme.header),
                Span::styled(TITLE_MARKS, self.theme.header_accent),
            ]),
            Line::from(Span::styled(separator, self.theme.separator)),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(self.input_dir, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(self.filter, self.theme.value),
                Span::styled(" ]", self.theme.label),
            ]),
            Line::from(""),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_header_to_lines_count() {
        let theme = Theme::dark();
        let lines = Header::new("./exports", "all", &theme).to_lines();
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_header_title_line_content() {
        let theme = Theme::dark();
        let lines = Header::new("./exports", "all", &theme).to_lines();
        let title = text(&lines[0]);
        assert!(title.contains("FLEET EVALUATION"), "got: {title}");
        assert!(title.starts_with(TITLE_MARKS));
    }

    #[test]
    fn test_header_separator_line() {
        let theme = Theme::dark();
        let lines = Header::new("./exports", "all", &theme).to_lines();
        let sep = text(&lines[1]);
        assert_eq!(sep.chars().count(), 60);
        assert!(sep.chars().all(|c| c == '='));
    }

    #[test]
    fn test_header_info_line() {
        let theme = Theme::dark();
        let lines = Header::new("/data/fleet", "SELL | owned", &theme).to_lines();
        assert_eq!(text(&lines[2]), "[ /data/fleet | SELL | owned ]");
        assert_eq!(lines[2].spans.len(), 5);
    }

    #[test]
    fn test_header_empty_fourth_line() {
        let theme = Theme::dark();
        let lines = Header::new("x", "y", &theme).to_lines();
        assert!(text(&lines[3]).is_empty());
    }
}
