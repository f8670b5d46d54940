use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Decoration placed either side of the application title.
pub const ORNAMENT: &str = "═══";

/// Width of the separator line under the title.
pub const SEPARATOR_WIDTH: usize = 60;

/// Viewer header rendering four lines:
///
/// 1. Application title (ALL CAPS) between ornaments.
/// 2. A 60-column `=` separator.
/// 3. `[ view | position | currency ]`.
/// 4. An empty line.
pub struct Header<'a> {
    /// What is on screen, e.g. an account title or `"All accounts"`.
    pub view: &'a str,
    /// 1-based index of the chart on screen and the chart count.
    pub position: Option<(usize, usize)>,
    pub currency: Option<&'a str>,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(view: &'a str, theme: &'a Theme) -> Self {
        Self {
            view,
            position: None,
            currency: None,
            theme,
        }
    }

    pub fn position(mut self, index: usize, count: usize) -> Self {
        self.position = Some((index, count));
        self
    }

    pub fn currency(mut self, currency: Option<&'a str>) -> Self {
        self.currency = currency;
        self
    }

    /// Render the header as exactly four lines.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let mut info = vec![
            Span::styled("[ ", self.theme.label),
            Span::styled(self.view.to_string(), self.theme.value),
        ];
        if let Some((index, count)) = self.position {
            info.push(Span::styled(" | ", self.theme.label));
            info.push(Span::styled(format!("{}/{}", index, count), self.theme.value));
        }
        if let Some(currency) = self.currency {
            info.push(Span::styled(" | ", self.theme.label));
            info.push(Span::styled(currency.to_string(), self.theme.value));
        }
        info.push(Span::styled(" ]", self.theme.label));

        vec![
            Line::from(vec![
                Span::styled(ORNAMENT, self.theme.header_accent),
                Span::styled(" BANK ANALYZER ", self.theme.header),
                Span::styled(ORNAMENT, self.theme.header_accent),
            ]),
            Line::from(Span::styled("=".repeat(SEPARATOR_WIDTH), self.theme.separator)),
            Line::from(info),
            Line::from(""),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
