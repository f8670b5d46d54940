use ratatui::style::{Color, Modifier, Style};
use rust_decimal::Decimal;

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
    Unknown,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`.  Background values
/// 0–6 are considered dark; 7–15 are considered light.  If the variable is
/// absent or unparseable, `BackgroundType::Dark` is returned.
pub fn detect_background() -> BackgroundType {
    background_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
}

fn background_from_colorfgbg(value: Option<&str>) -> BackgroundType {
    let Some(value) = value else {
        return BackgroundType::Dark;
    };
    match value.split(';').next_back().map(str::parse::<u8>) {
        Some(Ok(bg)) if bg <= 6 => BackgroundType::Dark,
        Some(Ok(_)) => BackgroundType::Light,
        _ => BackgroundType::Dark,
    }
}

/// Every style used by the analyzer views.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub header_accent: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub success: Style,
    pub warning: Style,
    pub error: Style,

    // ── Charts ───────────────────────────────────────────────────────────────
    pub chart_axis: Style,
    /// End-of-day balance line.
    pub chart_line: Style,
    /// One marker per transaction.
    pub chart_marker: Style,
    /// Sum of every stacked account.
    pub chart_total: Style,
    /// Rolling average of the total.
    pub chart_average: Style,
    /// Colours cycled through for the stacked layers, bottom first.
    pub layer_colors: Vec<Color>,

    // ── Table ────────────────────────────────────────────────────────────────
    pub table_header: Style,
    pub table_border: Style,
    pub table_row: Style,
    pub table_row_alt: Style,
    pub table_total: Style,
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
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            chart_axis: Style::default().fg(Color::Gray),
            chart_line: Style::default().fg(Color::Cyan),
            chart_marker: Style::default().fg(Color::Yellow),
            chart_total: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            chart_average: Style::default().fg(Color::Magenta),
            layer_colors: vec![
                Color::Blue,
                Color::Green,
                Color::Yellow,
                Color::Cyan,
                Color::Red,
                Color::LightMagenta,
            ],

            table_header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
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
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            chart_axis: Style::default().fg(Color::DarkGray),
            chart_line: Style::default().fg(Color::Blue),
            chart_marker: Style::default().fg(Color::Magenta),
            chart_total: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            chart_average: Style::default().fg(Color::Red),
            layer_colors: vec![
                Color::Blue,
                Color::Green,
                Color::Magenta,
                Color::Cyan,
                Color::Red,
                Color::DarkGray,
            ],

            table_header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::Gray),
            table_row: Style::default().fg(Color::Black),
            table_row_alt: Style::default().fg(Color::DarkGray),
            table_total: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Basic 8-colour ANSI palette, no bold.
    pub fn classic() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan),
            header_accent: Style::default().fg(Color::White),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default().fg(Color::White),

            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            chart_axis: Style::default().fg(Color::White),
            chart_line: Style::default().fg(Color::Green),
            chart_marker: Style::default().fg(Color::Yellow),
            chart_total: Style::default().fg(Color::White),
            chart_average: Style::default().fg(Color::Magenta),
            layer_colors: vec![Color::Blue, Color::Green, Color::Yellow, Color::Cyan, Color::Red],

            table_header: Style::default().fg(Color::Cyan),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default().fg(Color::Yellow),
        }
    }

    /// Choose a theme automatically based on the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Construct a theme by name.  Falls back to `auto_detect` for unknown
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

    /// Red for an overdrawn balance, green otherwise.
    pub fn balance_style(&self, balance: Decimal) -> Style {
        if balance.is_sign_negative() && !balance.is_zero() {
            self.error
        } else {
            self.success
        }
    }

    /// Style of the stacked layer at `index`, cycling through the palette.
    pub fn layer_style(&self, index: usize) -> Style {
        match self.layer_colors.len() {
            0 => self.chart_line,
            n => Style::default().fg(self.layer_colors[index % n]),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
