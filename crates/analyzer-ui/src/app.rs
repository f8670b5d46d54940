//! Interactive chart viewer and its event loop.
//!
//! [`App`] owns the theme, the analysis output and the current selection.
//! Key handling is kept apart from the terminal loop so it can be driven
//! directly in tests.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    text::{Line, Span, Text},
    widgets::Paragraph,
    Frame, Terminal,
};

use analyzer_data::analysis::AnalysisResult;

use crate::chart_view::{BalanceChartView, StackedChartView};
use crate::components::header::Header;
use crate::table_view::{AccountTable, NoData, TableRowData, TableTotals};
use crate::themes::Theme;

/// Skipped items listed in the footer before collapsing into a count.
const FOOTER_ITEMS: usize = 3;

// ── ViewMode ──────────────────────────────────────────────────────────────────

/// Which view the viewer is currently rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// One account's balance chart.
    Account,
    /// All accounts stacked.
    Stacked,
    /// Account summary table.
    Table,
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root state of the chart viewer.
pub struct App {
    pub theme: Theme,
    pub view_mode: ViewMode,
    /// Index into `result.charts` of the account on screen.
    pub selected: usize,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    result: AnalysisResult,
    rows: Vec<TableRowData>,
    totals: TableTotals,
}

impl App {
    pub fn new(theme_name: &str, result: AnalysisResult) -> Self {
        let rows: Vec<TableRowData> = result.charts.iter().map(TableRowData::from_chart).collect();
        let totals = TableTotals::from_rows(&rows);
        let view_mode = if result.charts.is_empty() && result.stacked.is_some() {
            ViewMode::Stacked
        } else {
            ViewMode::Account
        };
        Self {
            theme: Theme::from_name(theme_name),
            view_mode,
            selected: 0,
            should_quit: false,
            result,
            rows,
            totals,
        }
    }

    pub fn result(&self) -> &AnalysisResult {
        &self.result
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Take over the terminal until the user quits.
    ///
    /// Polls `crossterm` with a 250 ms timeout; the terminal is restored
    /// whether the loop ends normally or with an error.
    pub fn run(mut self) -> io::Result<()> {
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
                    Ok(Event::Key(key)) => self.handle_key(key),
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }
            if self.should_quit {
                break Ok(());
            }
        };

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    /// Apply one key press to the viewer state.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Right | KeyCode::Char('l') => self.step(1),
            KeyCode::Left | KeyCode::Char('h') => self.step(-1),
            KeyCode::Char('s') => self.toggle(ViewMode::Stacked),
            KeyCode::Char('t') => self.toggle(ViewMode::Table),
            _ => {}
        }
    }

    fn step(&mut self, delta: isize) {
        let count = self.result.charts.len();
        if count == 0 {
            return;
        }
        self.view_mode = ViewMode::Account;
        self.selected = (self.selected as isize + delta).rem_euclid(count as isize) as usize;
    }

    fn toggle(&mut self, mode: ViewMode) {
        if mode == ViewMode::Stacked && self.result.stacked.is_none() {
            return;
        }
        self.view_mode = if self.view_mode == mode {
            ViewMode::Account
        } else {
            mode
        };
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Draw the header, the current view and the footer into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let footer = self.footer_lines();
        let [header_area, body_area, footer_area] = Layout::vertical([
            Constraint::Length(4),
            Constraint::Min(6),
            Constraint::Length(footer.len() as u16),
        ])
        .areas(frame.area());

        frame.render_widget(Paragraph::new(Text::from(self.header_lines())), header_area);

        let theme = &self.theme;
        if !self.result.has_charts() {
            let root = self.result.metadata.root.display().to_string();
            frame.render_widget(NoData { root: &root, theme }, body_area);
        } else {
            match (self.view_mode, &self.result.stacked, self.current_chart()) {
                (ViewMode::Stacked, Some(stacked), _) => {
                    frame.render_widget(StackedChartView::new(stacked, theme), body_area);
                }
                (ViewMode::Table, _, _) | (_, _, None) => {
                    frame.render_widget(
                        AccountTable {
                            rows: &self.rows,
                            totals: &self.totals,
                            theme,
                        },
                        body_area,
                    );
                }
                (_, _, Some(chart)) => {
                    frame.render_widget(BalanceChartView::new(chart, theme), body_area);
                }
            }
        }

        frame.render_widget(Paragraph::new(Text::from(footer)), footer_area);
    }

    fn current_chart(&self) -> Option<&analyzer_data::report::BalanceChart> {
        self.result.charts.get(self.selected)
    }

    fn header_lines(&self) -> Vec<Line<'_>> {
        let count = self.result.charts.len();
        match (self.view_mode, &self.result.stacked, self.current_chart()) {
            (ViewMode::Stacked, Some(stacked), _) => Header::new("All accounts", &self.theme)
                .currency(stacked.currency.as_deref())
                .to_lines(),
            (ViewMode::Table, _, _) | (_, _, None) => {
                Header::new("Accounts", &self.theme).to_lines()
            }
            (_, _, Some(chart)) => Header::new(&chart.title, &self.theme)
                .position(self.selected + 1, count)
                .currency(chart.currency.as_deref())
                .to_lines(),
        }
    }

    /// Key help, then one line per skipped file or account.
    fn footer_lines(&self) -> Vec<Line<'static>> {
        let theme = &self.theme;
        let mut lines = vec![Line::from(Span::styled(
            "←/→ accounts · s stacked · t table · q quit",
            theme.dim,
        ))];

        let mut skipped: Vec<String> = self
            .result
            .skipped_files
            .iter()
            .map(|f| format!("skipped file {}: {}", f.path.display(), f.reason))
            .chain(
                self.result
                    .skipped_accounts
                    .iter()
                    .map(|a| format!("skipped account {}: {}", a.account_id, a.reason)),
            )
            .chain(
                self.result
                    .stacked_error
                    .iter()
                    .map(|reason| format!("no stacked chart: {}", reason)),
            )
            .collect();

        let hidden = skipped.len().saturating_sub(FOOTER_ITEMS);
        skipped.truncate(FOOTER_ITEMS);
        lines.extend(
            skipped
                .into_iter()
                .map(|text| Line::from(Span::styled(text, theme.warning))),
        );
        if hidden > 0 {
            lines.push(Line::from(Span::styled(
                format!("… and {} more (see log)", hidden),
                theme.warning,
            )));
        }
        lines
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
