//! Account summary table for the Bank Analyzer TUI.
//!
//! Renders a bordered [`ratatui::widgets::Table`] with one row per charted
//! account plus a highlighted totals row at the bottom.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};
use rust_decimal::Decimal;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use analyzer_core::calculations::checked_sum;
use analyzer_core::formatting::{format_money, format_period};
use analyzer_data::report::BalanceChart;

use crate::themes::Theme;

/// Widest account title shown before truncation.
const ACCOUNT_COLUMN_WIDTH: usize = 28;

/// Data for a single row in the account table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRowData {
    pub account: String,
    pub institution: String,
    pub currency: Option<String>,
    pub period: String,
    pub transactions: usize,
    pub final_balance: Decimal,
    pub average_daily_activity: Decimal,
}

impl TableRowData {
    pub fn from_chart(chart: &BalanceChart) -> Self {
        Self {
            account: chart.title.clone(),
            institution: chart.institution.clone().unwrap_or_default(),
            currency: chart.currency.clone(),
            period: format_period(&chart.period),
            transactions: chart.stats.transactions,
            final_balance: chart.stats.final_balance,
            average_daily_activity: chart.stats.average_daily_activity,
        }
    }
}

/// Totals across every row of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableTotals {
    pub accounts: usize,
    pub transactions: usize,
    /// Sum of the final balances, only when every row shares a currency and
    /// the sum fits a [`Decimal`].
    pub balance: Option<Decimal>,
    pub currency: Option<String>,
    pub mixed_currencies: bool,
}

impl TableTotals {
    pub fn from_rows(rows: &[TableRowData]) -> Self {
        let currency = rows.first().and_then(|r| r.currency.clone());
        let same_currency = rows.iter().all(|r| r.currency == currency);
        let balance = if same_currency {
            checked_sum(rows.iter().map(|r| r.final_balance))
        } else {
            None
        };
        Self {
            accounts: rows.len(),
            transactions: rows.iter().map(|r| r.transactions).sum(),
            balance,
            currency: if same_currency { currency } else { None },
            mixed_currencies: !same_currency,
        }
    }
}

/// Truncate `text` to at most `width` terminal columns, marking the cut with
/// an ellipsis.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// The account table as a widget.
pub struct AccountTable<'a> {
    pub rows: &'a [TableRowData],
    pub totals: &'a TableTotals,
    pub theme: &'a Theme,
}

impl Widget for AccountTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let header_cells = [
            "Account",
            "Institution",
            "Period",
            "Transactions",
            "Final balance",
            "Avg daily activity",
        ]
        .iter()
        .map(|h| Cell::from(*h).style(theme.table_header));
        let header = Row::new(header_cells).height(1);

        let mut all_rows: Vec<Row> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let style = if i % 2 == 0 {
                    theme.table_row
                } else {
                    theme.table_row_alt
                };
                let currency = row.currency.as_deref();
                Row::new(vec![
                    Cell::from(truncate_to_width(&row.account, ACCOUNT_COLUMN_WIDTH)),
                    Cell::from(row.institution.clone()),
                    Cell::from(row.period.clone()),
                    Cell::from(row.transactions.to_string()),
                    Cell::from(Span::styled(
                        format_money(row.final_balance, currency),
                        theme.balance_style(row.final_balance),
                    )),
                    Cell::from(format_money(row.average_daily_activity, currency)),
                ])
                .style(style)
            })
            .collect();

        let totals = self.totals;
        all_rows.push(
            Row::new(vec![
                Cell::from("TOTAL"),
                Cell::from(format!("{} accounts", totals.accounts)),
                Cell::from(""),
                Cell::from(totals.transactions.to_string()),
                Cell::from(match totals.balance {
                    Some(balance) => format_money(balance, totals.currency.as_deref()),
                    None if totals.mixed_currencies => "mixed currencies".to_string(),
                    None => "out of range".to_string(),
                }),
                Cell::from(""),
            ])
            .style(theme.table_total),
        );

        let widths = [
            Constraint::Length(ACCOUNT_COLUMN_WIDTH as u16),
            Constraint::Length(18),
            Constraint::Length(25),
            Constraint::Length(12),
            Constraint::Length(18),
            Constraint::Length(18),
        ];

        Table::new(all_rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.table_border)
                    .title(" Accounts "),
            )
            .style(theme.text)
            .render(area, buf);
    }
}

/// Placeholder shown when the run produced no chart at all.
pub struct NoData<'a> {
    pub root: &'a str,
    pub theme: &'a Theme,
}

impl Widget for NoData<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let text = vec![
            Line::from(""),
            Line::from(Span::styled("No account to chart", theme.warning)),
            Line::from(""),
            Line::from(Span::styled(
                format!("No usable OFX/QFX export was found under {}", self.root),
                theme.dim,
            )),
            Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
        ];
        Paragraph::new(Text::from(text))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Bank Analyzer "),
            )
            .render(area, buf);
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
