//! Balance charts drawn with the ratatui [`Chart`] widget.
//!
//! Both views implement [`Widget`] so the same drawing code serves the
//! interactive viewer (through a [`ratatui::Frame`]) and the off-screen text
//! export (through a bare [`Buffer`]).

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, LegendPosition, Paragraph, Widget},
};
use rust_decimal::Decimal;

use analyzer_core::formatting::{format_amount, format_date, format_money, format_period};
use analyzer_core::models::DatePeriod;
use analyzer_core::time_utils::{date_to_x, x_to_date};
use analyzer_data::report::{BalanceChart, StackedChart};
use chrono::NaiveDate;

use crate::themes::Theme;

/// Number of labels spread along each axis.
const AXIS_LABELS: usize = 5;

// ── BalanceChartView ──────────────────────────────────────────────────────────

/// One account: end-of-day balance line, transaction markers and a stats
/// line underneath.
pub struct BalanceChartView<'a> {
    pub chart: &'a BalanceChart,
    pub theme: &'a Theme,
}

impl<'a> BalanceChartView<'a> {
    pub fn new(chart: &'a BalanceChart, theme: &'a Theme) -> Self {
        Self { chart, theme }
    }

    fn stats_line(&self) -> Line<'static> {
        let stats = &self.chart.stats;
        let currency = self.chart.currency.as_deref();
        let theme = self.theme;
        Line::from(vec![
            Span::styled("Final ", theme.label),
            Span::styled(
                format_money(stats.final_balance, currency),
                theme.balance_style(stats.final_balance),
            ),
            Span::styled("  Min ", theme.label),
            Span::styled(format_money(stats.min_balance, currency), theme.value),
            Span::styled("  Max ", theme.label),
            Span::styled(format_money(stats.max_balance, currency), theme.value),
            Span::styled("  Avg daily activity ", theme.label),
            Span::styled(
                format_money(stats.average_daily_activity, currency),
                theme.value,
            ),
            Span::styled(format!("  {} transactions", stats.transactions), theme.dim),
        ])
    }
}

impl Widget for BalanceChartView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [chart_area, stats_area] =
            Layout::vertical([Constraint::Min(5), Constraint::Length(1)]).areas(area);

        let chart = self.chart;
        let theme = self.theme;
        let x_bounds = chart.x_bounds();
        let y_bounds = chart.y_bounds();
        let line = chart.line_data();
        let markers = chart.marker_data();
        let months = month_separators(&chart.month_ticks, y_bounds);

        let mut datasets = month_datasets(&months, theme);
        datasets.push(
            Dataset::default()
                .name("balance")
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(theme.chart_line)
                .data(&line),
        );
        datasets.push(
            Dataset::default()
                .name("transactions")
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(theme.chart_marker)
                .data(&markers),
        );

        let title = format!(" {} ({}) ", chart.title, format_period(&chart.period));
        Chart::new(datasets)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.table_border)
                    .title(Span::styled(title, theme.header)),
            )
            .x_axis(
                Axis::default()
                    .title("Date")
                    .style(theme.chart_axis)
                    .bounds(x_bounds)
                    .labels(date_labels(&chart.period, x_bounds)),
            )
            .y_axis(
                Axis::default()
                    .title(balance_axis_title(chart.currency.as_deref()))
                    .style(theme.chart_axis)
                    .bounds(y_bounds)
                    .labels(amount_labels(y_bounds)),
            )
            .legend_position(Some(LegendPosition::TopRight))
            .render(chart_area, buf);

        Paragraph::new(self.stats_line()).render(stats_area, buf);
    }
}

// ── StackedChartView ──────────────────────────────────────────────────────────

/// Every account stacked on a shared axis, with the total and its rolling
/// average drawn on top.
pub struct StackedChartView<'a> {
    pub chart: &'a StackedChart,
    pub theme: &'a Theme,
}

impl<'a> StackedChartView<'a> {
    pub fn new(chart: &'a StackedChart, theme: &'a Theme) -> Self {
        Self { chart, theme }
    }
}

impl Widget for StackedChartView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chart = self.chart;
        let theme = self.theme;
        let x_bounds = chart.x_bounds();
        let y_bounds = chart.y_bounds();
        let layers = chart.stacked_data();
        let total = chart.total_data();
        let average = chart.rolling_average_data();
        let months = month_separators(&chart.month_ticks, y_bounds);

        let mut datasets = month_datasets(&months, theme);
        for (index, (layer, data)) in chart.layers.iter().zip(&layers).enumerate() {
            datasets.push(
                Dataset::default()
                    .name(layer.title.clone())
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(theme.layer_style(index))
                    .data(data),
            );
        }
        datasets.push(
            Dataset::default()
                .name(chart.rolling_average_label())
                .marker(Marker::Dot)
                .graph_type(GraphType::Line)
                .style(theme.chart_average)
                .data(&average),
        );
        datasets.push(
            Dataset::default()
                .name("total")
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(theme.chart_total)
                .data(&total),
        );

        Chart::new(datasets)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.table_border)
                    .title(Span::styled(format!(" {} ", chart.title), theme.header)),
            )
            .x_axis(
                Axis::default()
                    .title("Time")
                    .style(theme.chart_axis)
                    .bounds(x_bounds)
                    .labels(date_labels(&chart.period, x_bounds)),
            )
            .y_axis(
                Axis::default()
                    .title(balance_axis_title(chart.currency.as_deref()))
                    .style(theme.chart_axis)
                    .bounds(y_bounds)
                    .labels(amount_labels(y_bounds)),
            )
            .legend_position(Some(LegendPosition::BottomRight))
            .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)))
            .render(area, buf);
    }
}

// ── Axis helpers ──────────────────────────────────────────────────────────────

fn balance_axis_title(currency: Option<&str>) -> String {
    match currency {
        Some(code) => format!("Balance ({})", code),
        None => "Balance".to_string(),
    }
}

/// Evenly spaced date labels across `bounds`, matching how the chart
/// distributes axis labels.
pub fn date_labels(period: &DatePeriod, bounds: [f64; 2]) -> Vec<String> {
    if period.start == period.end {
        return vec![String::new(), format_date(period.start), String::new()];
    }
    spread(bounds)
        .into_iter()
        .map(|x| x_to_date(x).map(format_date).unwrap_or_default())
        .collect()
}

/// Evenly spaced amount labels across `bounds`, without decimals.
pub fn amount_labels(bounds: [f64; 2]) -> Vec<String> {
    spread(bounds)
        .into_iter()
        .map(|y| match Decimal::try_from(y) {
            Ok(value) => format_amount(value, 0),
            Err(_) => format!("{:.0}", y),
        })
        .collect()
}

fn spread([lo, hi]: [f64; 2]) -> Vec<f64> {
    let steps = (AXIS_LABELS - 1) as f64;
    (0..AXIS_LABELS)
        .map(|i| lo + (hi - lo) * i as f64 / steps)
        .collect()
}

/// Vertical segments marking each month boundary.
fn month_separators(ticks: &[NaiveDate], [lo, hi]: [f64; 2]) -> Vec<[(f64, f64); 2]> {
    ticks
        .iter()
        .map(|day| {
            let x = date_to_x(*day);
            [(x, lo), (x, hi)]
        })
        .collect()
}

fn month_datasets<'a>(separators: &'a [[(f64, f64); 2]], theme: &Theme) -> Vec<Dataset<'a>> {
    separators
        .iter()
        .map(|segment| {
            Dataset::default()
                .marker(Marker::Dot)
                .graph_type(GraphType::Line)
                .style(theme.separator)
                .data(segment)
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
