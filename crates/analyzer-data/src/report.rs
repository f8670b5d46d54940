//! Chart artifacts: one balance chart per account plus the stacked view.
//!
//! Charts are plain data.  Amounts stay [`Decimal`] for display; the `*_data`
//! helpers project them onto `f64` chart coordinates for the UI.

use analyzer_core::calculations::{checked_sum, BalanceCalculator};
use analyzer_core::error::{AnalyzerError, Result};
use analyzer_core::formatting::{format_date, slugify};
use analyzer_core::models::{Account, DatePeriod};
use analyzer_core::time_utils::{date_to_x, days_in, month_starts};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::aggregator::AggregationSet;
use crate::aliases::AliasMap;

/// Window of the rolling average drawn on the stacked chart, in days.
pub const ROLLING_AVERAGE_DAYS: usize = 31;

// ── BalanceChart ──────────────────────────────────────────────────────────────

/// A transaction placed on the balance curve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub amount: Decimal,
    /// Running balance right after this transaction.
    pub balance: Decimal,
    pub description: String,
}

/// Summary figures shown next to a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartStats {
    pub opening: Decimal,
    pub final_balance: Decimal,
    pub min_balance: Decimal,
    pub max_balance: Decimal,
    /// Average absolute amount moved per day over the chart period.
    pub average_daily_activity: Decimal,
    pub transactions: usize,
}

/// Balance over time for one account.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceChart {
    pub account_id: String,
    pub title: String,
    pub currency: Option<String>,
    pub institution: Option<String>,
    pub period: DatePeriod,
    /// One point per transaction, date ascending.
    pub points: Vec<ChartPoint>,
    /// End-of-day balance for every day of `period`.
    pub daily: Vec<(NaiveDate, Decimal)>,
    /// First day of each month inside `period`.
    pub month_ticks: Vec<NaiveDate>,
    pub stats: ChartStats,
}

impl BalanceChart {
    /// File-name friendly form of the title.
    pub fn slug(&self) -> String {
        slugify(&self.title)
    }

    /// End-of-day line as chart coordinates.
    pub fn line_data(&self) -> Vec<(f64, f64)> {
        self.daily
            .iter()
            .map(|(day, balance)| (date_to_x(*day), to_f64(*balance)))
            .collect()
    }

    /// Transaction markers as chart coordinates.
    pub fn marker_data(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (date_to_x(p.date), to_f64(p.balance)))
            .collect()
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        period_bounds(&self.period)
    }

    /// Balance range padded so the curve never touches the frame.
    pub fn y_bounds(&self) -> [f64; 2] {
        padded_bounds(to_f64(self.stats.min_balance), to_f64(self.stats.max_balance))
    }
}

/// Build the balance chart of one account.
///
/// Fails with [`AnalyzerError::Render`] when the account has no transaction.
pub fn build_chart(account: &Account, aliases: &AliasMap) -> Result<BalanceChart> {
    let title = aliases
        .get(&account.id)
        .unwrap_or_else(|| account.display_name())
        .to_string();

    if account.transactions.is_empty() {
        return Err(AnalyzerError::Render {
            account: title,
            reason: "account has no transactions".to_string(),
        });
    }
    let Some(period) = account.covered_period() else {
        return Err(AnalyzerError::Render {
            account: title,
            reason: "account has no dated activity".to_string(),
        });
    };

    let out_of_range = || AnalyzerError::Render {
        account: title.clone(),
        reason: "balance exceeds the representable decimal range".to_string(),
    };
    let opening = BalanceCalculator::opening_balance(account).ok_or_else(out_of_range)?;
    let running = BalanceCalculator::running_balances(&account.transactions, opening)
        .ok_or_else(out_of_range)?;
    let average_daily_activity =
        BalanceCalculator::average_daily_activity(&account.transactions, period)
            .ok_or_else(out_of_range)?;
    let daily = BalanceCalculator::daily_balances(&account.transactions, &running, opening, period);

    let points: Vec<ChartPoint> = account
        .transactions
        .iter()
        .zip(&running)
        .map(|(tx, balance)| ChartPoint {
            date: tx.date,
            amount: tx.amount,
            balance: *balance,
            description: tx.description.clone(),
        })
        .collect();

    let balances = daily
        .iter()
        .map(|(_, b)| *b)
        .chain(running.iter().copied());
    let (min_balance, max_balance) = min_max(balances).unwrap_or((opening, opening));
    let final_balance = running.last().copied().unwrap_or(opening);

    let stats = ChartStats {
        opening,
        final_balance,
        min_balance,
        max_balance,
        average_daily_activity,
        transactions: account.transactions.len(),
    };

    debug!(
        "Built chart for {} ({} points, {} days)",
        title,
        points.len(),
        daily.len()
    );

    Ok(BalanceChart {
        account_id: account.id.clone(),
        title,
        currency: account.currency.clone(),
        institution: account.institution.clone(),
        period,
        points,
        daily,
        month_ticks: month_starts(period),
        stats,
    })
}

/// An account that produced no chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAccount {
    pub account_id: String,
    pub reason: String,
}

/// Build every account chart, skipping (and logging) those that fail.
pub fn build_reports(
    set: &AggregationSet,
    aliases: &AliasMap,
) -> (Vec<BalanceChart>, Vec<SkippedAccount>) {
    let mut charts = Vec::with_capacity(set.len());
    let mut skipped = Vec::new();
    for account in set.iter() {
        match build_chart(account, aliases) {
            Ok(chart) => charts.push(chart),
            Err(e) => {
                warn!("{}", e);
                skipped.push(SkippedAccount {
                    account_id: account.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    (charts, skipped)
}

// ── StackedChart ──────────────────────────────────────────────────────────────

/// Which days the stacked chart spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpanMode {
    /// Every day at least one account has data.
    #[default]
    Union,
    /// Only the days every account has data.
    Intersection,
}

/// One account's contribution to the stacked chart.
#[derive(Debug, Clone, PartialEq)]
pub struct StackLayer {
    pub account_id: String,
    pub title: String,
    pub average_daily_activity: Decimal,
    /// End-of-day balance, aligned with [`StackedChart::days`].
    pub balances: Vec<Decimal>,
}

/// All accounts stacked on a shared date axis, least active at the bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedChart {
    pub title: String,
    pub currency: Option<String>,
    pub period: DatePeriod,
    pub days: Vec<NaiveDate>,
    pub layers: Vec<StackLayer>,
    /// Sum of every layer per day.
    pub total: Vec<Decimal>,
    /// Trailing average of `total` over [`ROLLING_AVERAGE_DAYS`].
    pub rolling_average: Vec<Decimal>,
    pub month_ticks: Vec<NaiveDate>,
}

impl StackedChart {
    pub fn slug(&self) -> String {
        slugify(&self.title)
    }

    pub fn rolling_average_label(&self) -> String {
        format!("{}-days avg", ROLLING_AVERAGE_DAYS)
    }

    /// Upper edge of each layer once stacked, bottom layer first.
    pub fn stacked_data(&self) -> Vec<Vec<(f64, f64)>> {
        let mut running = vec![0.0; self.days.len()];
        self.layers
            .iter()
            .map(|layer| {
                self.days
                    .iter()
                    .zip(running.iter_mut())
                    .zip(&layer.balances)
                    .map(|((day, acc), balance)| {
                        *acc += to_f64(*balance);
                        (date_to_x(*day), *acc)
                    })
                    .collect()
            })
            .collect()
    }

    pub fn total_data(&self) -> Vec<(f64, f64)> {
        self.series(&self.total)
    }

    pub fn rolling_average_data(&self) -> Vec<(f64, f64)> {
        self.series(&self.rolling_average)
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        period_bounds(&self.period)
    }

    /// Bounds covering every stacked edge, the total and the average.
    pub fn y_bounds(&self) -> [f64; 2] {
        let values = self
            .stacked_data()
            .into_iter()
            .flatten()
            .map(|(_, y)| y)
            .chain(self.total.iter().map(|v| to_f64(*v)))
            .chain(self.rolling_average.iter().map(|v| to_f64(*v)))
            .chain(std::iter::once(0.0));
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        padded_bounds(min, max)
    }

    fn series(&self, values: &[Decimal]) -> Vec<(f64, f64)> {
        self.days
            .iter()
            .zip(values)
            .map(|(day, v)| (date_to_x(*day), to_f64(*v)))
            .collect()
    }
}

/// Combine `accounts` into one stacked chart.
///
/// Fails with [`AnalyzerError::Render`] when the accounts do not share a
/// currency, when none of them has data, or when `span` is
/// [`SpanMode::Intersection`] and their periods do not overlap.
pub fn build_stacked_chart(
    accounts: &[&Account],
    aliases: &AliasMap,
    span: SpanMode,
) -> Result<StackedChart> {
    let render_error = |reason: String| AnalyzerError::Render {
        account: "all accounts".to_string(),
        reason,
    };

    let charted: Vec<(&Account, DatePeriod)> = accounts
        .iter()
        .filter(|a| !a.transactions.is_empty())
        .filter_map(|a| a.covered_period().map(|p| (*a, p)))
        .collect();
    let Some((first, first_period)) = charted.first().copied() else {
        return Err(render_error("no account has transactions".to_string()));
    };

    if let Some((other, _)) = charted.iter().find(|(a, _)| a.currency != first.currency) {
        return Err(render_error(format!(
            "not all accounts have the same currency, found {} and {}",
            first.currency.as_deref().unwrap_or("none"),
            other.currency.as_deref().unwrap_or("none"),
        )));
    }

    let mut period = first_period;
    for (_, p) in &charted[1..] {
        period = match span {
            SpanMode::Union => period.union(p),
            SpanMode::Intersection => period
                .intersection(p)
                .ok_or_else(|| render_error("account periods do not overlap".to_string()))?,
        };
    }

    let days: Vec<NaiveDate> = days_in(period).collect();
    let out_of_range =
        || render_error("total balance exceeds the representable decimal range".to_string());
    let mut layers: Vec<StackLayer> = charted
        .iter()
        .map(|(account, own_period)| -> Result<StackLayer> {
            let opening = BalanceCalculator::opening_balance(account).ok_or_else(out_of_range)?;
            let running = BalanceCalculator::running_balances(&account.transactions, opening)
                .ok_or_else(out_of_range)?;
            let balances =
                BalanceCalculator::daily_balances(&account.transactions, &running, opening, period)
                    .into_iter()
                    .map(|(_, b)| b)
                    .collect();
            Ok(StackLayer {
                account_id: account.id.clone(),
                title: aliases
                    .get(&account.id)
                    .unwrap_or_else(|| account.display_name())
                    .to_string(),
                average_daily_activity: BalanceCalculator::average_daily_activity(
                    &account.transactions,
                    *own_period,
                )
                .ok_or_else(out_of_range)?,
                balances,
            })
        })
        .collect::<Result<_>>()?;
    layers.sort_by(|a, b| a.average_daily_activity.cmp(&b.average_daily_activity));

    let total: Vec<Decimal> = (0..days.len())
        .map(|k| checked_sum(layers.iter().map(|layer| layer.balances[k])))
        .collect::<Option<_>>()
        .ok_or_else(out_of_range)?;
    let rolling_average = BalanceCalculator::rolling_average(&total, ROLLING_AVERAGE_DAYS)
        .ok_or_else(out_of_range)?;

    Ok(StackedChart {
        title: format!(
            "Accounts balance between {} and {}",
            format_date(period.start),
            format_date(period.end)
        ),
        currency: first.currency.clone(),
        period,
        days,
        layers,
        total,
        rolling_average,
        month_ticks: month_starts(period),
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn min_max(values: impl Iterator<Item = Decimal>) -> Option<(Decimal, Decimal)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn period_bounds(period: &DatePeriod) -> [f64; 2] {
    let start = date_to_x(period.start);
    let end = date_to_x(period.end);
    if end > start {
        [start, end]
    } else {
        [start - 1.0, end + 1.0]
    }
}

fn padded_bounds(min: f64, max: f64) -> [f64; 2] {
    if !min.is_finite() || !max.is_finite() {
        return [-1.0, 1.0];
    }
    let span = max - min;
    let pad = if span > 0.0 { span * 0.05 } else { min.abs().max(1.0) * 0.1 };
    [min - pad, max + pad]
}
