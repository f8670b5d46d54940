use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{Account, DatePeriod, Transaction};
use crate::time_utils::days_in;

// ── BalanceCalculator ─────────────────────────────────────────────────────────

/// Stateless collection of running-balance calculations.
///
/// Every function expects transactions already sorted by date, which is what
/// the aggregator hands out.  Sums are checked: `None` means an intermediate
/// value left the range of [`Decimal`].
pub struct BalanceCalculator;

impl BalanceCalculator {
    /// Balance before the first transaction.
    ///
    /// Zero unless the account carries a statement-level reference balance:
    /// that balance is taken as the state at the end of its as-of date and
    /// the opening balance is derived from it by undoing every amount dated
    /// on or before it.
    pub fn opening_balance(account: &Account) -> Option<Decimal> {
        match account.reference_balance {
            Some(reference) => {
                let applied = checked_sum(
                    account
                        .transactions
                        .iter()
                        .filter(|tx| tx.date <= reference.date)
                        .map(|tx| tx.amount),
                )?;
                reference.amount.checked_sub(applied)
            }
            None => Some(Decimal::ZERO),
        }
    }

    /// Balance after each transaction.
    ///
    /// Amounts are summed from `opening`.  A stated `balance_after` is an
    /// authoritative checkpoint: it replaces the running sum and summation
    /// resumes from it.
    pub fn running_balances(transactions: &[Transaction], opening: Decimal) -> Option<Vec<Decimal>> {
        let mut balance = opening;
        transactions
            .iter()
            .map(|tx| {
                balance = match tx.balance_after {
                    Some(stated) => stated,
                    None => balance.checked_add(tx.amount)?,
                };
                Some(balance)
            })
            .collect()
    }

    /// End-of-day balance for every day of `period`.
    ///
    /// `running` must be the output of [`Self::running_balances`] for the same
    /// transactions.  Days before the first transaction hold `opening`.  The
    /// walk is a single pass over both the days and the transactions.
    pub fn daily_balances(
        transactions: &[Transaction],
        running: &[Decimal],
        opening: Decimal,
        period: DatePeriod,
    ) -> Vec<(NaiveDate, Decimal)> {
        let mut idx = 0;
        let mut current = opening;
        days_in(period)
            .map(|day| {
                while idx < transactions.len() && transactions[idx].date <= day {
                    current = running.get(idx).copied().unwrap_or(current);
                    idx += 1;
                }
                (day, current)
            })
            .collect()
    }

    /// Average absolute amount moved per day over `period`.
    ///
    /// Accounts with little activity (savings) score low; used to order the
    /// layers of the stacked chart.
    pub fn average_daily_activity(
        transactions: &[Transaction],
        period: DatePeriod,
    ) -> Option<Decimal> {
        let days = period.days();
        if days <= 0 {
            return Some(Decimal::ZERO);
        }
        let moved = checked_sum(
            transactions
                .iter()
                .filter(|tx| period.contains(tx.date))
                .map(|tx| tx.amount.abs()),
        )?;
        moved.checked_div(Decimal::from(days))
    }

    /// Trailing average: element `k` averages `values[k - window ..= k]`
    /// (clamped at the start of the series).
    pub fn rolling_average(values: &[Decimal], window: usize) -> Option<Vec<Decimal>> {
        let mut sum = Decimal::ZERO;
        let mut out = Vec::with_capacity(values.len());
        for (k, value) in values.iter().enumerate() {
            sum = sum.checked_add(*value)?;
            if k > window {
                sum = sum.checked_sub(values[k - window - 1])?;
            }
            let count = k.min(window) + 1;
            out.push(sum.checked_div(Decimal::from(count))?);
        }
        Some(out)
    }
}

/// Sum of `values`, `None` on overflow.
pub fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}
