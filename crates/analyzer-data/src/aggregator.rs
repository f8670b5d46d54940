//! Merge statements from many export files into one timeline per account.

use std::collections::{BTreeMap, HashMap, HashSet};

use analyzer_core::models::{Account, Statement, StatementHeader, Transaction};
use tracing::debug;

// ── AggregationStats ──────────────────────────────────────────────────────────

/// Counters collected while merging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationStats {
    pub accounts: usize,
    pub transactions: usize,
    pub duplicates_dropped: usize,
}

// ── AccountAggregator ─────────────────────────────────────────────────────────

/// Accumulates transactions keyed by raw account id.
///
/// Transaction ids are unique within an account: the first occurrence wins
/// and later ones are dropped without error.
#[derive(Debug, Default)]
pub struct AccountAggregator {
    accounts: BTreeMap<String, Account>,
    seen: HashMap<String, HashSet<String>>,
    duplicates_dropped: usize,
}

impl AccountAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up or create the account for `account_id`.
    pub fn ensure_account(&mut self, account_id: &str) -> &mut Account {
        self.accounts
            .entry(account_id.to_string())
            .or_insert_with(|| Account::new(account_id))
    }

    /// Add `tx` to its account.  Returns `false` when a transaction with the
    /// same id was already pushed for that account.
    pub fn push(&mut self, account_id: &str, tx: Transaction) -> bool {
        let seen = self.seen.entry(account_id.to_string()).or_default();
        if !seen.insert(tx.id.clone()) {
            debug!("Dropping duplicate transaction {} of account {}", tx.id, account_id);
            self.duplicates_dropped += 1;
            return false;
        }
        self.ensure_account(account_id).transactions.push(tx);
        true
    }

    /// Merge one parsed statement: header metadata first, then every
    /// transaction in file order.
    pub fn ingest(&mut self, statement: Statement) {
        let Statement {
            header,
            transactions,
        } = statement;
        let account_id = header.account_id.clone();
        merge_header(self.ensure_account(&account_id), header);
        for tx in transactions {
            self.push(&account_id, tx);
        }
    }

    pub fn stats(&self) -> AggregationStats {
        AggregationStats {
            accounts: self.accounts.len(),
            transactions: self.accounts.values().map(|a| a.transactions.len()).sum(),
            duplicates_dropped: self.duplicates_dropped,
        }
    }

    /// Sort every account's transactions by date and hand out the result.
    ///
    /// The sort is stable: same-day transactions keep their ingestion order.
    pub fn finish(self) -> AggregationSet {
        let stats = self.stats();
        let mut accounts: Vec<Account> = self.accounts.into_values().collect();
        for account in &mut accounts {
            account.transactions.sort_by_key(|tx| tx.date);
        }
        debug!(
            "Aggregated {} accounts, {} transactions ({} duplicates dropped)",
            stats.accounts, stats.transactions, stats.duplicates_dropped
        );
        AggregationSet { accounts, stats }
    }
}

fn merge_header(account: &mut Account, header: StatementHeader) {
    if account.currency.is_none() {
        account.currency = header.currency;
    }
    if account.institution.is_none() {
        account.institution = header.institution;
    }
    if let Some(period) = header.period {
        account.period = Some(match account.period {
            Some(existing) => existing.union(&period),
            None => period,
        });
    }
    if let Some(reference) = header.reference_balance {
        let newer = account
            .reference_balance
            .map_or(true, |current| reference.date > current.date);
        if newer {
            account.reference_balance = Some(reference);
        }
    }
}

// ── AggregationSet ────────────────────────────────────────────────────────────

/// Final per-account timelines, accounts ordered by id.
#[derive(Debug, Clone, Default)]
pub struct AggregationSet {
    accounts: Vec<Account>,
    stats: AggregationStats,
}

impl AggregationSet {
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    pub(crate) fn accounts_mut(&mut self) -> impl Iterator<Item = &mut Account> {
        self.accounts.iter_mut()
    }

    pub fn get(&self, account_id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == account_id)
    }

    pub fn stats(&self) -> AggregationStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
