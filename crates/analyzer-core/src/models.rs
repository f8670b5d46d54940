use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category of a transaction as stated by the bank (`TRNTYPE`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
    Int,
    Div,
    Fee,
    SrvChg,
    Dep,
    Atm,
    Pos,
    Xfer,
    Check,
    Payment,
    Cash,
    DirectDep,
    DirectDebit,
    RepeatPmt,
    /// Any value outside the standard vocabulary, kept verbatim (upper-cased).
    Other(String),
}

impl TransactionKind {
    /// Map a raw `TRNTYPE` value to a kind. Matching ignores case and
    /// surrounding whitespace.
    pub fn from_ofx(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        match upper.as_str() {
            "CREDIT" => Self::Credit,
            "DEBIT" => Self::Debit,
            "INT" => Self::Int,
            "DIV" => Self::Div,
            "FEE" => Self::Fee,
            "SRVCHG" => Self::SrvChg,
            "DEP" => Self::Dep,
            "ATM" => Self::Atm,
            "POS" => Self::Pos,
            "XFER" => Self::Xfer,
            "CHECK" => Self::Check,
            "PAYMENT" => Self::Payment,
            "CASH" => Self::Cash,
            "DIRECTDEP" => Self::DirectDep,
            "DIRECTDEBIT" => Self::DirectDebit,
            "REPEATPMT" => Self::RepeatPmt,
            _ => Self::Other(upper),
        }
    }

    /// The `TRNTYPE` spelling of this kind.
    pub fn as_ofx(&self) -> &str {
        match self {
            Self::Credit => "CREDIT",
            Self::Debit => "DEBIT",
            Self::Int => "INT",
            Self::Div => "DIV",
            Self::Fee => "FEE",
            Self::SrvChg => "SRVCHG",
            Self::Dep => "DEP",
            Self::Atm => "ATM",
            Self::Pos => "POS",
            Self::Xfer => "XFER",
            Self::Check => "CHECK",
            Self::Payment => "PAYMENT",
            Self::Cash => "CASH",
            Self::DirectDep => "DIRECTDEP",
            Self::DirectDebit => "DIRECTDEBIT",
            Self::RepeatPmt => "REPEATPMT",
            Self::Other(raw) => raw,
        }
    }
}

impl Default for TransactionKind {
    fn default() -> Self {
        Self::Other("OTHER".to_string())
    }
}

/// A single posted transaction read from an export file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Source-assigned identifier (`FITID`), unique within its account.
    pub id: String,
    /// Calendar date the transaction was posted.
    pub date: NaiveDate,
    /// Signed amount: negative for money leaving the account.
    pub amount: Decimal,
    /// Account balance right after this transaction, when the bank states it.
    #[serde(default)]
    pub balance_after: Option<Decimal>,
    /// Free-text description (memo, else payee name).
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: TransactionKind,
}

/// Inclusive calendar-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatePeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DatePeriod {
    /// Build a period, swapping the bounds if they are given in reverse.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, bounds included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Smallest period covering both.
    pub fn union(&self, other: &DatePeriod) -> DatePeriod {
        DatePeriod {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Overlap of both periods, `None` when they are disjoint.
    pub fn intersection(&self, other: &DatePeriod) -> Option<DatePeriod> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(DatePeriod { start, end })
    }

    /// Grow the period so that it includes `date`.
    pub fn extend_to(&mut self, date: NaiveDate) {
        if date < self.start {
            self.start = date;
        }
        if date > self.end {
            self.end = date;
        }
    }
}

/// A statement-level balance known at a given date (`LEDGERBAL` / `AVAILBAL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceBalance {
    /// Balance at the end of `date`.
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Account identity and statement metadata from one export section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementHeader {
    /// Institution name (`FI/ORG`), when the file carries a sign-on block.
    #[serde(default)]
    pub institution: Option<String>,
    /// Raw institution-assigned account identifier (`ACCTID`).
    pub account_id: String,
    /// ISO currency code (`CURDEF`).
    #[serde(default)]
    pub currency: Option<String>,
    /// Statement range (`DTSTART` .. `DTEND`).
    #[serde(default)]
    pub period: Option<DatePeriod>,
    #[serde(default)]
    pub reference_balance: Option<ReferenceBalance>,
}

impl StatementHeader {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            institution: None,
            account_id: account_id.into(),
            currency: None,
            period: None,
            reference_balance: None,
        }
    }
}

/// One account section of one export file, transactions in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub header: StatementHeader,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// One bank account merged across every export file of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Raw institution-assigned identifier.
    pub id: String,
    /// Display name from the alias file, if any.
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    /// Union of every merged statement range.
    #[serde(default)]
    pub period: Option<DatePeriod>,
    /// Most recent statement-level balance seen across files.
    #[serde(default)]
    pub reference_balance: Option<ReferenceBalance>,
    /// Transactions ordered by date once aggregation has finished.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Account {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            alias: None,
            institution: None,
            currency: None,
            period: None,
            reference_balance: None,
            transactions: Vec::new(),
        }
    }

    /// Alias when set, raw identifier otherwise.
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.id)
    }

    /// The statement range widened to every transaction date, or the span
    /// of transaction dates alone when no statement range was given.
    ///
    /// Returns `None` for an account without any date information.
    pub fn covered_period(&self) -> Option<DatePeriod> {
        let mut period = self.period;
        for tx in &self.transactions {
            match period.as_mut() {
                Some(p) => p.extend_to(tx.date),
                None => period = Some(DatePeriod::new(tx.date, tx.date)),
            }
        }
        period
    }
}
