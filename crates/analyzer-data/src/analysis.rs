//! Main analysis pipeline for Bank Analyzer.
//!
//! Scans a directory, parses every export, merges accounts and builds the
//! charts, returning an [`AnalysisResult`] ready for the UI layer.

use std::path::{Path, PathBuf};
use std::time::Instant;

use analyzer_core::error::Result;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::aggregator::{AccountAggregator, AggregationSet};
use crate::aliases::AliasMap;
use crate::ofx::parse_export;
use crate::reader::{read_export, ExportScan};
use crate::report::{
    build_reports, build_stacked_chart, BalanceChart, SkippedAccount, SpanMode, StackedChart,
};

// ── Public types ──────────────────────────────────────────────────────────────

/// Knobs of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Build the all-accounts stacked chart.
    pub stacked: bool,
    pub span: SpanMode,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            stacked: true,
            span: SpanMode::Union,
        }
    }
}

/// An export file that was found but could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    pub root: PathBuf,
    pub files_scanned: usize,
    pub files_parsed: usize,
    pub files_skipped: usize,
    pub statements: usize,
    pub accounts: usize,
    /// Transactions kept after de-duplication.
    pub transactions: usize,
    pub duplicates_dropped: usize,
    pub charts_built: usize,
    /// Wall-clock seconds spent scanning, reading and parsing.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent building charts.
    pub report_time_seconds: f64,
}

/// The complete output of [`analyze_directory`].
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub accounts: AggregationSet,
    /// One chart per account with transactions, ordered by account id.
    pub charts: Vec<BalanceChart>,
    pub stacked: Option<StackedChart>,
    /// Why the stacked chart is missing although it was requested.
    pub stacked_error: Option<String>,
    pub skipped_files: Vec<SkippedFile>,
    pub skipped_accounts: Vec<SkippedAccount>,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    pub fn has_charts(&self) -> bool {
        !self.charts.is_empty() || self.stacked.is_some()
    }
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full analysis pipeline over `root`.
///
/// 1. Scan `root` for export files (a missing root is fatal).
/// 2. Read and parse each file; unusable files are logged and skipped.
/// 3. Merge statements per account and apply `aliases`.
/// 4. Build one chart per account, plus the stacked chart when asked.
pub fn analyze_directory(
    root: &Path,
    aliases: &AliasMap,
    options: &AnalysisOptions,
) -> Result<AnalysisResult> {
    let scan = ExportScan::new(root)?;
    info!("Scanning {} for bank exports", root.display());

    // ── Step 1: Load and parse ────────────────────────────────────────────────
    let load_start = Instant::now();
    let mut aggregator = AccountAggregator::new();
    let mut skipped_files = Vec::new();
    let mut files_scanned = 0usize;
    let mut statements = 0usize;

    for path in scan.files() {
        files_scanned += 1;
        let parsed = read_export(&path).and_then(|contents| parse_export(&path, &contents));
        match parsed {
            Ok(found) => {
                debug!("{}: {} statements", path.display(), found.len());
                statements += found.len();
                for statement in found {
                    aggregator.ingest(statement);
                }
            }
            Err(e) if !e.is_fatal() => {
                warn!("Skipping {}: {}", path.display(), e);
                skipped_files.push(SkippedFile {
                    path,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    let mut accounts = aggregator.finish();
    aliases.apply(&mut accounts);
    let load_time = load_start.elapsed().as_secs_f64();

    // ── Step 2: Charts ────────────────────────────────────────────────────────
    let report_start = Instant::now();
    let (charts, skipped_accounts) = build_reports(&accounts, aliases);

    let (stacked, stacked_error) = if options.stacked && !charts.is_empty() {
        let charted: Vec<_> = charts
            .iter()
            .filter_map(|chart| accounts.get(&chart.account_id))
            .collect();
        match build_stacked_chart(&charted, aliases, options.span) {
            Ok(chart) => (Some(chart), None),
            Err(e) => {
                warn!("No stacked chart: {}", e);
                (None, Some(e.to_string()))
            }
        }
    } else {
        (None, None)
    };
    let report_time = report_start.elapsed().as_secs_f64();

    // ── Step 3: Build result ──────────────────────────────────────────────────
    let stats = accounts.stats();
    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        root: root.to_path_buf(),
        files_scanned,
        files_parsed: files_scanned - skipped_files.len(),
        files_skipped: skipped_files.len(),
        statements,
        accounts: stats.accounts,
        transactions: stats.transactions,
        duplicates_dropped: stats.duplicates_dropped,
        charts_built: charts.len(),
        load_time_seconds: load_time,
        report_time_seconds: report_time,
    };

    info!(
        "Analyzed {} files ({} skipped): {} accounts, {} transactions, {} charts",
        metadata.files_scanned,
        metadata.files_skipped,
        metadata.accounts,
        metadata.transactions,
        metadata.charts_built
    );

    Ok(AnalysisResult {
        accounts,
        charts,
        stacked,
        stacked_error,
        skipped_files,
        skipped_accounts,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use analyzer_core::error::AnalyzerError;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn export(account: &str, currency: &str, transactions: &[(&str, &str, &str)]) -> String {
        let body: String = transactions
            .iter()
            .map(|(id, date, amount)| {
                format!(
                    "<STMTTRN><TRNTYPE>OTHER<DTPOSTED>{}<TRNAMT>{}<FITID>{}</STMTTRN>\n",
                    date, amount, id
                )
            })
            .collect();
        format!(
            "OFXHEADER:100\nDATA:OFXSGML\n\n<OFX><BANKMSGSRSV1><STMTTRNRS><STMTRS>\
             <CURDEF>{}<BANKACCTFROM><ACCTID>{}</BANKACCTFROM>\
             <BANKTRANLIST>\n{}</BANKTRANLIST></STMTRS></STMTTRNRS></BANKMSGSRSV1></OFX>\n",
            currency, account, body
        )
    }

    fn write(dir: &TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    // ── analyze_directory ─────────────────────────────────────────────────────

    #[test]
    fn test_analyze_single_account() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "jan.ofx",
            &export("123", "EUR", &[("t1", "20240101", "-50.00"), ("t2", "20240103", "20.00")]),
        );

        let result =
            analyze_directory(dir.path(), &AliasMap::default(), &AnalysisOptions::default())
                .unwrap();
        assert_eq!(result.charts.len(), 1);
        assert_eq!(result.charts[0].title, "123");
        assert_eq!(result.charts[0].stats.final_balance, dec!(-30.00));
        assert_eq!(result.stacked.as_ref().unwrap().layers.len(), 1);
        assert_eq!(result.metadata.files_parsed, 1);
        assert!(result.has_charts());
    }

    #[test]
    fn test_analyze_builds_stacked_chart_for_several_accounts() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.ofx", &export("123", "EUR", &[("t1", "20240101", "-5")]));
        write(&dir, "b.ofx", &export("456", "EUR", &[("s1", "20240102", "7")]));

        let result =
            analyze_directory(dir.path(), &AliasMap::default(), &AnalysisOptions::default())
                .unwrap();
        let stacked = result.stacked.unwrap();
        assert_eq!(stacked.layers.len(), 2);
        assert!(result.stacked_error.is_none());
    }

    #[test]
    fn test_analyze_stacked_disabled() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.ofx", &export("123", "EUR", &[("t1", "20240101", "-5")]));
        write(&dir, "b.ofx", &export("456", "EUR", &[("s1", "20240102", "7")]));

        let options = AnalysisOptions {
            stacked: false,
            ..AnalysisOptions::default()
        };
        let result = analyze_directory(dir.path(), &AliasMap::default(), &options).unwrap();
        assert!(result.stacked.is_none());
        assert_eq!(result.charts.len(), 2);
    }

    #[test]
    fn test_analyze_mixed_currencies_records_stacked_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.ofx", &export("123", "EUR", &[("t1", "20240101", "-5")]));
        write(&dir, "b.ofx", &export("456", "USD", &[("s1", "20240102", "7")]));

        let result =
            analyze_directory(dir.path(), &AliasMap::default(), &AnalysisOptions::default())
                .unwrap();
        assert!(result.stacked.is_none());
        assert!(result.stacked_error.unwrap().contains("same currency"));
        assert_eq!(result.charts.len(), 2);
    }

    #[test]
    fn test_analyze_skips_malformed_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "bad.ofx", "OFXHEADER:100\n<OFX><SIGNONMSGSRSV1></OFX>");
        write(&dir, "good.ofx", &export("123", "EUR", &[("t1", "20240101", "1")]));

        let result =
            analyze_directory(dir.path(), &AliasMap::default(), &AnalysisOptions::default())
                .unwrap();
        assert_eq!(result.skipped_files.len(), 1);
        assert!(result.skipped_files[0].path.ends_with("bad.ofx"));
        assert_eq!(result.metadata.files_scanned, 2);
        assert_eq!(result.metadata.files_skipped, 1);
        assert_eq!(result.charts.len(), 1);
    }

    #[test]
    fn test_analyze_missing_root() {
        let err = analyze_directory(
            Path::new("/tmp/bank-analyzer-no-such-root"),
            &AliasMap::default(),
            &AnalysisOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalyzerError::PathNotFound(_)));
    }

    #[test]
    fn test_analyze_empty_directory() {
        let dir = TempDir::new().unwrap();
        let result =
            analyze_directory(dir.path(), &AliasMap::default(), &AnalysisOptions::default())
                .unwrap();
        assert!(!result.has_charts());
        assert_eq!(result.metadata.files_scanned, 0);
    }
}
