use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the bank analyzer.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// The root directory to scan does not exist or is not a directory.
    #[error("Path not found or not a directory: {0}")]
    PathNotFound(PathBuf),

    /// The alias file exists but is not a JSON object of strings.
    #[error("Invalid alias file {path}: {reason}")]
    InvalidAliasFile { path: PathBuf, reason: String },

    /// A transaction block is missing a required field or holds an
    /// unparsable value. `block` counts `STMTTRN` blocks from 1 within the file.
    #[error("Malformed record in {path} (transaction block {block}): {reason}")]
    MalformedRecord {
        path: PathBuf,
        block: usize,
        reason: String,
    },

    /// The file structure itself is unusable (no `<OFX>` root, no statement,
    /// statement without an account id).
    #[error("Malformed statement in {path}: {reason}")]
    MalformedStatement { path: PathBuf, reason: String },

    /// A chart could not be produced for an account.
    #[error("Cannot render chart for account {account}: {reason}")]
    Render { account: String, reason: String },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnalyzerError {
    /// Whether this error must abort the whole run.
    ///
    /// Per-file and per-account failures are recoverable: the pipeline logs
    /// them and moves on to the next input.
    pub fn is_fatal(&self) -> bool {
        match self {
            AnalyzerError::PathNotFound(_)
            | AnalyzerError::InvalidAliasFile { .. }
            | AnalyzerError::Io(_)
            | AnalyzerError::Other(_) => true,
            AnalyzerError::MalformedRecord { .. }
            | AnalyzerError::MalformedStatement { .. }
            | AnalyzerError::Render { .. }
            | AnalyzerError::FileRead { .. } => false,
        }
    }
}

/// Convenience alias used throughout the analyzer crates.
pub type Result<T> = std::result::Result<T, AnalyzerError>;
