//! Export-file discovery and loading.
//!
//! Walks a root directory for OFX / QFX statements and reads them into
//! strings for the parser.  Unreadable entries are logged and skipped; only a
//! missing root is an error.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use analyzer_core::error::{AnalyzerError, Result};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Extensions accepted without looking at the content.
const EXPORT_EXTENSIONS: &[&str] = &["ofx", "qfx"];

/// How many leading bytes are inspected for the content signature.
const SNIFF_LEN: usize = 1024;

// ── ExportScan ────────────────────────────────────────────────────────────────

/// A validated root directory whose export files can be enumerated.
///
/// Enumeration is lazy and restartable: every call to [`ExportScan::files`]
/// starts a fresh walk.
#[derive(Debug, Clone)]
pub struct ExportScan {
    root: PathBuf,
}

impl ExportScan {
    /// Fails with [`AnalyzerError::PathNotFound`] when `root` does not exist
    /// or is not a directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(AnalyzerError::PathNotFound(root));
        }
        Ok(Self { root })
    }

    /// Lazily yield every export file below the root, depth-first, entries of
    /// a directory in file-name order.
    pub fn files(&self) -> impl Iterator<Item = PathBuf> + '_ {
        WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", self.root.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(is_export_candidate)
            .map(DirEntry::into_path)
    }
}

/// Read one export file.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected: SGML
/// exports are commonly Latin-1 and only the markup has to survive.
pub fn read_export(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| AnalyzerError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!("{} is not valid UTF-8; decoding lossily", path.display());
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn has_export_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            EXPORT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

fn is_export_candidate(entry: &DirEntry) -> bool {
    let path = entry.path();
    if has_export_extension(path) {
        return true;
    }
    match sniff_signature(path) {
        Ok(found) => found,
        Err(e) => {
            warn!("Skipping unreadable file {}: {}", path.display(), e);
            false
        }
    }
}

/// Whether the head of the file carries an OFX header or root element.
fn sniff_signature(path: &Path) -> std::io::Result<bool> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    let text = String::from_utf8_lossy(&head).to_uppercase();
    Ok(text.contains("OFXHEADER") || text.contains("<OFX>"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
