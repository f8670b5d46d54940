//! Display aliases for raw account identifiers.
//!
//! The alias file is a JSON object mapping account ids to names:
//!
//! ```json
//! { "FR7630003000123": "Checking", "4111-XXXX": "Visa" }
//! ```

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use analyzer_core::error::{AnalyzerError, Result};
use tracing::{debug, info};

use crate::aggregator::AggregationSet;

/// Read-only mapping from raw account id to display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    names: BTreeMap<String, String>,
}

impl AliasMap {
    /// Load aliases from `path`.
    ///
    /// No path, or a path that does not exist, gives an empty map.  A path
    /// that cannot be inspected or read, or a file that is not a JSON object
    /// of strings, is an [`AnalyzerError::InvalidAliasFile`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No alias file configured");
            return Ok(Self::default());
        };
        let invalid = |reason: String| AnalyzerError::InvalidAliasFile {
            path: path.to_path_buf(),
            reason,
        };

        match std::fs::metadata(path) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Alias file {} not found; using raw ids", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(invalid(e.to_string())),
        }

        let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let names: BTreeMap<String, String> =
            serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;

        info!("Loaded {} account aliases from {}", names.len(), path.display());
        Ok(Self { names })
    }

    /// Alias for `account_id`, if one is configured.
    pub fn get(&self, account_id: &str) -> Option<&str> {
        self.names
            .get(account_id)
            .map(String::as_str)
            .filter(|name| !name.trim().is_empty())
    }

    /// Alias when configured, the raw id otherwise.
    pub fn display_name<'a>(&'a self, account_id: &'a str) -> &'a str {
        self.get(account_id).unwrap_or(account_id)
    }

    /// Record the alias on every account of the set that has one.
    pub fn apply(&self, set: &mut AggregationSet) {
        for account in set.accounts_mut() {
            account.alias = self.get(&account.id).map(str::to_string);
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for AliasMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::AccountAggregator;
    use tempfile::TempDir;

    fn write_aliases(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("aliases.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_without_path_is_empty() {
        let aliases = AliasMap::load(None).unwrap();
        assert!(aliases.is_empty());
        assert_eq!(aliases.display_name("123"), "123");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let aliases = AliasMap::load(Some(&dir.path().join("nope.json"))).unwrap();
        assert!(aliases.is_empty());
    }

    #[test]
    fn test_load_uninspectable_path_is_invalid_alias_file() {
        let dir = TempDir::new().unwrap();
        let file = write_aliases(&dir, "{}");
        // A path below a regular file fails with ENOTDIR, not NotFound.
        let below_file = file.join("aliases.json");

        let err = AliasMap::load(Some(&below_file)).unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::InvalidAliasFile { ref path, .. } if *path == below_file
        ));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_load_valid_file() {
        let dir = TempDir::new().unwrap();
        let path = write_aliases(&dir, r#"{"123": "Checking", "456": "Savings"}"#);

        let aliases = AliasMap::load(Some(&path)).unwrap();
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases.get("123"), Some("Checking"));
        assert_eq!(aliases.display_name("123"), "Checking");
        assert_eq!(aliases.display_name("789"), "789");
    }

    #[test]
    fn test_blank_alias_falls_back_to_id() {
        let aliases: AliasMap = [("123".to_string(), "  ".to_string())].into_iter().collect();
        assert_eq!(aliases.display_name("123"), "123");
    }

    #[test]
    fn test_load_malformed_json_is_invalid_alias_file() {
        let dir = TempDir::new().unwrap();
        let path = write_aliases(&dir, "{not json");

        let err = AliasMap::load(Some(&path)).unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidAliasFile { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_load_wrong_shape_is_invalid_alias_file() {
        let dir = TempDir::new().unwrap();
        let path = write_aliases(&dir, r#"["123", "Checking"]"#);
        assert!(matches!(
            AliasMap::load(Some(&path)).unwrap_err(),
            AnalyzerError::InvalidAliasFile { .. }
        ));

        let path = write_aliases(&dir, r#"{"123": 42}"#);
        assert!(matches!(
            AliasMap::load(Some(&path)).unwrap_err(),
            AnalyzerError::InvalidAliasFile { .. }
        ));
    }

    #[test]
    fn test_apply_sets_account_aliases() {
        let mut aggregator = AccountAggregator::new();
        aggregator.ensure_account("123");
        aggregator.ensure_account("456");
        let mut set = aggregator.finish();

        let aliases: AliasMap = [("123".to_string(), "Checking".to_string())]
            .into_iter()
            .collect();
        aliases.apply(&mut set);

        assert_eq!(set.get("123").unwrap().alias.as_deref(), Some("Checking"));
        assert!(set.get("456").unwrap().alias.is_none());
    }
}
