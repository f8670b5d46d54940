use clap::Parser;
use std::path::{Path, PathBuf};

/// File name looked up in the per-user config directory when `--aliases` is
/// not given.
pub const DEFAULT_ALIAS_FILE: &str = "aliases.json";

/// Per-user directory (under the home directory) holding optional config.
pub const CONFIG_DIR_NAME: &str = ".bank-analyzer";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Plot bank account balances from OFX exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "bank-analyzer",
    about = "Plot bank account balances from the OFX files found in a directory",
    version
)]
pub struct Settings {
    /// Directory to scan recursively for .ofx / .qfx exports
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// JSON file mapping raw account ids to display names
    #[arg(long, short = 'a')]
    pub aliases: Option<PathBuf>,

    /// Write every chart as a text file into this directory instead of
    /// opening the interactive viewer
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Restrict the stacked chart to the dates every account covers
    #[arg(long)]
    pub short_period: bool,

    /// Do not build the stacked all-accounts chart
    #[arg(long)]
    pub no_stacked: bool,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Chart width in columns for text export
    #[arg(long, default_value = "120", value_parser = clap::value_parser!(u16).range(40..=1000))]
    pub width: u16,

    /// Chart height in rows for text export
    #[arg(long, default_value = "32", value_parser = clap::value_parser!(u16).range(10..=500))]
    pub height: u16,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path (keeps the terminal clean while the viewer is open)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse from the process arguments.
    pub fn load() -> Self {
        Self::parse()
    }

    /// Parse from an explicit argument list (first item is the binary name).
    pub fn try_load_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    /// Effective log level: `--debug` wins over `--log-level`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }

    /// The alias file to load: `--aliases` when given, else
    /// `~/.bank-analyzer/aliases.json`.
    ///
    /// Returns `None` only when no explicit path is set and the home
    /// directory cannot be determined.
    pub fn resolved_alias_path(&self) -> Option<PathBuf> {
        match &self.aliases {
            Some(path) => Some(path.clone()),
            None => dirs::home_dir().map(|home| default_alias_path_in(&home)),
        }
    }
}

/// Default alias file location rooted at `home`.
pub fn default_alias_path_in(home: &Path) -> PathBuf {
    home.join(CONFIG_DIR_NAME).join(DEFAULT_ALIAS_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::try_load_from(["bank-analyzer"]).unwrap();
        assert_eq!(settings.directory, PathBuf::from("."));
        assert!(settings.aliases.is_none());
        assert!(settings.output.is_none());
        assert!(!settings.short_period);
        assert!(!settings.no_stacked);
        assert_eq!(settings.theme, "auto");
        assert_eq!(settings.log_level, "INFO");
    }

    #[test]
    fn test_explicit_arguments() {
        let settings = Settings::try_load_from([
            "bank-analyzer",
            "/data/exports",
            "--aliases",
            "/data/aliases.json",
            "--output",
            "/tmp/charts",
            "--short-period",
            "--theme",
            "light",
        ])
        .unwrap();
        assert_eq!(settings.directory, PathBuf::from("/data/exports"));
        assert_eq!(settings.aliases, Some(PathBuf::from("/data/aliases.json")));
        assert_eq!(settings.output, Some(PathBuf::from("/tmp/charts")));
        assert!(settings.short_period);
        assert_eq!(settings.theme, "light");
        assert_eq!(
            settings.resolved_alias_path(),
            Some(PathBuf::from("/data/aliases.json"))
        );
    }

    #[test]
    fn test_invalid_theme_rejected() {
        assert!(Settings::try_load_from(["bank-analyzer", "--theme", "neon"]).is_err());
    }

    #[test]
    fn test_width_range_enforced() {
        assert!(Settings::try_load_from(["bank-analyzer", "--width", "10"]).is_err());
        let ok = Settings::try_load_from(["bank-analyzer", "--width", "80"]).unwrap();
        assert_eq!(ok.width, 80);
    }

    #[test]
    fn test_debug_flag_overrides_level() {
        let settings =
            Settings::try_load_from(["bank-analyzer", "--log-level", "ERROR", "--debug"]).unwrap();
        assert_eq!(settings.effective_log_level(), "DEBUG");
    }

    #[test]
    fn test_default_alias_path_in_home() {
        let path = default_alias_path_in(Path::new("/home/user"));
        assert_eq!(path, PathBuf::from("/home/user/.bank-analyzer/aliases.json"));
    }
}
