mod bootstrap;

use anyhow::{Context, Result};
use analyzer_core::settings::Settings;
use analyzer_data::aliases::AliasMap;
use analyzer_data::analysis::{analyze_directory, AnalysisOptions};
use analyzer_data::report::SpanMode;
use analyzer_ui::app::App;
use analyzer_ui::export::write_charts;
use analyzer_ui::themes::Theme;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(settings.effective_log_level(), settings.log_file.as_deref())?;

    tracing::info!("Bank Analyzer v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Settings: {:?}", settings);

    let alias_path = settings.resolved_alias_path();
    let aliases = AliasMap::load(alias_path.as_deref())?;

    let options = AnalysisOptions {
        stacked: !settings.no_stacked,
        span: if settings.short_period {
            SpanMode::Intersection
        } else {
            SpanMode::Union
        },
    };
    let result = analyze_directory(&settings.directory, &aliases, &options)?;

    match &settings.output {
        Some(dir) => {
            let theme = Theme::from_name(&settings.theme);
            let written = write_charts(dir, &result, settings.width, settings.height, &theme)
                .with_context(|| format!("cannot write charts to {}", dir.display()))?;
            for path in &written {
                println!("{}", path.display());
            }
            if written.is_empty() {
                eprintln!(
                    "No chart written: no usable export under {}",
                    settings.directory.display()
                );
            }
        }
        None => {
            App::new(&settings.theme, result).run()?;
        }
    }

    Ok(())
}
