//! Off-screen rendering of charts into plain-text files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};
use tracing::{debug, info};

use analyzer_core::error::Result;
use analyzer_data::analysis::AnalysisResult;

use crate::chart_view::{BalanceChartView, StackedChartView};
use crate::themes::Theme;

/// Render `widget` into a `width` x `height` buffer and return its text,
/// one line per row with trailing blanks removed.
pub fn render_to_text<W: Widget>(widget: W, width: u16, height: u16) -> String {
    let area = Rect::new(0, 0, width, height);
    let mut buffer = Buffer::empty(area);
    widget.render(area, &mut buffer);

    let mut out = String::with_capacity(usize::from(width + 1) * usize::from(height));
    for y in 0..height {
        let line: String = (0..width)
            .filter_map(|x| buffer.cell((x, y)))
            .map(|cell| cell.symbol())
            .collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Write every chart of `result` into `dir` as `<slug>.txt`.
///
/// `dir` is created when missing.  Two charts with the same slug get a
/// numeric suffix.  Returns the written paths in chart order, the stacked
/// chart last.
pub fn write_charts(
    dir: &Path,
    result: &AnalysisResult,
    width: u16,
    height: u16,
    theme: &Theme,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut used = HashSet::new();
    let mut written = Vec::with_capacity(result.charts.len() + 1);

    for chart in &result.charts {
        let text = render_to_text(BalanceChartView::new(chart, theme), width, height);
        written.push(write_one(dir, &chart.slug(), &text, &mut used)?);
    }
    if let Some(stacked) = &result.stacked {
        let text = render_to_text(StackedChartView::new(stacked, theme), width, height);
        written.push(write_one(dir, "all-accounts", &text, &mut used)?);
    }

    info!("Wrote {} charts to {}", written.len(), dir.display());
    Ok(written)
}

fn write_one(dir: &Path, slug: &str, text: &str, used: &mut HashSet<String>) -> Result<PathBuf> {
    let mut name = slug.to_string();
    let mut n = 2;
    while !used.insert(name.clone()) {
        name = format!("{}-{}", slug, n);
        n += 1;
    }
    let path = dir.join(format!("{}.txt", name));
    std::fs::write(&path, text)?;
    debug!("Wrote {}", path.display());
    Ok(path)
}
