use std::path::Path;

use gxlate_services::ensure_success;

use super::{print_json, OutputFormat};
use crate::settings::{Settings, SyncInputs};
use crate::ui::print_failures;

pub fn run_download(
    settings: &Settings,
    workbook: Option<&Path>,
    inputs: SyncInputs<'_>,
    format: OutputFormat,
    use_color: bool,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "download_args", workbook = ?workbook, inputs = ?inputs, format = ?format);
    let book = settings.workbook(workbook)?;
    let rules = settings.rules()?;
    let opts = settings.sync_options(inputs)?;
    let report = gxlate_services::download(&book, &rules, &opts)?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            for s in &report.languages {
                crate::ui_out!(
                    "  {}: {} updated, {} retained, {} placeholders, {} errors, {} file(s) written",
                    s.language,
                    s.updated,
                    s.retained,
                    s.placeholders,
                    s.errors,
                    s.files_written
                );
            }
            let mode = if report.check_only { " (check only)" } else { "" };
            crate::ui_ok!(
                "Download from {}{}: {} bundle(s), {} row(s) removed",
                report.document,
                mode,
                report.bundles,
                report.removed
            );
            print_failures(&report.failures, use_color);
        }
    }
    ensure_success(&report)
}
