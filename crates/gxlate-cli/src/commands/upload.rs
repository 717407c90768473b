use std::path::Path;

use gxlate_services::ensure_success;

use super::{print_json, OutputFormat};
use crate::settings::{Settings, SyncInputs};
use crate::ui::print_failures;

pub fn run_upload(
    settings: &Settings,
    workbook: Option<&Path>,
    inputs: SyncInputs<'_>,
    format: OutputFormat,
    use_color: bool,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "upload_args", workbook = ?workbook, inputs = ?inputs, format = ?format);
    let book = settings.workbook(workbook)?;
    let rules = settings.rules()?;
    let opts = settings.sync_options(inputs)?;
    let report = gxlate_services::upload(&book, &rules, &opts)?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            for tab in &report.tabs {
                crate::ui_out!(
                    "  {} ({}): {} added, {} updated, {} removed, {} stale",
                    tab.tab,
                    tab.bundle,
                    tab.added,
                    tab.updated,
                    tab.removed,
                    tab.stale
                );
            }
            let mode = if report.check_only { " (check only)" } else { "" };
            crate::ui_ok!(
                "Upload to {}{}: {} bundle(s), {} added, {} updated, {} removed",
                report.document,
                mode,
                report.bundles,
                report.added,
                report.updated,
                report.removed
            );
            print_failures(&report.failures, use_color);
        }
    }
    ensure_success(&report)
}
