use std::path::Path;

use super::{print_json, OutputFormat};
use crate::settings::Settings;

pub fn run_create_template(
    settings: &Settings,
    workbook: Option<&Path>,
    doc: Option<&str>,
    languages: Option<String>,
    tab: Option<String>,
    check_only: bool,
    format: OutputFormat,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "create_template_args", workbook = ?workbook, doc = ?doc, languages = ?languages, tab = ?tab, check_only);
    let book = settings.workbook(workbook)?;
    let doc = settings.doc(doc);
    let langs = settings.languages(languages.as_deref())?;
    let tab = settings.template_tab(tab.as_deref());
    let report = gxlate_services::create_template(&book, doc.as_deref(), &tab, &langs, check_only)?;
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text if report.check_only => crate::ui_info!(
            "Tab {} in {} would be {} with {} columns",
            report.tab,
            report.document,
            if report.replaced { "replaced" } else { "created" },
            report.headers.len()
        ),
        OutputFormat::Text => {
            crate::ui_ok!("Created tab {} in {}", report.tab, report.document);
            crate::ui_out!("{}", report.headers.join(", "));
        }
    }
    Ok(())
}
