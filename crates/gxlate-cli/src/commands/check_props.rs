use std::path::PathBuf;

use gxlate_domain::RunReport;
use gxlate_services::ensure_success;

use super::{print_json, OutputFormat};
use crate::settings::Settings;
use crate::ui::print_failures;

pub fn run_check_props(
    settings: &Settings,
    props_dir: Option<PathBuf>,
    languages: Option<String>,
    format: OutputFormat,
    use_color: bool,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "check_props_args", props_dir = ?props_dir, languages = ?languages, format = ?format);
    let path = settings.props_dir(props_dir);
    let langs = settings.languages(languages.as_deref())?;
    let report = gxlate_services::check_props(&path, &langs)?;
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text if report.is_success() => {
            crate::ui_ok!("All props files loaded successfully: {}", report.loaded)
        }
        OutputFormat::Text => {
            crate::ui_out!("Loaded {} props file(s)", report.loaded);
            print_failures(&report.failures, use_color);
        }
    }
    ensure_success(&report)
}
