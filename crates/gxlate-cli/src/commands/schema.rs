use std::fs;
use std::path::PathBuf;

pub fn run_schema(out_dir: PathBuf) -> color_eyre::Result<()> {
    tracing::debug!(event = "schema_args", out_dir = %out_dir.display());
    fs::create_dir_all(&out_dir)?;
    macro_rules! dump {
        ($ty:ty, $name:literal) => {{
            let schema = schemars::schema_for!($ty);
            let path = out_dir.join($name);
            let f = std::fs::File::create(&path)?;
            serde_json::to_writer_pretty(f, &schema)?;
        }};
    }
    dump!(gxlate_domain::UploadReport, "upload_report.schema.json");
    dump!(gxlate_domain::DownloadReport, "download_report.schema.json");
    dump!(gxlate_domain::CheckReport, "check_report.schema.json");
    dump!(gxlate_domain::WorkbookListing, "workbook_listing.schema.json");
    dump!(gxlate_domain::TemplateReport, "template_report.schema.json");
    dump!(gxlate_domain::Failure, "failure.schema.json");
    crate::ui_ok!("Schemas written to {}", out_dir.display());
    Ok(())
}
