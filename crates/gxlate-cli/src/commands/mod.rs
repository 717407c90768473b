pub mod check_props;
pub mod create_template;
pub mod download;
pub mod schema;
pub mod upload;

use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Pretty JSON on stdout, newline terminated.
pub fn print_json<T: serde::Serialize>(value: &T) -> color_eyre::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
