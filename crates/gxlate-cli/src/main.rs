mod commands;
mod settings;
mod ui;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use gxlate_services::ListingMode;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use commands::OutputFormat;
use settings::{Settings, SyncInputs};

#[derive(Parser)]
#[command(
    name = "gxlate",
    version,
    about = "Keep properties bundles and a translation workbook in sync"
)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Only log warnings and errors to the console
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Config file to use instead of searching for gxlate.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Workbook directory (one subdirectory per document)
    #[arg(long, global = true)]
    workbook: Option<PathBuf>,

    /// Document within the workbook; the first one when omitted
    #[arg(long, global = true)]
    doc: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Args, Debug, Clone)]
struct SourceArgs {
    /// Directory searched for English bundles, or a single bundle
    #[arg(long)]
    props_dir: Option<PathBuf>,
    /// Comma separated language codes, e.g. fr,de
    #[arg(long)]
    languages: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct SyncArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Report what would change without touching the workbook or files
    #[arg(long, default_value_t = false)]
    check_only: bool,
    /// Rule flag to enable; repeatable
    #[arg(long = "flag")]
    flags: Vec<String>,
    /// Rule domain to use
    #[arg(long)]
    domain: Option<String>,
    /// Column forming the row key; repeatable
    #[arg(long = "key-column")]
    key_columns: Vec<String>,
    /// Delete rows whose keys no longer exist in the bundles
    #[arg(long, default_value_t = false)]
    remove_rows: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse every bundle and report load errors
    CheckProps {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Push new and changed English strings to the workbook
    Upload {
        #[command(flatten)]
        sync: SyncArgs,
    },

    /// Write language bundles from the workbook's translations
    Download {
        #[command(flatten)]
        sync: SyncArgs,
        /// Write untranslated strings without the [code] prefix
        #[arg(long, default_value_t = false)]
        no_prepend: bool,
    },

    /// List documents, tabs or row counts of the workbook
    DocTest {
        #[arg(long, default_value = "docs")]
        mode: ListingMode,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Replace the template tab with a fresh header row
    CreateTemplate {
        /// Comma separated language codes, e.g. fr,de
        #[arg(long)]
        languages: Option<String>,
        /// Tab name; "template" by default
        #[arg(long)]
        tab: Option<String>,
        #[arg(long, default_value_t = false)]
        check_only: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Dump JSON Schemas of the report formats
    Schema {
        #[arg(long, default_value = "./docs/assets/schemas")]
        out_dir: PathBuf,
    },
}

/// Values every command may need, taken from the global flags.
struct Globals {
    use_color: bool,
    config: Option<PathBuf>,
    workbook: Option<PathBuf>,
    doc: Option<String>,
}

impl Globals {
    fn sync_inputs<'a>(&'a self, sync: &'a SyncArgs, no_prepend: bool) -> SyncInputs<'a> {
        SyncInputs {
            props_dir: sync.source.props_dir.clone(),
            languages: sync.source.languages.as_deref(),
            doc: self.doc.as_deref(),
            check_only: sync.check_only,
            flags: &sync.flags,
            domain: sync.domain.as_deref(),
            key_columns: &sync.key_columns,
            remove_rows: sync.remove_rows,
            no_prepend,
        }
    }
}

trait Runnable {
    fn run(self, globals: &Globals) -> Result<()>;
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::CheckProps { .. } => "check-props",
            Commands::Upload { .. } => "upload",
            Commands::Download { .. } => "download",
            Commands::DocTest { .. } => "doc-test",
            Commands::CreateTemplate { .. } => "create-template",
            Commands::Schema { .. } => "schema",
        }
    }
}

impl Commands {
    fn dispatch(self, globals: &Globals) -> Result<()> {
        let settings = || Settings::load(globals.config.as_deref());
        let workbook = globals.workbook.as_deref();
        match self {
            Commands::CheckProps { source, format } => commands::check_props::run_check_props(
                &settings()?,
                source.props_dir,
                source.languages,
                format,
                globals.use_color,
            ),
            Commands::Upload { sync } => commands::upload::run_upload(
                &settings()?,
                workbook,
                globals.sync_inputs(&sync, false),
                sync.format,
                globals.use_color,
            ),
            Commands::Download { sync, no_prepend } => commands::download::run_download(
                &settings()?,
                workbook,
                globals.sync_inputs(&sync, no_prepend),
                sync.format,
                globals.use_color,
            ),
            Commands::DocTest { mode, format } => commands::doc_test::run_doc_test(
                &settings()?,
                workbook,
                globals.doc.as_deref(),
                mode,
                format,
            ),
            Commands::CreateTemplate {
                languages,
                tab,
                check_only,
                format,
            } => commands::create_template::run_create_template(
                &settings()?,
                workbook,
                globals.doc.as_deref(),
                languages,
                tab,
                check_only,
                format,
            ),
            Commands::Schema { out_dir } => commands::schema::run_schema(out_dir),
        }
    }
}

impl Runnable for Commands {
    fn run(self, globals: &Globals) -> Result<()> {
        let cmd_name = self.name();
        info!(event = "command_start", cmd = cmd_name, "▶ Starting command: {}", cmd_name);

        let result = self.dispatch(globals);

        match &result {
            Ok(_) => info!(event = "command_done", cmd = cmd_name, "✔ Finished command: {}", cmd_name),
            Err(e) => error!(event = "command_failed", cmd = cmd_name, "✖ Command {} failed: {:?}", cmd_name, e),
        }
        result
    }
}

/// Console on stderr plus a daily file under `logs/`. Keep the guard alive
/// until exit or buffered file lines are lost.
fn init_tracing(quiet: bool) -> WorkerGuard {
    let file_appender = rolling::daily("logs", "gxlate.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if quiet { "warn" } else { "info" };
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        );

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _guard = init_tracing(cli.quiet);

    let globals = Globals {
        use_color: !cli.no_color
            && std::io::stdout().is_terminal()
            && std::env::var_os("NO_COLOR").is_none(),
        config: cli.config,
        workbook: cli.workbook,
        doc: cli.doc,
    };
    cli.cmd.run(&globals)
}
