//! Command-line values layered over `gxlate.toml`. A flag given on the
//! command line always wins; config fills the rest; then built-in defaults.

use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use gxlate_config::GxlateConfig;
use gxlate_core::{flags, Language};
use gxlate_rules::RuleSet;
use gxlate_services::{default_key_columns, SyncOptions, DEFAULT_TEMPLATE_TAB};
use gxlate_sheet::CsvWorkbook;

const DEFAULT_PROPS_DIR: &str = ".";
const DEFAULT_WORKBOOK: &str = "workbook";

pub struct Settings {
    cfg: GxlateConfig,
}

impl Settings {
    /// `explicit` replaces the usual search for `gxlate.toml`.
    pub fn load(explicit: Option<&Path>) -> color_eyre::Result<Self> {
        let cfg = match explicit {
            Some(path) => gxlate_config::load_file(path)?,
            None => gxlate_config::load_config()?,
        };
        tracing::debug!(event = "config_loaded", explicit = ?explicit, languages = ?cfg.languages);
        Ok(Self { cfg })
    }

    #[cfg(test)]
    pub fn from_config(cfg: GxlateConfig) -> Self {
        Self { cfg }
    }

    pub fn props_dir(&self, cli: Option<PathBuf>) -> PathBuf {
        cli.or_else(|| self.cfg.props_dir.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROPS_DIR))
    }

    pub fn languages(&self, cli: Option<&str>) -> color_eyre::Result<Vec<Language>> {
        if let Some(list) = cli {
            return Ok(Language::parse_list(list)?);
        }
        let list = self.cfg.languages.clone().unwrap_or_default();
        Ok(Language::parse_list(&list.join(","))?)
    }

    pub fn workbook(&self, cli: Option<&Path>) -> color_eyre::Result<CsvWorkbook> {
        let root = cli
            .map(Path::to_path_buf)
            .or_else(|| self.cfg.workbook.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKBOOK));
        CsvWorkbook::open(&root).wrap_err_with(|| format!("opening workbook {}", root.display()))
    }

    pub fn doc(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string).or_else(|| self.cfg.doc_name.clone())
    }

    pub fn rules(&self) -> color_eyre::Result<RuleSet> {
        Ok(RuleSet::from_config(&self.cfg)?)
    }

    pub fn flags(&self, cli: &[String]) -> color_eyre::Result<u32> {
        let names = if cli.is_empty() {
            self.cfg.flags.clone().unwrap_or_default()
        } else {
            cli.to_vec()
        };
        Ok(flags::parse_all(names)?)
    }

    pub fn template_tab(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| self.cfg.template_tab.clone())
            .unwrap_or_else(|| DEFAULT_TEMPLATE_TAB.to_string())
    }

    pub fn sync_options(&self, args: SyncInputs<'_>) -> color_eyre::Result<SyncOptions> {
        let mut opts = SyncOptions::new(
            self.props_dir(args.props_dir),
            self.languages(args.languages)?,
        );
        opts.doc = self.doc(args.doc);
        opts.check_only = args.check_only;
        opts.flags = self.flags(args.flags)?;
        opts.domain = args
            .domain
            .map(str::to_string)
            .or_else(|| self.cfg.domain.clone());
        opts.key_columns = if !args.key_columns.is_empty() {
            args.key_columns.to_vec()
        } else {
            self.cfg
                .key_columns
                .clone()
                .unwrap_or_else(default_key_columns)
        };
        opts.remove_rows = args.remove_rows || self.cfg.remove_rows.unwrap_or(false);
        opts.no_prepend = args.no_prepend || self.cfg.no_prepend.unwrap_or(false);
        Ok(opts)
    }
}

/// Raw command-line inputs for upload and download.
#[derive(Debug, Default)]
pub struct SyncInputs<'a> {
    pub props_dir: Option<PathBuf>,
    pub languages: Option<&'a str>,
    pub doc: Option<&'a str>,
    pub check_only: bool,
    pub flags: &'a [String],
    pub domain: Option<&'a str>,
    pub key_columns: &'a [String],
    pub remove_rows: bool,
    pub no_prepend: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> GxlateConfig {
        gxlate_config::parse(
            Path::new("gxlate.toml"),
            r#"
languages = ["fr", "de"]
props_dir = "src/main/resources"
doc_name = "Strings"
domain = "game"
key_columns = ["Context", "Id"]
remove_rows = true

[[domains]]
name = "game"
double_quotes = true
"#,
        )
        .unwrap()
    }

    #[test]
    fn config_fills_unset_flags() {
        let settings = Settings::from_config(cfg());
        let opts = settings.sync_options(SyncInputs::default()).unwrap();
        assert_eq!(opts.props_path, PathBuf::from("src/main/resources"));
        assert_eq!(opts.languages.len(), 2);
        assert_eq!(opts.doc.as_deref(), Some("Strings"));
        assert_eq!(opts.domain.as_deref(), Some("game"));
        assert_eq!(opts.key_columns, vec!["Context", "Id"]);
        assert!(opts.remove_rows);
        assert!(!opts.no_prepend);
    }

    #[test]
    fn command_line_wins() {
        let settings = Settings::from_config(cfg());
        let cli_flags = vec!["support-tool".to_string()];
        let opts = settings
            .sync_options(SyncInputs {
                props_dir: Some(PathBuf::from("bundles")),
                languages: Some("es"),
                doc: Some("Other"),
                flags: &cli_flags,
                ..SyncInputs::default()
            })
            .unwrap();
        assert_eq!(opts.props_path, PathBuf::from("bundles"));
        assert_eq!(opts.languages, vec![Language::new("es").unwrap()]);
        assert_eq!(opts.doc.as_deref(), Some("Other"));
        assert_eq!(opts.flags, flags::SUPPORT_TOOL);
    }

    #[test]
    fn defaults_without_config() {
        let settings = Settings::from_config(GxlateConfig::default());
        assert_eq!(settings.props_dir(None), PathBuf::from("."));
        assert!(settings.languages(None).unwrap().is_empty());
        assert_eq!(settings.template_tab(None), "template");
        assert!(settings.languages(Some("fr,fr")).is_err());
    }
}
