use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const CONFIG_FILE: &str = "gxlate.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GxlateConfig {
    pub languages: Option<Vec<String>>,
    pub props_dir: Option<String>,
    pub workbook: Option<String>,
    pub doc_name: Option<String>,
    pub domain: Option<String>,
    pub flags: Option<Vec<String>>,
    pub key_columns: Option<Vec<String>>,
    pub no_prepend: Option<bool>,
    pub remove_rows: Option<bool>,
    pub template_tab: Option<String>,
    pub global_rules: Option<Vec<RuleCfg>>,
    pub domains: Option<Vec<DomainCfg>>,
    /// Shorthand rules: ignore ids matching `id` in bundles named `file`.
    pub ignore: Option<Vec<IgnoreCfg>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainCfg {
    pub name: String,
    /// Bundles are compiled by a tool that wants `'` written as `''`.
    pub double_quotes: Option<bool>,
    pub scopes: Option<Vec<ScopeCfg>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopeCfg {
    /// Bundle file name, e.g. `chat.properties`.
    pub file: String,
    /// Tab name; the bundle's base name when absent.
    pub scope: Option<String>,
    pub rules: Option<Vec<RuleCfg>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IgnoreCfg {
    /// Bundle base name the rule applies to.
    pub file: String,
    /// Case-insensitive regex on the property id.
    pub id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputCfg {
    #[default]
    Id,
    Comment,
}

/// Exactly one predicate is expected; checked when rules are built.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConditionCfg {
    pub input: Option<InputCfg>,
    pub matches: Option<String>,
    pub smatches: Option<String>,
    pub equals: Option<String>,
    pub in_set: Option<String>,
    pub prefix: Option<String>,
    pub otherwise: Option<bool>,
    pub and: Option<Box<ConditionCfg>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleCfg {
    #[serde(flatten)]
    pub when: ConditionCfg,
    /// Named flag that must also be set, e.g. `support-tool`.
    pub flag: Option<String>,
    pub action: ActionCfg,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionCfg {
    Set {
        #[serde(rename = "type")]
        type_name: String,
        field_size: Option<String>,
    },
    Ignore,
    Omit,
    InsertAndIgnore {
        set: String,
        offset: usize,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub fn parse(path: &Path, text: &str) -> Result<GxlateConfig, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_file(path: &Path) -> Result<GxlateConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(path, &text)
}

/// Candidate config files, most specific first.
pub fn search_paths() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Ok(p) = std::env::current_dir() {
        out.push(p.join(CONFIG_FILE));
    }
    if let Some(base) = dirs::config_dir() {
        out.push(base.join("gxlate").join(CONFIG_FILE));
    }
    out
}

pub fn load_config() -> Result<GxlateConfig, ConfigError> {
    // Search order: CWD/gxlate.toml, <config dir>/gxlate/gxlate.toml
    let mut merged = GxlateConfig::default();
    for path in search_paths() {
        if path.is_file() {
            merged = merge(merged, load_file(&path)?);
        }
    }
    Ok(merged)
}

/// Fill the unset fields of `a` from `b`.
pub fn merge(mut a: GxlateConfig, b: GxlateConfig) -> GxlateConfig {
    if a.languages.is_none() {
        a.languages = b.languages;
    }
    if a.props_dir.is_none() {
        a.props_dir = b.props_dir;
    }
    if a.workbook.is_none() {
        a.workbook = b.workbook;
    }
    if a.doc_name.is_none() {
        a.doc_name = b.doc_name;
    }
    if a.domain.is_none() {
        a.domain = b.domain;
    }
    if a.flags.is_none() {
        a.flags = b.flags;
    }
    if a.key_columns.is_none() {
        a.key_columns = b.key_columns;
    }
    if a.no_prepend.is_none() {
        a.no_prepend = b.no_prepend;
    }
    if a.remove_rows.is_none() {
        a.remove_rows = b.remove_rows;
    }
    if a.template_tab.is_none() {
        a.template_tab = b.template_tab;
    }
    if a.global_rules.is_none() {
        a.global_rules = b.global_rules;
    }
    a.domains = merge_opt(a.domains, b.domains, merge_domains);
    if a.ignore.is_none() {
        a.ignore = b.ignore;
    }
    a
}

fn merge_opt<T: Default>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

/// Domains are merged by name; a domain defined in `a` hides the same one in `b`.
fn merge_domains(mut a: Vec<DomainCfg>, b: Vec<DomainCfg>) -> Vec<DomainCfg> {
    for d in b {
        if !a.iter().any(|x| x.name == d.name) {
            a.push(d);
        }
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
languages = ["fr", "de"]
props_dir = "src/main/resources"
domain = "client"
key_columns = ["Context", "Id"]

[[global_rules]]
matches = "msgbundle_class"
action = { kind = "ignore" }

[[domains]]
name = "client"

[[domains.scopes]]
file = "chat.properties"
scope = "Chat"

[[domains.scopes.rules]]
smatches = "m.channel_*"
action = { kind = "insert_and_ignore", set = "channels", offset = 10 }

[[domains.scopes.rules]]
input = "comment"
matches = ".*button.*"
flag = "support-tool"
action = { kind = "set", type = "Button", field_size = "20" }

[[domains.scopes.rules]]
in_set = "channels"
prefix = "m.name_"
and = { input = "comment", equals = "Channel name" }
action = { kind = "omit" }

[[domains]]
name = "web"
double_quotes = true

[[ignore]]
file = "support"
id = "admin\\..*"
"#;

    #[test]
    fn parses_rule_tables() {
        let cfg = parse(Path::new("gxlate.toml"), SAMPLE).unwrap();
        assert_eq!(cfg.languages.as_deref(), Some(&["fr".to_string(), "de".to_string()][..]));
        let global = cfg.global_rules.as_ref().unwrap();
        assert_eq!(global[0].action, ActionCfg::Ignore);
        assert_eq!(global[0].when.matches.as_deref(), Some("msgbundle_class"));

        let domains = cfg.domains.as_ref().unwrap();
        assert_eq!(domains.len(), 2);
        assert_eq!(domains[1].double_quotes, Some(true));
        let chat = &domains[0].scopes.as_ref().unwrap()[0];
        assert_eq!(chat.scope.as_deref(), Some("Chat"));
        let rules = chat.rules.as_ref().unwrap();
        assert_eq!(
            rules[0].action,
            ActionCfg::InsertAndIgnore {
                set: "channels".into(),
                offset: 10
            }
        );
        assert_eq!(rules[1].when.input, Some(InputCfg::Comment));
        assert_eq!(rules[1].flag.as_deref(), Some("support-tool"));
        assert_eq!(
            rules[1].action,
            ActionCfg::Set {
                type_name: "Button".into(),
                field_size: Some("20".into())
            }
        );
        let and = rules[2].when.and.as_ref().unwrap();
        assert_eq!(and.equals.as_deref(), Some("Channel name"));
        assert_eq!(cfg.ignore.as_ref().unwrap()[0].id, "admin\\..*");
    }

    #[test]
    fn bad_toml_names_the_file() {
        let err = parse(Path::new("x/gxlate.toml"), "languages = [").unwrap_err();
        assert!(err.to_string().starts_with("invalid config x/gxlate.toml"));
    }

    #[test]
    fn earlier_config_wins() {
        let local = parse(
            Path::new("a"),
            "doc_name = \"Local\"\n[[domains]]\nname = \"client\"\ndouble_quotes = true\n",
        )
        .unwrap();
        let user = parse(
            Path::new("b"),
            "doc_name = \"User\"\nworkbook = \"/tmp/book\"\n[[domains]]\nname = \"client\"\n[[domains]]\nname = \"web\"\n",
        )
        .unwrap();
        let merged = merge(local, user);
        assert_eq!(merged.doc_name.as_deref(), Some("Local"));
        assert_eq!(merged.workbook.as_deref(), Some("/tmp/book"));
        let domains = merged.domains.unwrap();
        assert_eq!(domains.len(), 2);
        assert_eq!(domains[0].double_quotes, Some(true));
    }

    #[test]
    fn load_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "remove_rows = true\n").unwrap();
        let cfg = load_file(&path).unwrap();
        assert_eq!(cfg.remove_rows, Some(true));
        assert!(matches!(
            load_file(&dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
