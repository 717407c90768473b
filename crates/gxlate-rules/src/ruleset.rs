use std::collections::HashMap;
use std::sync::Arc;

use gxlate_config::{ActionCfg, ConditionCfg, GxlateConfig, InputCfg, RuleCfg};
use gxlate_core::{flags, Field};
use gxlate_props::bundle;

use crate::generate::Generator;
use crate::rule::{Action, Condition, Context, Input, Rule};
use crate::RuleError;

/// Domain used when none is configured.
pub const DEFAULT_DOMAIN: &str = "default";

/// A family of bundles sharing an output dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub name: String,
    /// Output is compiled by a tool that expects `'` doubled.
    pub double_quotes: bool,
}

impl Domain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            double_quotes: false,
        }
    }
}

/// Rules for one source bundle. `name` is written to the `Context` column.
#[derive(Debug, Clone)]
pub struct Scope {
    pub file_name: String,
    pub name: String,
    pub rules: Arc<[Rule]>,
}

#[derive(Debug, Clone)]
struct DomainRules {
    domain: Domain,
    scopes: HashMap<String, Scope>,
}

/// Immutable mapping of `(domain, file name)` to scopes plus the global rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    global: Arc<[Rule]>,
    domains: HashMap<String, DomainRules>,
    /// Ignore rules by bundle base name; they run before scope rules.
    ignores: HashMap<String, Vec<Rule>>,
}

#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    global: Vec<Rule>,
    domains: HashMap<String, DomainRules>,
    ignores: HashMap<String, Vec<Rule>>,
}

impl RuleSetBuilder {
    pub fn global(mut self, rule: Rule) -> Self {
        self.global.push(rule);
        self
    }

    pub fn domain(mut self, domain: Domain) -> Self {
        let entry = self
            .domains
            .entry(domain.name.clone())
            .or_insert_with(|| DomainRules {
                domain: domain.clone(),
                scopes: HashMap::new(),
            });
        entry.domain = domain;
        self
    }

    pub fn scope(mut self, domain: &str, file_name: &str, name: &str, rules: Vec<Rule>) -> Self {
        let entry = self
            .domains
            .entry(domain.to_string())
            .or_insert_with(|| DomainRules {
                domain: Domain::new(domain),
                scopes: HashMap::new(),
            });
        entry.scopes.insert(
            file_name.to_string(),
            Scope {
                file_name: file_name.to_string(),
                name: name.to_string(),
                rules: Arc::from(rules),
            },
        );
        self
    }

    pub fn ignore(mut self, base_name: &str, rule: Rule) -> Self {
        self.ignores
            .entry(base_name.to_string())
            .or_default()
            .push(rule);
        self
    }

    pub fn build(self) -> RuleSet {
        RuleSet {
            global: Arc::from(self.global),
            domains: self.domains,
            ignores: self.ignores,
        }
    }
}

impl Default for RuleSet {
    /// No domains; `msgbundle_class` is ignored everywhere.
    fn default() -> Self {
        RuleSet::builder().global(msgbundle_rule()).build()
    }
}

fn msgbundle_rule() -> Rule {
    Input::Id.equals("msgbundle_class").ignore()
}

impl RuleSet {
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    /// Build from `[[global_rules]]`, `[[domains]]` and `[[ignore]]`. Without
    /// configured global rules the `msgbundle_class` ignore applies.
    pub fn from_config(cfg: &GxlateConfig) -> Result<Self, RuleError> {
        let mut b = RuleSet::builder();
        match &cfg.global_rules {
            Some(rules) => {
                for r in rules {
                    b = b.global(rule_from_cfg(r)?);
                }
            }
            None => b = b.global(msgbundle_rule()),
        }
        for d in cfg.domains.iter().flatten() {
            b = b.domain(Domain {
                name: d.name.clone(),
                double_quotes: d.double_quotes.unwrap_or(false),
            });
            for s in d.scopes.iter().flatten() {
                let rules = s
                    .rules
                    .iter()
                    .flatten()
                    .map(rule_from_cfg)
                    .collect::<Result<Vec<_>, _>>()?;
                let name = match &s.scope {
                    Some(n) => n.clone(),
                    None => default_scope_name(&s.file),
                };
                b = b.scope(&d.name, &s.file, &name, rules);
            }
        }
        for i in cfg.ignore.iter().flatten() {
            b = b.ignore(&i.file, Input::Id.matches(&i.id)?.ignore());
        }
        Ok(b.build())
    }

    /// Look up a configured domain; `None` selects the default domain.
    pub fn domain(&self, name: Option<&str>) -> Result<Domain, RuleError> {
        match name {
            None => Ok(self
                .domains
                .get(DEFAULT_DOMAIN)
                .map(|d| d.domain.clone())
                .unwrap_or_else(|| Domain::new(DEFAULT_DOMAIN))),
            Some(n) => self
                .domains
                .get(n)
                .map(|d| d.domain.clone())
                .ok_or_else(|| RuleError::UnknownDomain(n.to_string())),
        }
    }

    pub fn global_rules(&self) -> Arc<[Rule]> {
        Arc::clone(&self.global)
    }

    /// Scope for a bundle file name. `foo_en.properties` falls back to
    /// `foo.properties`; unknown files get a rule-less scope named after their base name.
    pub fn scope(&self, domain: &Domain, file_name: &str) -> Scope {
        let scopes = self.domains.get(&domain.name).map(|d| &d.scopes);
        let found = scopes.and_then(|s| {
            s.get(file_name).or_else(|| {
                let stripped = strip_en(file_name)?;
                s.get(&stripped)
            })
        });
        let mut scope = match found {
            Some(s) => s.clone(),
            None => {
                tracing::debug!(event = "default_scope", domain = %domain.name, file = file_name);
                Scope {
                    file_name: file_name.to_string(),
                    name: default_scope_name(file_name),
                    rules: Arc::from(Vec::<Rule>::new()),
                }
            }
        };
        let base = bundle::base_name(file_name).unwrap_or(file_name);
        if let Some(extra) = self.ignores.get(base) {
            let mut rules = extra.clone();
            rules.extend(scope.rules.iter().cloned());
            scope.rules = Arc::from(rules);
        }
        scope
    }

    /// Row generator for one bundle, with a fresh [`Context`].
    pub fn generator(&self, domain: &Domain, file_name: &str, flags: u32) -> Generator {
        Generator::new(
            domain.clone(),
            self.scope(domain, file_name),
            Context::new(self.global_rules(), flags),
        )
    }
}

fn strip_en(file_name: &str) -> Option<String> {
    file_name
        .strip_suffix("_en.properties")
        .map(|base| format!("{base}.properties"))
}

fn default_scope_name(file_name: &str) -> String {
    bundle::base_name(file_name)
        .unwrap_or(file_name)
        .trim_end_matches("_en")
        .to_string()
}

fn input_of(cfg: &ConditionCfg) -> Input {
    match cfg.input.unwrap_or_default() {
        InputCfg::Id => Input::Id,
        InputCfg::Comment => Input::Comment,
    }
}

pub fn condition_from_cfg(cfg: &ConditionCfg) -> Result<Condition, RuleError> {
    let input = input_of(cfg);
    let mut picked = Vec::new();
    if let Some(e) = &cfg.matches {
        picked.push(input.matches(e)?);
    }
    if let Some(e) = &cfg.smatches {
        picked.push(input.smatches(e)?);
    }
    if let Some(e) = &cfg.equals {
        picked.push(input.equals(e));
    }
    if let Some(set) = &cfg.in_set {
        picked.push(input.is_in_set(set, cfg.prefix.as_deref().unwrap_or("")));
    }
    if cfg.otherwise == Some(true) {
        picked.push(Condition::Else);
    }
    let mut cond = match (picked.pop(), picked.is_empty()) {
        (Some(c), true) => c,
        _ => {
            return Err(RuleError::Condition(
                "needs exactly one of matches, smatches, equals, in_set, otherwise".into(),
            ))
        }
    };
    if let Some(and) = &cfg.and {
        cond = cond.and(condition_from_cfg(and)?);
    }
    Ok(cond)
}

pub fn rule_from_cfg(cfg: &RuleCfg) -> Result<Rule, RuleError> {
    let mut cond = condition_from_cfg(&cfg.when)?;
    if let Some(flag) = &cfg.flag {
        cond = cond.and_flag_set(flags::parse(flag)?);
    }
    let action = match &cfg.action {
        ActionCfg::Set {
            type_name,
            field_size,
        } => {
            let mut fields = Vec::new();
            if let Some(size) = field_size {
                fields.push((Field::FieldSize, size.clone()));
            }
            fields.push((Field::Type, type_name.clone()));
            Action::SetFields(fields)
        }
        ActionCfg::Ignore => Action::Ignore,
        ActionCfg::Omit => Action::Omit,
        ActionCfg::InsertAndIgnore { set, offset } => {
            return Ok(cond.insert_and_ignore(set, *offset));
        }
    };
    Ok(cond.then(action))
}
