//! Classification of source properties: which tab a property belongs to, which
//! fixed columns it fills and whether it is uploaded, copied verbatim or dropped.

mod generate;
mod rule;
mod ruleset;

use gxlate_core::CoreError;
use thiserror::Error;

pub use generate::{GeneratedRow, Generator};
pub use rule::{
    make_tech_notes, Action, Condition, Context, Input, NamedSets, Rule, TECH_NOTES_PREAMBLE,
};
pub use ruleset::{
    condition_from_cfg, rule_from_cfg, Domain, RuleSet, RuleSetBuilder, Scope, DEFAULT_DOMAIN,
};

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid rule pattern '{pattern}': {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid rule condition: {0}")]
    Condition(String),
    #[error("unknown domain '{0}'")]
    UnknownDomain(String),
    #[error(transparent)]
    Flag(#[from] CoreError),
}
