use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use gxlate_core::{Field, Status};
use gxlate_props::Entry;
use gxlate_sheet::FieldMapping;
use regex::{Regex, RegexBuilder};

use crate::RuleError;

/// The part of a property a condition looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Id,
    Comment,
}

impl Input {
    pub fn get<'a>(self, entry: &Entry<'a>) -> &'a str {
        match self {
            Input::Id => entry.id,
            Input::Comment => entry.comment,
        }
    }

    /// Case-insensitive match of the whole input against `expr`.
    pub fn matches(self, expr: &str) -> Result<Condition, RuleError> {
        let regex = RegexBuilder::new(&format!("^(?:{expr})$"))
            .case_insensitive(true)
            .build()
            .map_err(|source| RuleError::Regex {
                pattern: expr.to_string(),
                source,
            })?;
        Ok(Condition::Pattern { input: self, regex })
    }

    /// Wildcard match: `.` is literal and `*` stands for any run of characters.
    pub fn smatches(self, wildcard: &str) -> Result<Condition, RuleError> {
        self.matches(&wildcard.replace('.', "\\.").replace('*', ".*"))
    }

    /// Exact, case-sensitive comparison.
    pub fn equals(self, literal: &str) -> Condition {
        Condition::Equals {
            input: self,
            value: literal.to_string(),
        }
    }

    /// Input starts with `prefix` and the remainder is in the named set.
    pub fn is_in_set(self, set: &str, prefix: &str) -> Condition {
        Condition::InSet {
            input: self,
            set: set.to_string(),
            prefix: prefix.to_string(),
        }
    }
}

/// String sets filled by rules while a bundle is processed; created on first use.
#[derive(Debug, Clone, Default)]
pub struct NamedSets(HashMap<String, HashSet<String>>);

impl NamedSets {
    pub fn get_mut(&mut self, name: &str) -> &mut HashSet<String> {
        self.0.entry(name.to_string()).or_default()
    }

    pub fn contains(&self, name: &str, value: &str) -> bool {
        self.0.get(name).is_some_and(|s| s.contains(value))
    }
}

#[derive(Debug, Clone)]
pub enum Condition {
    Pattern { input: Input, regex: Regex },
    Equals { input: Input, value: String },
    InSet {
        input: Input,
        set: String,
        prefix: String,
    },
    And(Box<Condition>, Box<Condition>),
    FlagSet(u32),
    Else,
}

impl Condition {
    pub fn test(&self, entry: &Entry<'_>, flags: u32, sets: &NamedSets) -> bool {
        match self {
            Condition::Pattern { input, regex } => regex.is_match(input.get(entry)),
            Condition::Equals { input, value } => input.get(entry) == value,
            Condition::InSet { input, set, prefix } => input
                .get(entry)
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| sets.contains(set, rest)),
            Condition::And(a, b) => a.test(entry, flags, sets) && b.test(entry, flags, sets),
            Condition::FlagSet(flag) => flags & flag != 0,
            Condition::Else => true,
        }
    }

    pub fn and(self, other: Condition) -> Condition {
        Condition::And(Box::new(self), Box::new(other))
    }

    pub fn and_flag_set(self, flag: u32) -> Condition {
        self.and(Condition::FlagSet(flag))
    }

    pub fn then_set(self, type_name: &str) -> Rule {
        self.then(Action::SetFields(vec![(Field::Type, type_name.to_string())]))
    }

    pub fn then_set_sized(self, type_name: &str, field_size: &str) -> Rule {
        self.then(Action::SetFields(vec![
            (Field::FieldSize, field_size.to_string()),
            (Field::Type, type_name.to_string()),
        ]))
    }

    pub fn ignore(self) -> Rule {
        self.then(Action::Ignore)
    }

    pub fn omit(self) -> Rule {
        self.then(Action::Omit)
    }

    /// Remember `id[offset..]` in `set`, then ignore the property.
    pub fn insert_and_ignore(self, set: &str, offset: usize) -> Rule {
        self.then(Action::Seq(vec![
            Action::InsertIntoSet {
                set: set.to_string(),
                offset,
            },
            Action::Ignore,
        ]))
    }

    pub fn then(self, action: Action) -> Rule {
        Rule {
            condition: self,
            action,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetFields(Vec<(Field, String)>),
    Ignore,
    Omit,
    InsertIntoSet { set: String, offset: usize },
    /// Runs every action; the last one decides the status.
    Seq(Vec<Action>),
}

impl Action {
    pub fn execute(
        &self,
        entry: &Entry<'_>,
        fields: &mut FieldMapping,
        sets: &mut NamedSets,
    ) -> Status {
        match self {
            Action::SetFields(values) => {
                for (field, value) in values {
                    fields.set(*field, value.clone());
                }
                Status::Normal
            }
            Action::Ignore => Status::Ignore,
            Action::Omit => Status::Omit,
            Action::InsertIntoSet { set, offset } => {
                let tail: String = entry.id.chars().skip(*offset).collect();
                sets.get_mut(set).insert(tail);
                Status::Normal
            }
            Action::Seq(actions) => actions
                .iter()
                .fold(Status::Normal, |_, a| a.execute(entry, fields, sets)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub condition: Condition,
    pub action: Action,
}

impl Rule {
    /// `None` when the condition does not hold.
    pub fn apply(
        &self,
        entry: &Entry<'_>,
        fields: &mut FieldMapping,
        flags: u32,
        sets: &mut NamedSets,
    ) -> Option<Status> {
        if self.condition.test(entry, flags, sets) {
            Some(self.action.execute(entry, fields, sets))
        } else {
            None
        }
    }
}

/// Per-bundle evaluation state: the global rules, the run's flags and the named sets.
#[derive(Debug, Clone)]
pub struct Context {
    global_rules: Arc<[Rule]>,
    flags: u32,
    sets: NamedSets,
}

impl Context {
    pub fn new(global_rules: Arc<[Rule]>, flags: u32) -> Self {
        Self {
            global_rules,
            flags,
            sets: NamedSets::default(),
        }
    }

    pub fn is_flag_set(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn named_set(&mut self, name: &str) -> &mut HashSet<String> {
        self.sets.get_mut(name)
    }

    /// Global rules, then `rules`; the first that fires decides.
    pub fn apply(
        &mut self,
        rules: &[Rule],
        entry: &Entry<'_>,
        fields: &mut FieldMapping,
    ) -> Option<Status> {
        let Context {
            global_rules,
            flags,
            sets,
        } = self;
        for rule in global_rules.iter().chain(rules) {
            if let Some(status) = rule.apply(entry, fields, *flags, sets) {
                return Some(status);
            }
        }
        None
    }
}

pub const TECH_NOTES_PREAMBLE: &str =
    "The translation should use the following escape sequences:\n";

/// Reviewer notes listing every `{...}` group of `english`; empty without braces.
pub fn make_tech_notes(english: &str) -> String {
    if !english.contains('{') {
        return String::new();
    }
    let mut notes = String::from(TECH_NOTES_PREAMBLE);
    let mut rest = english;
    while let Some(open) = rest.find('{') {
        let group = match rest[open..].find('}') {
            Some(close) => &rest[open..=open + close],
            None => &rest[open..],
        };
        notes.push_str(group);
        notes.push_str(": <Fill in>\n");
        rest = &rest[open + group.len()..];
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry<'a>(id: &'a str, comment: &'a str) -> Entry<'a> {
        Entry {
            id,
            value: "",
            comment,
            line: 1,
        }
    }

    fn no_globals() -> Arc<[Rule]> {
        Arc::from(Vec::<Rule>::new())
    }

    fn run(ctx: &mut Context, rules: &[Rule], e: &Entry<'_>) -> (Option<Status>, FieldMapping) {
        let mut fields = FieldMapping::new();
        let status = ctx.apply(rules, e, &mut fields);
        (status, fields)
    }

    #[test]
    fn pattern_flavours() {
        let e = entry("m.usage_Tell", "Chat commands");
        let sets = NamedSets::default();
        assert!(Input::Id.matches("M\\.USAGE.*").unwrap().test(&e, 0, &sets));
        assert!(!Input::Id.matches("usage").unwrap().test(&e, 0, &sets));
        assert!(Input::Id.smatches("m.usage*").unwrap().test(&e, 0, &sets));
        assert!(!Input::Id.smatches("mXusage*").unwrap().test(&e, 0, &sets));
        assert!(Input::Id.smatches("x.*|m.*").unwrap().test(&e, 0, &sets));
        assert!(Input::Comment.equals("Chat commands").test(&e, 0, &sets));
        assert!(!Input::Comment.equals("chat commands").test(&e, 0, &sets));
        assert!(Input::Id.matches("(").is_err());
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = vec![
            Input::Id.smatches("m.*").unwrap().then_set_sized("Message", "Chat box"),
            Input::Id.smatches("m.a*").unwrap().ignore(),
            Condition::Else.omit(),
        ];
        let mut ctx = Context::new(no_globals(), 0);
        let (status, fields) = run(&mut ctx, &rules, &entry("m.abc", ""));
        assert_eq!(status, Some(Status::Normal));
        assert_eq!(fields.get(Field::Type), Some("Message"));
        assert_eq!(fields.get(Field::FieldSize), Some("Chat box"));

        let (status, _) = run(&mut ctx, &rules, &entry("z", ""));
        assert_eq!(status, Some(Status::Omit));
    }

    #[test]
    fn global_rules_run_first() {
        let global: Arc<[Rule]> =
            Arc::from(vec![Input::Id.equals("msgbundle_class").ignore()]);
        let rules = vec![Condition::Else.then_set("Other")];
        let mut ctx = Context::new(global, 0);
        let (status, fields) = run(&mut ctx, &rules, &entry("msgbundle_class", ""));
        assert_eq!(status, Some(Status::Ignore));
        assert_eq!(fields.get(Field::Type), None);
    }

    #[test]
    fn insert_then_in_set() {
        let rules = vec![
            Input::Id.is_in_set("S", "aa").ignore(),
            Input::Comment.equals("seed").insert_and_ignore("S", 2),
        ];
        let mut ctx = Context::new(no_globals(), 0);
        for id in ["aaFOO", "aaBAR"] {
            let (status, _) = run(&mut ctx, &rules, &entry(id, "seed"));
            assert_eq!(status, Some(Status::Ignore));
        }
        assert!(ctx.named_set("S").contains("FOO"));
        assert!(ctx.named_set("S").contains("BAR"));

        for id in ["aaFOO", "aaBAR"] {
            let (status, _) = run(&mut ctx, &rules, &entry(id, "other"));
            assert_eq!(status, Some(Status::Ignore));
        }
        let (status, _) = run(&mut ctx, &rules, &entry("aaBAZ", "other"));
        assert_eq!(status, None);
    }

    #[test]
    fn flags_gate_rules() {
        let rules = vec![Input::Comment
            .smatches("General admin*")
            .unwrap()
            .and_flag_set(gxlate_core::flags::SUPPORT_TOOL)
            .then_set("General")];
        let e = entry("a.b", "General admin strings");
        let mut off = Context::new(no_globals(), 0);
        assert_eq!(run(&mut off, &rules, &e).0, None);
        let mut on = Context::new(no_globals(), gxlate_core::flags::SUPPORT_TOOL);
        assert!(on.is_flag_set(gxlate_core::flags::SUPPORT_TOOL));
        assert_eq!(run(&mut on, &rules, &e).0, Some(Status::Normal));
    }

    #[test]
    fn tech_notes() {
        assert_eq!(make_tech_notes("plain"), "");
        assert_eq!(
            make_tech_notes("Hello {0}, you have {1} items"),
            format!("{TECH_NOTES_PREAMBLE}{{0}}: <Fill in>\n{{1}}: <Fill in>\n")
        );
        assert_eq!(
            make_tech_notes("a {0} b {oops"),
            format!("{TECH_NOTES_PREAMBLE}{{0}}: <Fill in>\n{{oops: <Fill in>\n")
        );
    }
}
