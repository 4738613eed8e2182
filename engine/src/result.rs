//! Parse results.
//!
//! A [`ParseResult`] is an immutable record of what one parse matched: the
//! options and positionals seen (in order, with raw tokens), their final
//! values including defaults, unmatched tokens, group repetitions, and the
//! nested result of a dispatched subcommand.

use command_grammar_core::ArgId;
use serde::Serialize;

use crate::{ParameterError, Value};

/// One occurrence of an argument on the command line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedArg {
    /// Which argument matched.
    pub arg: ArgId,
    /// Identifying key (longest option name or positional label).
    pub key: String,
    /// Name as typed (`-v`, `--no-color`), or the label for positionals.
    pub name: String,
    /// Every name the argument answers to.
    pub names: Vec<String>,
    /// Raw tokens consumed as values.
    pub tokens: Vec<String>,
    /// Value of this occurrence alone, `None` when nothing was converted.
    pub value: Option<Value>,
    /// Index of the token that introduced the match, after at-file expansion.
    pub position: usize,
}

/// Final value of an argument after all occurrences and defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedValue {
    pub arg: ArgId,
    pub key: String,
    /// Every name the argument answers to.
    pub names: Vec<String>,
    pub value: Value,
    /// The value came from a default rather than the command line.
    pub from_default: bool,
}

/// One repetition of a group: the keys matched in it, the values they
/// received in this repetition, and its nested group repetitions.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct GroupRepetition {
    pub matched: Vec<String>,
    pub values: Vec<(String, Value)>,
    pub subgroups: Vec<GroupMatch>,
}

impl GroupRepetition {
    /// Value the argument `key` received in this repetition. Containers
    /// hold only the values of this repetition.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Repetitions of one group on the command line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMatch {
    /// Display name of the group.
    pub group: String,
    pub repetitions: Vec<GroupRepetition>,
}

/// Outcome of parsing one command level.
///
/// # Examples
///
/// ```
/// use command_grammar_core::*;
/// use command_grammar_engine::{CommandLine, Value};
///
/// let spec = CommandSpec::new("tool")
///     .with_option(OptionSpec::flag(&["-v", "--verbose"]))
///     .with_option(OptionSpec::with_value(&["-n"], ValueType::Integer).with_default("1"));
/// let mut cli = CommandLine::new(spec).unwrap();
///
/// let result = cli.parse(&["-v"]).unwrap();
/// assert!(result.has_matched_option("--verbose"));
/// assert!(!result.has_matched_option("-n"));
/// assert_eq!(result.option_value("-n"), Some(&Value::Int(1)));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub(crate) command: String,
    pub(crate) command_path: Vec<String>,
    pub(crate) original_args: Vec<String>,
    pub(crate) matched: Vec<MatchedArg>,
    pub(crate) values: Vec<ResolvedValue>,
    pub(crate) unmatched: Vec<String>,
    pub(crate) groups: Vec<GroupMatch>,
    pub(crate) usage_help_requested: bool,
    pub(crate) version_help_requested: bool,
    pub(crate) subcommand: Option<Box<ParseResult>>,
    #[serde(serialize_with = "serialize_errors")]
    pub(crate) errors: Vec<ParameterError>,
}

fn serialize_errors<S: serde::Serializer>(
    errors: &[ParameterError],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().map(ToString::to_string))
}

impl ParseResult {
    /// Name of the command this level parsed.
    pub fn command_name(&self) -> &str {
        &self.command
    }

    /// Names from the root command down to this level.
    pub fn command_path(&self) -> &[String] {
        &self.command_path
    }

    /// Arguments given to the parse, after at-file expansion.
    pub fn original_args(&self) -> &[String] {
        &self.original_args
    }

    /// Every match at this level, in command-line order.
    pub fn matched_args(&self) -> &[MatchedArg] {
        &self.matched
    }

    /// Final values at this level, including defaults.
    pub fn values(&self) -> &[ResolvedValue] {
        &self.values
    }

    /// Returns `true` if an option answering to `name` was matched.
    pub fn has_matched_option(&self, name: &str) -> bool {
        self.matched_option(name).next().is_some()
    }

    /// All occurrences of the option answering to `name`.
    pub fn matched_option<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a MatchedArg> + 'a {
        self.matched
            .iter()
            .filter(move |m| matches!(m.arg, ArgId::Option(_)) && m.names.iter().any(|n| n == name))
    }

    /// All matches of the positional with `label`.
    pub fn matched_positional<'a>(
        &'a self,
        label: &'a str,
    ) -> impl Iterator<Item = &'a MatchedArg> + 'a {
        self.matched
            .iter()
            .filter(move |m| matches!(m.arg, ArgId::Positional(_)) && m.key == label)
    }

    /// Returns `true` if a positional with `label` was matched.
    pub fn has_matched_positional(&self, label: &str) -> bool {
        self.matched_positional(label).next().is_some()
    }

    /// Final value of the option answering to `name`, default included.
    pub fn option_value(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|v| matches!(v.arg, ArgId::Option(_)) && v.names.iter().any(|n| n == name))
            .map(|v| &v.value)
    }

    /// Final value of the positional with `label`, default included.
    pub fn positional_value(&self, label: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|v| matches!(v.arg, ArgId::Positional(_)) && v.key == label)
            .map(|v| &v.value)
    }

    /// Raw tokens assigned to positional slots, in order.
    pub fn positional_tokens(&self) -> Vec<&str> {
        self.matched
            .iter()
            .filter(|m| matches!(m.arg, ArgId::Positional(_)))
            .flat_map(|m| m.tokens.iter().map(String::as_str))
            .collect()
    }

    /// Tokens that matched nothing (when unmatched arguments are allowed).
    pub fn unmatched(&self) -> &[String] {
        &self.unmatched
    }

    /// Group repetitions at this level.
    pub fn group_matches(&self) -> &[GroupMatch] {
        &self.groups
    }

    /// Result of the dispatched subcommand, if any.
    pub fn subcommand(&self) -> Option<&ParseResult> {
        self.subcommand.as_deref()
    }

    /// This level followed by each nested subcommand result.
    pub fn levels(&self) -> Vec<&ParseResult> {
        let mut levels = vec![self];
        let mut current = self;
        while let Some(sub) = current.subcommand() {
            levels.push(sub);
            current = sub;
        }
        levels
    }

    /// Innermost subcommand result (this level when none was dispatched).
    pub fn deepest(&self) -> &ParseResult {
        let mut current = self;
        while let Some(sub) = current.subcommand() {
            current = sub;
        }
        current
    }

    /// Whether a usage-help option was matched at this level or below.
    pub fn is_usage_help_requested(&self) -> bool {
        self.levels().iter().any(|l| l.usage_help_requested)
    }

    /// Whether a version-help option was matched at this level or below.
    pub fn is_version_help_requested(&self) -> bool {
        self.levels().iter().any(|l| l.version_help_requested)
    }

    /// Errors collected when `collect_errors` is on. Only populated on the
    /// root result.
    pub fn errors(&self) -> &[ParameterError] {
        &self.errors
    }
}
