//! Build-time model validation.
//!
//! Validates the structural invariants of a command tree: well-formed and
//! unique option names (including generated `--no-*` names and names
//! contributed by mixins), gap-free positional indices, consistent arity and
//! multiplicity, resolvable group members, and a cycle-free subcommand tree.
//!
//! # Examples
//!
//! ```
//! use command_grammar_core::*;
//!
//! let ok = CommandSpec::new("cp")
//!     .with_positional(PositionalSpec::at(0, "<src>"))
//!     .with_positional(PositionalSpec::at(1, "<dst>"));
//! assert!(validate_spec(&ok).is_empty());
//!
//! // Invalid: nothing covers index 1
//! let gap = CommandSpec::new("cp")
//!     .with_positional(PositionalSpec::at(0, "<src>"))
//!     .with_positional(PositionalSpec::at(2, "<dst>"));
//! assert!(!validate_spec(&gap).is_empty());
//! ```

use std::collections::{HashMap, HashSet};

use regex::Regex;
use thiserror::Error;

use crate::{ArgGroupSpec, ArgId, CommandSpec, OptionSpec, PositionalSpec};

/// Model-definition errors.
///
/// These describe a badly declared grammar and are raised when the model is
/// built, never while parsing user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Command name is empty or whitespace-only.
    #[error("command name cannot be empty")]
    EmptyCommandName,
    /// A subcommand has an empty name.
    #[error("empty subcommand name in '{command}'")]
    EmptySubcommandName { command: String },
    /// Range text could not be parsed, or `min > max`.
    #[error("invalid range: '{0}'")]
    InvalidRange(String),
    /// An option declares no names.
    #[error("option in '{command}' must define at least one name")]
    MissingOptionName { command: String },
    /// An option name has no prefix, is too short, or contains whitespace.
    #[error("invalid option name in '{command}': '{name}'")]
    InvalidOptionName { command: String, name: String },
    /// Two options in one command share a name.
    #[error("duplicate option name in '{command}': {name}")]
    DuplicateOption { command: String, name: String },
    /// A mixin contributes a name the command already has.
    #[error("mixin '{mixin}' redefines option {name} in '{command}'")]
    MixinConflict {
        command: String,
        mixin: String,
        name: String,
    },
    /// Two mixins of one command share a name, or a mixin has none.
    #[error("invalid or duplicate mixin name in '{command}': '{mixin}'")]
    InvalidMixinName { command: String, mixin: String },
    /// Two positionals in one command share a label.
    #[error("duplicate positional parameter in '{command}': {label}")]
    DuplicatePositional { command: String, label: String },
    /// Positional index ranges leave a slot uncovered.
    #[error("positional parameters in '{command}' leave index {index} uncovered")]
    PositionalGap { command: String, index: usize },
    /// Arity is inconsistent for the argument.
    #[error("invalid arity {arity} for {arg} in '{command}'")]
    InvalidArity {
        command: String,
        arg: String,
        arity: String,
    },
    /// Split regex does not compile.
    #[error("invalid split regex for {arg} in '{command}': {reason}")]
    InvalidSplitRegex {
        command: String,
        arg: String,
        reason: String,
    },
    /// Help options must be boolean flags.
    #[error("help option {option} in '{command}' must be a boolean flag")]
    NonBooleanHelpOption { command: String, option: String },
    /// Negatable options must be boolean flags.
    #[error("negatable option {option} in '{command}' must be a boolean flag")]
    NonBooleanNegatable { command: String, option: String },
    /// Group has neither members nor subgroups.
    #[error("argument group {group} in '{command}' is empty")]
    EmptyGroup { command: String, group: String },
    /// Group multiplicity is inconsistent or zero.
    #[error("invalid multiplicity {multiplicity} for group {group} in '{command}'")]
    InvalidMultiplicity {
        command: String,
        group: String,
        multiplicity: String,
    },
    /// A group member key does not name an argument of the command.
    #[error("group {group} in '{command}' references unknown argument {member}")]
    UnknownGroupMember {
        command: String,
        group: String,
        member: String,
    },
    /// An argument appears in more than one group.
    #[error("argument {member} in '{command}' belongs to more than one group")]
    ArgInMultipleGroups { command: String, member: String },
    /// A required member of a repeatable group can only match once.
    #[error("required member {member} of repeatable group {group} in '{command}' cannot repeat")]
    GroupMemberNotRepeatable {
        command: String,
        group: String,
        member: String,
    },
    /// Two subcommands in the same scope share a name or alias.
    #[error("duplicate subcommand in '{command}': {name}")]
    DuplicateSubcommand { command: String, name: String },
    /// A subcommand path repeats a name (e.g. `git remote git`).
    #[error("subcommand cycle detected at path: {0}")]
    SubcommandCycle(String),
}

/// Validates a command tree.
///
/// Validation stops at the first problem within each scope, mirroring the
/// order in which a reader of the grammar would hit them.
///
/// # Examples
///
/// ```
/// use command_grammar_core::*;
///
/// let dup = CommandSpec::new("tool")
///     .with_option(OptionSpec::flag(&["-v", "--verbose"]))
///     .with_option(OptionSpec::flag(&["-v"]));
/// let errors = validate_spec(&dup);
/// assert!(matches!(errors[0], ModelError::DuplicateOption { .. }));
/// ```
pub fn validate_spec(spec: &CommandSpec) -> Vec<ModelError> {
    let mut errors = Vec::new();

    if spec.name.trim().is_empty() {
        errors.push(ModelError::EmptyCommandName);
        return errors;
    }

    let mut path = vec![spec.name.clone()];
    errors.extend(validate_command(spec, &mut path));
    errors
}

fn validate_command(spec: &CommandSpec, path: &mut Vec<String>) -> Vec<ModelError> {
    let command = path.join(" ");
    let mut errors = Vec::new();

    errors.extend(validate_mixin_names(spec, &command));
    if !errors.is_empty() {
        return errors;
    }

    errors.extend(validate_options(&spec.options, &command));
    if !errors.is_empty() {
        return errors;
    }

    errors.extend(validate_positionals(&spec.positionals, &command));
    if !errors.is_empty() {
        return errors;
    }

    errors.extend(validate_args(spec, &command));
    if !errors.is_empty() {
        return errors;
    }

    errors.extend(validate_groups(spec, &command));
    if !errors.is_empty() {
        return errors;
    }

    validate_subcommands(&spec.subcommands, path)
}

fn validate_mixin_names(spec: &CommandSpec, command: &str) -> Vec<ModelError> {
    let mut seen = HashSet::new();
    for mixin in &spec.mixins {
        let name = mixin.name.trim();
        if name.is_empty() || !seen.insert(name) {
            return vec![ModelError::InvalidMixinName {
                command: command.to_string(),
                mixin: mixin.name.clone(),
            }];
        }
    }
    Vec::new()
}

fn is_valid_option_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if !first.is_alphanumeric() && !first.is_whitespace() => {}
        _ => return false,
    }
    name.chars().count() >= 2 && !name.chars().any(char::is_whitespace)
}

fn validate_options(options: &[OptionSpec], command: &str) -> Vec<ModelError> {
    let mut seen: HashMap<String, Option<&str>> = HashMap::new();

    for option in options {
        if option.names.is_empty() {
            return vec![ModelError::MissingOptionName {
                command: command.to_string(),
            }];
        }

        for name in &option.names {
            if !is_valid_option_name(name) {
                return vec![ModelError::InvalidOptionName {
                    command: command.to_string(),
                    name: name.clone(),
                }];
            }
        }

        if option.is_help() && !option.arg.is_boolean() {
            return vec![ModelError::NonBooleanHelpOption {
                command: command.to_string(),
                option: option.key().to_string(),
            }];
        }
        if option.negatable && !option.arg.is_boolean() {
            return vec![ModelError::NonBooleanNegatable {
                command: command.to_string(),
                option: option.key().to_string(),
            }];
        }

        let owner = option.arg.mixin.as_deref();
        let names = option.names.iter().cloned().chain(option.negated_names());
        for name in names {
            if let Some(&previous) = seen.get(&name) {
                let error = match previous.or(owner) {
                    Some(mixin) => ModelError::MixinConflict {
                        command: command.to_string(),
                        mixin: mixin.to_string(),
                        name,
                    },
                    None => ModelError::DuplicateOption {
                        command: command.to_string(),
                        name,
                    },
                };
                return vec![error];
            }
            seen.insert(name, owner);
        }
    }

    Vec::new()
}

fn validate_positionals(positionals: &[PositionalSpec], command: &str) -> Vec<ModelError> {
    let mut labels = HashSet::new();
    for positional in positionals {
        if !labels.insert(positional.key()) {
            return vec![ModelError::DuplicatePositional {
                command: command.to_string(),
                label: positional.key().to_string(),
            }];
        }
        if !positional.index.is_valid() {
            return vec![ModelError::InvalidRange(positional.index.to_string())];
        }
    }

    let mut ranges: Vec<_> = positionals.iter().map(|p| p.index).collect();
    ranges.sort_by_key(|r| r.min);

    let mut next = 0;
    for range in ranges {
        if range.min > next {
            return vec![ModelError::PositionalGap {
                command: command.to_string(),
                index: next,
            }];
        }
        match range.max {
            Some(max) => next = next.max(max + 1),
            None => break,
        }
    }

    Vec::new()
}

fn validate_args(spec: &CommandSpec, command: &str) -> Vec<ModelError> {
    for id in spec.arg_ids() {
        let arg = spec.arg(id);
        let key = spec.arg_key(id);

        if let Some(arity) = arg.arity {
            let positional_without_values =
                matches!(id, ArgId::Positional(_)) && arity.max == Some(0);
            let scalar_with_many =
                !arg.is_multi_value() && arity.max != Some(0) && arity.max != Some(1);
            if !arity.is_valid() || positional_without_values || scalar_with_many {
                return vec![ModelError::InvalidArity {
                    command: command.to_string(),
                    arg: key.to_string(),
                    arity: arity.to_string(),
                }];
            }
        }

        if let Some(pattern) = &arg.split_regex {
            if !arg.is_multi_value() {
                return vec![ModelError::InvalidSplitRegex {
                    command: command.to_string(),
                    arg: key.to_string(),
                    reason: "splitting requires a list, set or map".to_string(),
                }];
            }
            if let Err(err) = Regex::new(pattern) {
                return vec![ModelError::InvalidSplitRegex {
                    command: command.to_string(),
                    arg: key.to_string(),
                    reason: err.to_string(),
                }];
            }
        }
    }
    Vec::new()
}

fn validate_groups(spec: &CommandSpec, command: &str) -> Vec<ModelError> {
    let mut claimed = HashSet::new();
    for group in &spec.groups {
        let errors = validate_group(spec, group, command, &mut claimed);
        if !errors.is_empty() {
            return errors;
        }
    }
    Vec::new()
}

fn validate_group(
    spec: &CommandSpec,
    group: &ArgGroupSpec,
    command: &str,
    claimed: &mut HashSet<ArgId>,
) -> Vec<ModelError> {
    let name = group.display_name();

    if group.members.is_empty() && group.subgroups.is_empty() {
        return vec![ModelError::EmptyGroup {
            command: command.to_string(),
            group: name,
        }];
    }

    let multiplicity = group.multiplicity;
    if !multiplicity.is_valid() || multiplicity.max == Some(0) {
        return vec![ModelError::InvalidMultiplicity {
            command: command.to_string(),
            group: name,
            multiplicity: multiplicity.to_string(),
        }];
    }

    let repeatable = multiplicity.max != Some(1);
    for member in &group.members {
        let Some(id) = spec.resolve_key(member) else {
            return vec![ModelError::UnknownGroupMember {
                command: command.to_string(),
                group: name,
                member: member.clone(),
            }];
        };
        if !claimed.insert(id) {
            return vec![ModelError::ArgInMultipleGroups {
                command: command.to_string(),
                member: member.clone(),
            }];
        }
        if let ArgId::Positional(i) = id {
            let positional = &spec.positionals[i];
            if repeatable && positional.is_required() && !positional.index.is_unbounded() {
                return vec![ModelError::GroupMemberNotRepeatable {
                    command: command.to_string(),
                    group: name,
                    member: member.clone(),
                }];
            }
        }
    }

    for sub in &group.subgroups {
        let errors = validate_group(spec, sub, command, claimed);
        if !errors.is_empty() {
            return errors;
        }
    }

    Vec::new()
}

fn validate_subcommands(subcommands: &[CommandSpec], path: &mut Vec<String>) -> Vec<ModelError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for sub in subcommands {
        let name = sub.name.trim();
        if name.is_empty() {
            errors.push(ModelError::EmptySubcommandName {
                command: path.join(" "),
            });
            return errors;
        }

        for alias in std::iter::once(name).chain(sub.aliases.iter().map(String::as_str)) {
            if !seen.insert(alias) {
                errors.push(ModelError::DuplicateSubcommand {
                    command: path.join(" "),
                    name: alias.to_string(),
                });
                return errors;
            }
        }

        if path.iter().any(|segment| segment == name) {
            let cycle_path = path
                .iter()
                .cloned()
                .chain(std::iter::once(name.to_string()))
                .collect::<Vec<_>>()
                .join(" ");
            errors.push(ModelError::SubcommandCycle(cycle_path));
            return errors;
        }

        path.push(name.to_string());
        errors.extend(validate_command(sub, path));
        path.pop();
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use crate::{OptionSpec, Range, ValueType};

    use super::*;

    fn first_error(spec: &CommandSpec) -> ModelError {
        validate_spec(spec).into_iter().next().expect("expected a model error")
    }

    #[test]
    fn test_rejects_empty_command_name() {
        assert_eq!(validate_spec(&CommandSpec::new("  ")), vec![ModelError::EmptyCommandName]);
    }

    #[test]
    fn test_rejects_option_without_prefix() {
        let spec = CommandSpec::new("tool").with_option(OptionSpec::flag(&["v"]));
        assert_eq!(
            first_error(&spec),
            ModelError::InvalidOptionName {
                command: "tool".to_string(),
                name: "v".to_string(),
            }
        );
    }

    #[test]
    fn test_accepts_windows_style_names() {
        let spec = CommandSpec::new("tool").with_option(OptionSpec::flag(&["/v", "/verbose"]));
        assert!(validate_spec(&spec).is_empty());
    }

    #[test]
    fn test_rejects_negated_name_collision() {
        let spec = CommandSpec::new("tool")
            .with_option(OptionSpec::flag(&["--color"]).negatable())
            .with_option(OptionSpec::flag(&["--no-color"]));
        assert_eq!(
            first_error(&spec),
            ModelError::DuplicateOption {
                command: "tool".to_string(),
                name: "--no-color".to_string(),
            }
        );
    }

    #[test]
    fn test_rejects_non_boolean_negatable() {
        let spec = CommandSpec::new("tool")
            .with_option(OptionSpec::with_value(&["--level"], ValueType::Integer).negatable());
        assert!(matches!(first_error(&spec), ModelError::NonBooleanNegatable { .. }));
    }

    #[test]
    fn test_overlapping_positionals_are_allowed() {
        let spec = CommandSpec::new("tool")
            .with_positional(PositionalSpec::at(0, "<first>"))
            .with_positional(PositionalSpec::new(Range::at_least(0), "<all>").list());
        assert!(validate_spec(&spec).is_empty());
    }

    #[test]
    fn test_rejects_positional_gap() {
        let spec = CommandSpec::new("tool")
            .with_positional(PositionalSpec::new(Range::between(0, 1), "<a>"))
            .with_positional(PositionalSpec::new(Range::at_least(3), "<b>").list());
        assert_eq!(
            first_error(&spec),
            ModelError::PositionalGap {
                command: "tool".to_string(),
                index: 2,
            }
        );
    }

    #[test]
    fn test_rejects_positional_without_values() {
        let spec = CommandSpec::new("tool")
            .with_positional(PositionalSpec::at(0, "<a>").with_arity(Range::exactly(0)));
        assert!(matches!(first_error(&spec), ModelError::InvalidArity { .. }));
    }

    #[test]
    fn test_rejects_bad_split_regex() {
        let spec = CommandSpec::new("tool")
            .with_option(OptionSpec::with_value(&["-o"], ValueType::String).list().with_split("("));
        assert!(matches!(first_error(&spec), ModelError::InvalidSplitRegex { .. }));
    }

    #[test]
    fn test_rejects_scalar_with_multi_arity() {
        let spec = CommandSpec::new("tool").with_option(
            OptionSpec::with_value(&["-o"], ValueType::String).with_arity(Range::exactly(2)),
        );
        assert!(matches!(first_error(&spec), ModelError::InvalidArity { .. }));
    }

    #[test]
    fn test_rejects_split_on_scalar() {
        let spec = CommandSpec::new("tool")
            .with_option(OptionSpec::with_value(&["-o"], ValueType::String).with_split(","));
        assert!(matches!(first_error(&spec), ModelError::InvalidSplitRegex { .. }));
    }

    #[test]
    fn test_rejects_unknown_group_member() {
        let spec = CommandSpec::new("tool")
            .with_option(OptionSpec::flag(&["-x"]))
            .with_group(ArgGroupSpec::exclusive(&["-x", "-y"]));
        assert!(matches!(first_error(&spec), ModelError::UnknownGroupMember { .. }));
    }

    #[test]
    fn test_rejects_arg_in_two_groups() {
        let spec = CommandSpec::new("tool")
            .with_option(OptionSpec::flag(&["-x"]))
            .with_option(OptionSpec::flag(&["-y"]))
            .with_group(ArgGroupSpec::exclusive(&["-x", "-y"]))
            .with_group(ArgGroupSpec::dependent(&["-y"]));
        assert_eq!(
            first_error(&spec),
            ModelError::ArgInMultipleGroups {
                command: "tool".to_string(),
                member: "-y".to_string(),
            }
        );
    }

    #[test]
    fn test_rejects_zero_multiplicity() {
        let spec = CommandSpec::new("tool")
            .with_option(OptionSpec::flag(&["-x"]))
            .with_group(ArgGroupSpec::exclusive(&["-x"]).with_multiplicity(Range::exactly(0)));
        assert!(matches!(first_error(&spec), ModelError::InvalidMultiplicity { .. }));
    }

    #[test]
    fn test_rejects_bounded_required_positional_in_repeatable_group() {
        let spec = CommandSpec::new("tool")
            .with_option(OptionSpec::with_value(&["-a"], ValueType::String).required())
            .with_positional(PositionalSpec::at(0, "<file>"))
            .with_group(
                ArgGroupSpec::dependent(&["-a", "<file>"]).with_multiplicity(Range::at_least(0)),
            );
        assert!(matches!(first_error(&spec), ModelError::GroupMemberNotRepeatable { .. }));
    }

    #[test]
    fn test_rejects_duplicate_subcommand_alias() {
        let spec = CommandSpec::new("git")
            .with_subcommand(CommandSpec::new("checkout").with_alias("co"))
            .with_subcommand(CommandSpec::new("co"));
        assert_eq!(
            first_error(&spec),
            ModelError::DuplicateSubcommand {
                command: "git".to_string(),
                name: "co".to_string(),
            }
        );
    }

    #[test]
    fn test_rejects_subcommand_cycle() {
        let spec = CommandSpec::new("git")
            .with_subcommand(CommandSpec::new("remote").with_subcommand(CommandSpec::new("git")));
        assert_eq!(
            first_error(&spec),
            ModelError::SubcommandCycle("git remote git".to_string())
        );
    }

    #[test]
    fn test_reports_scope_of_nested_error() {
        let spec = CommandSpec::new("git").with_subcommand(
            CommandSpec::new("remote")
                .with_option(OptionSpec::flag(&["-v"]))
                .with_option(OptionSpec::flag(&["-v"])),
        );
        assert_eq!(
            first_error(&spec),
            ModelError::DuplicateOption {
                command: "git remote".to_string(),
                name: "-v".to_string(),
            }
        );
    }
}
