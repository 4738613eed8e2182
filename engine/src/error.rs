//! Parse-time errors.
//!
//! Everything here is a problem with the user's input. Grammar mistakes are
//! reported at build time as [`ModelError`](command_grammar_core::ModelError)
//! and never show up during parsing.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::{BindingError, ConversionError};

/// An invalid command line.
///
/// Every variant carries the qualified name of the command being parsed
/// when the error was found (`git commit`), so a caller can show help for
/// the right subcommand.
#[derive(Debug, Clone, Error)]
pub enum ParameterError {
    /// Tokens that match no option, positional slot, or subcommand.
    #[error("{command}: unmatched argument{} at index {index}: {}",
        plural(.tokens),
        .tokens.join(", "))]
    UnmatchedArgument {
        command: String,
        tokens: Vec<String>,
        index: usize,
    },

    /// An abbreviated option matches more than one name.
    #[error("{command}: option '{token}' is ambiguous; candidates: {}", .candidates.join(", "))]
    AmbiguousOption {
        command: String,
        token: String,
        candidates: Vec<String>,
    },

    /// Required arguments were not supplied. All missing arguments of one
    /// command are reported together.
    #[error("{command}: missing required argument{}: {}{}",
        plural(.missing),
        .missing.join(", "),
        .detail.as_ref().map(|d| format!(" ({d})")).unwrap_or_default())]
    MissingParameter {
        command: String,
        missing: Vec<String>,
        detail: Option<String>,
    },

    /// A token could not be converted to the argument's type.
    #[error("{command}: invalid value for {arg}: {source}")]
    TypeConversion {
        command: String,
        arg: String,
        token: String,
        target: String,
        #[source]
        source: ConversionError,
    },

    /// A single-value option was given twice with different values.
    #[error(
        "{command}: option '{option}' should be specified only once \
         (was '{previous}', now '{value}')"
    )]
    OverwrittenOption {
        command: String,
        option: String,
        previous: String,
        value: String,
    },

    /// Two members of an exclusive group were matched together.
    #[error("{command}: {first} and {second} are mutually exclusive (specify only one of {group})")]
    MutuallyExclusive {
        command: String,
        first: String,
        second: String,
        group: String,
    },

    /// A group occurred fewer times than its multiplicity requires.
    #[error("{command}: missing required argument group {group}")]
    MissingGroup { command: String, group: String },

    /// A group occurred more times than its multiplicity allows.
    #[error("{command}: group {group} matched {count} times but may occur at most {max} times")]
    TooManyGroupMatches {
        command: String,
        group: String,
        count: usize,
        max: usize,
    },

    /// One occurrence supplied more values than the arity allows.
    #[error("{command}: {arg} takes at most {max} values but {count} were given")]
    MaxValuesExceeded {
        command: String,
        arg: String,
        max: usize,
        count: usize,
    },

    /// An argument file could not be read.
    #[error("{command}: cannot read argument file {}: {source}", .path.display())]
    AtFileRead {
        command: String,
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    /// Argument files nest deeper than allowed (usually a cycle).
    #[error("{command}: argument file {} nests deeper than {max_depth} levels", .path.display())]
    AtFileRecursion {
        command: String,
        path: PathBuf,
        max_depth: usize,
    },

    /// Reading an interactive value failed.
    #[error("{command}: cannot read value for {arg}: {source}")]
    Prompt {
        command: String,
        arg: String,
        #[source]
        source: Arc<io::Error>,
    },

    /// The bound host storage rejected a value.
    #[error("{command}: cannot bind {arg}: {source}")]
    Binding {
        command: String,
        arg: String,
        #[source]
        source: BindingError,
    },
}

fn plural(items: &[String]) -> &'static str {
    if items.len() > 1 { "s" } else { "" }
}

impl ParameterError {
    /// Qualified name of the command the error belongs to.
    pub fn command(&self) -> &str {
        match self {
            Self::UnmatchedArgument { command, .. }
            | Self::AmbiguousOption { command, .. }
            | Self::MissingParameter { command, .. }
            | Self::TypeConversion { command, .. }
            | Self::OverwrittenOption { command, .. }
            | Self::MutuallyExclusive { command, .. }
            | Self::MissingGroup { command, .. }
            | Self::TooManyGroupMatches { command, .. }
            | Self::MaxValuesExceeded { command, .. }
            | Self::AtFileRead { command, .. }
            | Self::AtFileRecursion { command, .. }
            | Self::Prompt { command, .. }
            | Self::Binding { command, .. } => command,
        }
    }
}
