//! Parsing and validation of command lines against a
//! [`CommandSpec`](command_grammar_core::CommandSpec).
//!
//! [`CommandLine`] is the entry point. A parse runs in three stages:
//!
//! 1. `@file` arguments are expanded ([`expand_at_files`]);
//! 2. tokens are matched to options, positionals and subcommands, values
//!    are converted through the [`ConverterRegistry`] and pushed into any
//!    [`Binding`]s;
//! 3. each command level is validated: required arguments first, then
//!    argument groups.
//!
//! Problems with the user's input are [`ParameterError`]s. With
//! `collect_errors` enabled the parse keeps going and reports them on the
//! [`ParseResult`] instead.
//!
//! # Example
//!
//! ```
//! use command_grammar_core::*;
//! use command_grammar_engine::{CommandLine, Value, ValueCell};
//!
//! let spec = CommandSpec::new("fetch")
//!     .with_option(OptionSpec::with_value(&["-o", "--output"], ValueType::Path).list())
//!     .with_option(OptionSpec::flag(&["-q", "--quiet"]))
//!     .with_positional(PositionalSpec::new(Range::at_least(0), "<url>").list());
//!
//! let mut cli = CommandLine::new(spec).unwrap();
//! let quiet = ValueCell::new();
//! cli.bind("--quiet", quiet.clone()).unwrap();
//!
//! let result = cli.parse(&["-q", "-o", "a.html", "http://a", "http://b"]).unwrap();
//! assert_eq!(quiet.value(), Some(Value::Bool(true)));
//! assert_eq!(result.positional_tokens(), ["http://a", "http://b"]);
//! ```

mod atfile;
mod binding;
mod command_line;
mod convert;
mod error;
mod groups;
mod parser;
mod result;
mod value;

pub use atfile::{AtFileError, expand_at_files};
pub use binding::{Binding, BindingError, FieldBinding, ValueCell};
pub use command_line::{
    CommandLine, DefaultProvider, EnvDefaults, Prompter, ScriptedPrompter, StdinPrompter,
};
pub use convert::{Builtin, ConversionError, ConverterFn, ConverterRegistry, parse_bool};
pub use error::ParameterError;
pub use result::{GroupMatch, GroupRepetition, MatchedArg, ParseResult, ResolvedValue};
pub use value::{FromValue, IntoValue, Value};
