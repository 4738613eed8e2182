//! Command model types and build-time validation.
//!
//! This crate defines the grammar a command line is parsed against:
//!
//! - [`CommandSpec`]: one command or subcommand with its options,
//!   positional parameters, argument groups, subcommands, mixins and
//!   parser configuration.
//! - [`OptionSpec`]: a named option (`-v`, `--verbose`), optionally
//!   negatable, or a usage/version help marker.
//! - [`PositionalSpec`]: a positional parameter covering an index range.
//! - [`ArgSpec`]: properties shared by both (value type, container
//!   shape, arity, default, split regex and converters).
//! - [`ArgGroupSpec`]: exclusive or co-occurring argument groups with a
//!   repetition multiplicity.
//! - [`ParserConfig`]: parser switches, loadable from YAML.
//!
//! [`CommandSpec::build`] flattens mixins and runs [`validate_spec`]; the
//! resulting [`ModelError`]s are programming errors in the grammar and are
//! kept separate from parse-time errors.
//!
//! # Example
//!
//! ```
//! use command_grammar_core::*;
//!
//! let spec = CommandSpec::new("archive")
//!     .with_option(OptionSpec::flag(&["-v", "--verbose"]))
//!     .with_option(OptionSpec::with_value(&["-x", "--extract"], ValueType::Path))
//!     .with_option(OptionSpec::with_value(&["-c", "--create"], ValueType::Path))
//!     .with_group(
//!         ArgGroupSpec::exclusive(&["--extract", "--create"])
//!             .with_multiplicity(Range::exactly(1)),
//!     )
//!     .with_positional(PositionalSpec::new(Range::at_least(0), "<files>").list())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(spec.options.len(), 3);
//! assert_eq!(spec.groups[0].synopsis(), "(--extract | --create)");
//! ```

mod config;
mod merge;
mod range;
mod types;
mod validate;

pub use config::{AtFileConfig, ConfigError, ParserConfig};
pub use range::Range;
pub use types::*;
pub use validate::{ModelError, validate_spec};

use std::path::Path;

/// Loads a grammar from a JSON or YAML file, chosen by extension
/// (`.yml`/`.yaml` are YAML, anything else JSON).
///
/// The grammar is returned as declared; call [`CommandSpec::build`] to
/// flatten and validate it.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed.
pub fn load_grammar(path: impl AsRef<Path>) -> Result<CommandSpec, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    );
    if yaml {
        Ok(serde_yaml::from_str(&text)?)
    } else {
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_grammar_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("tool.yaml");
        std::fs::write(
            &yaml_path,
            r#"
name: tool
options:
  - names: ["-n", "--count"]
    value_type: Integer
    default_value: "3"
positionals:
  - index: "0..*"
    param_label: "<files>"
    container: List
"#,
        )
        .unwrap();
        let from_yaml = load_grammar(&yaml_path).unwrap().build().unwrap();

        let json_path = dir.path().join("tool.json");
        std::fs::write(&json_path, serde_json::to_string(&from_yaml).unwrap()).unwrap();
        let from_json = load_grammar(&json_path).unwrap().build().unwrap();

        assert_eq!(from_yaml, from_json);
        assert_eq!(from_yaml.options[0].arg.value_type, ValueType::Integer);
        assert_eq!(from_yaml.positionals[0].index, Range::at_least(0));
    }
}
