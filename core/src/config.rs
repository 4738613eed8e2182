//! Parser configuration.
//!
//! [`ParserConfig`] is threaded explicitly through the parser; nothing is
//! read from the environment while parsing. It can be declared in code,
//! embedded in a grammar file, or loaded from a standalone YAML file.
//!
//! # Example YAML
//!
//! ```yaml
//! posix_clustered_short_options: true
//! separator: "="
//! end_of_options_delimiter: "--"
//! abbreviated_options: true
//! overwritten_options_allowed: false
//! unmatched_arguments_allowed: false
//! at_files:
//!   enabled: true
//!   marker: "@"
//!   comment_char: "#"
//!   max_depth: 16
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading or saving configuration and grammar files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Argument-file (`@file`) expansion settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtFileConfig {
    /// Expand `@file` tokens at all.
    pub enabled: bool,
    /// Marker character that introduces an argument file.
    pub marker: char,
    /// Lines starting with this character are skipped.
    pub comment_char: Option<char>,
    /// One argument per line, no quoting or whitespace splitting.
    pub simplified: bool,
    /// Maximum nesting of `@file` references inside argument files.
    pub max_depth: usize,
}

impl Default for AtFileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            marker: '@',
            comment_char: Some('#'),
            simplified: false,
            max_depth: 32,
        }
    }
}

/// Parser behavior switches.
///
/// Defaults give strict POSIX/GNU-style parsing.
///
/// # Examples
///
/// ```
/// use command_grammar_core::ParserConfig;
///
/// let config = ParserConfig::default();
/// assert!(config.posix_clustered_short_options);
/// assert_eq!(config.separator, "=");
/// assert_eq!(config.end_of_options_delimiter, "--");
/// assert!(!config.collect_errors);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Split `-abc` into `-a -b -c`.
    pub posix_clustered_short_options: bool,
    /// Separator between an option name and an attached value.
    pub separator: String,
    /// Separator between a key and a value in map arguments.
    pub map_separator: String,
    /// Token after which everything is positional.
    pub end_of_options_delimiter: String,
    /// Match option names ignoring ASCII case.
    pub case_insensitive_options: bool,
    /// Match subcommand names ignoring ASCII case.
    pub case_insensitive_subcommands: bool,
    /// Match choice values ignoring ASCII case.
    pub case_insensitive_enum_values: bool,
    /// Accept an unambiguous prefix of a long option name.
    pub abbreviated_options: bool,
    /// A repeated single-value option overwrites instead of failing.
    pub overwritten_options_allowed: bool,
    /// A repeated map key overwrites instead of failing.
    pub map_key_overwrite_allowed: bool,
    /// Collect unknown tokens instead of failing.
    pub unmatched_arguments_allowed: bool,
    /// Treat unknown option-like tokens as positional parameters.
    pub unmatched_options_are_positional: bool,
    /// Let a declared option name fill a mandatory option value slot.
    pub allow_options_as_option_parameters: bool,
    /// Let an unknown option-like token fill an option value slot.
    pub allow_unmatched_options_as_option_parameters: bool,
    /// After the first positional, treat everything as positional.
    pub stop_at_positional: bool,
    /// After the first unmatched token, collect everything as unmatched.
    pub stop_at_unmatched: bool,
    /// A boolean flag flips its current value instead of setting `true`.
    pub toggle_boolean_flags: bool,
    /// Strip one level of surrounding double quotes from values.
    pub trim_quotes: bool,
    /// Accumulate parameter errors in the result instead of failing.
    pub collect_errors: bool,
    /// Argument-file expansion.
    pub at_files: AtFileConfig,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            posix_clustered_short_options: true,
            separator: "=".to_string(),
            map_separator: "=".to_string(),
            end_of_options_delimiter: "--".to_string(),
            case_insensitive_options: false,
            case_insensitive_subcommands: false,
            case_insensitive_enum_values: false,
            abbreviated_options: false,
            overwritten_options_allowed: false,
            map_key_overwrite_allowed: true,
            unmatched_arguments_allowed: false,
            unmatched_options_are_positional: false,
            allow_options_as_option_parameters: false,
            allow_unmatched_options_as_option_parameters: true,
            stop_at_positional: false,
            stop_at_unmatched: false,
            toggle_boolean_flags: false,
            trim_quotes: false,
            collect_errors: false,
            at_files: AtFileConfig::default(),
        }
    }
}

impl ParserConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be read,
    /// or [`YamlError`](ConfigError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be
    /// written, or [`YamlError`](ConfigError::YamlError) if serialization
    /// fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Parses configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
