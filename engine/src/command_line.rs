//! The parsing entry point.
//!
//! A [`CommandLine`] pairs a built [`CommandSpec`] with everything the
//! parser needs from the host: converters, bindings, a default provider and
//! a prompter for interactive arguments. It mirrors the command tree, one
//! `CommandLine` per subcommand.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};
use std::rc::Rc;
use std::sync::Arc;

use command_grammar_core::{ArgId, CommandSpec, ModelError, ParserConfig, ValueType};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::debug;

use crate::atfile::{AtFileError, expand_at_files};
use crate::convert::{ConversionError, ConverterFn, ConverterRegistry};
use crate::{
    Binding, BindingError, FieldBinding, FromValue, IntoValue, ParameterError, ParseResult, Value,
    parser,
};

/// Source of values for interactive arguments.
pub trait Prompter {
    /// Shows `prompt` and reads one value.
    fn read_secret(&mut self, prompt: &str) -> io::Result<String>;
}

/// Prompts on stderr and reads one value from the terminal with echo off.
///
/// When stdin is not a terminal (piped input) one plain line is read
/// instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn read_secret(&mut self, prompt: &str) -> io::Result<String> {
        let mut stderr = io::stderr();
        stderr.write_all(prompt.as_bytes())?;
        stderr.flush()?;

        if !io::stdin().is_terminal() {
            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line)? == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no input"));
            }
            return Ok(line.trim_end_matches(['\r', '\n']).to_string());
        }

        let secret = read_hidden();
        stderr.write_all(b"\n")?;
        stderr.flush()?;
        secret
    }
}

/// Keeps the terminal in raw mode while alive.
#[must_use = "raw mode ends when the guard is dropped"]
struct RawModeGuard;

impl RawModeGuard {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

fn read_hidden() -> io::Result<String> {
    let _raw = RawModeGuard::new()?;
    let mut secret = String::new();
    loop {
        if let Event::Key(key) = event::read()? {
            if let Some(done) = feed_key(&mut secret, &key) {
                return done.map(|()| secret);
            }
        }
    }
}

/// Applies one key press to the hidden input. Returns `Some` once the
/// input is finished or cancelled.
fn feed_key(secret: &mut String, key: &KeyEvent) -> Option<io::Result<()>> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => Some(Ok(())),
        KeyCode::Char('c') if control => {
            Some(Err(io::Error::new(io::ErrorKind::Interrupted, "prompt cancelled")))
        }
        KeyCode::Char('d') if control && secret.is_empty() => {
            Some(Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no input")))
        }
        KeyCode::Esc => Some(Err(io::Error::new(io::ErrorKind::Interrupted, "prompt cancelled"))),
        KeyCode::Backspace => {
            secret.pop();
            None
        }
        KeyCode::Char(c) if !control => {
            secret.push(c);
            None
        }
        _ => None,
    }
}

/// Answers prompts from a fixed list, for tests and scripted runs.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    prompts: Rc<RefCell<Vec<String>>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Rc::default(),
        }
    }

    /// Prompts shown so far. Clones share the record.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn read_secret(&mut self, prompt: &str) -> io::Result<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted answer left"))
    }
}

/// Supplies defaults for arguments not given on the command line.
///
/// Consulted before the declared `default_value`.
pub trait DefaultProvider {
    /// Raw default for the argument `key` of `command` (the qualified
    /// command name, e.g. `git commit`).
    fn default_value(&self, command: &str, key: &str) -> Option<String>;
}

/// Defaults read from environment variables.
///
/// The variable for an argument is the prefix followed by its key with
/// leading dashes and angle brackets removed, uppercased, and `-` replaced
/// by `_`: with prefix `APP_`, `--log-level` reads `APP_LOG_LEVEL`.
///
/// # Examples
///
/// ```
/// use command_grammar_engine::{DefaultProvider, EnvDefaults};
///
/// let defaults = EnvDefaults::from_pairs("APP_", [("APP_LOG_LEVEL", "debug")]);
/// assert_eq!(defaults.variable_name("--log-level"), "APP_LOG_LEVEL");
/// assert_eq!(defaults.default_value("app", "--log-level").as_deref(), Some("debug"));
/// assert_eq!(defaults.default_value("app", "<file>"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EnvDefaults {
    prefix: String,
    values: HashMap<String, String>,
}

impl EnvDefaults {
    /// Snapshots the current environment variables starting with `prefix`.
    pub fn capture(prefix: &str) -> Self {
        Self::from_pairs(prefix, std::env::vars())
    }

    /// Uses the given variables instead of the process environment.
    pub fn from_pairs<I, K, V>(prefix: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();
        Self {
            prefix: prefix.to_string(),
            values,
        }
    }

    /// Environment variable consulted for `key`.
    pub fn variable_name(&self, key: &str) -> String {
        let body = key
            .trim_start_matches(['-', '/'])
            .trim_start_matches('<')
            .trim_end_matches('>');
        format!("{}{}", self.prefix, body.to_ascii_uppercase().replace('-', "_"))
    }
}

impl DefaultProvider for EnvDefaults {
    fn default_value(&self, _command: &str, key: &str) -> Option<String> {
        self.values.get(&self.variable_name(key)).cloned()
    }
}

/// A parser for one command tree.
///
/// Settings changed through the setters apply to this command and every
/// subcommand; the prompter is only used from the root.
///
/// # Examples
///
/// ```
/// use command_grammar_core::*;
/// use command_grammar_engine::{CommandLine, Value};
///
/// let spec = CommandSpec::new("git")
///     .with_option(OptionSpec::flag(&["--no-pager"]))
///     .with_subcommand(
///         CommandSpec::new("commit")
///             .with_option(
///                 OptionSpec::with_value(&["-m", "--message"], ValueType::String).required(),
///             ),
///     );
/// let mut git = CommandLine::new(spec).unwrap();
///
/// let result = git.parse(&["--no-pager", "commit", "-m", "fix"]).unwrap();
/// let commit = result.subcommand().unwrap();
/// assert_eq!(commit.command_path(), ["git", "commit"]);
/// assert_eq!(commit.option_value("-m"), Some(&Value::Str("fix".into())));
///
/// let err = git.parse(&["commit"]).unwrap_err();
/// assert_eq!(err.command(), "git commit");
/// ```
pub struct CommandLine {
    pub(crate) spec: CommandSpec,
    pub(crate) registry: ConverterRegistry,
    pub(crate) bindings: HashMap<ArgId, Box<dyn Binding>>,
    pub(crate) defaults: Option<Rc<dyn DefaultProvider>>,
    pub(crate) prompter: Box<dyn Prompter>,
    pub(crate) subcommands: Vec<CommandLine>,
    pub(crate) last_result: Option<ParseResult>,
}

impl fmt::Debug for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bound: Vec<&str> = self.bindings.keys().map(|id| self.spec.arg_key(*id)).collect();
        bound.sort_unstable();
        f.debug_struct("CommandLine")
            .field("name", &self.spec.name)
            .field("registry", &self.registry)
            .field("bound", &bound)
            .field("subcommands", &self.subcommands)
            .finish_non_exhaustive()
    }
}

impl CommandLine {
    /// Builds the spec (flattening mixins and validating it) and creates
    /// the parser tree.
    ///
    /// Subcommands that declare no parser configuration of their own
    /// inherit their parent's.
    ///
    /// # Errors
    ///
    /// Returns the first [`ModelError`] found in the grammar.
    pub fn new(spec: CommandSpec) -> Result<Self, ModelError> {
        Ok(Self::from_built(spec.build()?, None))
    }

    fn from_built(mut spec: CommandSpec, parent: Option<&ParserConfig>) -> Self {
        if let Some(parent) = parent {
            if spec.parser == ParserConfig::default() {
                spec.parser = parent.clone();
            }
        }
        let subcommands = spec
            .subcommands
            .iter()
            .cloned()
            .map(|sub| Self::from_built(sub, Some(&spec.parser)))
            .collect();
        Self {
            spec,
            registry: ConverterRegistry::new(),
            bindings: HashMap::new(),
            defaults: None,
            prompter: Box::new(StdinPrompter),
            subcommands,
            last_result: None,
        }
    }

    /// The built command model.
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    pub fn config(&self) -> &ParserConfig {
        &self.spec.parser
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn subcommands(&self) -> &[CommandLine] {
        &self.subcommands
    }

    /// Finds a direct subcommand by name or alias.
    pub fn subcommand(&self, name: &str) -> Option<&CommandLine> {
        let index = self
            .spec
            .find_subcommand(name, self.spec.parser.case_insensitive_subcommands)?;
        self.subcommands.get(index)
    }

    pub fn subcommand_mut(&mut self, name: &str) -> Option<&mut CommandLine> {
        let index = self
            .spec
            .find_subcommand(name, self.spec.parser.case_insensitive_subcommands)?;
        self.subcommands.get_mut(index)
    }

    /// Attaches host storage to the argument with `key` (any option name or
    /// a positional label).
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::UnknownArgument`] if no argument has that key.
    pub fn bind(&mut self, key: &str, binding: impl Binding + 'static) -> Result<(), BindingError> {
        let id = self
            .spec
            .resolve_key(key)
            .ok_or_else(|| BindingError::UnknownArgument(key.to_string()))?;
        self.bindings.insert(id, Box::new(binding));
        Ok(())
    }

    /// Binds the argument with `key` to a field of a shared host struct.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::UnknownArgument`] if no argument has that key.
    pub fn bind_field<H, T>(
        &mut self,
        key: &str,
        host: &Rc<RefCell<H>>,
        field: fn(&mut H) -> &mut T,
    ) -> Result<(), BindingError>
    where
        H: 'static,
        T: FromValue + IntoValue + Clone + 'static,
    {
        self.bind(key, FieldBinding::new(host, field))
    }

    fn for_each_mut(&mut self, f: &mut dyn FnMut(&mut CommandLine)) {
        f(self);
        for sub in &mut self.subcommands {
            sub.for_each_mut(f);
        }
    }

    /// Registers a converter for a value type on this command and all
    /// subcommands.
    pub fn register_converter<F>(&mut self, value_type: ValueType, converter: F)
    where
        F: Fn(&str) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        let converter: ConverterFn = Arc::new(converter);
        self.for_each_mut(&mut |cmd| {
            cmd.registry.insert_type(value_type.clone(), Arc::clone(&converter))
        });
    }

    /// Registers a converter that arguments reference by name.
    pub fn register_named_converter<F>(&mut self, name: &str, converter: F)
    where
        F: Fn(&str) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        let converter: ConverterFn = Arc::new(converter);
        self.for_each_mut(&mut |cmd| cmd.registry.insert_named(name, Arc::clone(&converter)));
    }

    /// Changes the parser configuration of this command and all
    /// subcommands.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_grammar_core::CommandSpec;
    /// use command_grammar_engine::CommandLine;
    ///
    /// let spec = CommandSpec::new("tool").with_subcommand(CommandSpec::new("run"));
    /// let mut cli = CommandLine::new(spec).unwrap();
    /// cli.configure(|c| c.unmatched_arguments_allowed = true);
    /// assert!(cli.subcommand("run").unwrap().config().unmatched_arguments_allowed);
    /// ```
    pub fn configure(&mut self, update: impl Fn(&mut ParserConfig)) {
        self.for_each_mut(&mut |cmd| update(&mut cmd.spec.parser));
    }

    /// Replaces the parser configuration of this command and all
    /// subcommands.
    pub fn set_config(&mut self, config: &ParserConfig) {
        self.configure(|c| *c = config.clone());
    }

    pub fn set_collect_errors(&mut self, collect: bool) {
        self.configure(|c| c.collect_errors = collect);
    }

    pub fn set_unmatched_arguments_allowed(&mut self, allowed: bool) {
        self.configure(|c| c.unmatched_arguments_allowed = allowed);
    }

    pub fn set_overwritten_options_allowed(&mut self, allowed: bool) {
        self.configure(|c| c.overwritten_options_allowed = allowed);
    }

    pub fn set_abbreviated_options(&mut self, allowed: bool) {
        self.configure(|c| c.abbreviated_options = allowed);
    }

    /// Installs a default provider on this command and all subcommands.
    pub fn set_default_provider(&mut self, provider: impl DefaultProvider + 'static) {
        let provider: Rc<dyn DefaultProvider> = Rc::new(provider);
        self.for_each_mut(&mut |cmd| cmd.defaults = Some(Rc::clone(&provider)));
    }

    /// Replaces the prompter used for interactive arguments.
    pub fn set_prompter(&mut self, prompter: impl Prompter + 'static) {
        self.prompter = Box::new(prompter);
    }

    /// Parses `args` (without the program name).
    ///
    /// Argument files are expanded first. Matched values are pushed into
    /// bindings as they are parsed, so with `collect_errors` the bound
    /// host state reflects everything that matched before and after a
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParameterError`], unless `collect_errors` is set,
    /// in which case errors are reported through [`ParseResult::errors`].
    /// Argument file failures are always returned as errors.
    pub fn parse<S: AsRef<str>>(&mut self, args: &[S]) -> Result<ParseResult, ParameterError> {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        let config = &self.spec.parser;
        let expanded = expand_at_files(&args, &config.at_files, &config.end_of_options_delimiter)
            .map_err(|error| self.at_file_error(error))?;
        debug!(command = %self.spec.name, count = expanded.len(), "parsing arguments");

        let result = parser::parse_root(self, &expanded)?;
        self.last_result = Some(result.clone());
        Ok(result)
    }

    fn at_file_error(&self, error: AtFileError) -> ParameterError {
        let command = self.spec.name.clone();
        match error {
            AtFileError::Read { path, source } => ParameterError::AtFileRead {
                command,
                path,
                source: Arc::new(source),
            },
            AtFileError::TooDeep { path, max_depth } => ParameterError::AtFileRecursion {
                command,
                path,
                max_depth,
            },
        }
    }

    /// Result of the last successful parse.
    pub fn last_result(&self) -> Option<&ParseResult> {
        self.last_result.as_ref()
    }

    /// The `CommandLine` of each level in `result`, root first.
    ///
    /// Stops at the first level that does not belong to this tree.
    pub fn parsed_path(&self, result: &ParseResult) -> Vec<&CommandLine> {
        let mut path = Vec::new();
        if result.command_name() != self.spec.name {
            return path;
        }
        let mut current = self;
        path.push(current);
        for level in result.levels().into_iter().skip(1) {
            match current.subcommands.iter().find(|s| s.spec.name == level.command_name()) {
                Some(next) => {
                    path.push(next);
                    current = next;
                }
                None => break,
            }
        }
        path
    }
}
