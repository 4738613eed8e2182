//! Command model type definitions.
//!
//! This module defines the grammar a command line is parsed against: a tree
//! of [`CommandSpec`] nodes, each owning its [`OptionSpec`] and
//! [`PositionalSpec`] leaves and the [`ArgGroupSpec`] constraints between
//! them. The types are plain data, serializable with [`serde`], so a grammar
//! can be declared in code or loaded from JSON/YAML.

use serde::{Deserialize, Serialize};

use crate::{ParserConfig, Range};

/// Declared type of a single value.
///
/// For container arguments this is the element type (lists, sets) or the
/// value type (maps); the key type of a map lives in [`Container::Map`].
///
/// # Examples
///
/// ```
/// use command_grammar_core::ValueType;
///
/// assert_eq!(ValueType::default(), ValueType::String);
/// let format = ValueType::Choice(vec!["json".into(), "yaml".into()]);
/// assert_eq!(format.type_name(), "choice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ValueType {
    /// `true`/`false` style values.
    Bool,
    /// Any text (the default).
    #[default]
    String,
    /// Signed 64-bit integer.
    Integer,
    /// Unsigned 64-bit integer.
    Unsigned,
    /// 64-bit float.
    Float,
    /// A single character.
    Char,
    /// Filesystem path.
    Path,
    /// Calendar date (`2024-01-31`).
    Date,
    /// Wall-clock time (`13:45:00`).
    Time,
    /// Date and time (RFC 3339 or `2024-01-31T13:45:00`).
    DateTime,
    /// Human-readable duration (`1h 30m`, `250ms`).
    Duration,
    /// IPv4 or IPv6 address.
    IpAddr,
    /// `host:port` socket address.
    SocketAddr,
    /// A regular expression, validated on conversion.
    Pattern,
    /// One of a fixed set of names (enum constants).
    Choice(Vec<String>),
    /// A host-defined type resolved through a registered converter.
    Custom(String),
}

impl ValueType {
    /// Short display name used in error messages.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Unsigned => "unsigned",
            Self::Float => "float",
            Self::Char => "char",
            Self::Path => "path",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Duration => "duration",
            Self::IpAddr => "ip-address",
            Self::SocketAddr => "socket-address",
            Self::Pattern => "pattern",
            Self::Choice(_) => "choice",
            Self::Custom(name) => name,
        }
    }
}

/// Shape of the host member an argument is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Container {
    /// A single value (the default).
    #[default]
    Scalar,
    /// Ordered values, duplicates kept.
    List,
    /// Ordered values, duplicates dropped.
    Set,
    /// `key=value` pairs in first-seen order.
    Map {
        /// Declared type of the keys.
        key_type: ValueType,
    },
}

/// Properties shared by options and positional parameters.
///
/// Arity left as `None` is "unspecified": see [`ArgSpec::effective_arity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ArgSpec {
    /// Element/value type.
    pub value_type: ValueType,
    /// Container shape of the bound member.
    pub container: Container,
    /// Values consumed per occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arity: Option<Range>,
    /// Raw default, converted like any command-line token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Must be matched at least once.
    pub required: bool,
    /// Regex used to split one token into several values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_regex: Option<String>,
    /// Names of registered converters, tried before the type registry.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub converters: Vec<String>,
    /// Completion candidates offered by completion generators.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub completion_candidates: Vec<String>,
    /// Value is read from a secure prompt instead of the token stream.
    pub interactive: bool,
    /// Omitted from usage help.
    pub hidden: bool,
    /// Description for usage help.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Placeholder label (`<file>`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param_label: Option<String>,
    /// Name of the mixin this argument was copied from during build.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mixin: Option<String>,
}

impl ArgSpec {
    /// Creates an argument of the given value type.
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            ..Default::default()
        }
    }

    /// Returns `true` for a scalar boolean.
    pub fn is_boolean(&self) -> bool {
        self.value_type == ValueType::Bool && self.container == Container::Scalar
    }

    /// Returns `true` for list, set, and map arguments.
    pub fn is_multi_value(&self) -> bool {
        self.container != Container::Scalar
    }

    /// Returns `true` if this argument binds to a map.
    pub fn is_map(&self) -> bool {
        matches!(self.container, Container::Map { .. })
    }

    /// Arity actually used by the parser.
    ///
    /// Declared arity wins. Otherwise booleans and interactive arguments
    /// take no value, and everything else takes exactly one value per
    /// occurrence, containers included: repeating the argument is how
    /// multiple values accumulate.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_grammar_core::{ArgSpec, Container, Range, ValueType};
    ///
    /// let mut list = ArgSpec::new(ValueType::String);
    /// list.container = Container::List;
    /// assert_eq!(list.effective_arity(), Range::exactly(1));
    ///
    /// list.arity = Some(Range::at_least(1));
    /// assert_eq!(list.effective_arity(), Range::at_least(1));
    ///
    /// assert_eq!(ArgSpec::new(ValueType::Bool).effective_arity(), Range::exactly(0));
    /// ```
    pub fn effective_arity(&self) -> Range {
        if let Some(arity) = self.arity {
            return arity;
        }
        if self.is_boolean() || self.interactive {
            Range::exactly(0)
        } else {
            Range::exactly(1)
        }
    }

    /// Label used in messages (`<value>` when none was declared).
    pub fn label(&self) -> &str {
        self.param_label.as_deref().unwrap_or("<value>")
    }
}

macro_rules! arg_builders {
    ($ty:ty) => {
        impl $ty {
            /// Sets the value type.
            pub fn with_type(mut self, value_type: ValueType) -> Self {
                self.arg.value_type = value_type;
                self
            }

            /// Declares an explicit arity.
            pub fn with_arity(mut self, arity: Range) -> Self {
                self.arg.arity = Some(arity);
                self
            }

            /// Binds to an ordered list.
            pub fn list(mut self) -> Self {
                self.arg.container = Container::List;
                self
            }

            /// Binds to an ordered set.
            pub fn set(mut self) -> Self {
                self.arg.container = Container::Set;
                self
            }

            /// Binds to a map with keys of `key_type`.
            pub fn map(mut self, key_type: ValueType) -> Self {
                self.arg.container = Container::Map { key_type };
                self
            }

            /// Marks as required.
            pub fn required(mut self) -> Self {
                self.arg.required = true;
                self
            }

            /// Sets the raw default value.
            pub fn with_default(mut self, value: &str) -> Self {
                self.arg.default_value = Some(value.to_string());
                self
            }

            /// Splits each token on `regex` before conversion.
            pub fn with_split(mut self, regex: &str) -> Self {
                self.arg.split_regex = Some(regex.to_string());
                self
            }

            /// Adds a named converter ahead of the type registry.
            pub fn with_converter(mut self, name: &str) -> Self {
                self.arg.converters.push(name.to_string());
                self
            }

            /// Adds completion candidates.
            pub fn with_candidates(mut self, candidates: &[&str]) -> Self {
                self.arg
                    .completion_candidates
                    .extend(candidates.iter().map(|c| c.to_string()));
                self
            }

            /// Reads the value from a secure prompt.
            pub fn interactive(mut self) -> Self {
                self.arg.interactive = true;
                self
            }

            /// Hides from usage help.
            pub fn hidden(mut self) -> Self {
                self.arg.hidden = true;
                self
            }

            /// Adds a description.
            pub fn with_description(mut self, desc: &str) -> Self {
                self.arg.description = Some(desc.to_string());
                self
            }

            /// Sets the placeholder label.
            pub fn with_label(mut self, label: &str) -> Self {
                self.arg.param_label = Some(label.to_string());
                self
            }
        }
    };
}

/// A named option such as `-v` / `--verbose`.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{OptionSpec, ValueType};
///
/// let verbose = OptionSpec::flag(&["-v", "--verbose"]).negatable();
/// assert_eq!(verbose.key(), "--verbose");
/// assert_eq!(verbose.negated_names(), vec!["--no-verbose".to_string()]);
///
/// let output = OptionSpec::with_value(&["-o", "--output"], ValueType::Path);
/// assert!(output.matches("-o"));
/// assert!(!output.arg.is_boolean());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OptionSpec {
    /// All names, e.g. `["-v", "--verbose"]`.
    pub names: Vec<String>,
    /// Generates a `--no-name` counterpart for each long name.
    pub negatable: bool,
    /// Requests usage help; short-circuits required validation.
    pub usage_help: bool,
    /// Requests version help; short-circuits required validation.
    pub version_help: bool,
    /// Shared argument properties.
    #[serde(flatten)]
    pub arg: ArgSpec,
}

impl OptionSpec {
    /// Creates a boolean flag.
    pub fn flag(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            arg: ArgSpec::new(ValueType::Bool),
            ..Default::default()
        }
    }

    /// Creates an option that takes a value.
    pub fn with_value(names: &[&str], value_type: ValueType) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            arg: ArgSpec::new(value_type),
            ..Default::default()
        }
    }

    /// Creates the conventional `-h, --help` option.
    pub fn help() -> Self {
        let mut help =
            Self::flag(&["-h", "--help"]).with_description("Show this help message and exit.");
        help.usage_help = true;
        help
    }

    /// Creates the conventional `-V, --version` option.
    pub fn version() -> Self {
        let mut version = Self::flag(&["-V", "--version"])
            .with_description("Print version information and exit.");
        version.version_help = true;
        version
    }

    /// Marks as negatable.
    pub fn negatable(mut self) -> Self {
        self.negatable = true;
        self
    }

    /// Marks as a usage-help request.
    pub fn usage_help(mut self) -> Self {
        self.usage_help = true;
        self
    }

    /// Marks as a version-help request.
    pub fn version_help(mut self) -> Self {
        self.version_help = true;
        self
    }

    /// Identifying key: the longest name (first wins on ties).
    pub fn key(&self) -> &str {
        self.names
            .iter()
            .fold(None::<&String>, |best, name| match best {
                Some(b) if b.len() >= name.len() => Some(b),
                _ => Some(name),
            })
            .map(String::as_str)
            .unwrap_or("unknown")
    }

    /// Checks if `name` is one of this option's names.
    pub fn matches(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Generated negated names for a negatable option.
    ///
    /// `--name` becomes `--no-name`, and `--no-name` becomes `--name`.
    /// Short names have no negated form.
    pub fn negated_names(&self) -> Vec<String> {
        if !self.negatable {
            return Vec::new();
        }
        self.names
            .iter()
            .filter_map(|name| {
                let body = name.strip_prefix("--")?;
                Some(match body.strip_prefix("no-") {
                    Some(rest) => format!("--{rest}"),
                    None => format!("--no-{body}"),
                })
            })
            .collect()
    }

    /// Returns `true` for usage or version help options.
    pub fn is_help(&self) -> bool {
        self.usage_help || self.version_help
    }
}

arg_builders!(OptionSpec);

/// A positional parameter occupying one or more index slots.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{PositionalSpec, Range, ValueType};
///
/// let source = PositionalSpec::at(0, "<source>").with_type(ValueType::Path);
/// assert!(source.is_required());
///
/// let rest = PositionalSpec::new(Range::at_least(1), "<files>").list();
/// assert!(rest.covers(7));
/// assert!(!rest.is_required());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionalSpec {
    /// Index range covered.
    pub index: Range,
    /// Shared argument properties.
    #[serde(flatten)]
    pub arg: ArgSpec,
}

impl PositionalSpec {
    /// Creates a positional covering `index` with the given label.
    pub fn new(index: Range, label: &str) -> Self {
        Self {
            index,
            arg: ArgSpec {
                param_label: Some(label.to_string()),
                ..Default::default()
            },
        }
    }

    /// Creates a positional at a single index.
    pub fn at(index: usize, label: &str) -> Self {
        Self::new(Range::exactly(index), label)
    }

    /// Identifying key: the parameter label.
    pub fn key(&self) -> &str {
        self.arg.param_label.as_deref().unwrap_or("<param>")
    }

    /// Returns `true` if this positional occupies slot `index`.
    pub fn covers(&self, index: usize) -> bool {
        self.index.contains(index)
    }

    /// Whether the positional must be matched.
    ///
    /// Explicitly required, an explicit arity with a non-zero minimum, or
    /// an unspecified arity on a scalar.
    pub fn is_required(&self) -> bool {
        if self.arg.required {
            return true;
        }
        match self.arg.arity {
            Some(arity) => arity.min > 0,
            None => !self.arg.is_multi_value(),
        }
    }
}

impl Default for PositionalSpec {
    fn default() -> Self {
        Self {
            index: Range::exactly(0),
            arg: ArgSpec::default(),
        }
    }
}

arg_builders!(PositionalSpec);

/// Identity of an argument within one [`CommandSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArgId {
    /// Index into [`CommandSpec::options`].
    Option(usize),
    /// Index into [`CommandSpec::positionals`].
    Positional(usize),
}

fn default_true() -> bool {
    true
}

fn default_multiplicity() -> Range {
    Range::between(0, 1)
}

/// A group of arguments with joint constraints.
///
/// Members are referenced by key: an option's longest name or a
/// positional's label. Exclusive groups allow at most one member per
/// repetition; non-exclusive groups require every required member on each
/// repetition (the dependency form).
///
/// # Examples
///
/// ```
/// use command_grammar_core::{ArgGroupSpec, Range};
///
/// let either = ArgGroupSpec::exclusive(&["-x", "-y"]);
/// assert_eq!(either.synopsis(), "[-x | -y]");
///
/// let pair = ArgGroupSpec::dependent(&["-a", "-b"]).with_multiplicity(Range::at_least(0));
/// assert_eq!(pair.synopsis(), "[-a -b]...");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgGroupSpec {
    /// Optional identifying name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Section heading for usage help.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    /// At most one member may match per repetition.
    #[serde(default = "default_true")]
    pub exclusive: bool,
    /// How many repetitions of the group may appear.
    #[serde(default = "default_multiplicity")]
    pub multiplicity: Range,
    /// Member argument keys, in declaration order.
    pub members: Vec<String>,
    /// Nested groups.
    pub subgroups: Vec<ArgGroupSpec>,
    /// Name of the mixin this group was copied from during build.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mixin: Option<String>,
}

impl Default for ArgGroupSpec {
    fn default() -> Self {
        Self {
            name: None,
            heading: None,
            exclusive: true,
            multiplicity: default_multiplicity(),
            members: Vec::new(),
            subgroups: Vec::new(),
            mixin: None,
        }
    }
}

impl ArgGroupSpec {
    /// Creates an exclusive group over `members`.
    pub fn exclusive(members: &[&str]) -> Self {
        Self {
            members: members.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Creates a non-exclusive (co-occurring) group over `members`.
    pub fn dependent(members: &[&str]) -> Self {
        Self {
            exclusive: false,
            ..Self::exclusive(members)
        }
    }

    /// Sets the multiplicity.
    pub fn with_multiplicity(mut self, multiplicity: Range) -> Self {
        self.multiplicity = multiplicity;
        self
    }

    /// Sets the name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Sets the heading.
    pub fn with_heading(mut self, heading: &str) -> Self {
        self.heading = Some(heading.to_string());
        self
    }

    /// Adds a nested group.
    pub fn with_subgroup(mut self, group: ArgGroupSpec) -> Self {
        self.subgroups.push(group);
        self
    }

    /// All member keys of this group and its subgroups.
    pub fn all_members(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.members.iter().map(String::as_str).collect();
        for sub in &self.subgroups {
            keys.extend(sub.all_members());
        }
        keys
    }

    /// Compact synopsis such as `(-x | -y)` or `[-a -b]...`.
    pub fn synopsis(&self) -> String {
        let sep = if self.exclusive { " | " } else { " " };
        let parts: Vec<String> = self
            .members
            .iter()
            .cloned()
            .chain(self.subgroups.iter().map(ArgGroupSpec::synopsis))
            .collect();
        let body = parts.join(sep);
        let mut text = if self.multiplicity.min == 0 {
            format!("[{body}]")
        } else {
            format!("({body})")
        };
        if self.multiplicity.max != Some(1) && self.multiplicity.max != Some(0) {
            text.push_str("...");
        }
        text
    }

    /// Display name: the declared name, or the synopsis.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.synopsis())
    }
}

/// One command or subcommand in the grammar.
///
/// Build the tree with the `with_*` methods, then call
/// [`build`](CommandSpec::build) to flatten mixins and validate it.
///
/// # Examples
///
/// ```
/// use command_grammar_core::*;
///
/// let git = CommandSpec::new("git")
///     .with_option(OptionSpec::flag(&["-v", "--verbose"]))
///     .with_subcommand(
///         CommandSpec::new("commit")
///             .with_option(OptionSpec::with_value(&["-m", "--message"], ValueType::String))
///             .with_positional(PositionalSpec::new(Range::at_least(0), "<pathspec>").list()),
///     )
///     .build()
///     .unwrap();
///
/// assert_eq!(git.subcommand_names(), vec!["commit"]);
/// assert!(git.find_option("--verbose", false).is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CommandSpec {
    /// Command name.
    pub name: String,
    /// Alternative names.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Short description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Version text printed for version help.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Options, in declaration order.
    pub options: Vec<OptionSpec>,
    /// Positional parameters, in declaration order.
    pub positionals: Vec<PositionalSpec>,
    /// Argument groups.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<ArgGroupSpec>,
    /// Subcommands.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subcommands: Vec<CommandSpec>,
    /// Reusable fragments merged into this command on build.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mixins: Vec<CommandSpec>,
    /// Parser configuration.
    pub parser: ParserConfig,
}

impl CommandSpec {
    /// Creates an empty command.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds an option.
    pub fn with_option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    /// Adds a positional parameter.
    pub fn with_positional(mut self, positional: PositionalSpec) -> Self {
        self.positionals.push(positional);
        self
    }

    /// Adds an argument group.
    pub fn with_group(mut self, group: ArgGroupSpec) -> Self {
        self.groups.push(group);
        self
    }

    /// Adds a subcommand.
    pub fn with_subcommand(mut self, sub: CommandSpec) -> Self {
        self.subcommands.push(sub);
        self
    }

    /// Adds a mixin.
    pub fn with_mixin(mut self, mixin: CommandSpec) -> Self {
        self.mixins.push(mixin);
        self
    }

    /// Adds an alias.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Sets the version text.
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    /// Replaces the parser configuration.
    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }

    /// Finds an option by one of its declared names.
    pub fn find_option(&self, name: &str, case_insensitive: bool) -> Option<usize> {
        self.options.iter().position(|o| {
            o.names
                .iter()
                .any(|n| n == name || (case_insensitive && n.eq_ignore_ascii_case(name)))
        })
    }

    /// Finds a subcommand by name or alias.
    pub fn find_subcommand(&self, name: &str, case_insensitive: bool) -> Option<usize> {
        let eq = |candidate: &str| {
            candidate == name || (case_insensitive && candidate.eq_ignore_ascii_case(name))
        };
        self.subcommands
            .iter()
            .position(|s| eq(&s.name) || s.aliases.iter().any(|a| eq(a)))
    }

    /// Gets all subcommand names.
    pub fn subcommand_names(&self) -> Vec<&str> {
        self.subcommands.iter().map(|s| s.name.as_str()).collect()
    }

    /// Indices of positionals covering slot `index`, in declaration order.
    pub fn positionals_at(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.positionals
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.covers(index))
            .map(|(i, _)| i)
    }

    /// Shared properties of an argument.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this command.
    pub fn arg(&self, id: ArgId) -> &ArgSpec {
        match id {
            ArgId::Option(i) => &self.options[i].arg,
            ArgId::Positional(i) => &self.positionals[i].arg,
        }
    }

    /// Identifying key of an argument.
    pub fn arg_key(&self, id: ArgId) -> &str {
        match id {
            ArgId::Option(i) => self.options[i].key(),
            ArgId::Positional(i) => self.positionals[i].key(),
        }
    }

    /// Resolves a key (any option name, or a positional label).
    pub fn resolve_key(&self, key: &str) -> Option<ArgId> {
        self.options
            .iter()
            .position(|o| o.matches(key))
            .map(ArgId::Option)
            .or_else(|| {
                self.positionals
                    .iter()
                    .position(|p| p.key() == key)
                    .map(ArgId::Positional)
            })
    }

    /// Every argument that belongs to some group.
    pub fn grouped_args(&self) -> Vec<ArgId> {
        self.groups
            .iter()
            .flat_map(ArgGroupSpec::all_members)
            .filter_map(|key| self.resolve_key(key))
            .collect()
    }

    /// Iterates over all argument ids, options first.
    pub fn arg_ids(&self) -> impl Iterator<Item = ArgId> + '_ {
        (0..self.options.len())
            .map(ArgId::Option)
            .chain((0..self.positionals.len()).map(ArgId::Positional))
    }

    /// Returns `true` if a positional slot past the declared ones exists
    /// (an open-ended index range).
    pub fn has_open_positional(&self) -> bool {
        self.positionals.iter().any(|p| p.index.is_unbounded())
    }
}
