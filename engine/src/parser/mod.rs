//! The token-matching state machine.
//!
//! One [`Level`] parses the tokens belonging to one command. It walks the
//! (already at-file expanded) arguments left to right:
//!
//! 1. after the end-of-options delimiter every token is positional;
//! 2. a subcommand name validates this level and hands the remaining
//!    tokens to the subcommand;
//! 3. a declared option (exact, `name=value`, short cluster, abbreviation)
//!    consumes its values according to its arity;
//! 4. an unknown option-like token is unmatched;
//! 5. anything else fills the next positional slot.
//!
//! Optional value slots (between an arity's minimum and maximum) are filled
//! until a token looks like an option, a subcommand, or the delimiter. One
//! positional occurrence fills one index slot, however many values it takes.

mod lookup;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use command_grammar_core::{
    ArgGroupSpec, ArgId, ArgSpec, CommandSpec, Container, ParserConfig, Range, ValueType,
};
use regex::Regex;
use tracing::{debug, warn};

use crate::command_line::{DefaultProvider, Prompter};
use crate::convert::{ConversionError, ConverterRegistry};
use crate::groups;
use crate::{
    Binding, CommandLine, GroupMatch, MatchedArg, ParameterError, ParseResult, ResolvedValue, Value,
};

use lookup::{Hit, OptionTable, Resolution};

/// State shared across all levels of one parse.
pub(crate) struct ParseContext<'p> {
    prompter: &'p mut dyn Prompter,
    collect: bool,
    errors: Vec<ParameterError>,
}

impl ParseContext<'_> {
    /// Records an error, or returns it when errors are not collected.
    fn fail(&mut self, error: ParameterError) -> Result<(), ParameterError> {
        if self.collect {
            debug!(%error, "collected parse error");
            self.errors.push(error);
            Ok(())
        } else {
            Err(error)
        }
    }
}

/// Parses `args` against the root command of `cmd`.
pub(crate) fn parse_root(
    cmd: &mut CommandLine,
    args: &[String],
) -> Result<ParseResult, ParameterError> {
    let path = vec![cmd.spec.name.clone()];
    let (level, prompter) = split(cmd, path);
    let mut ctx = ParseContext {
        prompter,
        collect: level.config.collect_errors,
        errors: Vec::new(),
    };
    let mut result = level.parse(args, 0, &mut ctx, false)?;
    result.errors = ctx.errors;
    Ok(result)
}

fn split(cmd: &mut CommandLine, path: Vec<String>) -> (Level<'_>, &mut dyn Prompter) {
    let CommandLine {
        spec,
        registry,
        bindings,
        defaults,
        prompter,
        subcommands,
        ..
    } = cmd;
    let spec: &CommandSpec = spec;
    let splitters = spec
        .arg_ids()
        .filter_map(|id| {
            let pattern = spec.arg(id).split_regex.as_deref()?;
            Regex::new(pattern).ok().map(|re| (id, re))
        })
        .collect();
    let mut repeatable = HashSet::new();
    for group in &spec.groups {
        collect_repeatable(spec, group, false, &mut repeatable);
    }
    let level = Level {
        spec,
        config: &spec.parser,
        table: OptionTable::new(spec, &spec.parser),
        registry,
        bindings,
        subcommands: subcommands.as_mut_slice(),
        defaults: defaults.as_deref(),
        splitters,
        repeatable,
        path,
    };
    (level, &mut **prompter)
}

/// Members of groups that may occur more than once, directly or through an
/// enclosing group. Their scalar values legitimately change between
/// repetitions.
fn collect_repeatable(
    spec: &CommandSpec,
    group: &ArgGroupSpec,
    inherited: bool,
    out: &mut HashSet<ArgId>,
) {
    let repeats = inherited || group.multiplicity.max != Some(1);
    if repeats {
        out.extend(group.members.iter().filter_map(|key| spec.resolve_key(key)));
    }
    for sub in &group.subgroups {
        collect_repeatable(spec, sub, repeats, out);
    }
}

/// Per-level parse progress.
#[derive(Default)]
struct State {
    matched: Vec<MatchedArg>,
    values: HashMap<ArgId, Value>,
    unmatched: Vec<String>,
    position: usize,
    end_of_options: bool,
    usage_help: bool,
    version_help: bool,
    groups: Vec<GroupMatch>,
    subcommand: Option<Box<ParseResult>>,
}

struct Level<'a> {
    spec: &'a CommandSpec,
    config: &'a ParserConfig,
    table: OptionTable<'a>,
    registry: &'a ConverterRegistry,
    bindings: &'a mut HashMap<ArgId, Box<dyn Binding>>,
    subcommands: &'a mut [CommandLine],
    defaults: Option<&'a dyn DefaultProvider>,
    splitters: HashMap<ArgId, Regex>,
    repeatable: HashSet<ArgId>,
    path: Vec<String>,
}

impl Level<'_> {
    fn command(&self) -> String {
        self.path.join(" ")
    }

    fn parse(
        mut self,
        args: &[String],
        start: usize,
        ctx: &mut ParseContext<'_>,
        parent_help: bool,
    ) -> Result<ParseResult, ParameterError> {
        let mut state = State::default();
        let mut validated = false;
        let mut i = start;

        while i < args.len() {
            let token = &args[i];
            if state.end_of_options {
                i += self.positional(args, i, &mut state, ctx)?;
                continue;
            }
            if *token == self.config.end_of_options_delimiter {
                debug!(command = %self.command(), index = i, "end of options");
                state.end_of_options = true;
                i += 1;
                continue;
            }
            if let Some(index) = self
                .spec
                .find_subcommand(token, self.config.case_insensitive_subcommands)
            {
                let help = parent_help || state.usage_help || state.version_help;
                state.groups = self.validate(&state, ctx, help)?;
                validated = true;
                let sub = self.dispatch(index, args, i + 1, ctx, help)?;
                state.subcommand = Some(Box::new(sub));
                break;
            }
            match self.table.resolve(token) {
                Resolution::Options(hits) => {
                    i = self.options(hits, args, i, &mut state, ctx)?;
                }
                Resolution::Ambiguous(candidates) => {
                    ctx.fail(ParameterError::AmbiguousOption {
                        command: self.command(),
                        token: token.clone(),
                        candidates,
                    })?;
                    i += 1;
                }
                Resolution::Unknown
                    if self.table.resembles_option(token)
                        && !self.config.unmatched_options_are_positional =>
                {
                    i += self.unmatched(args, i, &mut state, ctx)?;
                }
                Resolution::Unknown => {
                    i += self.positional(args, i, &mut state, ctx)?;
                }
            }
        }

        if !validated {
            let help = parent_help || state.usage_help || state.version_help;
            state.groups = self.validate(&state, ctx, help)?;
        }
        let values = self.apply_defaults(&state, ctx)?;

        Ok(ParseResult {
            command: self.spec.name.clone(),
            command_path: self.path.clone(),
            original_args: args[start.min(args.len())..].to_vec(),
            matched: state.matched,
            values,
            unmatched: state.unmatched,
            groups: state.groups,
            usage_help_requested: state.usage_help,
            version_help_requested: state.version_help,
            subcommand: state.subcommand,
            errors: Vec::new(),
        })
    }

    fn dispatch(
        &mut self,
        index: usize,
        args: &[String],
        start: usize,
        ctx: &mut ParseContext<'_>,
        help: bool,
    ) -> Result<ParseResult, ParameterError> {
        let mut path = self.path.clone();
        let child = &mut self.subcommands[index];
        path.push(child.spec.name.clone());
        debug!(command = %path.join(" "), start, "dispatching to subcommand");
        let (level, _) = split(child, path);
        level.parse(args, start, ctx, help)
    }

    /// Checks required arguments and groups. Help requests skip the checks
    /// but still report group matches.
    fn validate(
        &self,
        state: &State,
        ctx: &mut ParseContext<'_>,
        help: bool,
    ) -> Result<Vec<GroupMatch>, ParameterError> {
        let command = self.command();
        let check = groups::validate_groups(self.spec, &state.matched, &command);
        if help {
            return Ok(check.matches);
        }

        let grouped: HashSet<ArgId> = self.spec.grouped_args().into_iter().collect();
        let is_missing =
            |id: ArgId| !grouped.contains(&id) && !state.matched.iter().any(|m| m.arg == id);
        let mut missing = Vec::new();
        for (k, opt) in self.spec.options.iter().enumerate() {
            if opt.arg.required && is_missing(ArgId::Option(k)) {
                missing.push(opt.key().to_string());
            }
        }
        for (k, pos) in self.spec.positionals.iter().enumerate() {
            let defaulted = pos.arg.default_value.is_some() && !pos.arg.required;
            if pos.is_required() && !defaulted && is_missing(ArgId::Positional(k)) {
                missing.push(pos.key().to_string());
            }
        }
        // Missing groups join the missing arguments in one report; a missing
        // group on its own keeps its dedicated error.
        let mut group_errors = Vec::new();
        for error in check.errors {
            match error {
                ParameterError::MissingGroup { group, .. } if !missing.is_empty() => {
                    missing.push(group)
                }
                other => group_errors.push(other),
            }
        }
        if !missing.is_empty() {
            ctx.fail(ParameterError::MissingParameter {
                command: command.clone(),
                missing,
                detail: None,
            })?;
        }
        for error in group_errors {
            ctx.fail(error)?;
        }
        Ok(check.matches)
    }

    /// Handles the options recognized in one token and returns the index
    /// of the next unconsumed token. Only the last option of a cluster may
    /// consume following tokens.
    fn options(
        &mut self,
        hits: Vec<Hit>,
        args: &[String],
        i: usize,
        state: &mut State,
        ctx: &mut ParseContext<'_>,
    ) -> Result<usize, ParameterError> {
        let mut next = i + 1;
        let last = hits.len().saturating_sub(1);
        for (k, hit) in hits.into_iter().enumerate() {
            if let Err(error) = self.option(hit, args, &mut next, k == last, i, state, ctx) {
                ctx.fail(error)?;
            }
        }
        Ok(next)
    }

    #[allow(clippy::too_many_arguments)]
    fn option(
        &mut self,
        hit: Hit,
        args: &[String],
        next: &mut usize,
        can_consume: bool,
        position: usize,
        state: &mut State,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ParameterError> {
        let spec = self.spec;
        let opt = &spec.options[hit.option];
        let id = ArgId::Option(hit.option);
        state.usage_help |= opt.usage_help;
        state.version_help |= opt.version_help;

        if opt.arg.interactive {
            let raw = match hit.attached {
                Some(value) => value,
                None => self.interactive_value(id, &opt.arg, args, next, can_consume, ctx)?,
            };
            return self.apply(id, &hit.name, vec![raw], position, state);
        }

        if opt.arg.is_boolean() {
            return self.boolean(id, hit, args, next, can_consume, position, state);
        }

        let arity = opt.arg.effective_arity();
        let mut raw: Vec<String> = hit.attached.into_iter().collect();
        if can_consume {
            while raw.len() < arity.min {
                match args.get(*next) {
                    Some(token) if self.fits_mandatory_slot(token) => {
                        raw.push(token.clone());
                        *next += 1;
                    }
                    _ => return Err(self.missing_values(&hit.name, &opt.arg, arity, raw.len())),
                }
            }
            while arity.max.is_none_or(|max| raw.len() < max) {
                match args.get(*next) {
                    Some(token) if self.fits_optional_slot(token) => {
                        raw.push(token.clone());
                        *next += 1;
                    }
                    _ => break,
                }
            }
        } else if raw.len() < arity.min {
            return Err(self.missing_values(&hit.name, &opt.arg, arity, raw.len()));
        }

        if arity.exceeded_by(raw.len()) {
            return Err(ParameterError::MaxValuesExceeded {
                command: self.command(),
                arg: hit.name,
                max: arity.max.unwrap_or_default(),
                count: raw.len(),
            });
        }
        self.apply(id, &hit.name, raw, position, state)
    }

    #[allow(clippy::too_many_arguments)]
    fn boolean(
        &mut self,
        id: ArgId,
        hit: Hit,
        args: &[String],
        next: &mut usize,
        can_consume: bool,
        position: usize,
        state: &mut State,
    ) -> Result<(), ParameterError> {
        let arg = self.spec.arg(id);
        let arity = arg.effective_arity();
        let explicit = match hit.attached {
            Some(value) => Some(value),
            None if can_consume && arity.max != Some(0) => match args.get(*next) {
                Some(token) if crate::convert::parse_bool(token).is_some() || arity.min > 0 => {
                    *next += 1;
                    Some(token.clone())
                }
                None if arity.min > 0 => return Err(self.missing_values(&hit.name, arg, arity, 0)),
                _ => None,
            },
            None => None,
        };

        let mut flag = match &explicit {
            Some(raw) => match self.convert_value(id, raw)? {
                Value::Bool(b) => b,
                other => {
                    return Err(self.conversion_error(
                        id,
                        raw,
                        ConversionError::Message(format!(
                            "expected a boolean, got {}",
                            other.type_name()
                        )),
                    ));
                }
            },
            None if self.config.toggle_boolean_flags => !self.current_bool(id, state),
            None => true,
        };
        if hit.negated {
            flag = !flag;
        }
        let tokens = explicit.into_iter().collect();
        self.record(id, &hit.name, tokens, vec![Value::Bool(flag)], position, state)
    }

    fn current_bool(&self, id: ArgId, state: &State) -> bool {
        state
            .values
            .get(&id)
            .and_then(Value::as_bool)
            .or_else(|| self.bindings.get(&id).and_then(|b| b.get()).and_then(|v| v.as_bool()))
            .or_else(|| {
                self.spec
                    .arg(id)
                    .default_value
                    .as_deref()
                    .and_then(crate::convert::parse_bool)
            })
            .unwrap_or(false)
    }

    fn interactive_value(
        &self,
        id: ArgId,
        arg: &ArgSpec,
        args: &[String],
        next: &mut usize,
        can_consume: bool,
        ctx: &mut ParseContext<'_>,
    ) -> Result<String, ParameterError> {
        if can_consume && arg.effective_arity().max != Some(0) {
            if let Some(token) = args.get(*next).filter(|t| self.fits_optional_slot(t)) {
                *next += 1;
                return Ok(token.clone());
            }
        }
        let key = self.spec.arg_key(id);
        let prompt = match &arg.description {
            Some(desc) => format!("Enter value for {key} ({desc}): "),
            None => format!("Enter value for {key}: "),
        };
        ctx.prompter
            .read_secret(&prompt)
            .map_err(|source| ParameterError::Prompt {
                command: self.command(),
                arg: key.to_string(),
                source: Arc::new(source),
            })
    }

    fn fits_mandatory_slot(&self, token: &str) -> bool {
        if *token == self.config.end_of_options_delimiter {
            return false;
        }
        if self.table.is_declared(token) {
            return self.config.allow_options_as_option_parameters;
        }
        if self.table.resembles_option(token) {
            return self.config.allow_unmatched_options_as_option_parameters;
        }
        true
    }

    fn fits_optional_slot(&self, token: &str) -> bool {
        *token != self.config.end_of_options_delimiter
            && self
                .spec
                .find_subcommand(token, self.config.case_insensitive_subcommands)
                .is_none()
            && !self.table.is_declared(token)
            && !self.table.resembles_option(token)
    }

    fn missing_values(
        &self,
        name: &str,
        arg: &ArgSpec,
        arity: Range,
        found: usize,
    ) -> ParameterError {
        ParameterError::MissingParameter {
            command: self.command(),
            missing: vec![format!("{name}={}", arg.label())],
            detail: Some(format!("expected {} value(s), found {found}", arity.min)),
        }
    }

    /// Fills positional slots starting at the current position and returns
    /// the number of tokens consumed.
    fn positional(
        &mut self,
        args: &[String],
        i: usize,
        state: &mut State,
        ctx: &mut ParseContext<'_>,
    ) -> Result<usize, ParameterError> {
        let spec = self.spec;
        let covering: Vec<usize> = spec.positionals_at(state.position).collect();
        if covering.is_empty() {
            return self.unmatched(args, i, state, ctx);
        }

        let arities: Vec<Range> = covering
            .iter()
            .map(|&p| spec.positionals[p].arg.effective_arity())
            .collect();
        let wanted = arities.iter().map(|a| a.min.max(1)).max().unwrap_or(1);
        let capacity = arities
            .iter()
            .map(|a| a.max.unwrap_or(usize::MAX))
            .max()
            .unwrap_or(1);

        // Mandatory values first, then optional ones up to the widest arity.
        let mut tokens = vec![args[i].clone()];
        while tokens.len() < capacity.max(wanted) {
            match args.get(i + tokens.len()) {
                Some(token) if state.end_of_options || self.fits_optional_slot(token) => {
                    tokens.push(token.clone());
                }
                _ => break,
            }
        }

        for &p in &covering {
            let pos = &spec.positionals[p];
            let arity = pos.arg.effective_arity();
            if tokens.len() < arity.min {
                ctx.fail(self.missing_values(pos.key(), &pos.arg, arity, tokens.len()))?;
                continue;
            }
            let take = tokens.len().min(arity.max.unwrap_or(usize::MAX).max(1));
            let values = tokens[..take].to_vec();
            if let Err(error) = self.apply(ArgId::Positional(p), pos.key(), values, i, state) {
                ctx.fail(error)?;
            }
        }

        // One occurrence fills one index slot, however many values it took.
        state.position += 1;
        if self.config.stop_at_positional && !state.end_of_options {
            debug!(command = %self.command(), "positional seen, treating the rest as positional");
            state.end_of_options = true;
        }
        Ok(tokens.len())
    }

    /// Handles a token nothing matched and returns the number of tokens
    /// consumed (all remaining ones when `stop_at_unmatched` is set).
    fn unmatched(
        &mut self,
        args: &[String],
        i: usize,
        state: &mut State,
        ctx: &mut ParseContext<'_>,
    ) -> Result<usize, ParameterError> {
        let tokens: Vec<String> = if self.config.stop_at_unmatched {
            args[i..].to_vec()
        } else {
            vec![args[i].clone()]
        };
        let consumed = tokens.len();
        state.unmatched.extend(tokens.iter().cloned());
        if self.config.unmatched_arguments_allowed {
            debug!(command = %self.command(), ?tokens, "unmatched arguments allowed");
        } else {
            ctx.fail(ParameterError::UnmatchedArgument {
                command: self.command(),
                tokens,
                index: i,
            })?;
        }
        Ok(consumed)
    }

    fn conversion_error(&self, id: ArgId, token: &str, source: ConversionError) -> ParameterError {
        ParameterError::TypeConversion {
            command: self.command(),
            arg: self.spec.arg_key(id).to_string(),
            token: token.to_string(),
            target: self.spec.arg(id).value_type.type_name().to_string(),
            source,
        }
    }

    fn convert_value(&self, id: ArgId, raw: &str) -> Result<Value, ParameterError> {
        let arg = self.spec.arg(id);
        self.registry
            .convert(
                raw,
                &arg.value_type,
                &arg.converters,
                self.config.case_insensitive_enum_values,
            )
            .map_err(|source| self.conversion_error(id, raw, source))
    }

    fn convert_key(
        &self,
        id: ArgId,
        key_type: &ValueType,
        raw: &str,
    ) -> Result<Value, ParameterError> {
        self.registry
            .convert(raw, key_type, &[], self.config.case_insensitive_enum_values)
            .map_err(|source| self.conversion_error(id, raw, source))
    }

    /// Raw tokens after quote trimming and regex splitting.
    fn pieces(&self, id: ArgId, tokens: &[String]) -> Vec<String> {
        let mut pieces = Vec::new();
        for token in tokens {
            let text = if self.config.trim_quotes {
                trim_quotes(token)
            } else {
                token.as_str()
            };
            match self.splitters.get(&id) {
                Some(re) => pieces.extend(re.split(text).map(str::to_string)),
                None => pieces.push(text.to_string()),
            }
        }
        pieces
    }

    fn convert_values(&self, id: ArgId, tokens: &[String]) -> Result<Vec<Value>, ParameterError> {
        self.pieces(id, tokens)
            .iter()
            .map(|piece| self.convert_value(id, piece))
            .collect()
    }

    fn convert_entries(
        &self,
        id: ArgId,
        key_type: &ValueType,
        tokens: &[String],
    ) -> Result<Vec<(Value, Value)>, ParameterError> {
        let separator = self.config.map_separator.as_str();
        self.pieces(id, tokens)
            .iter()
            .map(|piece| -> Result<(Value, Value), ParameterError> {
                let (key, value) = piece
                    .split_once(separator)
                    .filter(|_| !separator.is_empty())
                    .ok_or_else(|| {
                        self.conversion_error(
                            id,
                            piece,
                            ConversionError::Invalid {
                                value: piece.clone(),
                                target: "map entry".to_string(),
                                reason: format!("expected key{separator}value"),
                            },
                        )
                    })?;
                Ok((self.convert_key(id, key_type, key)?, self.convert_value(id, value)?))
            })
            .collect()
    }

    /// Converts the tokens of one occurrence and merges them into the
    /// accumulated value of the argument.
    fn apply(
        &mut self,
        id: ArgId,
        name: &str,
        tokens: Vec<String>,
        position: usize,
        state: &mut State,
    ) -> Result<(), ParameterError> {
        let spec = self.spec;
        let arg = spec.arg(id);
        match &arg.container {
            Container::Map { key_type } => {
                let entries = self.convert_entries(id, key_type, &tokens)?;
                if !entries.is_empty() {
                    let accumulated =
                        state.values.entry(id).or_insert_with(|| Value::Map(Vec::new()));
                    if let Value::Map(pairs) = accumulated {
                        for (key, value) in &entries {
                            match pairs.iter_mut().find(|(k, _)| k == key) {
                                Some(slot)
                                    if slot.1 != *value && !self.config.map_key_overwrite_allowed =>
                                {
                                    return Err(ParameterError::OverwrittenOption {
                                        command: self.command(),
                                        option: format!("{} {key}", spec.arg_key(id)),
                                        previous: slot.1.to_string(),
                                        value: value.to_string(),
                                    });
                                }
                                Some(slot) => slot.1 = value.clone(),
                                None => pairs.push((key.clone(), value.clone())),
                            }
                        }
                    }
                }
                let occurrence = (!entries.is_empty()).then(|| Value::Map(entries));
                self.finish_match(id, name, tokens, occurrence, position, state)
            }
            _ => {
                let values = self.convert_values(id, &tokens)?;
                self.record(id, name, tokens, values, position, state)
            }
        }
    }

    /// Merges converted scalar or collection values, binds the result and
    /// records the match.
    fn record(
        &mut self,
        id: ArgId,
        name: &str,
        tokens: Vec<String>,
        mut values: Vec<Value>,
        position: usize,
        state: &mut State,
    ) -> Result<(), ParameterError> {
        let spec = self.spec;
        let arg = spec.arg(id);
        let occurrence = match arg.container {
            Container::Scalar => match values.pop() {
                None => None,
                Some(value) => {
                    if let Some(previous) = state.values.get(&id) {
                        if *previous != value && !self.repeatable.contains(&id) {
                            if !self.config.overwritten_options_allowed {
                                return Err(ParameterError::OverwrittenOption {
                                    command: self.command(),
                                    option: spec.arg_key(id).to_string(),
                                    previous: previous.to_string(),
                                    value: value.to_string(),
                                });
                            }
                            warn!(
                                command = %self.command(),
                                option = spec.arg_key(id),
                                %previous,
                                %value,
                                "option overwritten"
                            );
                        }
                    }
                    state.values.insert(id, value.clone());
                    Some(value)
                }
            },
            _ if values.is_empty() => None,
            _ => {
                let dedup = arg.container == Container::Set;
                let accumulated = state.values.entry(id).or_insert_with(|| Value::List(Vec::new()));
                if let Value::List(items) = accumulated {
                    for value in &values {
                        if !(dedup && items.contains(value)) {
                            items.push(value.clone());
                        }
                    }
                }
                Some(Value::List(values))
            }
        };
        self.finish_match(id, name, tokens, occurrence, position, state)
    }

    fn finish_match(
        &mut self,
        id: ArgId,
        name: &str,
        tokens: Vec<String>,
        value: Option<Value>,
        position: usize,
        state: &mut State,
    ) -> Result<(), ParameterError> {
        let key = self.spec.arg_key(id).to_string();
        let current = state.values.get(&id);
        if let (Some(binding), Some(current)) = (self.bindings.get_mut(&id), current) {
            binding
                .set(current.clone())
                .map_err(|source| ParameterError::Binding {
                    command: self.path.join(" "),
                    arg: key.clone(),
                    source,
                })?;
        }
        if self.spec.arg(id).interactive {
            debug!(command = %self.command(), arg = %key, "matched interactive argument");
        } else {
            debug!(command = %self.command(), arg = %key, name, ?tokens, "matched argument");
        }
        state.matched.push(MatchedArg {
            arg: id,
            key,
            name: name.to_string(),
            names: self.names(id),
            tokens,
            value,
            position,
        });
        Ok(())
    }

    fn names(&self, id: ArgId) -> Vec<String> {
        match id {
            ArgId::Option(i) => {
                let opt = &self.spec.options[i];
                opt.names.iter().cloned().chain(opt.negated_names()).collect()
            }
            ArgId::Positional(i) => vec![self.spec.positionals[i].key().to_string()],
        }
    }

    /// Final values: matched values first, then defaults from the default
    /// provider or the declared default for everything else.
    fn apply_defaults(
        &mut self,
        state: &State,
        ctx: &mut ParseContext<'_>,
    ) -> Result<Vec<ResolvedValue>, ParameterError> {
        let spec = self.spec;
        let command = self.command();
        let mut resolved = Vec::new();
        for id in spec.arg_ids() {
            let key = spec.arg_key(id);
            if let Some(value) = state.values.get(&id) {
                resolved.push(ResolvedValue {
                    arg: id,
                    key: key.to_string(),
                    names: self.names(id),
                    value: value.clone(),
                    from_default: false,
                });
                continue;
            }
            let raw = self
                .defaults
                .and_then(|provider| provider.default_value(&command, key))
                .or_else(|| spec.arg(id).default_value.clone());
            let Some(raw) = raw else {
                continue;
            };
            let value = match self.convert_default(id, &raw) {
                Ok(value) => value,
                Err(error) => {
                    ctx.fail(error)?;
                    continue;
                }
            };
            if let Some(binding) = self.bindings.get_mut(&id) {
                if let Err(source) = binding.set(value.clone()) {
                    ctx.fail(ParameterError::Binding {
                        command: command.clone(),
                        arg: key.to_string(),
                        source,
                    })?;
                    continue;
                }
            }
            debug!(command = %command, arg = key, %value, "applied default");
            resolved.push(ResolvedValue {
                arg: id,
                key: key.to_string(),
                names: self.names(id),
                value,
                from_default: true,
            });
        }
        Ok(resolved)
    }

    fn convert_default(&self, id: ArgId, raw: &str) -> Result<Value, ParameterError> {
        let arg = self.spec.arg(id);
        let tokens = [raw.to_string()];
        match &arg.container {
            Container::Scalar => self.convert_value(id, raw),
            Container::List => Ok(Value::List(self.convert_values(id, &tokens)?)),
            Container::Set => {
                let mut items: Vec<Value> = Vec::new();
                for value in self.convert_values(id, &tokens)? {
                    if !items.contains(&value) {
                        items.push(value);
                    }
                }
                Ok(Value::List(items))
            }
            Container::Map { key_type } => {
                let mut pairs: Vec<(Value, Value)> = Vec::new();
                for (key, value) in self.convert_entries(id, key_type, &tokens)? {
                    match pairs.iter_mut().find(|(k, _)| *k == key) {
                        Some(slot) => slot.1 = value,
                        None => pairs.push((key, value)),
                    }
                }
                Ok(Value::Map(pairs))
            }
        }
    }
}

/// Strips one level of surrounding double quotes.
fn trim_quotes(token: &str) -> &str {
    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        &token[1..token.len() - 1]
    } else {
        token
    }
}
