use std::cell::RefCell;
use std::rc::Rc;

use command_grammar_core::*;
use command_grammar_engine::{
    CommandLine, ConversionError, EnvDefaults, ParameterError, ScriptedPrompter, Value, ValueCell,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn strs(items: &[&str]) -> Value {
    Value::List(items.iter().map(|s| Value::Str(s.to_string())).collect())
}

/// `-o` list option plus a catch-all positional for leftover tokens.
fn list_command(option: OptionSpec) -> CommandLine {
    let spec = CommandSpec::new("tool")
        .with_option(option)
        .with_positional(PositionalSpec::new(Range::at_least(0), "<rest>").list());
    CommandLine::new(spec).unwrap()
}

fn list_option() -> OptionSpec {
    OptionSpec::with_value(&["-o", "--output"], ValueType::String).list()
}

fn git() -> CommandLine {
    let spec = CommandSpec::new("git")
        .with_option(OptionSpec::flag(&["--no-pager"]))
        .with_option(OptionSpec::help())
        .with_subcommand(
            CommandSpec::new("commit")
                .with_alias("ci")
                .with_option(
                    OptionSpec::with_value(&["-m", "--message"], ValueType::String).required(),
                )
                .with_option(OptionSpec::flag(&["-a", "--all"]))
                .with_option(OptionSpec::help()),
        )
        .with_subcommand(
            CommandSpec::new("remote").with_subcommand(
                CommandSpec::new("add")
                    .with_positional(PositionalSpec::at(0, "<name>"))
                    .with_positional(PositionalSpec::at(1, "<url>")),
            ),
        );
    CommandLine::new(spec).unwrap()
}

// ---------------------------------------------------------------------------
// Arity and accumulation
// ---------------------------------------------------------------------------

#[test]
fn test_default_arity_takes_one_value() {
    let mut cli = list_command(list_option());
    let result = cli.parse(&["-o", "1", "2", "3"]).unwrap();
    assert_eq!(result.option_value("-o"), Some(&strs(&["1"])));
    assert_eq!(result.positional_tokens(), ["2", "3"]);
}

#[test]
fn test_variable_arity_takes_all_values() {
    let mut cli = list_command(list_option().with_arity(Range::at_least(1)));
    let result = cli.parse(&["-o", "1", "2", "3"]).unwrap();
    assert_eq!(result.option_value("--output"), Some(&strs(&["1", "2", "3"])));
    assert!(result.positional_tokens().is_empty());
}

#[test]
fn test_variable_arity_stops_at_options() {
    let spec = CommandSpec::new("tool")
        .with_option(list_option().with_arity(Range::between(0, 3)))
        .with_option(OptionSpec::flag(&["-v"]));
    let mut cli = CommandLine::new(spec).unwrap();
    let result = cli.parse(&["-o", "a", "-v"]).unwrap();
    assert_eq!(result.option_value("-o"), Some(&strs(&["a"])));
    assert_eq!(result.option_value("-v"), Some(&Value::Bool(true)));
}

#[test]
fn test_repeated_option_accumulates() {
    let mut cli = list_command(list_option());
    let result = cli.parse(&["-o", "1", "--output", "2", "-o3"]).unwrap();
    assert_eq!(result.option_value("-o"), Some(&strs(&["1", "2", "3"])));
    assert_eq!(result.matched_option("-o").count(), 3);
}

#[test]
fn test_split_value_counts_as_one_token() {
    let mut cli = list_command(list_option().with_split(",").with_arity(Range::exactly(1)));
    let result = cli.parse(&["-o", "a,b,c", "x"]).unwrap();
    assert_eq!(result.option_value("-o"), Some(&strs(&["a", "b", "c"])));
    assert_eq!(result.positional_tokens(), ["x"]);
}

#[test]
fn test_missing_option_value() {
    let mut cli = list_command(list_option());
    let err = cli.parse(&["-o"]).unwrap_err();
    assert!(matches!(err, ParameterError::MissingParameter { .. }), "{err}");
}

#[test]
fn test_set_drops_duplicates() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::with_value(&["-t"], ValueType::String).set());
    let mut cli = CommandLine::new(spec).unwrap();
    let result = cli.parse(&["-t", "a", "-t", "b", "-t", "a"]).unwrap();
    assert_eq!(result.option_value("-t"), Some(&strs(&["a", "b"])));
}

#[test]
fn test_map_entries() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::with_value(&["-D"], ValueType::Integer).map(ValueType::String));
    let mut cli = CommandLine::new(spec).unwrap();
    let result = cli.parse(&["-D", "a=1", "-Db=2", "-D", "a=3"]).unwrap();
    let map = result.option_value("-D").unwrap();
    assert_eq!(map.get("a"), Some(&Value::Int(3)));
    assert_eq!(map.get("b"), Some(&Value::Int(2)));

    let err = cli.parse(&["-D", "novalue"]).unwrap_err();
    assert!(matches!(err, ParameterError::TypeConversion { .. }), "{err}");
}

#[test]
fn test_positional_variable_arity_takes_all_values() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::flag(&["-v"]))
        .with_positional(PositionalSpec::at(0, "<files>").list().with_arity(Range::at_least(1)));
    let mut cli = CommandLine::new(spec).unwrap();

    let result = cli.parse(&["a", "b", "c"]).unwrap();
    assert_eq!(result.positional_value("<files>"), Some(&strs(&["a", "b", "c"])));
    assert_eq!(result.matched_positional("<files>").count(), 1);

    let result = cli.parse(&["-v", "a", "b"]).unwrap();
    assert!(result.has_matched_option("-v"));
    assert_eq!(result.positional_value("<files>"), Some(&strs(&["a", "b"])));
}

#[test]
fn test_positional_arity_fills_before_next_index() {
    let spec = CommandSpec::new("tool")
        .with_positional(PositionalSpec::at(0, "<pair>").list().with_arity(Range::between(1, 2)))
        .with_positional(PositionalSpec::at(1, "<last>"));
    let mut cli = CommandLine::new(spec).unwrap();

    let result = cli.parse(&["a", "b", "c"]).unwrap();
    assert_eq!(result.positional_value("<pair>"), Some(&strs(&["a", "b"])));
    assert_eq!(result.positional_value("<last>"), Some(&Value::Str("c".into())));
    assert!(result.unmatched().is_empty());
}

// ---------------------------------------------------------------------------
// Option syntax
// ---------------------------------------------------------------------------

#[test]
fn test_short_cluster_with_attached_value() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::flag(&["-a"]))
        .with_option(OptionSpec::flag(&["-b"]))
        .with_option(OptionSpec::with_value(&["-c"], ValueType::Integer));
    let mut cli = CommandLine::new(spec).unwrap();
    let result = cli.parse(&["-abc=5"]).unwrap();
    assert_eq!(result.option_value("-a"), Some(&Value::Bool(true)));
    assert_eq!(result.option_value("-b"), Some(&Value::Bool(true)));
    assert_eq!(result.option_value("-c"), Some(&Value::Int(5)));

    let result = cli.parse(&["-ab", "-c", "7"]).unwrap();
    assert_eq!(result.option_value("-c"), Some(&Value::Int(7)));
}

#[test]
fn test_end_of_options_delimiter() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::flag(&["-v"]))
        .with_positional(PositionalSpec::new(Range::at_least(0), "<files>").list());
    let mut cli = CommandLine::new(spec).unwrap();
    let result = cli.parse(&["-v", "--", "-v", "--"]).unwrap();
    assert_eq!(result.positional_tokens(), ["-v", "--"]);
    assert_eq!(result.matched_option("-v").count(), 1);
}

#[test]
fn test_negatable_and_boolean_values() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::flag(&["--backup"]).negatable())
        .with_option(OptionSpec::flag(&["--color"]).with_arity(Range::between(0, 1)));
    let mut cli = CommandLine::new(spec).unwrap();

    let result = cli.parse(&["--no-backup", "--color", "false"]).unwrap();
    assert_eq!(result.option_value("--backup"), Some(&Value::Bool(false)));
    assert_eq!(result.option_value("--color"), Some(&Value::Bool(false)));
    assert!(result.has_matched_option("--no-backup"));

    let result = cli.parse(&["--backup=false"]).unwrap();
    assert_eq!(result.option_value("--backup"), Some(&Value::Bool(false)));
}

#[test]
fn test_toggle_boolean_flags() {
    let spec = CommandSpec::new("tool").with_option(OptionSpec::flag(&["-x"]).with_default("true"));
    let mut cli = CommandLine::new(spec).unwrap();
    cli.configure(|c| {
        c.toggle_boolean_flags = true;
        c.overwritten_options_allowed = true;
    });
    let result = cli.parse(&["-x"]).unwrap();
    assert_eq!(result.option_value("-x"), Some(&Value::Bool(false)));
    let result = cli.parse(&["-x", "-x"]).unwrap();
    assert_eq!(result.option_value("-x"), Some(&Value::Bool(true)));
}

#[test]
fn test_abbreviated_options() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::with_value(&["--sort-key"], ValueType::String))
        .with_option(OptionSpec::with_value(&["--sort-order"], ValueType::String));
    let mut cli = CommandLine::new(spec).unwrap();
    assert!(matches!(
        cli.parse(&["--s-k", "name"]).unwrap_err(),
        ParameterError::UnmatchedArgument { .. }
    ));

    cli.set_abbreviated_options(true);
    let result = cli.parse(&["--s-k", "name", "--sort-o=asc"]).unwrap();
    assert_eq!(result.option_value("--sort-key"), Some(&Value::Str("name".into())));
    assert_eq!(result.option_value("--sort-order"), Some(&Value::Str("asc".into())));

    let err = cli.parse(&["--sort", "x"]).unwrap_err();
    match err {
        ParameterError::AmbiguousOption { candidates, .. } => {
            assert_eq!(candidates, vec!["--sort-key", "--sort-order"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_case_insensitive_options_and_choices() {
    let format = ValueType::Choice(vec!["json".into(), "yaml".into()]);
    let spec = CommandSpec::new("tool").with_option(OptionSpec::with_value(&["--format"], format));
    let mut cli = CommandLine::new(spec).unwrap();
    assert!(cli.parse(&["--FORMAT", "json"]).is_err());

    cli.configure(|c| {
        c.case_insensitive_options = true;
        c.case_insensitive_enum_values = true;
    });
    let result = cli.parse(&["--FORMAT", "YAML"]).unwrap();
    assert_eq!(result.option_value("--format"), Some(&Value::Str("yaml".into())));
}

#[test]
fn test_trim_quotes() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::with_value(&["-t"], ValueType::String));
    let mut cli = CommandLine::new(spec).unwrap();
    cli.configure(|c| c.trim_quotes = true);
    let result = cli.parse(&["-t", "\"two words\""]).unwrap();
    assert_eq!(result.option_value("-t"), Some(&Value::Str("two words".into())));
}

// ---------------------------------------------------------------------------
// Overwriting and unmatched input
// ---------------------------------------------------------------------------

#[test]
fn test_overwritten_option() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::with_value(&["-n"], ValueType::Integer));
    let mut cli = CommandLine::new(spec).unwrap();
    let err = cli.parse(&["-n", "1", "-n", "2"]).unwrap_err();
    assert!(matches!(err, ParameterError::OverwrittenOption { .. }), "{err}");

    cli.set_overwritten_options_allowed(true);
    let result = cli.parse(&["-n", "1", "-n", "2"]).unwrap();
    assert_eq!(result.option_value("-n"), Some(&Value::Int(2)));
}

#[test]
fn test_unmatched_arguments() {
    let spec = CommandSpec::new("tool").with_option(OptionSpec::flag(&["-v"]));
    let mut cli = CommandLine::new(spec).unwrap();
    let err = cli.parse(&["-v", "--nope", "extra"]).unwrap_err();
    match err {
        ParameterError::UnmatchedArgument { tokens, index, .. } => {
            assert_eq!(tokens, vec!["--nope"]);
            assert_eq!(index, 1);
        }
        other => panic!("unexpected error: {other}"),
    }

    cli.set_unmatched_arguments_allowed(true);
    let result = cli.parse(&["-v", "--nope", "extra"]).unwrap();
    assert_eq!(result.unmatched(), ["--nope", "extra"]);
}

#[test]
fn test_stop_at_positional() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::flag(&["-v"]))
        .with_positional(PositionalSpec::new(Range::at_least(0), "<args>").list());
    let mut cli = CommandLine::new(spec).unwrap();
    cli.configure(|c| c.stop_at_positional = true);
    let result = cli.parse(&["-v", "run", "-v"]).unwrap();
    assert_eq!(result.positional_tokens(), ["run", "-v"]);
    assert_eq!(result.matched_option("-v").count(), 1);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn test_missing_required_reported_together() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::with_value(&["-n", "--name"], ValueType::String).required())
        .with_option(OptionSpec::with_value(&["--age"], ValueType::Integer).required())
        .with_option(OptionSpec::flag(&["-v"]))
        .with_positional(PositionalSpec::at(0, "<file>"));
    let mut cli = CommandLine::new(spec).unwrap();
    let err = cli.parse(&["-v"]).unwrap_err();
    match &err {
        ParameterError::MissingParameter { missing, .. } => {
            assert_eq!(missing, &vec!["--name", "--age", "<file>"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        err.to_string(),
        "tool: missing required arguments: --name, --age, <file>"
    );
}

#[test]
fn test_help_skips_required_checks() {
    let mut git = git();
    let result = git.parse(&["commit", "--help"]).unwrap();
    assert!(result.is_usage_help_requested());
    assert!(!result.subcommand().unwrap().has_matched_option("-m"));
}

#[test]
fn test_type_conversion_error() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::with_value(&["-n"], ValueType::Integer));
    let mut cli = CommandLine::new(spec).unwrap();
    match cli.parse(&["-n", "ten"]).unwrap_err() {
        ParameterError::TypeConversion { arg, token, target, .. } => {
            assert_eq!(arg, "-n");
            assert_eq!(token, "ten");
            assert_eq!(target, "integer");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_integer_with_doubled_sign_is_rejected() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::with_value(&["-n"], ValueType::Integer));
    let mut cli = CommandLine::new(spec).unwrap();
    for token in ["-n=--5", "-n=-+5"] {
        let err = cli.parse(&[token]).unwrap_err();
        assert!(matches!(err, ParameterError::TypeConversion { .. }), "{token}: {err}");
    }
    let result = cli.parse(&["-n=-5"]).unwrap();
    assert_eq!(result.option_value("-n"), Some(&Value::Int(-5)));
}

#[test]
fn test_collect_errors() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::with_value(&["-n"], ValueType::Integer))
        .with_option(OptionSpec::with_value(&["--name"], ValueType::String).required())
        .with_option(OptionSpec::flag(&["-v"]));
    let mut cli = CommandLine::new(spec).unwrap();
    cli.set_collect_errors(true);
    let verbose = ValueCell::new();
    cli.bind("-v", verbose.clone()).unwrap();

    let result = cli.parse(&["-n", "x", "--bogus", "-v"]).unwrap();
    let errors = result.errors();
    assert_eq!(errors.len(), 3, "{errors:?}");
    assert!(matches!(errors[0], ParameterError::TypeConversion { .. }));
    assert!(matches!(errors[1], ParameterError::UnmatchedArgument { .. }));
    assert!(matches!(errors[2], ParameterError::MissingParameter { .. }));
    assert_eq!(verbose.value(), Some(Value::Bool(true)));
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

#[test]
fn test_subcommand_dispatch() {
    let mut git = git();
    let result = git.parse(&["--no-pager", "ci", "-am", "fix bug"]).unwrap();
    assert!(result.has_matched_option("--no-pager"));

    let commit = result.subcommand().unwrap();
    assert_eq!(commit.command_name(), "commit");
    assert_eq!(commit.command_path(), ["git", "commit"]);
    assert_eq!(commit.option_value("--all"), Some(&Value::Bool(true)));
    assert_eq!(commit.option_value("-m"), Some(&Value::Str("fix bug".into())));

    let path: Vec<&str> = git.parsed_path(&result).iter().map(|c| c.name()).collect();
    assert_eq!(path, ["git", "commit"]);
    assert!(git.last_result().is_some());
}

#[test]
fn test_nested_subcommands() {
    let mut git = git();
    let result = git
        .parse(&["remote", "add", "origin", "https://example.com/repo.git"])
        .unwrap();
    let add = result.deepest();
    assert_eq!(add.command_path(), ["git", "remote", "add"]);
    assert_eq!(add.positional_value("<name>"), Some(&Value::Str("origin".into())));
    assert_eq!(result.levels().len(), 3);
}

#[test]
fn test_subcommand_errors_name_the_subcommand() {
    let mut git = git();
    let err = git.parse(&["commit", "-a"]).unwrap_err();
    assert_eq!(err.command(), "git commit");
    assert!(err.to_string().contains("--message"), "{err}");

    let err = git.parse(&["remote", "add", "origin"]).unwrap_err();
    assert_eq!(err.command(), "git remote add");
}

// ---------------------------------------------------------------------------
// Defaults, bindings, conversion, prompting
// ---------------------------------------------------------------------------

#[test]
fn test_defaults_and_provider() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::with_value(&["--level"], ValueType::String).with_default("info"))
        .with_option(OptionSpec::with_value(&["--retries"], ValueType::Integer).with_default("3"))
        .with_positional(PositionalSpec::at(0, "<dir>").with_default("."));
    let mut cli = CommandLine::new(spec).unwrap();

    let result = cli.parse::<&str>(&[]).unwrap();
    assert_eq!(result.option_value("--level"), Some(&Value::Str("info".into())));
    assert_eq!(result.positional_value("<dir>"), Some(&Value::Str(".".into())));
    assert!(result.values().iter().all(|v| v.from_default));

    cli.set_default_provider(EnvDefaults::from_pairs("TOOL_", [("TOOL_RETRIES", "9")]));
    let result = cli.parse(&["--level", "debug"]).unwrap();
    assert_eq!(result.option_value("--retries"), Some(&Value::Int(9)));
    assert_eq!(result.option_value("--level"), Some(&Value::Str("debug".into())));
}

#[derive(Debug, Default)]
struct Settings {
    verbose: bool,
    jobs: u32,
    include: Vec<String>,
}

#[test]
fn test_field_bindings() {
    let spec = CommandSpec::new("build")
        .with_option(OptionSpec::flag(&["-v", "--verbose"]))
        .with_option(
            OptionSpec::with_value(&["-j", "--jobs"], ValueType::Unsigned).with_default("1"),
        )
        .with_option(OptionSpec::with_value(&["-I"], ValueType::String).list());
    let mut cli = CommandLine::new(spec).unwrap();

    let settings = Rc::new(RefCell::new(Settings::default()));
    cli.bind_field("--verbose", &settings, |s| &mut s.verbose).unwrap();
    cli.bind_field("-j", &settings, |s| &mut s.jobs).unwrap();
    cli.bind_field("-I", &settings, |s| &mut s.include).unwrap();

    cli.parse(&["-v", "-I", "src", "-I", "include"]).unwrap();
    let settings = settings.borrow();
    assert!(settings.verbose);
    assert_eq!(settings.jobs, 1);
    assert_eq!(settings.include, vec!["src", "include"]);
}

#[test]
fn test_binding_type_mismatch() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::with_value(&["-n"], ValueType::String));
    let mut cli = CommandLine::new(spec).unwrap();
    let host = Rc::new(RefCell::new(Settings::default()));
    cli.bind_field("-n", &host, |s| &mut s.jobs).unwrap();
    let err = cli.parse(&["-n", "many"]).unwrap_err();
    assert!(matches!(err, ParameterError::Binding { .. }), "{err}");
}

#[test]
fn test_custom_converters() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::with_value(&["--level"], ValueType::Custom("percent".into())))
        .with_option(OptionSpec::with_value(&["--name"], ValueType::String).with_converter("upper"))
        .with_subcommand(
            CommandSpec::new("run").with_option(OptionSpec::with_value(
                &["--at"],
                ValueType::Custom("percent".into()),
            )),
        );
    let mut cli = CommandLine::new(spec).unwrap();
    assert!(matches!(
        cli.parse(&["--level", "50%"]).unwrap_err(),
        ParameterError::TypeConversion {
            source: ConversionError::Unresolved { .. },
            ..
        }
    ));

    cli.register_converter(ValueType::Custom("percent".into()), |raw| {
        raw.trim_end_matches('%')
            .parse::<u64>()
            .map(Value::UInt)
            .map_err(|e| ConversionError::Message(e.to_string()))
    });
    cli.register_named_converter("upper", |raw| Ok(Value::Str(raw.to_uppercase())));

    let result = cli.parse(&["--level", "50%", "--name", "ada", "run", "--at", "10%"]).unwrap();
    assert_eq!(result.option_value("--level"), Some(&Value::UInt(50)));
    assert_eq!(result.option_value("--name"), Some(&Value::Str("ADA".into())));
    assert_eq!(result.subcommand().unwrap().option_value("--at"), Some(&Value::UInt(10)));
}

#[test]
fn test_builtin_types() {
    let spec = CommandSpec::new("tool")
        .with_option(OptionSpec::with_value(&["--timeout"], ValueType::Duration))
        .with_option(OptionSpec::with_value(&["--addr"], ValueType::SocketAddr))
        .with_option(OptionSpec::with_value(&["--ratio"], ValueType::Float));
    let mut cli = CommandLine::new(spec).unwrap();
    let result = cli
        .parse(&["--timeout", "1m 30s", "--addr", "127.0.0.1:8080", "--ratio", "-0.5"])
        .unwrap();
    assert_eq!(
        result.option_value("--timeout"),
        Some(&Value::Duration(std::time::Duration::from_secs(90)))
    );
    assert_eq!(
        result.option_value("--addr"),
        Some(&Value::Socket("127.0.0.1:8080".parse().unwrap()))
    );
    assert_eq!(result.option_value("--ratio"), Some(&Value::Float(-0.5)));
}

#[test]
fn test_interactive_option_prompts() {
    let spec = CommandSpec::new("login")
        .with_option(OptionSpec::with_value(&["-u", "--user"], ValueType::String))
        .with_option(
            OptionSpec::with_value(&["-p", "--password"], ValueType::String).interactive(),
        );
    let mut cli = CommandLine::new(spec).unwrap();
    let prompter = ScriptedPrompter::new(["s3cret"]);
    cli.set_prompter(prompter.clone());

    let result = cli.parse(&["-p", "-u", "ada"]).unwrap();
    assert_eq!(result.option_value("--password"), Some(&Value::Str("s3cret".into())));
    assert_eq!(result.option_value("--user"), Some(&Value::Str("ada".into())));
    assert_eq!(prompter.prompts(), vec!["Enter value for --password: "]);

    let err = cli.parse(&["-p"]).unwrap_err();
    assert!(matches!(err, ParameterError::Prompt { .. }), "{err}");
}

#[test]
fn test_parse_is_repeatable() {
    let mut cli = list_command(list_option());
    let first = cli.parse(&["-o", "a", "b"]).unwrap();
    let second = cli.parse(&["-o", "a", "b"]).unwrap();
    assert_eq!(first.values(), second.values());
    assert_eq!(first.matched_args(), second.matched_args());
}

#[test]
fn test_building_twice_is_idempotent() {
    let common = CommandSpec::new("common").with_option(OptionSpec::flag(&["-q", "--quiet"]));
    let spec = CommandSpec::new("tool")
        .with_mixin(common)
        .with_option(OptionSpec::flag(&["-v"]))
        .with_subcommand(CommandSpec::new("run"));
    let once = spec.build().unwrap();
    let twice = once.clone().build().unwrap();
    assert_eq!(once, twice);
    assert_eq!(once.options.len(), 2);

    let mut cli = CommandLine::new(twice).unwrap();
    assert!(cli.parse(&["-q"]).unwrap().has_matched_option("--quiet"));
}
