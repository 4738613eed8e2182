use command_grammar_core::*;
use command_grammar_engine::{CommandLine, ParameterError, Value};

fn archive() -> CommandLine {
    let spec = CommandSpec::new("archive")
        .with_option(OptionSpec::with_value(&["-x", "--extract"], ValueType::Path))
        .with_option(OptionSpec::with_value(&["-c", "--create"], ValueType::Path))
        .with_option(OptionSpec::flag(&["-v", "--verbose"]))
        .with_option(OptionSpec::help())
        .with_group(
            ArgGroupSpec::exclusive(&["--extract", "--create"])
                .with_multiplicity(Range::exactly(1)),
        );
    CommandLine::new(spec).unwrap()
}

/// `(-a -b)...`: pairs of options that always appear together.
fn pairs(multiplicity: Range) -> CommandLine {
    let spec = CommandSpec::new("pairs")
        .with_option(OptionSpec::with_value(&["-a"], ValueType::Integer).required())
        .with_option(OptionSpec::with_value(&["-b"], ValueType::Integer).required())
        .with_group(ArgGroupSpec::dependent(&["-a", "-b"]).with_multiplicity(multiplicity));
    CommandLine::new(spec).unwrap()
}

// ---------------------------------------------------------------------------
// Exclusive groups
// ---------------------------------------------------------------------------

#[test]
fn test_exclusive_accepts_one_member() {
    let mut cli = archive();
    let result = cli.parse(&["-v", "--create", "out.tar"]).unwrap();
    let groups = result.group_matches();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].group, "(--extract | --create)");
    assert_eq!(groups[0].repetitions[0].matched, vec!["--create"]);
}

#[test]
fn test_exclusive_violation_names_both_options() {
    let mut cli = archive();
    let err = cli.parse(&["-x", "in.tar", "-c", "out.tar"]).unwrap_err();
    match &err {
        ParameterError::MutuallyExclusive { first, second, group, .. } => {
            assert_eq!(first, "-x");
            assert_eq!(second, "-c");
            assert_eq!(group, "(--extract | --create)");
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("-x") && message.contains("-c"), "{message}");
}

#[test]
fn test_required_exclusive_group_missing() {
    let mut cli = archive();
    let err = cli.parse(&["-v"]).unwrap_err();
    assert!(matches!(err, ParameterError::MissingGroup { .. }), "{err}");
    assert_eq!(
        err.to_string(),
        "archive: missing required argument group (--extract | --create)"
    );
}

#[test]
fn test_missing_group_listed_with_missing_arguments() {
    let spec = CommandSpec::new("archive")
        .with_option(OptionSpec::with_value(&["-f", "--file"], ValueType::Path).required())
        .with_option(OptionSpec::flag(&["--extract"]))
        .with_option(OptionSpec::flag(&["--create"]))
        .with_group(
            ArgGroupSpec::exclusive(&["--extract", "--create"])
                .with_multiplicity(Range::exactly(1)),
        );
    let mut cli = CommandLine::new(spec).unwrap();

    let err = cli.parse::<&str>(&[]).unwrap_err();
    match &err {
        ParameterError::MissingParameter { missing, .. } => {
            assert_eq!(missing, &vec!["--file", "(--extract | --create)"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        err.to_string(),
        "archive: missing required arguments: --file, (--extract | --create)"
    );
}

#[test]
fn test_help_skips_group_validation() {
    let mut cli = archive();
    let result = cli.parse(&["--help"]).unwrap();
    assert!(result.is_usage_help_requested());
    assert!(result.group_matches()[0].repetitions.is_empty());
}

// ---------------------------------------------------------------------------
// Dependent and repeating groups
// ---------------------------------------------------------------------------

#[test]
fn test_repeating_group_counts_repetitions() {
    let mut cli = pairs(Range::at_least(0));
    let result = cli.parse(&["-a", "1", "-b", "2", "-a", "3", "-b", "4"]).unwrap();
    let reps = &result.group_matches()[0].repetitions;
    assert_eq!(reps.len(), 2);
    assert_eq!(reps[0].value("-a"), Some(&Value::Int(1)));
    assert_eq!(reps[0].value("-b"), Some(&Value::Int(2)));
    assert_eq!(reps[1].value("-a"), Some(&Value::Int(3)));
    assert_eq!(reps[1].value("-b"), Some(&Value::Int(4)));
    assert_eq!(result.option_value("-a"), Some(&Value::Int(3)));
}

#[test]
fn test_repeating_group_is_optional() {
    let mut cli = pairs(Range::at_least(0));
    let result = cli.parse::<&str>(&[]).unwrap();
    assert!(result.group_matches()[0].repetitions.is_empty());
}

#[test]
fn test_dependent_group_reports_missing_member() {
    let mut cli = pairs(Range::at_least(0));
    let err = cli.parse(&["-a", "1", "-b", "2", "-a", "3"]).unwrap_err();
    match err {
        ParameterError::MissingParameter { missing, detail, .. } => {
            assert_eq!(missing, vec!["-b"]);
            assert_eq!(detail.as_deref(), Some("[-a -b]..."));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_group_multiplicity_upper_bound() {
    let mut cli = pairs(Range::between(1, 2));
    let err = cli
        .parse(&["-a", "1", "-b", "2", "-a", "3", "-b", "4", "-a", "5", "-b", "6"])
        .unwrap_err();
    match err {
        ParameterError::TooManyGroupMatches { count, max, .. } => {
            assert_eq!((count, max), (3, 2));
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = cli.parse::<&str>(&[]).unwrap_err();
    assert!(matches!(err, ParameterError::MissingGroup { .. }), "{err}");
}

// ---------------------------------------------------------------------------
// Nested groups
// ---------------------------------------------------------------------------

fn connect() -> CommandLine {
    let credentials = ArgGroupSpec::dependent(&["--user", "--password"])
        .with_name("credentials")
        .with_multiplicity(Range::exactly(1));
    let spec = CommandSpec::new("connect")
        .with_option(OptionSpec::flag(&["--anonymous"]))
        .with_option(OptionSpec::with_value(&["--user"], ValueType::String).required())
        .with_option(OptionSpec::with_value(&["--password"], ValueType::String).required())
        .with_group(
            ArgGroupSpec::exclusive(&["--anonymous"])
                .with_multiplicity(Range::exactly(1))
                .with_subgroup(credentials),
        );
    CommandLine::new(spec).unwrap()
}

#[test]
fn test_nested_group_satisfies_outer() {
    let mut cli = connect();
    let result = cli.parse(&["--user", "ada", "--password", "pw"]).unwrap();
    let rep = &result.group_matches()[0].repetitions[0];
    assert_eq!(rep.subgroups[0].group, "credentials");
    assert_eq!(rep.subgroups[0].repetitions[0].matched, vec!["--user", "--password"]);

    assert!(cli.parse(&["--anonymous"]).is_ok());
}

#[test]
fn test_nested_group_conflicts_with_sibling() {
    let mut cli = connect();
    let err = cli
        .parse(&["--anonymous", "--user", "ada", "--password", "pw"])
        .unwrap_err();
    match err {
        ParameterError::MutuallyExclusive { first, second, .. } => {
            assert_eq!(first, "--anonymous");
            assert_eq!(second, "credentials");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_nested_errors_come_first() {
    let mut cli = connect();
    cli.set_collect_errors(true);
    let result = cli.parse(&["--user", "ada"]).unwrap();
    let errors = result.errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    match &errors[0] {
        ParameterError::MissingParameter { missing, .. } => {
            assert_eq!(missing, &vec!["--password"])
        }
        other => panic!("unexpected error: {other}"),
    }

    let result = cli.parse(&["--anonymous", "--user", "ada"]).unwrap();
    let errors = result.errors();
    assert_eq!(errors.len(), 2, "{errors:?}");
    assert!(matches!(errors[0], ParameterError::MissingParameter { .. }));
    assert!(matches!(errors[1], ParameterError::MutuallyExclusive { .. }));
}
