use std::fmt;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use command_grammar_core::{CommandSpec, ParserConfig, load_grammar};
use command_grammar_engine::{CommandLine, EnvDefaults, ParseResult};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Output format for descriptions and parse results.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "grammar-check")]
#[command(about = "Validate command-line grammars and parse arguments against them")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check one or more grammar files for model errors.
    Validate(ValidateArgs),
    /// Print a grammar after mixins are flattened.
    Describe(DescribeArgs),
    /// Parse arguments against a grammar and print the result.
    Parse(ParseArgs),
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Grammar files (JSON, or YAML with a .yml/.yaml extension).
    #[arg(required = true)]
    grammars: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct DescribeArgs {
    /// Grammar file.
    grammar: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Grammar file.
    grammar: PathBuf,
    /// Parser configuration (YAML) applied to every command in the grammar.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Report every error in the result instead of stopping at the first.
    #[arg(long)]
    collect_errors: bool,
    /// Read defaults from environment variables with this prefix.
    #[arg(long)]
    env_prefix: Option<String>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
    /// Arguments to parse. Put them after `--` when they start with a dash.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// Why a command failed, and the exit code it maps to.
#[derive(Debug)]
enum Failure {
    /// The grammar, configuration, or an I/O operation failed.
    Setup(String),
    /// The parsed arguments were rejected.
    Rejected(String),
}

impl Failure {
    fn exit_code(&self) -> i32 {
        match self {
            Self::Setup(_) => 1,
            Self::Rejected(_) => 2,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup(msg) | Self::Rejected(msg) => f.write_str(msg),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Validate(args) => run_validate(args),
        Command::Describe(args) => run_describe(args),
        Command::Parse(args) => run_parse(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_built(path: &Path) -> Result<CommandSpec, Failure> {
    let spec = load_grammar(path)
        .map_err(|err| Failure::Setup(format!("Failed to load '{}': {err}", path.display())))?;
    spec.build()
        .map_err(|err| Failure::Setup(format!("Invalid grammar '{}': {err}", path.display())))
}

fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String, Failure> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|err| Failure::Setup(format!("Failed to serialize output: {err}"))),
        OutputFormat::Yaml => serde_yaml::to_string(value)
            .map_err(|err| Failure::Setup(format!("Failed to serialize output: {err}"))),
    }
}

fn run_validate(args: ValidateArgs) -> Result<(), Failure> {
    let mut failures = Vec::new();
    for path in &args.grammars {
        match load_built(path) {
            Ok(spec) => debug!(path = %path.display(), command = %spec.name, "grammar is valid"),
            Err(err) => failures.push(err.to_string()),
        }
    }
    if !failures.is_empty() {
        return Err(Failure::Setup(failures.join("\n")));
    }
    println!("Validated {} grammar file(s).", args.grammars.len());
    Ok(())
}

fn run_describe(args: DescribeArgs) -> Result<(), Failure> {
    let spec = load_built(&args.grammar)?;
    println!("{}", render(&spec, args.format)?);
    Ok(())
}

fn run_parse(args: ParseArgs) -> Result<(), Failure> {
    let spec = load_built(&args.grammar)?;
    let mut cli = CommandLine::new(spec).map_err(|err| Failure::Setup(err.to_string()))?;

    if let Some(path) = &args.config {
        let config = ParserConfig::load(path).map_err(|err| {
            Failure::Setup(format!("Failed to load config '{}': {err}", path.display()))
        })?;
        cli.set_config(&config);
    }
    if args.collect_errors {
        cli.set_collect_errors(true);
    }
    if let Some(prefix) = &args.env_prefix {
        cli.set_default_provider(EnvDefaults::capture(prefix));
    }

    let result: ParseResult = cli
        .parse(&args.args)
        .map_err(|err| Failure::Rejected(err.to_string()))?;
    info!(command = %result.deepest().command_path().join(" "), "parsed arguments");
    println!("{}", render(&result, args.format)?);

    if !result.errors().is_empty() {
        let messages: Vec<String> = result.errors().iter().map(ToString::to_string).collect();
        return Err(Failure::Rejected(messages.join("\n")));
    }
    Ok(())
}
