//! Reporting every problem in a command line at once.
//!
//! Parses a deliberately broken command line twice: first stopping at the
//! first error, then with `collect_errors` so the result lists them all.
//! Also shows an argument file and a repeating option group.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p command-grammar-demos --example collect_errors
//! ```

use std::io::Write;

use command_grammar_core::{ArgGroupSpec, CommandSpec, OptionSpec, Range, ValueType};
use command_grammar_engine::CommandLine;

fn grammar() -> CommandSpec {
    CommandSpec::new("route")
        .with_option(OptionSpec::with_value(&["--from"], ValueType::String).required())
        .with_option(OptionSpec::with_value(&["--to"], ValueType::String).required())
        .with_option(
            OptionSpec::with_value(&["--timeout"], ValueType::Duration).with_default("30s"),
        )
        .with_option(OptionSpec::with_value(&["--name"], ValueType::String).required())
        .with_group(
            ArgGroupSpec::dependent(&["--from", "--to"]).with_multiplicity(Range::at_least(1)),
        )
}

fn main() {
    let mut route = CommandLine::new(grammar()).unwrap();
    let broken = ["--from", "a", "--timeout", "soon", "--bogus"];

    match route.parse(&broken) {
        Ok(_) => println!("unexpectedly parsed"),
        Err(err) => println!("first error only:\n  {err}\n"),
    }

    route.set_collect_errors(true);
    let result = route.parse(&broken).unwrap();
    println!("all errors:");
    for err in result.errors() {
        println!("  {err}");
    }
    println!();

    // Hops from an argument file, repeated pairs form group repetitions.
    let path = std::env::temp_dir().join("command_grammar_route_args.txt");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "# hops").unwrap();
    writeln!(file, "--from a --to b").unwrap();
    writeln!(file, "--from b --to c").unwrap();
    drop(file);

    let at_file = format!("@{}", path.display());
    let result = route.parse(&[at_file.as_str(), "--name", "scenic"]).unwrap();
    for (i, rep) in result.group_matches()[0].repetitions.iter().enumerate() {
        let from = rep.value("--from").map(ToString::to_string).unwrap_or_default();
        let to = rep.value("--to").map(ToString::to_string).unwrap_or_default();
        println!("hop {}: {from} -> {to}", i + 1);
    }
    println!("timeout: {:?}", result.option_value("--timeout"));

    std::fs::remove_file(&path).ok();
}
