//! Binding parsed arguments into host structs.
//!
//! Declares a small `git`-like grammar, binds options of the root command
//! and of `commit` to fields of plain structs, and parses a few command
//! lines.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p command-grammar-demos --example git_bindings -- --no-pager commit -am "fix typo"
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use command_grammar_core::{CommandSpec, OptionSpec, PositionalSpec, Range, ValueType};
use command_grammar_engine::CommandLine;

#[derive(Debug, Default)]
struct Global {
    no_pager: bool,
    config: Vec<(String, String)>,
}

#[derive(Debug, Default)]
struct Commit {
    all: bool,
    message: Vec<String>,
    amend: bool,
    paths: Vec<String>,
}

fn grammar() -> CommandSpec {
    CommandSpec::new("git")
        .with_option(OptionSpec::flag(&["--no-pager"]))
        .with_option(OptionSpec::with_value(&["-c"], ValueType::String).map(ValueType::String))
        .with_option(OptionSpec::help())
        .with_subcommand(
            CommandSpec::new("commit")
                .with_alias("ci")
                .with_option(OptionSpec::flag(&["-a", "--all"]))
                .with_option(OptionSpec::with_value(&["-m", "--message"], ValueType::String).list())
                .with_option(OptionSpec::flag(&["--amend"]).negatable())
                .with_option(OptionSpec::help())
                .with_positional(PositionalSpec::new(Range::at_least(0), "<pathspec>").list()),
        )
}

fn main() {
    let global = Rc::new(RefCell::new(Global::default()));
    let commit = Rc::new(RefCell::new(Commit::default()));

    let mut git = match CommandLine::new(grammar()) {
        Ok(git) => git,
        Err(err) => {
            eprintln!("invalid grammar: {err}");
            std::process::exit(1);
        }
    };

    let bound = git
        .bind_field("--no-pager", &global, |g| &mut g.no_pager)
        .and_then(|()| git.bind_field("-c", &global, |g| &mut g.config));
    if let Err(err) = bound {
        eprintln!("{err}");
        std::process::exit(1);
    }
    if let Some(sub) = git.subcommand_mut("commit") {
        let bound = sub
            .bind_field("--all", &commit, |c| &mut c.all)
            .and_then(|()| sub.bind_field("--message", &commit, |c| &mut c.message))
            .and_then(|()| sub.bind_field("--amend", &commit, |c| &mut c.amend))
            .and_then(|()| sub.bind_field("<pathspec>", &commit, |c| &mut c.paths));
        if let Err(err) = bound {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        args = ["-c", "user.name=Ada", "ci", "-am", "fix typo", "-m", "details", "src/lib.rs"]
            .map(String::from)
            .to_vec();
    }

    match git.parse(&args) {
        Ok(result) => {
            if result.is_usage_help_requested() {
                let path: Vec<&str> = git.parsed_path(&result).iter().map(|c| c.name()).collect();
                println!("help requested for '{}'", path.join(" "));
                return;
            }
            println!("{:#?}", global.borrow());
            println!("{:#?}", commit.borrow());
            match serde_json::to_string_pretty(result.deepest()) {
                Ok(json) => println!("{json}"),
                Err(err) => eprintln!("cannot render result: {err}"),
            }
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    }
}
