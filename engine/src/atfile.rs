//! Argument-file (`@file`) expansion.
//!
//! A token `@path` is replaced by the arguments read from `path`, before
//! any matching happens. Files may reference further files. Expansion stops
//! at the end-of-options delimiter, and `@@text` stands for the literal
//! token `@text`.
//!
//! File format (the default mode):
//!
//! ```text
//! # comment lines are skipped
//! --output out.txt
//! --title "two words"   'single quoted'
//! ```
//!
//! In simplified mode each non-comment line is one argument, taken verbatim.

use std::io;
use std::path::PathBuf;

use command_grammar_core::AtFileConfig;
use thiserror::Error;
use tracing::debug;

/// Failure expanding an argument file.
#[derive(Debug, Error)]
pub enum AtFileError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} nests deeper than {max_depth} levels", .path.display())]
    TooDeep { path: PathBuf, max_depth: usize },
}

/// Expands `@file` tokens in `args`.
///
/// Returns the arguments unchanged when expansion is disabled.
///
/// # Errors
///
/// Returns [`AtFileError::Read`] when a referenced file cannot be read, and
/// [`AtFileError::TooDeep`] when files nest past `config.max_depth`.
pub fn expand_at_files(
    args: &[String],
    config: &AtFileConfig,
    delimiter: &str,
) -> Result<Vec<String>, AtFileError> {
    if !config.enabled {
        return Ok(args.to_vec());
    }
    let mut expanded = Vec::with_capacity(args.len());
    let mut past_delimiter = false;
    expand_into(args, config, delimiter, 0, &mut past_delimiter, &mut expanded)?;
    Ok(expanded)
}

fn expand_into(
    args: &[String],
    config: &AtFileConfig,
    delimiter: &str,
    depth: usize,
    past_delimiter: &mut bool,
    out: &mut Vec<String>,
) -> Result<(), AtFileError> {
    for arg in args {
        if *past_delimiter {
            out.push(arg.clone());
            continue;
        }
        if arg == delimiter {
            *past_delimiter = true;
            out.push(arg.clone());
            continue;
        }
        let Some(name) = arg.strip_prefix(config.marker) else {
            out.push(arg.clone());
            continue;
        };
        if name.is_empty() {
            out.push(arg.clone());
            continue;
        }
        if name.starts_with(config.marker) {
            out.push(name.to_string());
            continue;
        }

        let path = PathBuf::from(name);
        if depth >= config.max_depth {
            return Err(AtFileError::TooDeep {
                path,
                max_depth: config.max_depth,
            });
        }
        let text = std::fs::read_to_string(&path).map_err(|source| AtFileError::Read {
            path: path.clone(),
            source,
        })?;
        let tokens = if config.simplified {
            simple_lines(&text, config.comment_char)
        } else {
            tokenize(&text, config.comment_char)
        };
        debug!(path = %path.display(), depth, count = tokens.len(), "expanding argument file");
        expand_into(&tokens, config, delimiter, depth + 1, past_delimiter, out)?;
    }
    Ok(())
}

fn is_comment(line: &str, comment_char: Option<char>) -> bool {
    comment_char.is_some_and(|c| line.trim_start().starts_with(c))
}

fn simple_lines(text: &str, comment_char: Option<char>) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty() && !is_comment(line, comment_char))
        .map(|line| line.trim().to_string())
        .collect()
}

/// Splits file contents on whitespace, honoring single and double quotes.
///
/// Inside double quotes a backslash escapes the next character. A comment
/// character at the start of a token runs to the end of the line.
fn tokenize(text: &str, comment_char: Option<char>) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if !in_token && Some(c) == comment_char => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '"' | '\'' => {
                in_token = true;
                while let Some(q) = chars.next() {
                    if q == c {
                        break;
                    }
                    if q == '\\' && c == '"' {
                        if let Some(escaped) = chars.next() {
                            current.push(escaped);
                        }
                        continue;
                    }
                    current.push(q);
                }
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}
