//! Option name resolution for one command level.

use command_grammar_core::{CommandSpec, ParserConfig};

/// One option recognized in a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Hit {
    /// Index into `CommandSpec::options`.
    pub option: usize,
    /// Declared name the token resolved to.
    pub name: String,
    /// Matched through a generated `--no-` name.
    pub negated: bool,
    /// Value attached to the name (`--out=x`, `-ox`, `-abc=5`).
    pub attached: Option<String>,
}

/// Outcome of resolving a token against the declared option names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// One option, or several from a short-option cluster.
    Options(Vec<Hit>),
    /// An abbreviation matching more than one option.
    Ambiguous(Vec<String>),
    /// Not a declared option.
    Unknown,
}

struct Name {
    text: String,
    option: usize,
    negated: bool,
}

pub(crate) struct OptionTable<'a> {
    spec: &'a CommandSpec,
    config: &'a ParserConfig,
    names: Vec<Name>,
    prefixes: Vec<char>,
}

impl<'a> OptionTable<'a> {
    pub fn new(spec: &'a CommandSpec, config: &'a ParserConfig) -> Self {
        let mut names = Vec::new();
        for (option, opt) in spec.options.iter().enumerate() {
            for text in &opt.names {
                names.push(Name {
                    text: text.clone(),
                    option,
                    negated: false,
                });
            }
            for text in opt.negated_names() {
                names.push(Name {
                    text,
                    option,
                    negated: true,
                });
            }
        }
        let mut prefixes: Vec<char> = names.iter().filter_map(|n| n.text.chars().next()).collect();
        prefixes.push('-');
        prefixes.sort_unstable();
        prefixes.dedup();
        Self {
            spec,
            config,
            names,
            prefixes,
        }
    }

    fn exact(&self, token: &str) -> Option<&Name> {
        self.names.iter().find(|n| n.text == token).or_else(|| {
            if self.config.case_insensitive_options {
                self.names.iter().find(|n| n.text.eq_ignore_ascii_case(token))
            } else {
                None
            }
        })
    }

    fn hit(name: &Name, attached: Option<String>) -> Hit {
        Hit {
            option: name.option,
            name: name.text.clone(),
            negated: name.negated,
            attached,
        }
    }

    /// Resolves a token: exact name, `name<sep>value`, short-option cluster,
    /// then abbreviation.
    pub fn resolve(&self, token: &str) -> Resolution {
        if let Some(name) = self.exact(token) {
            return Resolution::Options(vec![Self::hit(name, None)]);
        }
        if !self.config.separator.is_empty() {
            if let Some((head, value)) = token.split_once(self.config.separator.as_str()) {
                if let Some(name) = self.exact(head) {
                    return Resolution::Options(vec![Self::hit(name, Some(value.to_string()))]);
                }
            }
        }
        if self.config.posix_clustered_short_options {
            if let Some(hits) = self.cluster(token) {
                return Resolution::Options(hits);
            }
        }
        if self.config.abbreviated_options {
            return self.abbreviation(token);
        }
        Resolution::Unknown
    }

    /// Returns `true` if the token resolves to a declared option.
    pub fn is_declared(&self, token: &str) -> bool {
        !matches!(self.resolve(token), Resolution::Unknown)
    }

    /// Returns `true` if the token looks like an option: it starts with an
    /// option prefix character, is longer than one character, and is not a
    /// number.
    pub fn resembles_option(&self, token: &str) -> bool {
        let Some(first) = token.chars().next() else {
            return false;
        };
        token.len() > 1 && self.prefixes.contains(&first) && token.parse::<f64>().is_err()
    }

    /// Splits `-abc`, `-ofile` and `-abc=5` into individual short options.
    ///
    /// Every character up to the first option that takes a value must be a
    /// declared short option; the remainder becomes that option's value.
    fn cluster(&self, token: &str) -> Option<Vec<Hit>> {
        let mut chars = token.chars();
        let prefix = chars.next()?;
        let body: Vec<char> = chars.collect();
        if body.len() < 2 || body[0] == prefix {
            return None;
        }

        let mut hits = Vec::new();
        let mut k = 0;
        while k < body.len() {
            let short = format!("{prefix}{}", body[k]);
            let name = self.exact(&short)?;
            let arg = &self.spec.options[name.option].arg;
            let rest: String = body[k + 1..].iter().collect();
            let takes_value = !arg.is_boolean() && arg.effective_arity().max != Some(0);

            if rest.is_empty() {
                hits.push(Self::hit(name, None));
                break;
            }
            let separated = rest
                .strip_prefix(self.config.separator.as_str())
                .filter(|_| !self.config.separator.is_empty());
            if let Some(value) = separated {
                hits.push(Self::hit(name, Some(value.to_string())));
                break;
            }
            if takes_value {
                hits.push(Self::hit(name, Some(rest)));
                break;
            }
            hits.push(Self::hit(name, None));
            k += 1;
        }
        Some(hits)
    }

    /// Matches an unambiguous abbreviation of a long name.
    ///
    /// Each hyphen-separated part of the token must be a prefix of the
    /// corresponding part of the name, so `--sort-k` and `--s-k` both match
    /// `--sort-key`.
    fn abbreviation(&self, token: &str) -> Resolution {
        let (head, attached) = match token.split_once(self.config.separator.as_str()) {
            Some((head, value)) if !self.config.separator.is_empty() => {
                (head, Some(value.to_string()))
            }
            _ => (token, None),
        };
        let Some(body) = head.strip_prefix("--") else {
            return Resolution::Unknown;
        };
        if body.is_empty() {
            return Resolution::Unknown;
        }

        let ci = self.config.case_insensitive_options;
        let candidates: Vec<&Name> = self
            .names
            .iter()
            .filter(|n| n.text.strip_prefix("--").is_some_and(|name| abbreviates(body, name, ci)))
            .collect();

        let mut options: Vec<usize> = candidates.iter().map(|n| n.option).collect();
        options.sort_unstable();
        options.dedup();
        match (candidates.first(), options.len()) {
            (Some(name), 1) => Resolution::Options(vec![Self::hit(name, attached)]),
            (_, 0) => Resolution::Unknown,
            _ => Resolution::Ambiguous(candidates.iter().map(|n| n.text.clone()).collect()),
        }
    }
}

fn abbreviates(abbrev: &str, name: &str, case_insensitive: bool) -> bool {
    let starts = |part: &str, prefix: &str| {
        if case_insensitive {
            part.get(..prefix.len()).is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        } else {
            part.starts_with(prefix)
        }
    };
    let abbrev_parts: Vec<&str> = abbrev.split('-').collect();
    let name_parts: Vec<&str> = name.split('-').collect();
    abbrev_parts.len() <= name_parts.len()
        && abbrev_parts
            .iter()
            .zip(&name_parts)
            .all(|(a, n)| starts(n, a))
}
