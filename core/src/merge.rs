//! Mixin flattening and model build.
//!
//! A mixin is a reusable [`CommandSpec`] fragment whose options, positional
//! parameters and groups are copied into the host command when the model is
//! built. Copies are tagged with the mixin's name so a later build can strip
//! and recompute them, which keeps [`CommandSpec::build`] idempotent.
//!
//! # Example
//!
//! ```
//! use command_grammar_core::*;
//!
//! let logging = CommandSpec::new("logging")
//!     .with_option(OptionSpec::flag(&["-q", "--quiet"]));
//!
//! let cmd = CommandSpec::new("tool").with_mixin(logging).build().unwrap();
//! assert_eq!(cmd.options.len(), 1);
//! assert_eq!(cmd.options[0].arg.mixin.as_deref(), Some("logging"));
//!
//! // Building again yields the same model.
//! assert_eq!(cmd.clone().build().unwrap(), cmd);
//! ```

use crate::{CommandSpec, ModelError, validate_spec};

impl CommandSpec {
    /// Flattens mixins and validates the whole tree.
    ///
    /// # Errors
    ///
    /// Returns the first [`ModelError`] found. Model errors are programming
    /// errors in the grammar, never user-input errors.
    pub fn build(mut self) -> Result<Self, ModelError> {
        flatten_mixins(&mut self);
        match validate_spec(&self).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Copies mixin members into `spec`, recursively through mixins and
/// subcommands.
pub(crate) fn flatten_mixins(spec: &mut CommandSpec) {
    spec.options.retain(|o| o.arg.mixin.is_none());
    spec.positionals.retain(|p| p.arg.mixin.is_none());
    spec.groups.retain(|g| g.mixin.is_none());

    for mixin in &mut spec.mixins {
        flatten_mixins(mixin);
    }
    for sub in &mut spec.subcommands {
        flatten_mixins(sub);
    }

    let mut options = Vec::new();
    let mut positionals = Vec::new();
    let mut groups = Vec::new();

    for mixin in &spec.mixins {
        let tag = Some(mixin.name.clone());
        options.extend(mixin.options.iter().cloned().map(|mut o| {
            o.arg.mixin = tag.clone();
            o
        }));
        positionals.extend(mixin.positionals.iter().cloned().map(|mut p| {
            p.arg.mixin = tag.clone();
            p
        }));
        groups.extend(mixin.groups.iter().cloned().map(|mut g| {
            g.mixin = tag.clone();
            g
        }));
    }

    spec.options.extend(options);
    spec.positionals.extend(positionals);
    spec.groups.extend(groups);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArgGroupSpec, OptionSpec, PositionalSpec, ValueType};

    fn logging() -> CommandSpec {
        CommandSpec::new("logging")
            .with_option(OptionSpec::flag(&["-q", "--quiet"]))
            .with_option(OptionSpec::flag(&["--debug"]))
            .with_group(ArgGroupSpec::exclusive(&["--quiet", "--debug"]))
    }

    #[test]
    fn test_flatten_appends_tagged_members() {
        let cmd = CommandSpec::new("tool")
            .with_option(OptionSpec::with_value(&["-o"], ValueType::Path))
            .with_mixin(logging())
            .build()
            .unwrap();

        let keys: Vec<&str> = cmd.options.iter().map(|o| o.key()).collect();
        assert_eq!(keys, vec!["-o", "--quiet", "--debug"]);
        assert_eq!(cmd.options[0].arg.mixin, None);
        assert_eq!(cmd.groups.len(), 1);
        assert_eq!(cmd.groups[0].mixin.as_deref(), Some("logging"));
    }

    #[test]
    fn test_nested_mixins_flatten_through() {
        let outer = CommandSpec::new("common")
            .with_positional(PositionalSpec::at(0, "<target>"))
            .with_mixin(logging());
        let cmd = CommandSpec::new("tool").with_mixin(outer).build().unwrap();

        assert_eq!(cmd.options.len(), 2);
        assert!(cmd.options.iter().all(|o| o.arg.mixin.as_deref() == Some("common")));
        assert_eq!(cmd.positionals.len(), 1);
    }

    #[test]
    fn test_build_is_idempotent() {
        let spec = CommandSpec::new("tool")
            .with_mixin(logging())
            .with_subcommand(CommandSpec::new("run").with_mixin(logging()));
        let once = spec.clone().build().unwrap();
        let twice = once.clone().build().unwrap();
        assert_eq!(once, twice);
        assert_eq!(spec.build().unwrap(), once);
    }

    #[test]
    fn test_mixin_conflict_is_model_error() {
        let err = CommandSpec::new("tool")
            .with_option(OptionSpec::flag(&["-q"]))
            .with_mixin(logging())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::MixinConflict {
                command: "tool".to_string(),
                mixin: "logging".to_string(),
                name: "-q".to_string(),
            }
        );
    }
}
