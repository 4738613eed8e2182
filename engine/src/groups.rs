//! Argument group validation.
//!
//! Runs after matching for one command level. Each group's matched events
//! are partitioned into repetitions; every repetition is checked for
//! exclusivity or for its required members, nested groups first, and the
//! repetition count is then checked against the group's multiplicity.

use std::collections::HashSet;

use command_grammar_core::{ArgGroupSpec, ArgId, CommandSpec};

use crate::{GroupMatch, GroupRepetition, MatchedArg, ParameterError, Value};

/// Group matches and violations for one command level.
#[derive(Debug, Default)]
pub(crate) struct GroupCheck {
    pub matches: Vec<GroupMatch>,
    pub errors: Vec<ParameterError>,
}

/// Which part of a group an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Direct(ArgId),
    Subgroup(usize),
}

struct Validator<'a> {
    spec: &'a CommandSpec,
    command: &'a str,
    errors: Vec<ParameterError>,
}

pub(crate) fn validate_groups(
    spec: &CommandSpec,
    matched: &[MatchedArg],
    command: &str,
) -> GroupCheck {
    let mut validator = Validator {
        spec,
        command,
        errors: Vec::new(),
    };
    let matches = spec
        .groups
        .iter()
        .map(|group| {
            let members = validator.member_ids(group);
            let events: Vec<&MatchedArg> =
                matched.iter().filter(|m| members.contains(&m.arg)).collect();
            validator.validate_group(group, &events)
        })
        .collect();
    GroupCheck {
        matches,
        errors: validator.errors,
    }
}

impl Validator<'_> {
    fn member_ids(&self, group: &ArgGroupSpec) -> HashSet<ArgId> {
        group
            .all_members()
            .into_iter()
            .filter_map(|key| self.spec.resolve_key(key))
            .collect()
    }

    fn direct_ids(&self, group: &ArgGroupSpec) -> Vec<ArgId> {
        group
            .members
            .iter()
            .filter_map(|key| self.spec.resolve_key(key))
            .collect()
    }

    fn unit_of(&self, group: &ArgGroupSpec, id: ArgId) -> Option<Unit> {
        if self.direct_ids(group).contains(&id) {
            return Some(Unit::Direct(id));
        }
        group
            .subgroups
            .iter()
            .position(|sub| self.member_ids(sub).contains(&id))
            .map(Unit::Subgroup)
    }

    fn unit_name(&self, group: &ArgGroupSpec, unit: Unit, events: &[&MatchedArg]) -> String {
        match unit {
            Unit::Direct(id) => events
                .iter()
                .find(|e| e.arg == id)
                .map(|e| e.name.clone())
                .unwrap_or_else(|| self.spec.arg_key(id).to_string()),
            Unit::Subgroup(index) => group.subgroups[index].display_name(),
        }
    }

    /// Splits the events of one group into repetitions.
    ///
    /// In a repeatable group a new repetition starts when a single-valued
    /// argument shows up again, or, for exclusive groups, when a different
    /// member follows.
    fn partition<'e>(
        &self,
        group: &ArgGroupSpec,
        events: &[&'e MatchedArg],
    ) -> Vec<Vec<&'e MatchedArg>> {
        let repeatable = group.multiplicity.max != Some(1);
        let mut repetitions: Vec<Vec<&MatchedArg>> = Vec::new();
        let mut seen: HashSet<ArgId> = HashSet::new();
        let mut units: Vec<Unit> = Vec::new();

        for &event in events {
            let Some(unit) = self.unit_of(group, event.arg) else {
                continue;
            };
            let single_valued = !self.spec.arg(event.arg).is_multi_value();
            let repeated = single_valued && seen.contains(&event.arg);
            let switched = group.exclusive && units.iter().any(|u| *u != unit);
            if repetitions.is_empty() || (repeatable && (repeated || switched)) {
                repetitions.push(Vec::new());
                seen.clear();
                units.clear();
            }
            seen.insert(event.arg);
            if !units.contains(&unit) {
                units.push(unit);
            }
            if let Some(current) = repetitions.last_mut() {
                current.push(event);
            }
        }
        repetitions
    }

    fn validate_group(&mut self, group: &ArgGroupSpec, events: &[&MatchedArg]) -> GroupMatch {
        let repetitions: Vec<GroupRepetition> = self
            .partition(group, events)
            .iter()
            .map(|rep| self.validate_repetition(group, rep))
            .collect();

        let count = repetitions.len();
        if count < group.multiplicity.min {
            self.errors.push(ParameterError::MissingGroup {
                command: self.command.to_string(),
                group: group.display_name(),
            });
        } else if let Some(max) =
            group.multiplicity.max.filter(|_| group.multiplicity.exceeded_by(count))
        {
            self.errors.push(ParameterError::TooManyGroupMatches {
                command: self.command.to_string(),
                group: group.display_name(),
                count,
                max,
            });
        }

        GroupMatch {
            group: group.display_name(),
            repetitions,
        }
    }

    fn validate_repetition(
        &mut self,
        group: &ArgGroupSpec,
        events: &[&MatchedArg],
    ) -> GroupRepetition {
        let mut subgroups = Vec::new();
        for sub in &group.subgroups {
            let members = self.member_ids(sub);
            let sub_events: Vec<&MatchedArg> =
                events.iter().copied().filter(|e| members.contains(&e.arg)).collect();
            if group.exclusive && sub_events.is_empty() {
                continue;
            }
            subgroups.push(self.validate_group(sub, &sub_events));
        }

        let mut units: Vec<Unit> = Vec::new();
        for event in events {
            if let Some(unit) = self.unit_of(group, event.arg) {
                if !units.contains(&unit) {
                    units.push(unit);
                }
            }
        }

        if group.exclusive {
            if let [first, second, ..] = units[..] {
                let error = ParameterError::MutuallyExclusive {
                    command: self.command.to_string(),
                    first: self.unit_name(group, first, events),
                    second: self.unit_name(group, second, events),
                    group: group.synopsis(),
                };
                self.errors.push(error);
            }
        } else {
            let missing: Vec<String> = self
                .direct_ids(group)
                .into_iter()
                .filter(|id| self.is_required_member(*id) && !events.iter().any(|e| e.arg == *id))
                .map(|id| self.spec.arg_key(id).to_string())
                .collect();
            if !missing.is_empty() {
                self.errors.push(ParameterError::MissingParameter {
                    command: self.command.to_string(),
                    missing,
                    detail: Some(group.synopsis()),
                });
            }
        }

        let mut matched: Vec<String> = Vec::new();
        let mut values: Vec<(String, Value)> = Vec::new();
        for event in events {
            if !matched.contains(&event.key) {
                matched.push(event.key.clone());
            }
            let Some(value) = &event.value else {
                continue;
            };
            match values.iter_mut().find(|(k, _)| *k == event.key) {
                Some((_, slot)) => merge(slot, value),
                None => values.push((event.key.clone(), value.clone())),
            }
        }
        GroupRepetition {
            matched,
            values,
            subgroups,
        }
    }

    fn is_required_member(&self, id: ArgId) -> bool {
        match id {
            ArgId::Option(i) => self.spec.options[i].arg.required,
            ArgId::Positional(i) => self.spec.positionals[i].is_required(),
        }
    }
}

/// Adds one occurrence to the value collected for a repetition.
fn merge(slot: &mut Value, value: &Value) {
    match (slot, value) {
        (Value::List(items), Value::List(more)) => items.extend(more.iter().cloned()),
        (Value::Map(pairs), Value::Map(more)) => pairs.extend(more.iter().cloned()),
        (slot, value) => *slot = value.clone(),
    }
}
