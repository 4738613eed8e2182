//! String-to-value conversion.
//!
//! Every [`ValueType`] except [`ValueType::Custom`] has a built-in
//! converter. Host code can override any type or add new ones with
//! [`ConverterRegistry::register_type`], and can register converters by
//! name for arguments that list them in [`ArgSpec::converters`].
//!
//! [`ArgSpec::converters`]: command_grammar_core::ArgSpec::converters

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use command_grammar_core::ValueType;
use thiserror::Error;

use crate::Value;

/// Why a token could not be converted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The token is not a valid value of the target type.
    #[error("'{value}' is not a valid {target}: {reason}")]
    Invalid {
        value: String,
        target: String,
        reason: String,
    },

    /// The token is not one of the declared choices.
    #[error("'{value}' is not one of {}", .choices.join(", "))]
    InvalidChoice { value: String, choices: Vec<String> },

    /// No converter is registered for a custom type or converter name.
    #[error("no converter registered for '{target}'")]
    Unresolved { target: String },

    /// Free-form failure reported by a host converter.
    #[error("{0}")]
    Message(String),
}

impl ConversionError {
    fn invalid(value: &str, target: &str, reason: impl fmt::Display) -> Self {
        Self::Invalid {
            value: value.to_string(),
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A host-supplied converter.
pub type ConverterFn = Arc<dyn Fn(&str) -> Result<Value, ConversionError> + Send + Sync>;

/// Built-in converters, one per non-custom [`ValueType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Bool,
    String,
    Integer,
    Unsigned,
    Float,
    Char,
    Path,
    Date,
    Time,
    DateTime,
    Duration,
    IpAddr,
    SocketAddr,
    Pattern,
}

impl Builtin {
    /// Built-in converter for a value type. `Choice` and `Custom` have none.
    pub fn for_type(value_type: &ValueType) -> Option<Self> {
        Some(match value_type {
            ValueType::Bool => Self::Bool,
            ValueType::String => Self::String,
            ValueType::Integer => Self::Integer,
            ValueType::Unsigned => Self::Unsigned,
            ValueType::Float => Self::Float,
            ValueType::Char => Self::Char,
            ValueType::Path => Self::Path,
            ValueType::Date => Self::Date,
            ValueType::Time => Self::Time,
            ValueType::DateTime => Self::DateTime,
            ValueType::Duration => Self::Duration,
            ValueType::IpAddr => Self::IpAddr,
            ValueType::SocketAddr => Self::SocketAddr,
            ValueType::Pattern => Self::Pattern,
            ValueType::Choice(_) | ValueType::Custom(_) => return None,
        })
    }

    /// Converts `raw` to a value.
    pub fn convert(self, raw: &str) -> Result<Value, ConversionError> {
        match self {
            Self::Bool => parse_bool(raw)
                .map(Value::Bool)
                .ok_or_else(|| {
                    let expected = "expected true/false, yes/no, on/off or 1/0";
                    ConversionError::invalid(raw, "bool", expected)
                }),
            Self::String => Ok(Value::Str(raw.to_string())),
            Self::Integer => parse_integer(raw).map(Value::Int),
            Self::Unsigned => parse_unsigned(raw).map(Value::UInt),
            Self::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| ConversionError::invalid(raw, "float", e)),
            Self::Char => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(ConversionError::invalid(
                        raw,
                        "char",
                        "expected exactly one character",
                    )),
                }
            }
            Self::Path => Ok(Value::Path(raw.into())),
            Self::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|e| ConversionError::invalid(raw, "date", e)),
            Self::Time => parse_time(raw).map(Value::Time),
            Self::DateTime => parse_datetime(raw).map(Value::DateTime),
            Self::Duration => humantime::parse_duration(raw)
                .map(Value::Duration)
                .map_err(|e| ConversionError::invalid(raw, "duration", e)),
            Self::IpAddr => raw
                .parse()
                .map(Value::Ip)
                .map_err(|e| ConversionError::invalid(raw, "ip-address", e)),
            Self::SocketAddr => raw
                .parse()
                .map(Value::Socket)
                .map_err(|e| ConversionError::invalid(raw, "socket-address", e)),
            Self::Pattern => regex::Regex::new(raw)
                .map(|_| Value::Str(raw.to_string()))
                .map_err(|e| ConversionError::invalid(raw, "pattern", e)),
        }
    }
}

/// Parses the accepted boolean literals, ignoring ASCII case.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn split_radix(raw: &str) -> (&str, u32) {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        (hex, 16)
    } else if let Some(bin) = raw.strip_prefix("0b") {
        (bin, 2)
    } else {
        (raw, 10)
    }
}

fn parse_integer(raw: &str) -> Result<i64, ConversionError> {
    let text = raw.trim();
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (digits, radix) = split_radix(body);
    if digits.starts_with(['+', '-']) {
        return Err(ConversionError::invalid(raw, "integer", "misplaced sign"));
    }
    let magnitude = i128::from_str_radix(digits, radix)
        .map_err(|e| ConversionError::invalid(raw, "integer", e))?;
    let signed = if negative { -magnitude } else { magnitude };
    i64::try_from(signed).map_err(|_| ConversionError::invalid(raw, "integer", "out of range"))
}

fn parse_unsigned(raw: &str) -> Result<u64, ConversionError> {
    let text = raw.trim();
    let (digits, radix) = split_radix(text.strip_prefix('+').unwrap_or(text));
    if digits.starts_with(['+', '-']) {
        return Err(ConversionError::invalid(raw, "unsigned", "misplaced sign"));
    }
    u64::from_str_radix(digits, radix)
        .map_err(|e| ConversionError::invalid(raw, "unsigned", e))
}

fn parse_time(raw: &str) -> Result<NaiveTime, ConversionError> {
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| ConversionError::invalid(raw, "time", "expected HH:MM[:SS[.fff]]"))
}

/// RFC 3339 input is normalized to UTC; offset-free input is taken as is.
fn parse_datetime(raw: &str) -> Result<NaiveDateTime, ConversionError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| {
            let expected = "expected RFC 3339 or YYYY-MM-DDTHH:MM:SS";
            ConversionError::invalid(raw, "datetime", expected)
        })
}

fn convert_choice(
    raw: &str,
    choices: &[String],
    ignore_case: bool,
) -> Result<Value, ConversionError> {
    choices
        .iter()
        .find(|c| c.as_str() == raw || (ignore_case && c.eq_ignore_ascii_case(raw)))
        .map(|c| Value::Str(c.clone()))
        .ok_or_else(|| ConversionError::InvalidChoice {
            value: raw.to_string(),
            choices: choices.to_vec(),
        })
}

/// Converter lookup table.
///
/// Resolution order for one token: the argument's named converters (first
/// registered name wins), then a type override, then the built-in
/// converter, then choice matching.
///
/// # Examples
///
/// ```
/// use command_grammar_core::ValueType;
/// use command_grammar_engine::{ConversionError, ConverterRegistry, Value};
///
/// let mut registry = ConverterRegistry::new();
/// registry.register_type(ValueType::Custom("percent".into()), |raw| {
///     raw.trim_end_matches('%')
///         .parse::<u64>()
///         .map(Value::UInt)
///         .map_err(|e| ConversionError::Message(e.to_string()))
/// });
///
/// let custom = ValueType::Custom("percent".into());
/// assert_eq!(registry.convert("40%", &custom, &[], false), Ok(Value::UInt(40)));
/// assert_eq!(registry.convert("7", &ValueType::Integer, &[], false), Ok(Value::Int(7)));
/// ```
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    by_type: HashMap<ValueType, ConverterFn>,
    by_name: HashMap<String, ConverterFn>,
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&str> = self.by_type.keys().map(ValueType::type_name).collect();
        types.sort_unstable();
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ConverterRegistry")
            .field("types", &types)
            .field("names", &names)
            .finish()
    }
}

impl ConverterRegistry {
    /// Creates a registry with only the built-in converters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the converter for a value type.
    pub fn register_type<F>(&mut self, value_type: ValueType, converter: F)
    where
        F: Fn(&str) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        self.insert_type(value_type, Arc::new(converter));
    }

    pub(crate) fn insert_type(&mut self, value_type: ValueType, converter: ConverterFn) {
        self.by_type.insert(value_type, converter);
    }

    /// Registers (or replaces) a converter referenced by name.
    pub fn register_named<F>(&mut self, name: &str, converter: F)
    where
        F: Fn(&str) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        self.insert_named(name, Arc::new(converter));
    }

    pub(crate) fn insert_named(&mut self, name: &str, converter: ConverterFn) {
        self.by_name.insert(name.to_string(), converter);
    }

    /// Returns `true` if a converter named `name` is registered.
    pub fn has_named(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Converts one token.
    ///
    /// `named` lists converter names declared on the argument; the first
    /// one registered is used. `ignore_case` applies to choice matching.
    ///
    /// # Errors
    ///
    /// Returns the converter's [`ConversionError`], or
    /// [`ConversionError::Unresolved`] when nothing can convert the type.
    pub fn convert(
        &self,
        raw: &str,
        value_type: &ValueType,
        named: &[String],
        ignore_case: bool,
    ) -> Result<Value, ConversionError> {
        let named_converter = named.iter().find_map(|name| self.by_name.get(name));
        if let Some(converter) = named_converter {
            return converter(raw);
        }
        if let Some(name) = named.first() {
            if !self.by_type.contains_key(value_type) && Builtin::for_type(value_type).is_none() {
                return Err(ConversionError::Unresolved { target: name.clone() });
            }
        }
        if let Some(converter) = self.by_type.get(value_type) {
            return converter(raw);
        }
        if let Some(builtin) = Builtin::for_type(value_type) {
            return builtin.convert(raw);
        }
        match value_type {
            ValueType::Choice(choices) => convert_choice(raw, choices, ignore_case),
            other => Err(ConversionError::Unresolved {
                target: other.type_name().to_string(),
            }),
        }
    }
}
