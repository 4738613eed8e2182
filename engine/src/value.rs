//! Converted argument values.
//!
//! [`Value`] is what converters produce and what bindings receive. The
//! [`FromValue`] and [`IntoValue`] traits move values in and out of host
//! field types.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::hash::Hash;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::BindingError;

/// A converted value.
///
/// Containers keep insertion order: `Map` is a list of pairs so the first
/// time a key is seen fixes its position.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    Str(String),
    Path(PathBuf),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Duration(Duration),
    Ip(IpAddr),
    Socket(SocketAddr),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Short type name used in messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::UInt(_) => "unsigned",
            Self::Float(_) => "float",
            Self::Char(_) => "char",
            Self::Str(_) => "string",
            Self::Path(_) => "path",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) => "datetime",
            Self::Duration(_) => "duration",
            Self::Ip(_) => "ip-address",
            Self::Socket(_) => "socket-address",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Self::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Looks up `key` in a map value by its display form.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.to_string() == key)
            .map(|(_, v)| v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Char(c) => write!(f, "{c}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Date(d) => write!(f, "{d}"),
            Self::Time(t) => write!(f, "{t}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
            Self::Duration(d) => write!(f, "{}", humantime::format_duration(*d)),
            Self::Ip(ip) => write!(f, "{ip}"),
            Self::Socket(addr) => write!(f, "{addr}"),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Self::Map(pairs) => {
                let parts: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::UInt(u) => serializer.serialize_u64(*u),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::List(items) => items.serialize(serializer),
            Self::Map(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (k, v) in pairs {
                    map.serialize_entry(&k.to_string(), v)?;
                }
                map.end()
            }
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

/// Conversion from a [`Value`] into a host field type.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, BindingError>;
}

/// Conversion from a host field type into a [`Value`].
///
/// Returns `None` when the field holds no value (an empty `Option`).
pub trait IntoValue {
    fn into_value(self) -> Option<Value>;
}

fn mismatch<T>(target: &'static str, found: &Value) -> Result<T, BindingError> {
    Err(BindingError::TypeMismatch {
        target,
        found: found.type_name(),
    })
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, BindingError> {
        Ok(value)
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Option<Value> {
        Some(self)
    }
}

macro_rules! simple_value {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, BindingError> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => mismatch($name, &other),
                }
            }
        }

        impl IntoValue for $ty {
            fn into_value(self) -> Option<Value> {
                Some(Value::$variant(self))
            }
        }
    };
}

simple_value!(bool, Bool, "bool");
simple_value!(char, Char, "char");
simple_value!(NaiveDate, Date, "date");
simple_value!(NaiveTime, Time, "time");
simple_value!(NaiveDateTime, DateTime, "datetime");
simple_value!(Duration, Duration, "duration");
simple_value!(IpAddr, Ip, "ip-address");
simple_value!(SocketAddr, Socket, "socket-address");

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, BindingError> {
        match value {
            Value::Str(s) => Ok(s),
            Value::Path(p) => Ok(p.display().to_string()),
            Value::List(_) | Value::Map(_) => mismatch("string", &value),
            other => Ok(other.to_string()),
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> Option<Value> {
        Some(Value::Str(self))
    }
}

impl FromValue for PathBuf {
    fn from_value(value: Value) -> Result<Self, BindingError> {
        match value {
            Value::Path(p) => Ok(p),
            Value::Str(s) => Ok(PathBuf::from(s)),
            other => mismatch("path", &other),
        }
    }
}

impl IntoValue for PathBuf {
    fn into_value(self) -> Option<Value> {
        Some(Value::Path(self))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, BindingError> {
        match value {
            Value::Float(x) => Ok(x),
            Value::Int(i) => Ok(i as f64),
            Value::UInt(u) => Ok(u as f64),
            other => mismatch("float", &other),
        }
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Option<Value> {
        Some(Value::Float(self))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, BindingError> {
        f64::from_value(value).map(|x| x as f32)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Option<Value> {
        Some(Value::Float(f64::from(self)))
    }
}

macro_rules! int_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, BindingError> {
                    let converted = match &value {
                        Value::Int(i) => <$ty>::try_from(*i).ok(),
                        Value::UInt(u) => <$ty>::try_from(*u).ok(),
                        other => return mismatch(stringify!($ty), other),
                    };
                    converted.ok_or_else(|| BindingError::OutOfRange {
                        target: stringify!($ty),
                        value: value.to_string(),
                    })
                }
            }

            impl IntoValue for $ty {
                fn into_value(self) -> Option<Value> {
                    Some(Value::$variant(self.into()))
                }
            }
        )*
    };
}

int_value!(
    i8 => Int, i16 => Int, i32 => Int, i64 => Int,
    u8 => UInt, u16 => UInt, u32 => UInt, u64 => UInt,
);

impl FromValue for usize {
    fn from_value(value: Value) -> Result<Self, BindingError> {
        u64::from_value(value.clone())?
            .try_into()
            .map_err(|_| BindingError::OutOfRange {
                target: "usize",
                value: value.to_string(),
            })
    }
}

impl IntoValue for usize {
    fn into_value(self) -> Option<Value> {
        Some(Value::UInt(self as u64))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, BindingError> {
        T::from_value(value).map(Some)
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Option<Value> {
        self.and_then(IntoValue::into_value)
    }
}

fn list_items(value: Value) -> Result<Vec<Value>, BindingError> {
    match value {
        Value::List(items) => Ok(items),
        other => Ok(vec![other]),
    }
}

fn map_pairs(value: Value) -> Result<Vec<(Value, Value)>, BindingError> {
    match value {
        Value::Map(pairs) => Ok(pairs),
        other => mismatch("map", &other),
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, BindingError> {
        list_items(value)?.into_iter().map(T::from_value).collect()
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Option<Value> {
        Some(Value::List(self.into_iter().filter_map(IntoValue::into_value).collect()))
    }
}

impl<T: FromValue + Ord> FromValue for BTreeSet<T> {
    fn from_value(value: Value) -> Result<Self, BindingError> {
        list_items(value)?.into_iter().map(T::from_value).collect()
    }
}

impl<T: IntoValue> IntoValue for BTreeSet<T> {
    fn into_value(self) -> Option<Value> {
        Some(Value::List(self.into_iter().filter_map(IntoValue::into_value).collect()))
    }
}

impl<K: FromValue, V: FromValue> FromValue for Vec<(K, V)> {
    fn from_value(value: Value) -> Result<Self, BindingError> {
        map_pairs(value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }
}

impl<K: IntoValue, V: IntoValue> IntoValue for Vec<(K, V)> {
    fn into_value(self) -> Option<Value> {
        Some(Value::Map(
            self.into_iter()
                .filter_map(|(k, v)| Some((k.into_value()?, v.into_value()?)))
                .collect(),
        ))
    }
}

impl<K: FromValue + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    fn from_value(value: Value) -> Result<Self, BindingError> {
        map_pairs(value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }
}

impl<K: IntoValue, V: IntoValue> IntoValue for BTreeMap<K, V> {
    fn into_value(self) -> Option<Value> {
        self.into_iter().collect::<Vec<_>>().into_value()
    }
}

impl<K: FromValue + Eq + Hash, V: FromValue> FromValue for HashMap<K, V> {
    fn from_value(value: Value) -> Result<Self, BindingError> {
        map_pairs(value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }
}

impl<K: IntoValue, V: IntoValue> IntoValue for HashMap<K, V> {
    fn into_value(self) -> Option<Value> {
        self.into_iter().collect::<Vec<_>>().into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_range_checked() {
        assert_eq!(u8::from_value(Value::Int(200)), Ok(200));
        assert!(matches!(
            u8::from_value(Value::Int(300)),
            Err(BindingError::OutOfRange { target: "u8", .. })
        ));
        assert!(matches!(
            i32::from_value(Value::Str("x".into())),
            Err(BindingError::TypeMismatch { target: "i32", found: "string" })
        ));
    }

    #[test]
    fn test_containers() {
        let list = Value::List(vec![Value::Str("a".into()), Value::Str("b".into())]);
        assert_eq!(Vec::<String>::from_value(list).unwrap(), vec!["a", "b"]);

        let map = Value::Map(vec![
            (Value::Str("z".into()), Value::Int(1)),
            (Value::Str("a".into()), Value::Int(2)),
        ]);
        let ordered = Vec::<(String, i64)>::from_value(map.clone()).unwrap();
        assert_eq!(ordered, vec![("z".to_string(), 1), ("a".to_string(), 2)]);
        let sorted = BTreeMap::<String, i64>::from_value(map).unwrap();
        assert_eq!(sorted.keys().collect::<Vec<_>>(), vec!["a", "z"]);
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(None::<String>.into_value(), None);
        assert_eq!(Some(3u16).into_value(), Some(Value::UInt(3)));
    }

    #[test]
    fn test_display_and_serialize() {
        let map = Value::Map(vec![(Value::Int(1), Value::Duration(Duration::from_secs(90)))]);
        assert_eq!(map.to_string(), "{1=1m 30s}");
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"1":"1m 30s"}"#);
        assert_eq!(map.get("1"), Some(&Value::Duration(Duration::from_secs(90))));
    }
}
