//! Inclusive count ranges used for arity, positional indices, and group
//! multiplicity.
//!
//! A [`Range`] has the textual forms `"1"`, `"0..1"`, `"1..*"` and `"*"`
//! (shorthand for `"0..*"`). It serializes to and from that text so grammar
//! files stay readable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// An inclusive `min..max` range where `max` may be unbounded.
///
/// # Examples
///
/// ```
/// use command_grammar_core::Range;
///
/// let arity: Range = "1..*".parse().unwrap();
/// assert_eq!(arity.min, 1);
/// assert!(arity.is_unbounded());
/// assert!(arity.contains(42));
/// assert_eq!(arity.to_string(), "1..*");
///
/// assert_eq!("2".parse::<Range>().unwrap(), Range::exactly(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Range {
    /// Lower bound (inclusive).
    pub min: usize,
    /// Upper bound (inclusive); `None` means unbounded.
    pub max: Option<usize>,
}

impl Range {
    /// A range containing exactly `n`.
    pub const fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    /// The range `min..=max`.
    pub const fn between(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    /// The range `min..*`.
    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    /// Returns `true` if the upper bound is unbounded.
    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }

    /// Returns `true` if `min != max`.
    pub fn is_variable(&self) -> bool {
        self.max != Some(self.min)
    }

    /// Returns `true` if `n` lies within the range.
    pub fn contains(&self, n: usize) -> bool {
        n >= self.min && self.max.is_none_or(|max| n <= max)
    }

    /// Returns `true` if `n` exceeds the upper bound.
    pub fn exceeded_by(&self, n: usize) -> bool {
        self.max.is_some_and(|max| n > max)
    }

    /// Returns `true` when the bounds are consistent (`min <= max`).
    pub fn is_valid(&self) -> bool {
        self.max.is_none_or(|max| self.min <= max)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{}", self.min),
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..*", self.min),
        }
    }
}

impl FromStr for Range {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || ModelError::InvalidRange(s.to_string());

        if text == "*" {
            return Ok(Self::at_least(0));
        }

        let range = match text.split_once("..") {
            Some((min, max)) => {
                let min = min.trim().parse::<usize>().map_err(|_| invalid())?;
                let max = match max.trim() {
                    "*" => None,
                    max => Some(max.parse::<usize>().map_err(|_| invalid())?),
                };
                Self { min, max }
            }
            None => Self::exactly(text.parse::<usize>().map_err(|_| invalid())?),
        };

        if !range.is_valid() {
            return Err(invalid());
        }
        Ok(range)
    }
}

impl TryFrom<String> for Range {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Range> for String {
    fn from(range: Range) -> Self {
        range.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!("1".parse::<Range>().unwrap(), Range::exactly(1));
        assert_eq!("0..1".parse::<Range>().unwrap(), Range::between(0, 1));
        assert_eq!("1..*".parse::<Range>().unwrap(), Range::at_least(1));
        assert_eq!("*".parse::<Range>().unwrap(), Range::at_least(0));
        assert_eq!(" 2 .. 3 ".parse::<Range>().unwrap(), Range::between(2, 3));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            "3..1".parse::<Range>(),
            Err(ModelError::InvalidRange("3..1".to_string()))
        );
        assert!("x".parse::<Range>().is_err());
        assert!("1..y".parse::<Range>().is_err());
        assert!("".parse::<Range>().is_err());
    }

    #[test]
    fn test_contains_and_exceeded() {
        let r = Range::between(1, 3);
        assert!(!r.contains(0));
        assert!(r.contains(3));
        assert!(r.exceeded_by(4));
        assert!(!Range::at_least(0).exceeded_by(usize::MAX));
    }

    #[test]
    fn test_display() {
        assert_eq!(Range::exactly(0).to_string(), "0");
        assert_eq!(Range::between(0, 1).to_string(), "0..1");
        assert_eq!(Range::at_least(1).to_string(), "1..*");
    }

    #[test]
    fn test_serde_as_text() {
        let json = serde_json::to_string(&Range::at_least(1)).unwrap();
        assert_eq!(json, "\"1..*\"");
        let back: Range = serde_json::from_str("\"0..2\"").unwrap();
        assert_eq!(back, Range::between(0, 2));
        assert!(serde_json::from_str::<Range>("\"oops\"").is_err());
    }
}
