//! Declarative field predicates
//!
//! Parsed from plain-English strings in the contract table:
//!
//! | Text                                   | Predicate        |
//! |----------------------------------------|------------------|
//! | `items must be list`                   | `IsList`         |
//! | `sources must be non-empty list`       | `NonEmptyList`   |
//! | `content must be non-empty string`     | `NonEmptyString` |
//! | `range must be one of day, week`       | `OneOf`          |
//! | `each item in items must have a and b` | `EachHas`        |
//! | `each item must have a and b`          | `EachHas` (items)|

use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::ConfigError;

static IS_LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+) must be (non-empty )?list$").unwrap());

static NON_EMPTY_STRING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+) must be non-empty string$").unwrap());

static ONE_OF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+) must be one of (.+)$").unwrap());

static EACH_HAS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^each (\w+)(?: in (\w+))? must have (.+)$").unwrap()
});

static KEY_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,\s*(?:and\s+)?|\s+and\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    IsList(String),
    NonEmptyList(String),
    NonEmptyString(String),
    OneOf { field: String, values: Vec<String> },
    EachHas { field: String, keys: Vec<String> },
}

impl Predicate {
    /// Field the predicate inspects
    pub fn field(&self) -> &str {
        match self {
            Predicate::IsList(field)
            | Predicate::NonEmptyList(field)
            | Predicate::NonEmptyString(field) => field,
            Predicate::OneOf { field, .. } | Predicate::EachHas { field, .. } => field,
        }
    }

    /// An absent field passes; presence is checked by the shape's required list
    pub fn check(&self, fields: &Map<String, Value>) -> bool {
        let Some(value) = fields.get(self.field()) else {
            return true;
        };

        match self {
            Predicate::IsList(_) => value.is_array(),
            Predicate::NonEmptyList(_) => value.as_array().is_some_and(|items| !items.is_empty()),
            Predicate::NonEmptyString(_) => {
                value.as_str().is_some_and(|s| !s.trim().is_empty())
            }
            Predicate::OneOf { values, .. } => value
                .as_str()
                .is_some_and(|s| values.iter().any(|allowed| allowed == s)),
            Predicate::EachHas { keys, .. } => value.as_array().is_some_and(|items| {
                items.iter().all(|item| {
                    item.as_object().is_some_and(|obj| {
                        keys.iter()
                            .all(|key| obj.get(key).is_some_and(|v| !v.is_null()))
                    })
                })
            }),
        }
    }
}

fn split_list(text: &str) -> Vec<String> {
    KEY_SPLIT_RE
        .split(text.trim())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl FromStr for Predicate {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || ConfigError::InvalidPredicate(s.to_string());

        if let Some(caps) = IS_LIST_RE.captures(text) {
            let field = caps[1].to_string();
            return Ok(if caps.get(2).is_some() {
                Predicate::NonEmptyList(field)
            } else {
                Predicate::IsList(field)
            });
        }
        if let Some(caps) = NON_EMPTY_STRING_RE.captures(text) {
            return Ok(Predicate::NonEmptyString(caps[1].to_string()));
        }
        if let Some(caps) = ONE_OF_RE.captures(text) {
            let values = split_list(&caps[2]);
            if values.is_empty() {
                return Err(invalid());
            }
            return Ok(Predicate::OneOf {
                field: caps[1].to_string(),
                values,
            });
        }
        if let Some(caps) = EACH_HAS_RE.captures(text) {
            // "each item must have ..." checks the plural field "items"
            let field = match caps.get(2) {
                Some(field) => field.as_str().to_string(),
                None => format!("{}s", &caps[1]),
            };
            let keys = split_list(&caps[3]);
            if keys.is_empty() {
                return Err(invalid());
            }
            return Ok(Predicate::EachHas { field, keys });
        }

        Err(invalid())
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::IsList(field) => write!(f, "{} must be list", field),
            Predicate::NonEmptyList(field) => write!(f, "{} must be non-empty list", field),
            Predicate::NonEmptyString(field) => write!(f, "{} must be non-empty string", field),
            Predicate::OneOf { field, values } => {
                write!(f, "{} must be one of {}", field, values.join(", "))
            }
            Predicate::EachHas { field, keys } => {
                write!(f, "each entry in {} must have {}", field, keys.join(" and "))
            }
        }
    }
}
