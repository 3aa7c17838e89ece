//! Field label sets

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Key/value labels identifying a series.
///
/// Ordering of insertion is irrelevant: two label sets are equal when they
/// hold the same pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Same pairs, regardless of insertion order.
    pub fn equals(&self, other: &Labels) -> bool {
        self == other
    }

    /// Every pair of `other` is present in `self`.
    pub fn contains(&self, other: &Labels) -> bool {
        other.iter().all(|(k, v)| self.get(k) == Some(v))
    }

    /// Merge `other` into `self`, `other` wins on key conflicts.
    pub fn extend(&mut self, other: &Labels) {
        for (k, v) in other.iter() {
            self.insert(k, v);
        }
    }
}

impl fmt::Display for Labels {
    /// `{a=b, c=d}` with keys sorted; empty labels render as nothing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        f.write_str("{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        f.write_str("}")
    }
}

impl FromStr for Labels {
    type Err = Error;

    /// Parses `{a=b, c="d"}`; braces and value quotes are optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s.trim();
        let inner = inner
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .unwrap_or(inner);

        let mut labels = Labels::new();
        for pair in inner.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let Some((key, value)) = pair.split_once('=') else {
                return Err(Error::Parse(format!(
                    "label '{}' is invalid, expected key=value",
                    pair
                )));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::Parse(format!("label '{}' has an empty key", pair)));
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            labels.insert(key, value);
        }
        Ok(labels)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Labels(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Labels {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_irrelevant_equality() {
        let a = Labels::from([("host", "a"), ("dc", "eu")]);
        let mut b = Labels::new();
        b.insert("dc", "eu");
        b.insert("host", "a");
        assert!(a.equals(&b));
    }

    #[test]
    fn test_contains() {
        let full = Labels::from([("host", "a"), ("dc", "eu")]);
        assert!(full.contains(&Labels::from([("dc", "eu")])));
        assert!(full.contains(&Labels::new()));
        assert!(!full.contains(&Labels::from([("dc", "us")])));
    }

    #[test]
    fn test_parse_and_display() {
        let labels: Labels = "{host=a, dc=\"eu\"}".parse().unwrap();
        assert_eq!(labels.get("dc"), Some("eu"));
        assert_eq!(labels.to_string(), "{dc=eu, host=a}");
        assert_eq!("".parse::<Labels>().unwrap(), Labels::new());
        assert!("{host}".parse::<Labels>().is_err());
    }

    #[test]
    fn test_serializes_as_map() {
        let labels = Labels::from([("b", "2"), ("a", "1")]);
        assert_eq!(
            serde_json::to_string(&labels).unwrap(),
            r#"{"a":"1","b":"2"}"#
        );
    }
}
