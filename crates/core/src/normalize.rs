// Copyright 2025 GraphCL Parity Contributors
// SPDX-License-Identifier: Apache-2.0

//! Removal of volatile keys from JSON responses.
//!
//! Two deployments of the same API legitimately disagree on generated ids,
//! timestamps and GraphQL type annotations. [`normalize`] drops those keys at
//! every depth so the remaining tree only carries data both sides should agree
//! on. Array order is left untouched here; the comparator handles it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Keys excluded from comparison by default.
pub const DEFAULT_IGNORE_KEYS: [&str; 4] = ["__typename", "id", "createdAt", "updatedAt"];

/// A set of object keys removed at every nesting level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IgnoreKeySet(BTreeSet<String>);

impl IgnoreKeySet {
    /// An empty set: nothing is ignored.
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Build a set from arbitrary keys.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    /// Return this set extended with one more key.
    pub fn with(mut self, key: impl Into<String>) -> Self {
        self.insert(key);
        self
    }

    /// Add a key in place. Returns `false` if it was already present.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.0.insert(key.into())
    }

    /// Whether `key` is ignored.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    /// Number of ignored keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no key is ignored.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the keys in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for IgnoreKeySet {
    fn default() -> Self {
        Self::from_keys(DEFAULT_IGNORE_KEYS)
    }
}

impl<S: Into<String>> Extend<S> for IgnoreKeySet {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for IgnoreKeySet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::from_keys(iter)
    }
}

/// Return a copy of `value` with every key in `ignore_keys` removed, at any depth.
///
/// Objects keep their remaining keys in insertion order, arrays keep their
/// length and element order, scalars are returned as-is. The input is never
/// mutated and the operation is idempotent.
pub fn normalize(value: &Value, ignore_keys: &IgnoreKeySet) -> Value {
    match value {
        Value::Object(map) => {
            let mut retained = Map::with_capacity(map.len());
            for (key, child) in map {
                if !ignore_keys.contains(key) {
                    retained.insert(key.clone(), normalize(child, ignore_keys));
                }
            }
            Value::Object(retained)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| normalize(item, ignore_keys))
                .collect(),
        ),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_keys() {
        let keys = IgnoreKeySet::default();
        assert_eq!(keys.len(), 4);
        for key in DEFAULT_IGNORE_KEYS {
            assert!(keys.contains(key));
        }
        assert!(!keys.contains("timestamp"));
    }

    #[test]
    fn test_with_extends_set() {
        let keys = IgnoreKeySet::default().with("timestamp");
        assert!(keys.contains("timestamp"));
        assert_eq!(keys.len(), 5);
    }

    #[test]
    fn test_removes_keys_at_every_depth() {
        let input = json!({
            "id": "1",
            "user": {
                "id": "7",
                "name": "Al",
                "posts": [
                    {"id": "p1", "title": "a", "createdAt": "2024-01-01"},
                    {"__typename": "Post", "title": "b"}
                ]
            }
        });

        let normalized = normalize(&input, &IgnoreKeySet::default());
        assert_eq!(
            normalized,
            json!({
                "user": {
                    "name": "Al",
                    "posts": [{"title": "a"}, {"title": "b"}]
                }
            })
        );
    }

    #[test]
    fn test_arrays_keep_order_and_length() {
        let input = json!([3, {"id": 1}, 1, [{"id": 2, "v": 2}]]);
        let normalized = normalize(&input, &IgnoreKeySet::default());
        assert_eq!(normalized, json!([3, {}, 1, [{"v": 2}]]));
    }

    #[test]
    fn test_scalars_unchanged() {
        let keys = IgnoreKeySet::default();
        for scalar in [json!(null), json!(true), json!(1.5), json!("id")] {
            assert_eq!(normalize(&scalar, &keys), scalar);
        }
    }

    #[test]
    fn test_input_not_mutated() {
        let input = json!({"id": 1, "name": "x"});
        let copy = input.clone();
        let _ = normalize(&input, &IgnoreKeySet::default());
        assert_eq!(input, copy);
    }

    #[test]
    fn test_idempotent() {
        let keys = IgnoreKeySet::default();
        let input = json!({"a": [{"id": 1, "b": {"updatedAt": 2, "c": 3}}]});
        let once = normalize(&input, &keys);
        assert_eq!(normalize(&once, &keys), once);
    }

    #[test]
    fn test_empty_set_is_identity() {
        let input = json!({"id": 1, "nested": {"__typename": "T"}});
        assert_eq!(normalize(&input, &IgnoreKeySet::empty()), input);
    }

    #[test]
    fn test_deserializes_from_list() {
        let keys: IgnoreKeySet = serde_json::from_str(r#"["id", "timestamp"]"#).unwrap();
        assert!(keys.contains("timestamp"));
        assert_eq!(keys.len(), 2);
    }
}
