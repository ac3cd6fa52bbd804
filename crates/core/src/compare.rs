// Copyright 2025 GraphCL Parity Contributors
// SPDX-License-Identifier: Apache-2.0

//! Semantic comparison of JSON responses.
//!
//! Two responses are *semantically equal* when, after [`normalize`] has
//! removed the volatile keys, they hold the same data regardless of object key
//! order and array element order. Arrays are compared as multisets through a
//! canonical structural key (see [`canonical_key`]), so duplicates count.
//!
//! Differences are reported as a [`Diff`]: a list of [`DiffEntry`] values
//! addressed by a JSONPath-like string (`$.user.posts[2].title`). A diff is
//! empty exactly when the two inputs are semantically equal.
//!
//! # Example
//!
//! ```
//! use graphcl_parity_core::compare::SemanticComparator;
//! use serde_json::json;
//!
//! let comparator = SemanticComparator::default();
//! let result = comparator.compare(&json!({"tags": ["a", "b"]}), &json!({"tags": ["a", "c"]}));
//! assert!(!result.equal);
//! assert!(result.diff.iter().all(|entry| entry.path.starts_with("$.tags")));
//! ```

use crate::normalize::{normalize, IgnoreKeySet};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Path of the document root.
pub const ROOT_PATH: &str = "$";

/// Longest rendering of a value inside a diff line before it is elided.
const MAX_VALUE_PREVIEW: usize = 80;

/// Shape of a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonKind {
    /// `null`
    Null,
    /// `true` / `false`
    Bool,
    /// Any number.
    Number,
    /// A string.
    String,
    /// An object.
    Object,
    /// An array.
    Array,
}

impl JsonKind {
    /// Classify a value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Bool,
            Value::Number(_) => JsonKind::Number,
            Value::String(_) => JsonKind::String,
            Value::Object(_) => JsonKind::Object,
            Value::Array(_) => JsonKind::Array,
        }
    }

    /// Whether values of this kind contain other values.
    pub fn is_container(self) -> bool {
        matches!(self, JsonKind::Object | JsonKind::Array)
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JsonKind::Null => "null",
            JsonKind::Bool => "bool",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Object => "object",
            JsonKind::Array => "array",
        };
        f.write_str(name)
    }
}

/// What differs at a given path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffChange {
    /// Key present only in the right-hand value.
    Added {
        /// The right-hand value.
        value: Value,
    },
    /// Key present only in the left-hand value.
    Removed {
        /// The left-hand value.
        value: Value,
    },
    /// Same scalar kind, different value.
    ValueChanged {
        /// Left-hand value.
        left: Value,
        /// Right-hand value.
        right: Value,
    },
    /// The two values have different shapes.
    TypeChanged {
        /// Kind on the left.
        left_type: JsonKind,
        /// Kind on the right.
        right_type: JsonKind,
        /// Left-hand value.
        left: Value,
        /// Right-hand value.
        right: Value,
    },
    /// Array element on the right with no equal counterpart on the left.
    ItemAdded {
        /// The unmatched element.
        value: Value,
    },
    /// Array element on the left with no equal counterpart on the right.
    ItemRemoved {
        /// The unmatched element.
        value: Value,
    },
}

impl fmt::Display for DiffChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffChange::Added { value } => write!(f, "added {}", preview(value)),
            DiffChange::Removed { value } => write!(f, "removed {}", preview(value)),
            DiffChange::ValueChanged { left, right } => {
                write!(f, "changed {} -> {}", preview(left), preview(right))
            }
            DiffChange::TypeChanged {
                left_type,
                right_type,
                left,
                right,
            } => write!(
                f,
                "type changed {left_type} -> {right_type} ({} -> {})",
                preview(left),
                preview(right)
            ),
            DiffChange::ItemAdded { value } => write!(f, "item added {}", preview(value)),
            DiffChange::ItemRemoved { value } => write!(f, "item removed {}", preview(value)),
        }
    }
}

/// A single difference between two values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// Location of the difference, e.g. `$.posts[1].title`.
    pub path: String,
    /// The difference itself.
    #[serde(flatten)]
    pub change: DiffChange,
}

impl DiffEntry {
    /// Create a new entry.
    pub fn new(path: impl Into<String>, change: DiffChange) -> Self {
        Self {
            path: path.into(),
            change,
        }
    }
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.change)
    }
}

/// Ordered collection of differences.
///
/// Object keys are reported in left-hand insertion order followed by keys
/// only present on the right; unmatched array elements are reported by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diff {
    entries: Vec<DiffEntry>,
}

impl Diff {
    /// Whether there are no differences.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of differences.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate the differences.
    pub fn iter(&self) -> std::slice::Iter<'_, DiffEntry> {
        self.entries.iter()
    }

    /// The differences as a slice.
    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    /// Whether any difference lies at or below `path`.
    pub fn touches(&self, path: &str) -> bool {
        self.entries.iter().any(|entry| {
            entry.path == path
                || entry
                    .path
                    .strip_prefix(path)
                    .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
        })
    }
}

impl<'a> IntoIterator for &'a Diff {
    type Item = &'a DiffEntry;
    type IntoIter = std::slice::Iter<'a, DiffEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("no differences");
        }
        for (index, entry) in self.entries.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "  {entry}")?;
        }
        Ok(())
    }
}

/// Outcome of a semantic comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// `true` iff `diff` is empty.
    pub equal: bool,
    /// Differences found after normalization.
    pub diff: Diff,
}

impl ComparisonResult {
    fn from_entries(entries: Vec<DiffEntry>) -> Self {
        Self {
            equal: entries.is_empty(),
            diff: Diff { entries },
        }
    }
}

/// Compares JSON values after stripping a fixed set of volatile keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticComparator {
    ignore_keys: IgnoreKeySet,
}

impl SemanticComparator {
    /// Create a comparator ignoring `ignore_keys`.
    pub fn new(ignore_keys: IgnoreKeySet) -> Self {
        Self { ignore_keys }
    }

    /// The keys this comparator ignores.
    pub fn ignore_keys(&self) -> &IgnoreKeySet {
        &self.ignore_keys
    }

    /// Normalize a value with this comparator's ignore keys.
    pub fn normalize(&self, value: &Value) -> Value {
        normalize(value, &self.ignore_keys)
    }

    /// Normalize both values and compute their semantic difference.
    pub fn compare(&self, left: &Value, right: &Value) -> ComparisonResult {
        let left = self.normalize(left);
        let right = self.normalize(right);
        let mut entries = Vec::new();
        diff_values(&left, &right, ROOT_PATH, &mut entries);
        ComparisonResult::from_entries(entries)
    }

    /// Whether both values are semantically equal.
    pub fn are_equal(&self, left: &Value, right: &Value) -> bool {
        self.compare(left, right).equal
    }
}

/// Compare with an explicit ignore-key set.
pub fn compare(left: &Value, right: &Value, ignore_keys: &IgnoreKeySet) -> ComparisonResult {
    let left = normalize(left, ignore_keys);
    let right = normalize(right, ignore_keys);
    let mut entries = Vec::new();
    diff_values(&left, &right, ROOT_PATH, &mut entries);
    ComparisonResult::from_entries(entries)
}

/// Equality with an explicit ignore-key set.
pub fn are_equal(left: &Value, right: &Value, ignore_keys: &IgnoreKeySet) -> bool {
    compare(left, right, ignore_keys).equal
}

/// Structural sort key of a value.
///
/// Objects are keyed with their entries sorted by name and arrays with their
/// element keys sorted, so two values share a key exactly when they are equal
/// up to key order and element order. Numbers are keyed by numeric value
/// (`1` and `1.0` collide).
pub fn canonical_key(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push('n'),
        Value::Bool(true) => out.push('t'),
        Value::Bool(false) => out.push('f'),
        Value::Number(number) => {
            out.push('#');
            out.push_str(&canonical_number(number));
        }
        Value::String(text) => out.push_str(&format!("{text:?}")),
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            out.push('{');
            for (key, child) in entries {
                out.push_str(&format!("{key:?}:"));
                write_canonical(child, out);
                out.push(',');
            }
            out.push('}');
        }
        Value::Array(items) => {
            let mut keys: Vec<String> = items.iter().map(canonical_key).collect();
            keys.sort();
            out.push('[');
            for key in keys {
                out.push_str(&key);
                out.push(',');
            }
            out.push(']');
        }
    }
}

fn canonical_number(number: &Number) -> String {
    if let Some(int) = number.as_i64() {
        return int.to_string();
    }
    if let Some(uint) = number.as_u64() {
        return uint.to_string();
    }
    match number.as_f64() {
        // Integral floats are keyed by their exact integer value, which also
        // folds -0.0 into 0.
        Some(float) if float.fract() == 0.0 && float.abs() < I128_BOUND => {
            (float as i128).to_string()
        }
        Some(float) => float.to_string(),
        None => number.to_string(),
    }
}

/// 2^127: every integral float below it converts to `i128` exactly.
const I128_BOUND: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;

fn numbers_equal(left: &Number, right: &Number) -> bool {
    canonical_number(left) == canonical_number(right)
}

fn key_path(parent: &str, key: &str) -> String {
    let plain = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        format!("{parent}.{key}")
    } else {
        format!("{parent}[{key:?}]")
    }
}

fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

fn diff_values(left: &Value, right: &Value, path: &str, out: &mut Vec<DiffEntry>) {
    match (left, right) {
        (Value::Object(left_map), Value::Object(right_map)) => {
            for (key, left_child) in left_map {
                let child_path = key_path(path, key);
                match right_map.get(key) {
                    Some(right_child) => diff_values(left_child, right_child, &child_path, out),
                    None => out.push(DiffEntry::new(
                        child_path,
                        DiffChange::Removed {
                            value: left_child.clone(),
                        },
                    )),
                }
            }
            for (key, right_child) in right_map {
                if !left_map.contains_key(key) {
                    out.push(DiffEntry::new(
                        key_path(path, key),
                        DiffChange::Added {
                            value: right_child.clone(),
                        },
                    ));
                }
            }
        }
        (Value::Array(left_items), Value::Array(right_items)) => {
            diff_arrays(left_items, right_items, path, out)
        }
        (Value::Null, Value::Null) => {}
        (Value::Bool(a), Value::Bool(b)) if a == b => {}
        (Value::Number(a), Value::Number(b)) if numbers_equal(a, b) => {}
        (Value::String(a), Value::String(b)) if a == b => {}
        (Value::Bool(_), Value::Bool(_))
        | (Value::Number(_), Value::Number(_))
        | (Value::String(_), Value::String(_)) => out.push(DiffEntry::new(
            path,
            DiffChange::ValueChanged {
                left: left.clone(),
                right: right.clone(),
            },
        )),
        _ => out.push(DiffEntry::new(
            path,
            DiffChange::TypeChanged {
                left_type: JsonKind::of(left),
                right_type: JsonKind::of(right),
                left: left.clone(),
                right: right.clone(),
            },
        )),
    }
}

/// Multiset difference of two arrays.
///
/// Elements are matched by canonical key, first unmatched right-hand
/// occurrence wins. A single leftover container on each side of the same kind
/// is descended into instead of being reported as a removal plus an addition.
fn diff_arrays(left: &[Value], right: &[Value], path: &str, out: &mut Vec<DiffEntry>) {
    let right_keys: Vec<String> = right.iter().map(canonical_key).collect();
    let mut pending: HashMap<&str, VecDeque<usize>> = HashMap::new();
    for (index, key) in right_keys.iter().enumerate() {
        pending.entry(key.as_str()).or_default().push_back(index);
    }

    let mut unmatched_left = Vec::new();
    for (index, item) in left.iter().enumerate() {
        let key = canonical_key(item);
        let matched = pending
            .get_mut(key.as_str())
            .and_then(VecDeque::pop_front)
            .is_some();
        if !matched {
            unmatched_left.push(index);
        }
    }

    let mut unmatched_right: Vec<usize> = pending.into_values().flatten().collect();
    unmatched_right.sort_unstable();

    if let ([left_index], [right_index]) = (unmatched_left.as_slice(), unmatched_right.as_slice()) {
        let left_item = &left[*left_index];
        let right_item = &right[*right_index];
        let kind = JsonKind::of(left_item);
        if kind.is_container() && kind == JsonKind::of(right_item) {
            diff_values(left_item, right_item, &index_path(path, *left_index), out);
            return;
        }
    }

    for index in unmatched_left {
        out.push(DiffEntry::new(
            index_path(path, index),
            DiffChange::ItemRemoved {
                value: left[index].clone(),
            },
        ));
    }
    for index in unmatched_right {
        out.push(DiffEntry::new(
            index_path(path, index),
            DiffChange::ItemAdded {
                value: right[index].clone(),
            },
        ));
    }
}

fn preview(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() <= MAX_VALUE_PREVIEW {
        return rendered;
    }
    let truncated: String = rendered.chars().take(MAX_VALUE_PREVIEW - 3).collect();
    format!("{truncated}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn comparator() -> SemanticComparator {
        SemanticComparator::default()
    }

    #[test]
    fn test_volatile_keys_are_ignored() {
        let left = json!({"user": {"id": "1", "name": "Al"}});
        let right = json!({"user": {"id": "2", "name": "Al"}});
        let result = comparator().compare(&left, &right);
        assert!(result.equal);
        assert!(result.diff.is_empty());
    }

    #[test]
    fn test_array_order_ignored() {
        assert!(comparator().are_equal(&json!({"tags": ["a", "b"]}), &json!({"tags": ["b", "a"]})));
        assert!(comparator().are_equal(&json!({"a": [1, 2, 3]}), &json!({"a": [3, 1, 2]})));
    }

    #[test]
    fn test_array_element_change_reported_under_parent() {
        let result = comparator().compare(&json!({"tags": ["a", "b"]}), &json!({"tags": ["a", "c"]}));
        assert!(!result.equal);
        assert_eq!(result.diff.len(), 2);
        assert!(result.diff.touches("$.tags"));
        assert_eq!(
            result.diff.entries()[0],
            DiffEntry::new("$.tags[1]", DiffChange::ItemRemoved { value: json!("b") })
        );
        assert_eq!(
            result.diff.entries()[1],
            DiffEntry::new("$.tags[1]", DiffChange::ItemAdded { value: json!("c") })
        );
    }

    #[test]
    fn test_numbers_differ() {
        assert!(!comparator().are_equal(&json!({"a": [1, 2, 3]}), &json!({"a": [1, 2, 4]})));
    }

    #[test]
    fn test_duplicates_count() {
        assert!(!comparator().are_equal(&json!([1, 1, 2]), &json!([1, 2, 2])));
        assert!(!comparator().are_equal(&json!([1, 1]), &json!([1])));
    }

    #[test]
    fn test_key_order_ignored() {
        let left: Value = serde_json::from_str(r#"{"a": 1, "b": {"c": 2, "d": 3}}"#).unwrap();
        let right: Value = serde_json::from_str(r#"{"b": {"d": 3, "c": 2}, "a": 1}"#).unwrap();
        assert!(comparator().are_equal(&left, &right));
    }

    #[test]
    fn test_integer_and_float_compare_by_value() {
        assert!(comparator().are_equal(&json!({"n": 1}), &json!({"n": 1.0})));
        assert!(comparator().are_equal(&json!([0.0]), &json!([-0.0])));
        assert!(!comparator().are_equal(&json!({"n": 1}), &json!({"n": 1.5})));
    }

    #[test]
    fn test_large_integer_and_float_compare_exactly() {
        let big_int = json!(9_223_372_036_854_775_808u64);
        let big_float = json!(9.223372036854775808e18);
        assert!(comparator().are_equal(&big_int, &big_float));
        assert_eq!(canonical_key(&big_int), canonical_key(&big_float));

        // 2^53 + 1 has no exact f64 representation.
        assert!(!comparator().are_equal(&json!(9_007_199_254_740_993i64), &json!(9_007_199_254_740_992.0)));
        assert!(comparator().are_equal(&json!(-9_007_199_254_740_992i64), &json!(-9_007_199_254_740_992.0)));
    }

    #[test]
    fn test_added_and_removed_keys() {
        let result = comparator().compare(&json!({"a": 1, "b": 2}), &json!({"a": 1, "c": 3}));
        assert_eq!(
            result.diff.entries(),
            &[
                DiffEntry::new("$.b", DiffChange::Removed { value: json!(2) }),
                DiffEntry::new("$.c", DiffChange::Added { value: json!(3) }),
            ]
        );
    }

    #[test]
    fn test_scalar_change() {
        let result = comparator().compare(&json!({"user": {"name": "Al"}}), &json!({"user": {"name": "Bo"}}));
        assert_eq!(
            result.diff.entries(),
            &[DiffEntry::new(
                "$.user.name",
                DiffChange::ValueChanged {
                    left: json!("Al"),
                    right: json!("Bo")
                }
            )]
        );
    }

    #[test]
    fn test_root_shape_mismatch_is_a_diff_entry() {
        let result = comparator().compare(&json!([1, 2]), &json!("x"));
        assert!(!result.equal);
        match &result.diff.entries()[0].change {
            DiffChange::TypeChanged {
                left_type,
                right_type,
                ..
            } => {
                assert_eq!(*left_type, JsonKind::Array);
                assert_eq!(*right_type, JsonKind::String);
            }
            other => panic!("unexpected change: {other:?}"),
        }
        assert_eq!(result.diff.entries()[0].path, ROOT_PATH);
    }

    #[test]
    fn test_null_against_value_is_type_change() {
        let result = comparator().compare(&json!({"a": null}), &json!({"a": 0}));
        assert!(matches!(
            result.diff.entries()[0].change,
            DiffChange::TypeChanged { .. }
        ));
    }

    #[test]
    fn test_single_leftover_objects_are_descended() {
        let left = json!({"posts": [{"title": "a", "tags": ["x"]}, {"title": "b"}]});
        let right = json!({"posts": [{"title": "b"}, {"title": "a", "tags": ["y"]}]});
        let result = comparator().compare(&left, &right);
        assert_eq!(result.diff.len(), 2);
        assert!(result.diff.touches("$.posts[0].tags"));
    }

    #[test]
    fn test_ids_inside_arrays_of_objects_ignored() {
        let left = json!({"users": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]});
        let right = json!({"users": [{"id": 9, "name": "b"}, {"id": 8, "name": "a"}]});
        assert!(comparator().are_equal(&left, &right));
    }

    #[test]
    fn test_extra_ignore_key() {
        let comparator = SemanticComparator::new(IgnoreKeySet::default().with("timestamp"));
        assert!(comparator.are_equal(
            &json!({"event": {"timestamp": 1, "v": 2}}),
            &json!({"event": {"timestamp": 5, "v": 2}})
        ));
    }

    #[test]
    fn test_odd_keys_are_quoted_in_paths() {
        let result = comparator().compare(&json!({"a b": 1}), &json!({"a b": 2}));
        assert_eq!(result.diff.entries()[0].path, r#"$["a b"]"#);
    }

    #[test]
    fn test_canonical_key_ignores_order() {
        assert_eq!(
            canonical_key(&json!({"a": [1, {"b": 2, "c": 3}], "d": null})),
            canonical_key(&json!({"d": null, "a": [{"c": 3, "b": 2}, 1]}))
        );
        assert_ne!(canonical_key(&json!("1")), canonical_key(&json!(1)));
    }

    #[test]
    fn test_diff_display() {
        let result = comparator().compare(&json!({"a": 1}), &json!({"a": 2}));
        assert_eq!(result.diff.to_string(), "  $.a: changed 1 -> 2");
        assert_eq!(Diff::default().to_string(), "no differences");
    }

    #[test]
    fn test_long_values_elided() {
        let long = "x".repeat(200);
        let change = DiffChange::Added { value: json!(long) };
        assert!(change.to_string().ends_with("..."));
    }

    #[test]
    fn test_diff_serializes_with_kind_tag() {
        let result = comparator().compare(&json!({"a": 1}), &json!({}));
        let encoded = serde_json::to_value(&result).unwrap();
        assert_eq!(
            encoded,
            json!({
                "equal": false,
                "diff": [{"path": "$.a", "kind": "removed", "value": 1}]
            })
        );
    }

    #[test]
    fn test_free_functions_match_comparator() {
        let keys = IgnoreKeySet::default();
        let left = json!({"id": "a", "v": 1});
        let right = json!({"id": "b", "v": 1});
        assert!(are_equal(&left, &right, &keys));
        assert_eq!(compare(&left, &right, &keys), comparator().compare(&left, &right));
    }
}
