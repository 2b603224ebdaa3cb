//! Structural delta between two term documents.
//!
//! Objects are compared key by key and recursed into. Everything else,
//! arrays included, is compared as a whole: a changed matrix shows up as
//! the full new matrix, never as per-row edits.
//!
//! The JSON form mirrors a compact patch: changed and added keys map to
//! their new value (or nested patch), removed keys are listed under
//! [`DELETE_MARKER`].

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key under which removed object keys are listed in the JSON form.
pub const DELETE_MARKER: &str = "$delete";

/// Key-level changes inside an object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    /// Changed or added keys.
    pub changed: BTreeMap<String, Delta>,
    /// Keys present before and absent after, sorted.
    pub deleted: Vec<String>,
}

/// The difference between two documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    /// The value was replaced wholesale.
    Replace(Value),
    /// Both sides are objects; only the listed keys differ.
    Patch(Patch),
}

impl Default for Delta {
    fn default() -> Self {
        Delta::Patch(Patch::default())
    }
}

impl Delta {
    /// Returns true if there are no differences.
    pub fn is_empty(&self) -> bool {
        match self {
            Delta::Replace(_) => false,
            Delta::Patch(p) => p.changed.is_empty() && p.deleted.is_empty(),
        }
    }

    /// Serialize the delta to a plain JSON tree.
    pub fn to_json(&self) -> Value {
        match self {
            Delta::Replace(v) => v.clone(),
            Delta::Patch(p) => {
                let mut map = Map::new();
                for (key, delta) in &p.changed {
                    map.insert(key.clone(), delta.to_json());
                }
                if !p.deleted.is_empty() {
                    map.insert(
                        DELETE_MARKER.to_string(),
                        Value::Array(p.deleted.iter().cloned().map(Value::String).collect()),
                    );
                }
                Value::Object(map)
            }
        }
    }

    /// Dotted paths of every changed or deleted leaf, sorted.
    pub fn changed_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_paths("", &mut paths);
        paths.sort();
        paths
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<String>) {
        match self {
            Delta::Replace(_) => out.push(prefix.to_string()),
            Delta::Patch(p) => {
                for (key, delta) in &p.changed {
                    delta.collect_paths(&join_path(prefix, key), out);
                }
                for key in &p.deleted {
                    out.push(join_path(prefix, key));
                }
            }
        }
    }

    /// Format the delta as human-readable text, one path per line.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();
        self.collect_text("", &mut lines);
        lines.join("\n")
    }

    fn collect_text(&self, prefix: &str, out: &mut Vec<String>) {
        match self {
            Delta::Replace(v) => {
                let after = serde_json::to_string(v).unwrap_or_default();
                let label = if prefix.is_empty() { "." } else { prefix };
                out.push(format!("~ {}: {}", label, after));
            }
            Delta::Patch(p) => {
                for (key, delta) in &p.changed {
                    delta.collect_text(&join_path(prefix, key), out);
                }
                for key in &p.deleted {
                    out.push(format!("- {}", join_path(prefix, key)));
                }
            }
        }
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Compute the delta that turns `before` into `after`.
pub fn diff(before: &Value, after: &Value) -> Delta {
    match (before, after) {
        (Value::Object(b), Value::Object(a)) => Delta::Patch(diff_objects(b, a)),
        _ if same_value(before, after) => Delta::default(),
        _ => Delta::Replace(after.clone()),
    }
}

/// Structural equality where numbers compare by value, so `1000` and
/// `1000.0` are the same amount.
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| same_value(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| same_value(v, w)))
        }
        _ => a == b,
    }
}

fn diff_objects(before: &Map<String, Value>, after: &Map<String, Value>) -> Patch {
    let mut patch = Patch::default();

    for (key, av) in after {
        match before.get(key) {
            Some(bv) => {
                let d = diff(bv, av);
                if !d.is_empty() {
                    patch.changed.insert(key.clone(), d);
                }
            }
            None => {
                patch.changed.insert(key.clone(), Delta::Replace(av.clone()));
            }
        }
    }

    patch.deleted = before
        .keys()
        .filter(|k| !after.contains_key(*k))
        .cloned()
        .collect();
    patch.deleted.sort();

    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn terms(mgq: f64, matrix: Value) -> Value {
        json!({
            "bonus_rules": [],
            "clauses": [{ "body_html": "", "sequence": 10, "title": "Scope" }],
            "financial": { "mgq_target": mgq, "part_a_fixed": 0.0, "part_b_variable": 0.0 },
            "matrix": matrix,
        })
    }

    #[test]
    fn identical_documents_produce_empty_delta() {
        let doc = terms(1000.0, json!([{ "designation": "Driver", "headcount": 2 }]));
        let d = diff(&doc, &doc);
        assert!(d.is_empty());
        assert_eq!(d.to_json(), json!({}));
        assert!(d.changed_paths().is_empty());
    }

    #[test]
    fn scalar_change_is_nested_under_its_parent() {
        let before = terms(1000.0, json!([]));
        let after = terms(1500.0, json!([]));
        let d = diff(&before, &after);
        assert_eq!(d.to_json(), json!({ "financial": { "mgq_target": 1500.0 } }));
        assert_eq!(d.changed_paths(), vec!["financial.mgq_target"]);
    }

    #[test]
    fn arrays_are_replaced_as_a_whole() {
        let before = terms(1000.0, json!([{ "designation": "Driver", "headcount": 2 }]));
        let after = terms(
            1000.0,
            json!([
                { "designation": "Driver", "headcount": 3 },
                { "designation": "Helper", "headcount": 1 }
            ]),
        );
        let d = diff(&before, &after);
        assert_eq!(
            d.to_json(),
            json!({ "matrix": [
                { "designation": "Driver", "headcount": 3 },
                { "designation": "Helper", "headcount": 1 }
            ]})
        );
        assert_eq!(d.changed_paths(), vec!["matrix"]);
    }

    #[test]
    fn added_and_removed_keys() {
        let before = json!({ "a": 1, "b": { "x": true, "y": false } });
        let after = json!({ "a": 1, "b": { "x": true }, "c": "new" });
        let d = diff(&before, &after);
        assert_eq!(
            d.to_json(),
            json!({ "b": { "$delete": ["y"] }, "c": "new" })
        );
        assert_eq!(d.changed_paths(), vec!["b.y", "c"]);
    }

    #[test]
    fn type_change_replaces_value() {
        let before = json!({ "financial": { "mgq_target": 10.0 } });
        let after = json!({ "financial": null });
        let d = diff(&before, &after);
        assert_eq!(d.to_json(), json!({ "financial": null }));
    }

    #[test]
    fn non_object_roots() {
        assert!(diff(&json!([1, 2]), &json!([1, 2])).is_empty());
        assert_eq!(diff(&json!(1), &json!("1")), Delta::Replace(json!("1")));
    }

    #[test]
    fn text_output_format() {
        let before = json!({ "financial": { "mgq_target": 1.0 }, "gone": 1 });
        let after = json!({ "financial": { "mgq_target": 2.0 } });
        let text = diff(&before, &after).to_text();
        assert!(text.contains("~ financial.mgq_target: 2.0"));
        assert!(text.contains("- gone"));
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(same_value(&json!(1000), &json!(1000.0)));
        assert!(same_value(&json!([{ "rate": 5 }]), &json!([{ "rate": 5.0 }])));
        assert!(!same_value(&json!(1000), &json!(1000.5)));
        assert!(!same_value(&json!({ "a": 1 }), &json!({ "a": 1, "b": 2 })));
        assert!(diff(&terms(1000.0, json!([])), &json!({
            "bonus_rules": [],
            "clauses": [{ "body_html": "", "sequence": 10, "title": "Scope" }],
            "financial": { "mgq_target": 1000, "part_a_fixed": 0.0, "part_b_variable": 0.0 },
            "matrix": [],
        }))
        .is_empty());
    }
}
