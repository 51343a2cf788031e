//! Query filters.
//!
//! A filter is written as a JSON object in the query bar:
//!
//! ```text
//! { "status": "active", "age": { "$gte": 21 }, "$or": [ {"a": 1}, {"b": 2} ] }
//! ```
//!
//! `ObjectId("…")` is accepted and treated as the plain string id.

use std::cmp::Ordering;

use serde_json::Value;

use super::{Document, StoreError};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// Matches every document.
    #[default]
    Everything,
    All(Vec<Filter>),
    Any(Vec<Filter>),
    Field { path: String, condition: Condition },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Exists(bool),
}

impl Filter {
    /// Parse filter text from the query bar. Blank text matches everything.
    pub fn parse(text: &str) -> Result<Self, StoreError> {
        let text = normalize_object_ids(text.trim());
        if text.is_empty() {
            return Ok(Filter::Everything);
        }
        let value: Value =
            serde_json::from_str(&text).map_err(|e| StoreError::InvalidFilter(e.to_string()))?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, StoreError> {
        let Value::Object(map) = value else {
            return Err(StoreError::InvalidFilter("filter must be an object".to_string()));
        };

        let mut clauses = Vec::with_capacity(map.len());
        for (key, value) in map {
            match key.as_str() {
                "$and" => clauses.push(Filter::All(sub_filters(key, value)?)),
                "$or" => clauses.push(Filter::Any(sub_filters(key, value)?)),
                op if op.starts_with('$') => {
                    return Err(StoreError::InvalidFilter(format!("unsupported operator {op}")));
                }
                path => clauses.extend(field_clauses(path, value)?),
            }
        }

        Ok(match clauses.len() {
            0 => Filter::Everything,
            1 => clauses.remove(0),
            _ => Filter::All(clauses),
        })
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::Everything => true,
            Filter::All(filters) => filters.iter().all(|f| f.matches(document)),
            Filter::Any(filters) => filters.iter().any(|f| f.matches(document)),
            Filter::Field { path, condition } => condition.matches(lookup(document, path)),
        }
    }
}

impl Condition {
    fn matches(&self, field: Option<&Value>) -> bool {
        match self {
            Condition::Exists(expected) => field.is_some() == *expected,
            Condition::Eq(target) => field.is_some_and(|v| equals(v, target)),
            Condition::Ne(target) => !field.is_some_and(|v| equals(v, target)),
            Condition::In(targets) => field.is_some_and(|v| targets.iter().any(|t| equals(v, t))),
            Condition::Nin(targets) => !field.is_some_and(|v| targets.iter().any(|t| equals(v, t))),
            Condition::Gt(target) => compares(field, target, |o| o == Ordering::Greater),
            Condition::Gte(target) => compares(field, target, |o| o != Ordering::Less),
            Condition::Lt(target) => compares(field, target, |o| o == Ordering::Less),
            Condition::Lte(target) => compares(field, target, |o| o != Ordering::Greater),
        }
    }
}

fn sub_filters(op: &str, value: &Value) -> Result<Vec<Filter>, StoreError> {
    let Value::Array(items) = value else {
        return Err(StoreError::InvalidFilter(format!("{op} expects an array")));
    };
    items.iter().map(Filter::from_value).collect()
}

fn field_clauses(path: &str, value: &Value) -> Result<Vec<Filter>, StoreError> {
    let operators = match value {
        Value::Object(map) if !map.is_empty() && map.keys().all(|k| k.starts_with('$')) => map,
        _ => {
            return Ok(vec![Filter::Field {
                path: path.to_string(),
                condition: Condition::Eq(value.clone()),
            }]);
        }
    };

    operators
        .iter()
        .map(|(op, arg)| {
            let condition = match op.as_str() {
                "$eq" => Condition::Eq(arg.clone()),
                "$ne" => Condition::Ne(arg.clone()),
                "$gt" => Condition::Gt(arg.clone()),
                "$gte" => Condition::Gte(arg.clone()),
                "$lt" => Condition::Lt(arg.clone()),
                "$lte" => Condition::Lte(arg.clone()),
                "$in" => Condition::In(array_arg(op, arg)?),
                "$nin" => Condition::Nin(array_arg(op, arg)?),
                "$exists" => Condition::Exists(arg.as_bool().unwrap_or(true)),
                other => {
                    return Err(StoreError::InvalidFilter(format!(
                        "unsupported operator {other}"
                    )));
                }
            };
            Ok(Filter::Field {
                path: path.to_string(),
                condition,
            })
        })
        .collect()
}

fn array_arg(op: &str, arg: &Value) -> Result<Vec<Value>, StoreError> {
    match arg {
        Value::Array(items) => Ok(items.clone()),
        _ => Err(StoreError::InvalidFilter(format!("{op} expects an array"))),
    }
}

/// Resolve a dotted path (`address.city`) through nested objects.
fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = document.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Equality with array membership: `{"tags": "x"}` matches `tags: ["x", "y"]`.
fn equals(field: &Value, target: &Value) -> bool {
    if numbers_equal(field, target) || field == target {
        return true;
    }
    match field {
        Value::Array(items) if !target.is_array() => items.iter().any(|item| equals(item, target)),
        _ => false,
    }
}

fn numbers_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

fn compares(field: Option<&Value>, target: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    let Some(field) = field else {
        return false;
    };
    let ordering = match (field, target) {
        (Value::Number(a), Value::Number(b)) => a.as_f64().zip(b.as_f64()).and_then(|(a, b)| a.partial_cmp(&b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };
    ordering.is_some_and(accept)
}

/// Rewrite `ObjectId("abc")` to `"abc"` so the text parses as JSON.
fn normalize_object_ids(text: &str) -> String {
    const OPEN: &str = "ObjectId(";
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];
        match after.find(')') {
            Some(end) => {
                out.push_str(after[..end].trim());
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_blank_filter_matches_everything() {
        let filter = Filter::parse("   ").unwrap();
        assert_eq!(filter, Filter::Everything);
        assert!(filter.matches(&doc(json!({"a": 1}))));
    }

    #[test]
    fn test_equality_and_nested_paths() {
        let filter = Filter::parse(r#"{"address.city": "Oslo", "active": true}"#).unwrap();
        assert!(filter.matches(&doc(json!({"active": true, "address": {"city": "Oslo"}}))));
        assert!(!filter.matches(&doc(json!({"active": true, "address": {"city": "Bergen"}}))));
        assert!(!filter.matches(&doc(json!({"active": true}))));
    }

    #[test]
    fn test_comparison_operators() {
        let filter = Filter::parse(r#"{"age": {"$gte": 18, "$lt": 30}}"#).unwrap();
        assert!(filter.matches(&doc(json!({"age": 18}))));
        assert!(filter.matches(&doc(json!({"age": 29.5}))));
        assert!(!filter.matches(&doc(json!({"age": 30}))));
        assert!(!filter.matches(&doc(json!({"age": "20"}))));
    }

    #[test]
    fn test_in_exists_and_or() {
        let filter = Filter::parse(
            r#"{"$or": [{"tags": {"$in": ["rust", "go"]}}, {"deleted": {"$exists": false}}]}"#,
        )
        .unwrap();
        assert!(filter.matches(&doc(json!({"tags": ["rust"], "deleted": true}))));
        assert!(filter.matches(&doc(json!({"tags": []}))));
        assert!(!filter.matches(&doc(json!({"tags": ["c"], "deleted": false}))));
    }

    #[test]
    fn test_ne_matches_missing_fields() {
        let filter = Filter::parse(r#"{"status": {"$ne": "gone"}}"#).unwrap();
        assert!(filter.matches(&doc(json!({}))));
        assert!(!filter.matches(&doc(json!({"status": "gone"}))));
    }

    #[test]
    fn test_integer_and_float_compare_equal() {
        let filter = Filter::parse(r#"{"n": 2.0}"#).unwrap();
        assert!(filter.matches(&doc(json!({"n": 2}))));
    }

    #[test]
    fn test_object_id_literal() {
        let filter = Filter::parse(r#"{"_id": ObjectId("abc123")}"#).unwrap();
        assert!(filter.matches(&doc(json!({"_id": "abc123"}))));
    }

    #[test]
    fn test_invalid_filters() {
        assert!(matches!(Filter::parse("{oops"), Err(StoreError::InvalidFilter(_))));
        assert!(matches!(Filter::parse("[1]"), Err(StoreError::InvalidFilter(_))));
        assert!(matches!(
            Filter::parse(r#"{"a": {"$regex": "x"}}"#),
            Err(StoreError::InvalidFilter(_))
        ));
        assert!(matches!(
            Filter::parse(r#"{"$where": "1"}"#),
            Err(StoreError::InvalidFilter(_))
        ));
    }
}
