//! Rendering of [`QueryClause`] trees as Elasticsearch query DSL.

use crate::coerce::TypedValue;
use crate::query::QueryClause;
use chrono::SecondsFormat;
use serde_json::{json, Map, Value};

/// Map a clause tree onto the Elasticsearch JSON query DSL.
///
/// Terms become `term` (or `wildcard` for patterns), ranges become `range`
/// with `gt`/`gte`/`lt`/`lte` bounds, and boolean clauses become `bool` with
/// a single `must`, `should` or `must_not` array.
pub fn to_elasticsearch(clause: &QueryClause) -> Value {
    match clause {
        QueryClause::Term {
            field,
            value: TypedValue::Pattern(pattern),
        } => json!({ "wildcard": { field.as_str(): { "value": pattern } } }),
        QueryClause::Term { field, value } => {
            json!({ "term": { field.as_str(): value_to_json(value) } })
        }
        QueryClause::Range { field, op, value } => {
            json!({ "range": { field.as_str(): { op.keyword(): value_to_json(value) } } })
        }
        QueryClause::Bool { mode, children } => {
            let children: Vec<Value> = children.iter().map(to_elasticsearch).collect();
            let mut body = Map::new();
            body.insert(mode.keyword().to_string(), Value::Array(children));
            json!({ "bool": body })
        }
    }
}

pub fn value_to_json(value: &TypedValue) -> Value {
    match value {
        TypedValue::Text(s) | TypedValue::Pattern(s) | TypedValue::Enum(s) => {
            Value::String(s.clone())
        }
        TypedValue::Integer(n) => Value::from(*n),
        TypedValue::Float(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        TypedValue::Boolean(b) => Value::Bool(*b),
        TypedValue::Date(d) => Value::String(d.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    }
}
