use crate::ast::CompareOp;
use crate::coerce::TypedValue;
use serde::{Deserialize, Serialize};

/// Engine-neutral query tree handed to a search client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryClause {
    /// Exact match, or a wildcard match when `value` is a pattern
    Term { field: String, value: TypedValue },
    Range {
        field: String,
        op: RangeOp,
        value: TypedValue,
    },
    Bool {
        mode: BoolMode,
        children: Vec<QueryClause>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeOp {
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "gte")]
    GreaterOrEqual,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "lte")]
    LessOrEqual,
}

impl RangeOp {
    /// `None` for the equality operators
    pub fn from_compare(op: CompareOp) -> Option<Self> {
        match op {
            CompareOp::GreaterThan => Some(RangeOp::GreaterThan),
            CompareOp::GreaterOrEqual => Some(RangeOp::GreaterOrEqual),
            CompareOp::LessThan => Some(RangeOp::LessThan),
            CompareOp::LessOrEqual => Some(RangeOp::LessOrEqual),
            CompareOp::Equal | CompareOp::NotEqual => None,
        }
    }

    pub fn is_inclusive(&self) -> bool {
        matches!(self, RangeOp::GreaterOrEqual | RangeOp::LessOrEqual)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            RangeOp::GreaterThan => "gt",
            RangeOp::GreaterOrEqual => "gte",
            RangeOp::LessThan => "lt",
            RangeOp::LessOrEqual => "lte",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolMode {
    /// Every child matches (AND)
    Must,
    /// At least one child matches (OR)
    Should,
    /// No child matches (negation)
    MustNot,
}

impl BoolMode {
    pub fn keyword(&self) -> &'static str {
        match self {
            BoolMode::Must => "must",
            BoolMode::Should => "should",
            BoolMode::MustNot => "must_not",
        }
    }
}

impl QueryClause {
    pub fn term(field: &str, value: TypedValue) -> Self {
        QueryClause::Term {
            field: field.to_string(),
            value,
        }
    }

    pub fn range(field: &str, op: RangeOp, value: TypedValue) -> Self {
        QueryClause::Range {
            field: field.to_string(),
            op,
            value,
        }
    }

    pub fn must(children: Vec<QueryClause>) -> Self {
        QueryClause::Bool {
            mode: BoolMode::Must,
            children,
        }
    }

    pub fn should(children: Vec<QueryClause>) -> Self {
        QueryClause::Bool {
            mode: BoolMode::Should,
            children,
        }
    }

    pub fn must_not(clause: QueryClause) -> Self {
        QueryClause::Bool {
            mode: BoolMode::MustNot,
            children: vec![clause],
        }
    }

    /// Number of term and range clauses in the tree
    pub fn leaf_count(&self) -> usize {
        match self {
            QueryClause::Term { .. } | QueryClause::Range { .. } => 1,
            QueryClause::Bool { children, .. } => children.iter().map(|c| c.leaf_count()).sum(),
        }
    }
}

impl std::fmt::Display for QueryClause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryClause::Term { field, value } if value.is_pattern() => {
                write!(f, "wildcard({}:{})", field, value)
            }
            QueryClause::Term { field, value } => write!(f, "term({}:{})", field, value),
            QueryClause::Range { field, op, value } => {
                write!(f, "range({} {} {})", field, op.keyword(), value)
            }
            QueryClause::Bool { mode, children } => {
                write!(f, "{}[", mode.keyword())?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_op_mapping() {
        assert_eq!(RangeOp::from_compare(CompareOp::Equal), None);
        assert_eq!(
            RangeOp::from_compare(CompareOp::LessOrEqual),
            Some(RangeOp::LessOrEqual)
        );
        assert!(RangeOp::GreaterOrEqual.is_inclusive());
        assert!(!RangeOp::GreaterThan.is_inclusive());
    }

    #[test]
    fn test_display() {
        let clause = QueryClause::should(vec![
            QueryClause::term("tenantName", TypedValue::Text("taters".to_string())),
            QueryClause::must_not(QueryClause::term(
                "name",
                TypedValue::Pattern("din*".to_string()),
            )),
            QueryClause::range("size", RangeOp::GreaterOrEqual, TypedValue::Integer(3)),
        ]);
        assert_eq!(
            clause.to_string(),
            "should[term(tenantName:taters), must_not[wildcard(name:din*)], range(size gte 3)]"
        );
        assert_eq!(clause.leaf_count(), 3);
    }

    #[test]
    fn test_serde_json_shape() {
        use chrono::{TimeZone, Utc};
        use serde_json::json;

        let clause = QueryClause::must(vec![
            QueryClause::term("state", TypedValue::Enum("ACTIVE".to_string())),
            QueryClause::range(
                "created",
                RangeOp::GreaterOrEqual,
                TypedValue::Date(Utc.with_ymd_and_hms(2017, 3, 14, 0, 0, 0).unwrap()),
            ),
        ]);
        let value = serde_json::to_value(&clause).unwrap();
        assert_eq!(
            value,
            json!({"bool": {"mode": "must", "children": [
                {"term": {"field": "state", "value": {"enum": "ACTIVE"}}},
                {"range": {
                    "field": "created",
                    "op": "gte",
                    "value": {"date": "2017-03-14T00:00:00Z"},
                }},
            ]}})
        );
        let back: QueryClause = serde_json::from_value(value).unwrap();
        assert_eq!(back, clause);
    }
}
