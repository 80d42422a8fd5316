use crate::errors::FiqlError;
use std::str::FromStr;

/// Parsed filter expression. Leaves are always comparisons.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpression {
    Comparison {
        field: String,
        op: CompareOp,
        raw_value: String,
    },
    /// Always holds at least two children.
    Combinator {
        kind: CombinatorKind,
        children: Vec<FilterExpression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombinatorKind {
    And,
    Or,
}

impl CombinatorKind {
    pub fn separator(&self) -> char {
        match self {
            CombinatorKind::And => ';',
            CombinatorKind::Or => ',',
        }
    }
}

impl FilterExpression {
    pub fn comparison(field: &str, op: CompareOp, raw_value: &str) -> Self {
        FilterExpression::Comparison {
            field: field.to_string(),
            op,
            raw_value: raw_value.to_string(),
        }
    }

    /// Combinators need at least two children; the translator rejects
    /// shorter ones as malformed.
    pub fn and(children: Vec<FilterExpression>) -> Self {
        FilterExpression::Combinator {
            kind: CombinatorKind::And,
            children,
        }
    }

    pub fn or(children: Vec<FilterExpression>) -> Self {
        FilterExpression::Combinator {
            kind: CombinatorKind::Or,
            children,
        }
    }

    /// Number of comparisons in the tree
    pub fn comparison_count(&self) -> usize {
        match self {
            FilterExpression::Comparison { .. } => 1,
            FilterExpression::Combinator { children, .. } => {
                children.iter().map(|c| c.comparison_count()).sum()
            }
        }
    }

    /// All selectors referenced by the expression, in order of appearance
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            FilterExpression::Comparison { field, .. } => out.push(field),
            FilterExpression::Combinator { children, .. } => {
                for child in children {
                    child.collect_fields(out);
                }
            }
        }
    }
}

/// Renders canonical FIQL. Nested combinators are always parenthesized so the
/// output parses back into the same tree.
impl std::fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterExpression::Comparison {
                field,
                op,
                raw_value,
            } => {
                write!(f, "{}{}", field, op)?;
                write_argument(f, raw_value)
            }
            FilterExpression::Combinator { kind, children } => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", kind.separator())?;
                    }
                    match child {
                        FilterExpression::Comparison { .. } => write!(f, "{}", child)?,
                        FilterExpression::Combinator { .. } => write!(f, "({})", child)?,
                    }
                }
                Ok(())
            }
        }
    }
}

fn write_argument(f: &mut std::fmt::Formatter<'_>, value: &str) -> std::fmt::Result {
    let needs_quotes = value.is_empty()
        || value != value.trim()
        || value
            .chars()
            .any(|c| matches!(c, '(' | ')' | ';' | ',' | '\'' | '"'));
    if !needs_quotes {
        return write!(f, "{}", value);
    }
    write!(f, "\"")?;
    for c in value.chars() {
        if c == '"' || c == '\\' {
            write!(f, "\\")?;
        }
        write!(f, "{}", c)?;
    }
    write!(f, "\"")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
}

impl CompareOp {
    pub fn is_equality(&self) -> bool {
        matches!(self, CompareOp::Equal | CompareOp::NotEqual)
    }

    pub fn is_ordering(&self) -> bool {
        !self.is_equality()
    }
}

impl FromStr for CompareOp {
    type Err = FiqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(CompareOp::Equal),
            "!=" => Ok(CompareOp::NotEqual),
            "=gt=" | ">" => Ok(CompareOp::GreaterThan),
            "=ge=" | ">=" => Ok(CompareOp::GreaterOrEqual),
            "=lt=" | "<" => Ok(CompareOp::LessThan),
            "=le=" | "<=" => Ok(CompareOp::LessOrEqual),
            _ => Err(FiqlError::malformed(
                0,
                format!("Invalid comparison operator: {}", s),
            )),
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareOp::Equal => write!(f, "=="),
            CompareOp::NotEqual => write!(f, "!="),
            CompareOp::GreaterThan => write!(f, "=gt="),
            CompareOp::GreaterOrEqual => write!(f, "=ge="),
            CompareOp::LessThan => write!(f, "=lt="),
            CompareOp::LessOrEqual => write!(f, "=le="),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_op_aliases() {
        assert_eq!(CompareOp::from_str("=gt=").unwrap(), CompareOp::GreaterThan);
        assert_eq!(CompareOp::from_str(">").unwrap(), CompareOp::GreaterThan);
        assert_eq!(CompareOp::from_str("<=").unwrap(), CompareOp::LessOrEqual);
        assert!(CompareOp::from_str("=like=").is_err());
    }

    #[test]
    fn test_display_quotes_reserved_values() {
        let expr = FilterExpression::comparison("name", CompareOp::Equal, "a,b");
        assert_eq!(expr.to_string(), "name==\"a,b\"");

        let expr = FilterExpression::comparison("name", CompareOp::NotEqual, "say \"hi\"");
        assert_eq!(expr.to_string(), "name!=\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_display_parenthesizes_nested_combinators() {
        let expr = FilterExpression::or(vec![
            FilterExpression::and(vec![
                FilterExpression::comparison("a", CompareOp::Equal, "1"),
                FilterExpression::comparison("b", CompareOp::GreaterThan, "2"),
            ]),
            FilterExpression::comparison("c", CompareOp::Equal, "3"),
        ]);
        assert_eq!(expr.to_string(), "(a==1;b=gt=2),c==3");
        assert_eq!(expr.comparison_count(), 3);
        assert_eq!(expr.fields(), vec!["a", "b", "c"]);
    }
}
