use crate::ast::CompareOp;
use crate::schema::ValueKind;

/// Error types for parsing and translating filter expressions
#[derive(Debug, Clone, PartialEq)]
pub enum FiqlError {
    /// The filter text violates the grammar. `position` is a byte offset into the input.
    MalformedExpression { position: usize, message: String },
    UnknownField {
        field: String,
        hint: Option<String>,
    },
    InvalidOperator {
        field: String,
        op: CompareOp,
        kind: ValueKind,
        reason: String,
    },
    ValueCoercion {
        field: String,
        value: String,
        expected: String,
    },
    IllegalState(String),
}

impl FiqlError {
    pub(crate) fn malformed(position: usize, message: impl Into<String>) -> Self {
        FiqlError::MalformedExpression {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn unknown_field(field: &str, hint: Option<String>) -> Self {
        FiqlError::UnknownField {
            field: field.to_string(),
            hint,
        }
    }

    pub(crate) fn coercion(field: &str, value: &str, expected: impl Into<String>) -> Self {
        FiqlError::ValueCoercion {
            field: field.to_string(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}

impl std::fmt::Display for FiqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FiqlError::MalformedExpression { position, message } => {
                write!(f, "Malformed expression at {}: {}", position, message)
            }
            FiqlError::UnknownField { field, hint } => match hint {
                Some(hint) => write!(f, "Unknown field: {} ({})", field, hint),
                None => write!(f, "Unknown field: {}", field),
            },
            FiqlError::InvalidOperator {
                field,
                op,
                kind,
                reason,
            } => write!(
                f,
                "Invalid operator {} for {} field {}: {}",
                op, kind, field, reason
            ),
            FiqlError::ValueCoercion {
                field,
                value,
                expected,
            } => write!(
                f,
                "Cannot convert value '{}' for field {}: expected {}",
                value, field, expected
            ),
            FiqlError::IllegalState(msg) => write!(f, "Illegal state: {}", msg),
        }
    }
}

impl std::error::Error for FiqlError {}
