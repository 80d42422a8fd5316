use crate::ast::CompareOp;
use crate::config::QueryBuilderConfig;
use crate::errors::FiqlError;
use crate::schema::{FieldDescriptor, FieldKind, NumberFormat};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A comparison value converted to the type its field demands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypedValue {
    Text(String),
    /// Wildcard pattern, normalized so `*` is the only wildcard and literal
    /// `*`, `?` and `\` are backslash-escaped
    Pattern(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Enum(String),
}

impl TypedValue {
    pub fn is_pattern(&self) -> bool {
        matches!(self, TypedValue::Pattern(_))
    }
}

impl std::fmt::Display for TypedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypedValue::Text(s) | TypedValue::Pattern(s) | TypedValue::Enum(s) => {
                write!(f, "{}", s)
            }
            TypedValue::Integer(n) => write!(f, "{}", n),
            TypedValue::Float(n) => write!(f, "{}", n),
            TypedValue::Boolean(b) => write!(f, "{}", b),
            TypedValue::Date(d) => write!(f, "{}", d.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

/// Convert `raw` for a comparison against `field` using `op`.
///
/// Operator compatibility is checked before the value is parsed, so a
/// `=gt=` on a boolean field reports the operator even when the value is
/// also bad.
pub fn coerce(
    raw: &str,
    field: &FieldDescriptor,
    op: CompareOp,
    config: &QueryBuilderConfig,
) -> Result<TypedValue, FiqlError> {
    match &field.kind {
        FieldKind::String => coerce_string(raw, field, op, config.wildcard),
        FieldKind::Number(format) => coerce_number(raw, field, *format),
        FieldKind::Date(format) => {
            coerce_date(raw, field, format.as_deref(), &config.date_formats)
        }
        FieldKind::Boolean => {
            require_equality(field, op)?;
            if raw.eq_ignore_ascii_case("true") {
                Ok(TypedValue::Boolean(true))
            } else if raw.eq_ignore_ascii_case("false") {
                Ok(TypedValue::Boolean(false))
            } else {
                Err(FiqlError::coercion(&field.path, raw, "true or false"))
            }
        }
        FieldKind::Enum(values) => {
            require_equality(field, op)?;
            values
                .iter()
                .find(|v| *v == raw)
                .map(|v| TypedValue::Enum(v.clone()))
                .ok_or_else(|| {
                    FiqlError::coercion(&field.path, raw, format!("one of {}", values.join(", ")))
                })
        }
    }
}

fn require_equality(field: &FieldDescriptor, op: CompareOp) -> Result<(), FiqlError> {
    if op.is_equality() {
        return Ok(());
    }
    Err(FiqlError::InvalidOperator {
        field: field.path.clone(),
        op,
        kind: field.value_kind(),
        reason: "only == and != are supported".to_string(),
    })
}

fn coerce_string(
    raw: &str,
    field: &FieldDescriptor,
    op: CompareOp,
    wildcard: char,
) -> Result<TypedValue, FiqlError> {
    if !field.wildcards || !raw.contains(wildcard) {
        return Ok(TypedValue::Text(raw.to_string()));
    }
    if op.is_ordering() {
        return Err(FiqlError::InvalidOperator {
            field: field.path.clone(),
            op,
            kind: field.value_kind(),
            reason: "wildcard values only support == and !=".to_string(),
        });
    }
    let mut pattern = String::with_capacity(raw.len() + 2);
    for c in raw.chars() {
        if c == wildcard {
            pattern.push('*');
        } else {
            if matches!(c, '*' | '?' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
    }
    Ok(TypedValue::Pattern(pattern))
}

fn coerce_number(
    raw: &str,
    field: &FieldDescriptor,
    format: NumberFormat,
) -> Result<TypedValue, FiqlError> {
    match format {
        NumberFormat::Integer => raw
            .parse::<i64>()
            .map(TypedValue::Integer)
            .map_err(|_| FiqlError::coercion(&field.path, raw, "integer")),
        NumberFormat::Decimal => {
            if let Ok(n) = raw.parse::<i64>() {
                return Ok(TypedValue::Integer(n));
            }
            match raw.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(TypedValue::Float(n)),
                _ => Err(FiqlError::coercion(&field.path, raw, "number")),
            }
        }
        NumberFormat::Bytes => {
            let size_parser =
                parse_size::Config::new().with_byte_suffix(parse_size::ByteSuffix::Allow);
            size_parser
                .parse_size(raw)
                .ok()
                .and_then(|size| i64::try_from(size).ok())
                .map(TypedValue::Integer)
                .ok_or_else(|| FiqlError::coercion(&field.path, raw, "size in bytes"))
        }
    }
}

fn coerce_date(
    raw: &str,
    field: &FieldDescriptor,
    format: Option<&str>,
    defaults: &[String],
) -> Result<TypedValue, FiqlError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(TypedValue::Date(timestamp.with_timezone(&Utc)));
    }
    let formats = format.into_iter().chain(defaults.iter().map(String::as_str));
    for fmt in formats.clone() {
        // Formats carrying %z keep the offset; naive parses would drop it.
        if let Ok(timestamp) = DateTime::parse_from_str(raw, fmt) {
            return Ok(TypedValue::Date(timestamp.with_timezone(&Utc)));
        }
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(TypedValue::Date(timestamp.and_utc()));
        }
        if let Some(midnight) = NaiveDate::parse_from_str(raw, fmt)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Ok(TypedValue::Date(midnight.and_utc()));
        }
    }
    let mut expected = vec!["RFC 3339".to_string()];
    expected.extend(formats.map(|f| f.to_string()));
    Err(FiqlError::coercion(
        &field.path,
        raw,
        format!("date ({})", expected.join(" or ")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueKind;
    use chrono::TimeZone;

    fn field(kind: FieldKind) -> FieldDescriptor {
        FieldDescriptor {
            path: "f".to_string(),
            index_path: "f".to_string(),
            kind,
            wildcards: true,
            searchable: true,
        }
    }

    fn run(raw: &str, kind: FieldKind, op: CompareOp) -> Result<TypedValue, FiqlError> {
        coerce(raw, &field(kind), op, &QueryBuilderConfig::default())
    }

    #[test]
    fn test_string_passthrough() {
        assert_eq!(
            run("taters", FieldKind::String, CompareOp::Equal).unwrap(),
            TypedValue::Text("taters".to_string())
        );
        assert_eq!(
            run("taters", FieldKind::String, CompareOp::GreaterThan).unwrap(),
            TypedValue::Text("taters".to_string())
        );
    }

    #[test]
    fn test_string_wildcard() {
        assert_eq!(
            run("tat*rs", FieldKind::String, CompareOp::Equal).unwrap(),
            TypedValue::Pattern("tat*rs".to_string())
        );
        assert_eq!(
            run("tat*rs?", FieldKind::String, CompareOp::NotEqual).unwrap(),
            TypedValue::Pattern("tat*rs\\?".to_string())
        );
        let err = run("tat*", FieldKind::String, CompareOp::LessThan).unwrap_err();
        assert!(matches!(
            err,
            FiqlError::InvalidOperator {
                kind: ValueKind::String,
                op: CompareOp::LessThan,
                ..
            }
        ));
    }

    #[test]
    fn test_custom_wildcard_marker_escapes_star() {
        let config = QueryBuilderConfig {
            wildcard: '%',
            ..QueryBuilderConfig::default()
        };
        let value = coerce("5*%", &field(FieldKind::String), CompareOp::Equal, &config).unwrap();
        assert_eq!(value, TypedValue::Pattern("5\\**".to_string()));
        let value = coerce("5*", &field(FieldKind::String), CompareOp::Equal, &config).unwrap();
        assert_eq!(value, TypedValue::Text("5*".to_string()));
    }

    #[test]
    fn test_wildcard_literal_when_disabled() {
        let mut descriptor = field(FieldKind::String);
        descriptor.wildcards = false;
        let value = coerce(
            "a*b",
            &descriptor,
            CompareOp::GreaterThan,
            &QueryBuilderConfig::default(),
        )
        .unwrap();
        assert_eq!(value, TypedValue::Text("a*b".to_string()));
    }

    #[test]
    fn test_numbers() {
        let decimal = FieldKind::Number(NumberFormat::Decimal);
        assert_eq!(
            run("42", decimal.clone(), CompareOp::GreaterThan).unwrap(),
            TypedValue::Integer(42)
        );
        assert_eq!(
            run("-1.5", decimal.clone(), CompareOp::LessOrEqual).unwrap(),
            TypedValue::Float(-1.5)
        );
        assert!(matches!(
            run("NaN", decimal.clone(), CompareOp::Equal),
            Err(FiqlError::ValueCoercion { .. })
        ));
        assert!(matches!(
            run("tat*rs", decimal, CompareOp::Equal),
            Err(FiqlError::ValueCoercion { .. })
        ));
        assert!(matches!(
            run("1.5", FieldKind::Number(NumberFormat::Integer), CompareOp::Equal),
            Err(FiqlError::ValueCoercion { .. })
        ));
    }

    #[test]
    fn test_byte_sizes() {
        let bytes = FieldKind::Number(NumberFormat::Bytes);
        assert_eq!(
            run("10KB", bytes.clone(), CompareOp::GreaterThan).unwrap(),
            TypedValue::Integer(10_000)
        );
        assert_eq!(
            run("1KiB", bytes.clone(), CompareOp::GreaterThan).unwrap(),
            TypedValue::Integer(1024)
        );
        assert_eq!(
            run("512", bytes.clone(), CompareOp::Equal).unwrap(),
            TypedValue::Integer(512)
        );
        assert!(run("lots", bytes, CompareOp::Equal).is_err());
    }

    #[test]
    fn test_dates() {
        let midnight = Utc.with_ymd_and_hms(2017, 3, 14, 0, 0, 0).unwrap();
        assert_eq!(
            run("2017-03-14", FieldKind::Date(None), CompareOp::GreaterOrEqual).unwrap(),
            TypedValue::Date(midnight)
        );
        assert_eq!(
            run(
                "2017-03-14T02:00:00+02:00",
                FieldKind::Date(None),
                CompareOp::LessThan
            )
            .unwrap(),
            TypedValue::Date(midnight)
        );
        assert_eq!(
            run(
                "14/03/2017",
                FieldKind::Date(Some("%d/%m/%Y".to_string())),
                CompareOp::Equal
            )
            .unwrap(),
            TypedValue::Date(midnight)
        );
        match run("yesterday", FieldKind::Date(None), CompareOp::Equal).unwrap_err() {
            FiqlError::ValueCoercion { expected, .. } => {
                assert_eq!(expected, "date (RFC 3339 or %Y-%m-%d)")
            }
            other => panic!("Expected ValueCoercion, got {:?}", other),
        }
    }

    #[test]
    fn test_date_format_with_offset() {
        let kind = FieldKind::Date(Some("%Y-%m-%dT%H:%M:%S%z".to_string()));
        assert_eq!(
            run("2017-01-01T10:00:00+0200", kind.clone(), CompareOp::Equal).unwrap(),
            TypedValue::Date(Utc.with_ymd_and_hms(2017, 1, 1, 8, 0, 0).unwrap())
        );
        assert_eq!(
            run("2017-01-01T10:00:00-0130", kind, CompareOp::LessThan).unwrap(),
            TypedValue::Date(Utc.with_ymd_and_hms(2017, 1, 1, 11, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_booleans() {
        assert_eq!(
            run("TRUE", FieldKind::Boolean, CompareOp::Equal).unwrap(),
            TypedValue::Boolean(true)
        );
        assert_eq!(
            run("false", FieldKind::Boolean, CompareOp::NotEqual).unwrap(),
            TypedValue::Boolean(false)
        );
        assert!(matches!(
            run("yes", FieldKind::Boolean, CompareOp::Equal),
            Err(FiqlError::ValueCoercion { .. })
        ));
        assert!(matches!(
            run("yes", FieldKind::Boolean, CompareOp::GreaterThan),
            Err(FiqlError::InvalidOperator { .. })
        ));
    }

    #[test]
    fn test_enums() {
        let kind = FieldKind::Enum(vec!["ACTIVE".to_string(), "DELETED".to_string()]);
        assert_eq!(
            run("ACTIVE", kind.clone(), CompareOp::Equal).unwrap(),
            TypedValue::Enum("ACTIVE".to_string())
        );
        match run("active", kind.clone(), CompareOp::Equal).unwrap_err() {
            FiqlError::ValueCoercion { expected, .. } => {
                assert_eq!(expected, "one of ACTIVE, DELETED")
            }
            other => panic!("Expected ValueCoercion, got {:?}", other),
        }
        assert!(matches!(
            run("ACTIVE", kind, CompareOp::GreaterOrEqual),
            Err(FiqlError::InvalidOperator { .. })
        ));
    }

    #[test]
    fn test_display() {
        let midnight = Utc.with_ymd_and_hms(2017, 3, 14, 0, 0, 0).unwrap();
        assert_eq!(TypedValue::Date(midnight).to_string(), "2017-03-14T00:00:00Z");
        assert_eq!(TypedValue::Float(2.5).to_string(), "2.5");
    }
}
