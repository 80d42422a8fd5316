use fiql_search::{
    FieldDef, FieldKind, FiqlError, NumberFormat, QueryBuilder, QueryClause, RangeOp, Schema,
    TypedValue,
};
use std::io::Write;
use tempfile::Builder;
mod common;
use common::*;

fn write_schema(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_yaml_schema_file() {
    let file = write_schema(".yaml", SCHEMA_YAML);
    let schema = Schema::from_file(file.path()).unwrap();
    assert_eq!(
        schema.selectors().collect::<Vec<_>>(),
        vec!["objectMetadata.tenantName", "objectMetadata.created", "size", "state"]
    );

    let builder = QueryBuilder::new(schema);
    assert_eq!(
        builder.generate_query("tenant==taters;size=gt=1MB").unwrap(),
        QueryClause::must(vec![
            term("meta.tenantName", "taters"),
            QueryClause::range("size", RangeOp::GreaterThan, TypedValue::Integer(1_000_000)),
        ])
    );
    assert!(matches!(
        builder.generate_query("secret==x"),
        Err(FiqlError::UnknownField { .. })
    ));
}

#[test]
fn test_load_json_schema_file() {
    let file = write_schema(".json", SCHEMA_JSON);
    let builder = QueryBuilder::new(Schema::from_file(file.path()).unwrap());
    assert_eq!(
        builder.generate_query("archived==false").unwrap(),
        QueryClause::term("archived", TypedValue::Boolean(false))
    );
}

#[test]
fn test_invalid_schema_file_reports_path() {
    let file = write_schema(".yaml", "fields: [ { name: x } ]");
    let err = Schema::from_file(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("Invalid schema file"));

    assert!(Schema::from_file("/nonexistent/schema.yaml").is_err());
}

#[test]
fn test_schema_builder_validation() {
    let valid = Schema::builder()
        .field(FieldDef::string("name"))
        .alias("n", "name")
        .try_build();
    assert!(valid.is_ok());

    let dangling_alias = Schema::builder()
        .field(FieldDef::string("name"))
        .alias("n", "nom")
        .try_build();
    assert!(dangling_alias.is_err());
}

#[test]
fn test_number_format_is_kept() {
    let schema = Schema::builder()
        .field(FieldDef::number("n", NumberFormat::Decimal).format("int"))
        .try_build()
        .unwrap();
    assert_eq!(
        schema.resolve("n").unwrap().kind,
        FieldKind::Number(NumberFormat::Integer)
    );

    let file = write_schema(".yaml", "fields:\n  - { name: n, kind: number, format: hex }");
    assert!(Schema::from_file(file.path()).is_err());
}
