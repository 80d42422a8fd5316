//! Shared schemas and helpers for the fiql-search integration tests

#![allow(dead_code)]

use fiql_search::{FieldDef, NumberFormat, QueryClause, Schema, Searchable, TypedValue};

/// Flat document describing a stored object
pub struct MetadataRecord;

impl Searchable for MetadataRecord {
    fn schema() -> Schema {
        Schema::builder()
            .field(FieldDef::string("tenantName"))
            .field(FieldDef::string("containerName"))
            .field(FieldDef::string("objectName").without_wildcards())
            .field(FieldDef::number("size", NumberFormat::Bytes))
            .field(FieldDef::number("version", NumberFormat::Integer))
            .field(FieldDef::number("score", NumberFormat::Decimal))
            .field(FieldDef::date("created"))
            .field(FieldDef::boolean("archived"))
            .field(FieldDef::enumeration("state", &["ACTIVE", "DELETED"]))
            .field(FieldDef::string("checksum").not_searchable())
            .build()
    }
}

/// Search hit wrapping nested metadata objects
pub struct MetadataSearchResult;

impl Searchable for MetadataSearchResult {
    fn schema() -> Schema {
        Schema::builder()
            .field(FieldDef::object(
                "objectMetadata",
                vec![
                    FieldDef::string("tenantName").index_name("tenant_name"),
                    FieldDef::string("containerName").index_name("container_name"),
                ],
            ))
            .field(FieldDef::object(
                "otherMetadata",
                vec![
                    FieldDef::string("region"),
                    FieldDef::date("expires").format("%d/%m/%Y"),
                ],
            ))
            .alias("tenant", "objectMetadata.tenantName")
            .build()
    }
}

pub fn text(value: &str) -> TypedValue {
    TypedValue::Text(value.to_string())
}

pub fn term(field: &str, value: &str) -> QueryClause {
    QueryClause::term(field, text(value))
}

pub const SCHEMA_YAML: &str = r#"
aliases:
  tenant: objectMetadata.tenantName
fields:
  - name: objectMetadata
    kind: object
    index_name: meta
    fields:
      - { name: tenantName, kind: string }
      - { name: created, kind: date }
  - { name: size, kind: number, format: bytes }
  - { name: state, kind: enum, values: [ACTIVE, DELETED] }
  - { name: secret, kind: string, searchable: false }
"#;

pub const SCHEMA_JSON: &str = r#"{
  "fields": [
    {"name": "tenantName", "kind": "string"},
    {"name": "archived", "kind": "boolean"}
  ]
}"#;
