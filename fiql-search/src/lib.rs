//! FIQL filter expressions to search engine queries.
//!
//! A filter such as `tenantName==taters,(containerName==delicious;tenantName==dinner)`
//! is parsed into a [`FilterExpression`], checked against a [`Schema`], and
//! translated into a [`QueryClause`] tree that maps directly onto
//! Elasticsearch's `term`, `wildcard`, `range` and `bool` queries (see [`dsl`]).
//!
//! Operators: `==`, `!=`, `=gt=`, `=ge=`, `=lt=`, `=le=` (or `>`, `>=`, `<`, `<=`).
//! `;` is AND, `,` is OR, AND binds tighter, parentheses group.

pub mod ast;
pub mod builder;
pub mod coerce;
pub mod config;
pub mod dsl;
pub mod errors;
pub mod parser;
pub mod query;
pub mod schema;
pub mod translator;

pub use ast::{CombinatorKind, CompareOp, FilterExpression};
pub use builder::QueryBuilder;
pub use coerce::{coerce, TypedValue};
pub use config::{QueryBuilderConfig, MAX_DEPTH_LIMIT};
pub use errors::FiqlError;
pub use parser::FiqlParser;
pub use query::{BoolMode, QueryClause, RangeOp};
pub use schema::{
    FieldDef, FieldDescriptor, FieldKind, KindDef, NumberFormat, Schema, SchemaBuilder, SchemaDef,
    Searchable, ValueKind,
};
pub use translator::QueryTranslator;
