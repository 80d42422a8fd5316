use crate::config::QueryBuilderConfig;
use crate::dsl::to_elasticsearch;
use crate::errors::FiqlError;
use crate::parser::FiqlParser;
use crate::query::QueryClause;
use crate::schema::{Schema, Searchable};
use crate::translator::QueryTranslator;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Turns FIQL filter strings into queries against one schema.
///
/// Hold onto an instance (it is `Send + Sync` and cheap to clone) and call
/// it per request:
///
/// ```
/// use fiql_search::{FieldDef, QueryBuilder, Schema};
///
/// let schema = Schema::builder()
///     .field(FieldDef::string("tenantName"))
///     .field(FieldDef::string("containerName"))
///     .build();
/// let builder = QueryBuilder::new(schema);
/// let query = builder
///     .generate_query("tenantName==taters,(containerName==delicious;tenantName==dinner)")
///     .unwrap();
/// assert_eq!(query.leaf_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    parser: FiqlParser,
    schema: Arc<Schema>,
    config: Arc<QueryBuilderConfig>,
}

impl QueryBuilder {
    pub fn new(schema: Schema) -> Self {
        Self::from_parts(schema, QueryBuilderConfig::default())
    }

    pub fn for_type<T: Searchable>() -> Self {
        Self::new(T::schema())
    }

    /// Fails when `config` does not pass [`QueryBuilderConfig::validate`].
    pub fn with_config(schema: Schema, config: QueryBuilderConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(schema, config))
    }

    fn from_parts(schema: Schema, config: QueryBuilderConfig) -> Self {
        Self {
            parser: FiqlParser::with_config(&config),
            schema: Arc::new(schema),
            config: Arc::new(config),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn parser(&self) -> &FiqlParser {
        &self.parser
    }

    /// Parse and translate `filter`. Errors from any stage are returned as-is.
    pub fn generate_query(&self, filter: &str) -> Result<QueryClause, FiqlError> {
        let expression = self.parser.parse(filter)?;
        // The parser is reusable, translators are not.
        let mut translator = self.create_translator();
        translator.visit(&expression)?;
        let query = translator.into_query()?;
        debug!(
            filter,
            comparisons = expression.comparison_count(),
            "generated query"
        );
        Ok(query)
    }

    /// [`generate_query`](Self::generate_query) rendered as Elasticsearch query DSL
    pub fn generate_elasticsearch(&self, filter: &str) -> Result<Value, FiqlError> {
        self.generate_query(filter)
            .map(|query| to_elasticsearch(&query))
    }

    /// A fresh translator bound to this builder's schema and config
    pub fn create_translator(&self) -> QueryTranslator<'_> {
        QueryTranslator::new(&self.schema, &self.config)
    }
}
